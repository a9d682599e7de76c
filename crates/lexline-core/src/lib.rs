//! lexline-core - Common infrastructure for the lexline download pipeline
//!
//! Paced HTTP transport, retry policy, logging, progress reporting, and
//! interrupt handling shared by the pipeline crates.

pub mod client;
pub mod logging;
pub mod progress;
pub mod retry;
pub mod shutdown;

// Re-exports for convenience
pub use client::{
    Accept, ClientConfig, FinlexClient, HttpError, HttpResponse, Transport, DEFAULT_BASE_URL,
    SHARED_RUNTIME,
};
pub use logging::init_logging;
pub use progress::{ProgressContext, SharedProgress};
pub use retry::{backoff_duration, is_retryable_status};
pub use shutdown::{interrupt_flag, is_interrupted, request_interrupt};
