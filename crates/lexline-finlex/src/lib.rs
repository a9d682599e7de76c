//! lexline-finlex - Resumable download pipeline for the Finlex Open Data API
//!
//! Pages the document-listing endpoint, resolves each listed Akoma Ntoso URI
//! to a local directory, fetches the primary XML plus optional companions,
//! and tracks progress in a checkpoint and a manifest so interrupted runs can
//! resume without re-fetching completed work.

pub mod checkpoint;
pub mod config;
pub mod fetcher;
pub mod listing;
pub mod manifest;
pub mod media;
pub mod runner;
pub mod uri;

#[cfg(test)]
pub(crate) mod testutil;

// Re-exports for convenience
pub use checkpoint::{Checkpoint, CheckpointStore};
pub use config::{year_range, Selection};
pub use fetcher::{fetch_document, FetchOptions, FetchOutcome, OutcomeStatus};
pub use listing::{ChangeStatus, DocumentLister, ListEnd, ListQuery, ListedDocument};
pub use manifest::{Manifest, Summary};
pub use media::extract_media_links;
pub use runner::{run, RunConfig, RunSummary};
pub use uri::{list_path, parse_akn_uri, Category, DocumentRef};
