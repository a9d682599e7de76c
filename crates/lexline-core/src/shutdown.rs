//! Interrupt handling via atomic flag

use std::sync::atomic::{AtomicBool, Ordering};

/// Process-wide interrupt flag — set by the SIGINT/SIGTERM handlers
pub fn interrupt_flag() -> &'static AtomicBool {
    static FLAG: AtomicBool = AtomicBool::new(false);
    &FLAG
}

/// Check whether an interrupt was requested
pub fn is_interrupted() -> bool {
    interrupt_flag().load(Ordering::Relaxed)
}

/// Request an interrupt (for signal handlers)
pub fn request_interrupt() {
    interrupt_flag().store(true, Ordering::Relaxed);
}
