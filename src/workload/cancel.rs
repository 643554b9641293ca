//! Shared cancellation signal checked between items and after suspension points.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Cloneable stop flag. Every clone observes the same signal.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag {
    raised: Arc<AtomicBool>,
}

impl CancellationFlag {
    /// Create a lowered flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request that in-flight runs stop at their next check.
    pub fn cancel(&self) {
        self.raised.store(true, Ordering::SeqCst);
    }

    /// Whether a stop was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.raised.load(Ordering::SeqCst)
    }

    /// Lower the flag so the next run can proceed.
    pub fn reset(&self) {
        self.raised.store(false, Ordering::SeqCst);
    }
}
