//! Cooperative cancellation for the nonce search.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A shared flag raised to abort an in-flight mining run.
///
/// Cloning is cheap; all clones observe the same flag. The mining loop polls
/// the token between hash attempts, so a raised token stops the search
/// within a bounded number of iterations rather than at the next deadline.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create an unraised token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the flag; idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// Whether the flag has been raised.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}
