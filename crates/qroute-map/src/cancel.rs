//! Cooperative cancellation for long-running mapping calls.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{MapError, MapResult};

/// A cloneable flag that aborts a mapping run.
///
/// Routers check it once per scheduling iteration and SAT-based searches
/// check it between solver calls. Clones share the same flag, so a caller
/// can keep one handle and move another into a worker thread.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a token that is not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    /// Return `Err(Cancelled)` if cancellation was requested.
    #[inline]
    pub fn check(&self) -> MapResult<()> {
        if self.is_cancelled() {
            Err(MapError::Cancelled)
        } else {
            Ok(())
        }
    }
}
