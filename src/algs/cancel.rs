//! Cooperative cancellation.
//!
//! Long-running loops poll a [`CancelToken`] once per cell or per array and
//! stop with [`StructureError::Cancelled`]. Output written before the check
//! fired is left in an unspecified but valid state.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::structure_error::StructureError;

/// Shared cancellation flag. Clones observe the same flag.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; every clone observes it.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    /// `Err(Cancelled)` once cancellation was requested.
    #[inline]
    pub fn check(&self) -> Result<(), StructureError> {
        if self.is_cancelled() {
            Err(StructureError::Cancelled)
        } else {
            Ok(())
        }
    }
}
