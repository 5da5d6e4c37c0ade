//! Progress of an active batch run.

use derive_getters::Getters;
use serde::{Deserialize, Serialize};

/// Items attempted so far out of a fixed total.
///
/// Exists only while a batch run is active.
///
/// # Examples
///
/// ```
/// use shotlist_core::BatchProgress;
///
/// let mut progress = BatchProgress::new(2);
/// progress.advance();
/// assert_eq!(*progress.current(), 1);
/// assert!(!progress.is_complete());
/// progress.advance();
/// assert!(progress.is_complete());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct BatchProgress {
    current: usize,
    total: usize,
}

impl BatchProgress {
    /// Start a run of `total` items with nothing attempted.
    pub fn new(total: usize) -> Self {
        Self { current: 0, total }
    }

    /// Count one more attempted item. Never exceeds `total`.
    pub fn advance(&mut self) {
        if self.current < self.total {
            self.current += 1;
        }
    }

    /// True once every item has been attempted.
    pub fn is_complete(&self) -> bool {
        self.current >= self.total
    }
}
