//! Cancellation signal shared by the tasks of one fail-fast group.
//!
//! The group sets the flag on its first failure; transfers that are already
//! running poll it from the curl progress callback and stop early.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cloneable abort token. All clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct AbortFlag(Arc<AtomicBool>);

impl AbortFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request that every holder of this flag stops as soon as possible.
    pub fn request(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}
