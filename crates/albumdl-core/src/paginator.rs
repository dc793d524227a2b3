//! Page arithmetic for the listing endpoint.

use std::ops::Range;

/// Tracks per listing page used by the remote service.
pub const DEFAULT_PAGE_SIZE: u32 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    page_size: u32,
}

impl Default for Paginator {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl Paginator {
    /// A zero page size is treated as 1.
    pub fn new(page_size: u32) -> Self {
        Self {
            page_size: page_size.max(1),
        }
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Number of pages needed for `total` items (ceiling division; 0 items → 0 pages).
    pub fn page_count(&self, total: u64) -> u64 {
        total.div_ceil(u64::from(self.page_size))
    }

    /// Page indices to request, `0..page_count`.
    pub fn pages(&self, total: u64) -> Range<u64> {
        0..self.page_count(total)
    }
}
