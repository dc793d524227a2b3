//! Progress reporting for album downloads.
//!
//! Every download attempt produces exactly one [`ItemEvent`], success or not,
//! so a bar sized to the track count always reaches 100%.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use crate::http::FetchError;

/// How one item ended.
#[derive(Debug, Clone, Copy)]
pub enum ItemStatus<'a> {
    Succeeded { bytes: u64 },
    Failed(&'a FetchError),
}

/// Completion signal for one item of a batch.
#[derive(Debug, Clone, Copy)]
pub struct ItemEvent<'a> {
    /// Position of the item in the batch.
    pub index: usize,
    /// Human-readable name (track title).
    pub label: &'a str,
    pub status: ItemStatus<'a>,
}

/// Receiver of per-item completion signals. Must tolerate calls from any thread.
pub trait ProgressSink: Send + Sync {
    /// A batch of `total` items named `label` is starting.
    fn begin(&self, _label: &str, _total: usize) {}

    /// Called exactly once per item, whatever its outcome.
    fn item_finished(&self, event: &ItemEvent<'_>);

    /// The batch started by the last `begin` is over.
    fn finish(&self) {}
}

/// Sink that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn item_finished(&self, _event: &ItemEvent<'_>) {}
}

/// Snapshot of batch progress (CLI-friendly).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProgressStats {
    /// Items finished so far (succeeded + failed).
    pub done: usize,
    /// Items that finished with an error.
    pub failed: usize,
    /// Items in the batch.
    pub total: usize,
    /// Bytes written by successful items.
    pub bytes: u64,
}

impl ProgressStats {
    pub fn succeeded(&self) -> usize {
        self.done.saturating_sub(self.failed)
    }

    /// Fraction complete in [0.0, 1.0].
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        (self.done as f64 / self.total as f64).min(1.0)
    }

    pub fn is_complete(&self) -> bool {
        self.done >= self.total
    }
}

/// Lock-free counters behind a progress display.
#[derive(Debug, Default)]
pub struct ProgressCounter {
    total: AtomicUsize,
    done: AtomicUsize,
    failed: AtomicUsize,
    bytes: AtomicU64,
}

impl ProgressCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Zero the counters for a new batch of `total` items.
    pub fn reset(&self, total: usize) {
        self.total.store(total, Ordering::Relaxed);
        self.done.store(0, Ordering::Relaxed);
        self.failed.store(0, Ordering::Relaxed);
        self.bytes.store(0, Ordering::Relaxed);
    }

    /// Count one finished item and return the updated snapshot.
    pub fn record(&self, status: &ItemStatus<'_>) -> ProgressStats {
        match status {
            ItemStatus::Succeeded { bytes } => {
                self.bytes.fetch_add(*bytes, Ordering::Relaxed);
            }
            ItemStatus::Failed(_) => {
                self.failed.fetch_add(1, Ordering::Relaxed);
            }
        }
        self.done.fetch_add(1, Ordering::AcqRel);
        self.snapshot()
    }

    pub fn snapshot(&self) -> ProgressStats {
        ProgressStats {
            done: self.done.load(Ordering::Acquire),
            failed: self.failed.load(Ordering::Relaxed),
            total: self.total.load(Ordering::Relaxed),
            bytes: self.bytes.load(Ordering::Relaxed),
        }
    }
}

impl ProgressSink for ProgressCounter {
    fn begin(&self, _label: &str, total: usize) {
        self.reset(total);
    }

    fn item_finished(&self, event: &ItemEvent<'_>) {
        self.record(&event.status);
    }
}
