//! Timeout budget for a download batch.

use std::time::Duration;

/// Batch budget is `per_item * item_count`; each transfer gets its own timeout
/// capped by that budget, so one stalled track cannot hold up the others.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadBudget {
    /// Timeout applied to each transfer.
    pub per_item: Duration,
    /// Aggregate budget of the batch.
    pub total: Duration,
}

impl DownloadBudget {
    pub fn for_batch(item_count: usize, unit: Duration) -> Self {
        let count = u32::try_from(item_count).unwrap_or(u32::MAX);
        let total = unit.saturating_mul(count);
        Self {
            per_item: unit.min(total),
            total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn budget_scales_with_items() {
        let b = DownloadBudget::for_batch(10, Duration::from_secs(300));
        assert_eq!(b.total, Duration::from_secs(3000));
        assert_eq!(b.per_item, Duration::from_secs(300));
    }

    #[test]
    fn per_item_never_exceeds_total() {
        let b = DownloadBudget::for_batch(0, Duration::from_secs(300));
        assert_eq!(b.total, Duration::ZERO);
        assert_eq!(b.per_item, Duration::ZERO);
        let b = DownloadBudget::for_batch(1, Duration::from_secs(300));
        assert_eq!(b.per_item, b.total);
    }
}
