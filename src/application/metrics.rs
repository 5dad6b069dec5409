//! Observability metrics for report throttling.
//!
//! Counters are local to one reporter instance; the throttling state itself
//! lives in the shared store.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Metrics tracking reporter decisions.
///
/// All metrics use atomic operations for thread-safe updates and reads.
/// Clones share the same counters.
#[derive(Debug, Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

#[derive(Debug)]
struct MetricsInner {
    /// Reports handed to the notifier after a throttle check
    reports_delivered: AtomicU64,
    /// Occurrences suppressed inside a cooldown window
    reports_suppressed: AtomicU64,
    /// Reports delivered without throttling because capacity was exhausted
    reports_bypassed: AtomicU64,
}

impl Metrics {
    /// Create a new metrics tracker.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MetricsInner {
                reports_delivered: AtomicU64::new(0),
                reports_suppressed: AtomicU64::new(0),
                reports_bypassed: AtomicU64::new(0),
            }),
        }
    }

    pub(crate) fn record_delivered(&self) {
        self.inner.reports_delivered.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_suppressed(&self) {
        self.inner.reports_suppressed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_bypassed(&self) {
        self.inner.reports_bypassed.fetch_add(1, Ordering::Relaxed);
    }

    /// Get the number of delivered reports.
    pub fn reports_delivered(&self) -> u64 {
        self.inner.reports_delivered.load(Ordering::Relaxed)
    }

    /// Get the number of suppressed occurrences.
    pub fn reports_suppressed(&self) -> u64 {
        self.inner.reports_suppressed.load(Ordering::Relaxed)
    }

    /// Get the number of reports that bypassed throttling.
    pub fn reports_bypassed(&self) -> u64 {
        self.inner.reports_bypassed.load(Ordering::Relaxed)
    }

    /// Get a snapshot of all metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            reports_delivered: self.reports_delivered(),
            reports_suppressed: self.reports_suppressed(),
            reports_bypassed: self.reports_bypassed(),
        }
    }

    /// Reset all metrics to zero.
    pub fn reset(&self) {
        self.inner.reports_delivered.store(0, Ordering::Relaxed);
        self.inner.reports_suppressed.store(0, Ordering::Relaxed);
        self.inner.reports_bypassed.store(0, Ordering::Relaxed);
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// A point-in-time snapshot of metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Reports handed to the notifier after a throttle check
    pub reports_delivered: u64,
    /// Occurrences suppressed inside a cooldown window
    pub reports_suppressed: u64,
    /// Reports delivered without throttling
    pub reports_bypassed: u64,
}

impl MetricsSnapshot {
    /// Total occurrences seen.
    pub fn total(&self) -> u64 {
        self.reports_delivered
            .saturating_add(self.reports_suppressed)
            .saturating_add(self.reports_bypassed)
    }

    /// Calculate the suppression rate (0.0 to 1.0).
    ///
    /// Returns 0.0 if nothing has been reported.
    pub fn suppression_rate(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            0.0
        } else {
            self.reports_suppressed as f64 / total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_basic() {
        let metrics = Metrics::new();

        assert_eq!(metrics.reports_delivered(), 0);
        assert_eq!(metrics.reports_suppressed(), 0);
        assert_eq!(metrics.reports_bypassed(), 0);

        metrics.record_delivered();
        metrics.record_suppressed();
        metrics.record_suppressed();
        metrics.record_bypassed();

        assert_eq!(metrics.reports_delivered(), 1);
        assert_eq!(metrics.reports_suppressed(), 2);
        assert_eq!(metrics.reports_bypassed(), 1);
    }

    #[test]
    fn test_clones_share_counters() {
        let metrics = Metrics::new();
        let clone = metrics.clone();

        clone.record_delivered();
        assert_eq!(metrics.reports_delivered(), 1);
    }

    #[test]
    fn test_snapshot_and_rate() {
        let metrics = Metrics::new();
        for _ in 0..3 {
            metrics.record_suppressed();
        }
        metrics.record_delivered();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.total(), 4);
        assert_eq!(snapshot.suppression_rate(), 0.75);
    }

    #[test]
    fn test_empty_rate() {
        assert_eq!(Metrics::new().snapshot().suppression_rate(), 0.0);
    }

    #[test]
    fn test_reset() {
        let metrics = Metrics::new();
        metrics.record_delivered();
        metrics.record_bypassed();
        metrics.reset();

        assert_eq!(metrics.snapshot().total(), 0);
    }
}
