use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Runtime counters of the updater.
///
/// Purpose:
/// - Track how many runs and vendor updates happened
/// - Track failures (fetch, vendor) and consistency alerts
/// - Track how many releases were added overall
///
/// Design:
/// - Lock-free (Atomics)
/// - Owned by the `ReleaseUpdater`, not a global, so independent updaters
///   (and tests) never share counts
#[derive(Default)]
pub struct UpdateMetrics {
    pub ticks_completed: AtomicUsize,
    pub vendor_updates: AtomicUsize,
    pub vendor_failures: AtomicUsize,
    pub fetch_failures: AtomicUsize,
    pub releases_added: AtomicUsize,
    pub releases_disappeared: AtomicUsize,
    pub releases_withdrawn: AtomicUsize,
}

impl UpdateMetrics {
    pub fn incr(counter: &AtomicUsize) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add(counter: &AtomicUsize, n: usize) {
        counter.fetch_add(n, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            ticks_completed: self.ticks_completed.load(Ordering::Relaxed),
            vendor_updates: self.vendor_updates.load(Ordering::Relaxed),
            vendor_failures: self.vendor_failures.load(Ordering::Relaxed),
            fetch_failures: self.fetch_failures.load(Ordering::Relaxed),
            releases_added: self.releases_added.load(Ordering::Relaxed),
            releases_disappeared: self.releases_disappeared.load(Ordering::Relaxed),
            releases_withdrawn: self.releases_withdrawn.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of `UpdateMetrics`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    pub ticks_completed: usize,
    pub vendor_updates: usize,
    pub vendor_failures: usize,
    pub fetch_failures: usize,
    pub releases_added: usize,
    pub releases_disappeared: usize,
    pub releases_withdrawn: usize,
}

impl fmt::Display for MetricsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[METRICS] ticks={} updates={} vendor_err={} fetch_err={} added={} disappeared={} withdrawn={}",
            self.ticks_completed,
            self.vendor_updates,
            self.vendor_failures,
            self.fetch_failures,
            self.releases_added,
            self.releases_disappeared,
            self.releases_withdrawn,
        )
    }
}
