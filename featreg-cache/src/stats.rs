//! Cache counters.

use std::sync::atomic::{AtomicU64, Ordering};

/// Live counters updated by the cache.
#[derive(Debug, Default)]
pub struct CacheMetrics {
    cached_reads: AtomicU64,
    direct_reads: AtomicU64,
    memo_hits: AtomicU64,
    refreshes: AtomicU64,
    refresh_failures: AtomicU64,
}

impl CacheMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_cached_read(&self) {
        self.cached_reads.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_direct_read(&self) {
        self.direct_reads.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_memo_hit(&self) {
        self.memo_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_refresh(&self) {
        self.refreshes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_refresh_failure(&self) {
        self.refresh_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current snapshot of all counters.
    pub fn snapshot(&self) -> CacheStats {
        CacheStats {
            cached_reads: self.cached_reads.load(Ordering::Relaxed),
            direct_reads: self.direct_reads.load(Ordering::Relaxed),
            memo_hits: self.memo_hits.load(Ordering::Relaxed),
            refreshes: self.refreshes.load(Ordering::Relaxed),
            refresh_failures: self.refresh_failures.load(Ordering::Relaxed),
        }
    }
}

/// Counters at a point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Reads served from the snapshot.
    pub cached_reads: u64,
    /// Reads sent straight to the backing store.
    pub direct_reads: u64,
    /// Cached list reads answered from the list memo.
    pub memo_hits: u64,
    /// Successful snapshot replacements, including the initial load.
    pub refreshes: u64,
    /// Snapshot fetches that failed.
    pub refresh_failures: u64,
}

impl CacheStats {
    /// Fraction of all reads served from the snapshot (0.0 to 1.0).
    pub fn cached_read_ratio(&self) -> f64 {
        let total = self.cached_reads + self.direct_reads;
        if total == 0 {
            0.0
        } else {
            self.cached_reads as f64 / total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cached_read_ratio() {
        let stats = CacheStats {
            cached_reads: 80,
            direct_reads: 20,
            ..Default::default()
        };
        assert!((stats.cached_read_ratio() - 0.8).abs() < 0.001);

        let empty = CacheStats::default();
        assert!((empty.cached_read_ratio() - 0.0).abs() < 0.001);
    }

    #[test]
    fn test_counters_accumulate() {
        let metrics = CacheMetrics::new();
        metrics.record_cached_read();
        metrics.record_cached_read();
        metrics.record_direct_read();
        metrics.record_refresh();
        metrics.record_refresh_failure();
        metrics.record_memo_hit();

        let stats = metrics.snapshot();
        assert_eq!(stats.cached_reads, 2);
        assert_eq!(stats.direct_reads, 1);
        assert_eq!(stats.refreshes, 1);
        assert_eq!(stats.refresh_failures, 1);
        assert_eq!(stats.memo_hits, 1);
    }
}
