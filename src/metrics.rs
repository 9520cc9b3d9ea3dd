// src/metrics.rs
use std::sync::atomic::{AtomicU64, Ordering};

/// Cheap run counters, incremented from any task.
#[derive(Default)]
pub struct Metrics {
    pub rows_total: AtomicU64,
    pub rows_malformed: AtomicU64,
    pub batches_total: AtomicU64,
    pub source_merges: AtomicU64,
    pub cross_merges: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn inc_row(&self) {
        self.rows_total.fetch_add(1, Ordering::Relaxed);
    }
    #[inline]
    pub fn inc_malformed(&self) {
        self.rows_malformed.fetch_add(1, Ordering::Relaxed);
    }
    #[inline]
    pub fn inc_batch(&self) {
        self.batches_total.fetch_add(1, Ordering::Relaxed);
    }
    #[inline]
    pub fn inc_source_merge(&self) {
        self.source_merges.fetch_add(1, Ordering::Relaxed);
    }
    #[inline]
    pub fn inc_cross_merge(&self) {
        self.cross_merges.fetch_add(1, Ordering::Relaxed);
    }

    /// One-line run summary for the final log.
    pub fn summary(&self) -> String {
        format!(
            "rows={} malformed={} batches={} source_merges={} cross_merges={}",
            self.rows_total.load(Ordering::Relaxed),
            self.rows_malformed.load(Ordering::Relaxed),
            self.batches_total.load(Ordering::Relaxed),
            self.source_merges.load(Ordering::Relaxed),
            self.cross_merges.load(Ordering::Relaxed),
        )
    }
}
