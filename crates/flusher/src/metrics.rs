//! Flush metrics for observability

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters shared by the scheduler and every write task
#[derive(Debug, Default)]
pub struct FlushMetrics {
    /// Flush cycles run (timer ticks plus the shutdown flush)
    flush_cycles: AtomicU64,
    /// Batches persisted by the sink
    batches_written: AtomicU64,
    /// Records persisted by the sink
    records_written: AtomicU64,
    /// Individual failed write attempts
    write_failures: AtomicU64,
    /// Batches discarded after exhausting retries
    batches_lost: AtomicU64,
    /// Records discarded after exhausting retries
    records_lost: AtomicU64,
}

impl FlushMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_flush_cycles(&self) {
        self.flush_cycles.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_write_failures(&self) {
        self.write_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Count one batch of `records` as written
    pub fn record_written(&self, records: usize) {
        self.batches_written.fetch_add(1, Ordering::Relaxed);
        self.records_written
            .fetch_add(records as u64, Ordering::Relaxed);
    }

    /// Count one batch of `records` as lost
    pub fn record_lost(&self, records: usize) {
        self.batches_lost.fetch_add(1, Ordering::Relaxed);
        self.records_lost.fetch_add(records as u64, Ordering::Relaxed);
    }

    pub fn records_written(&self) -> u64 {
        self.records_written.load(Ordering::Relaxed)
    }

    pub fn records_lost(&self) -> u64 {
        self.records_lost.load(Ordering::Relaxed)
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> FlushSnapshot {
        FlushSnapshot {
            flush_cycles: self.flush_cycles.load(Ordering::Relaxed),
            batches_written: self.batches_written.load(Ordering::Relaxed),
            records_written: self.records_written(),
            write_failures: self.write_failures.load(Ordering::Relaxed),
            batches_lost: self.batches_lost.load(Ordering::Relaxed),
            records_lost: self.records_lost(),
        }
    }
}

/// Snapshot of flush metrics (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushSnapshot {
    pub flush_cycles: u64,
    pub batches_written: u64,
    pub records_written: u64,
    pub write_failures: u64,
    pub batches_lost: u64,
    pub records_lost: u64,
}
