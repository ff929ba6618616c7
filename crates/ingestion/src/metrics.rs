//! Ingestion counters

use std::sync::atomic::{AtomicU64, Ordering};

/// Lock-free counters shared by the ingress dispatcher, the registry and
/// every delivery worker
#[derive(Debug, Default)]
pub struct IngestionMetrics {
    /// Records accepted into the ingress queue
    submitted: AtomicU64,

    /// Records handed to a delivery channel
    routed: AtomicU64,

    /// Records dropped because their destination was not registered
    routing_failures: AtomicU64,

    /// Records dropped because their delivery channel was already closed
    dropped_on_close: AtomicU64,

    /// Delivery channel full events
    backpressure_events: AtomicU64,

    /// Delivery workers started after registration
    workers_spawned: AtomicU64,

    /// Records appended to the buffer cache
    buffered: AtomicU64,
}

impl IngestionMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_submitted(&self) {
        self.submitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_routed(&self) {
        self.routed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_routing_failures(&self) {
        self.routing_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_dropped_on_close(&self) {
        self.dropped_on_close.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_backpressure_events(&self) {
        self.backpressure_events.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_workers_spawned(&self) {
        self.workers_spawned.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_buffered(&self) {
        self.buffered.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            submitted: self.submitted.load(Ordering::Relaxed),
            routed: self.routed.load(Ordering::Relaxed),
            routing_failures: self.routing_failures.load(Ordering::Relaxed),
            dropped_on_close: self.dropped_on_close.load(Ordering::Relaxed),
            backpressure_events: self.backpressure_events.load(Ordering::Relaxed),
            workers_spawned: self.workers_spawned.load(Ordering::Relaxed),
            buffered: self.buffered.load(Ordering::Relaxed),
        }
    }
}

/// Metrics snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub submitted: u64,
    pub routed: u64,
    pub routing_failures: u64,
    pub dropped_on_close: u64,
    pub backpressure_events: u64,
    pub workers_spawned: u64,
    pub buffered: u64,
}
