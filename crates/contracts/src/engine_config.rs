//! Engine configuration contracts that can be shared across crates.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Buffering engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Number of dispatcher workers draining the ingress queue
    ///
    /// With one dispatcher and one delivery worker a single producer's records
    /// reach the buffer in submission order.
    pub dispatcher_workers: usize,

    /// Delivery workers started when a destination is registered
    pub initial_delivery_workers: usize,

    /// Ceiling on delivery workers per destination under backpressure
    pub max_delivery_workers: usize,

    /// Ingress queue capacity
    pub ingress_capacity: usize,

    /// Per-destination delivery channel capacity
    pub delivery_capacity: usize,

    /// Flush period in milliseconds
    pub flush_interval_ms: u64,
}

impl EngineConfig {
    pub fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.flush_interval_ms)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            dispatcher_workers: 1,
            initial_delivery_workers: 1,
            max_delivery_workers: 64,
            ingress_capacity: 1000,
            delivery_capacity: 1000,
            flush_interval_ms: 1000,
        }
    }
}

/// Write retry policy for flush batches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total write attempts per batch, including the first one
    pub max_attempts: u32,

    /// Pause between two attempts in milliseconds
    pub retry_delay_ms: u64,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, retry_delay: Duration) -> Self {
        Self {
            max_attempts,
            retry_delay_ms: retry_delay.as_millis() as u64,
        }
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_delay_ms: 2000,
        }
    }
}
