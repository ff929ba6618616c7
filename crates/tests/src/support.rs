//! Test sinks and helpers shared by the e2e suites

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use contracts::{ContractError, DestinationKey, EngineConfig, Record, RecordSink};

/// In-memory sink that fails the first `fail_first` writes and can be slowed
/// down per write
#[derive(Default)]
pub struct RecordingSink {
    written: Mutex<HashMap<DestinationKey, Vec<String>>>,
    fail_first: u32,
    delay: Duration,
    first_delay: Duration,
    calls: AtomicU32,
    active: AtomicUsize,
    max_active: AtomicUsize,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(fail_first: u32) -> Self {
        Self {
            fail_first,
            ..Self::default()
        }
    }

    pub fn slow(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    /// Only the first write sleeps for `delay`
    pub fn slow_first(delay: Duration) -> Self {
        Self {
            first_delay: delay,
            ..Self::default()
        }
    }

    /// Payloads persisted for `destination`, in write order
    pub fn payloads(&self, destination: &str) -> Vec<String> {
        self.written
            .lock()
            .unwrap()
            .get(destination)
            .cloned()
            .unwrap_or_default()
    }

    pub fn total(&self) -> usize {
        self.written.lock().unwrap().values().map(Vec::len).sum()
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Highest number of writes seen running at once
    pub fn max_active(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }
}

impl RecordSink for RecordingSink {
    fn name(&self) -> &str {
        "recording"
    }

    async fn write(
        &self,
        destination: &DestinationKey,
        records: &[Record],
    ) -> Result<(), ContractError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let delay = if call == 0 && !self.first_delay.is_zero() {
            self.first_delay
        } else {
            self.delay
        };

        let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(active, Ordering::SeqCst);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.active.fetch_sub(1, Ordering::SeqCst);

        if call < self.fail_first {
            return Err(ContractError::sink_write("recording", "injected failure"));
        }

        self.written
            .lock()
            .unwrap()
            .entry(destination.clone())
            .or_default()
            .extend(records.iter().map(|r| r.payload.clone()));
        Ok(())
    }
}

/// Single dispatcher and delivery worker, so arrival order is preserved
pub fn ordered_config(flush_interval_ms: u64) -> EngineConfig {
    EngineConfig {
        dispatcher_workers: 1,
        initial_delivery_workers: 1,
        max_delivery_workers: 1,
        flush_interval_ms,
        ..Default::default()
    }
}

pub fn expected_payloads(prefix: &str, count: usize) -> Vec<String> {
    (0..count).map(|i| format!("{prefix}{i}")).collect()
}

pub fn read_lines(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}
