//! Buffer cache - pending records per destination
//!
//! Delivery workers append, the flush scheduler drains. Both go through the
//! same lock, which is what keeps a record appended concurrently with a
//! drain out of the snapshot being taken and inside the next one.

use std::collections::HashMap;

use contracts::{DestinationKey, Record};
use parking_lot::Mutex;
use tracing::trace;

/// Snapshot of one destination's buffer taken by [`BufferCache::drain_all`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlushBatch {
    pub destination: DestinationKey,
    pub records: Vec<Record>,
}

impl FlushBatch {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Shared, lock-protected map of destination -> ordered pending records
#[derive(Debug, Default)]
pub struct BufferCache {
    buffers: Mutex<HashMap<DestinationKey, Vec<Record>>>,
}

impl BufferCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a record onto its destination buffer
    pub fn append(&self, record: Record) {
        let mut buffers = self.buffers.lock();
        trace!(destination = %record.destination, "record buffered");
        buffers
            .entry(record.destination.clone())
            .or_default()
            .push(record);
    }

    /// Take every non-empty buffer and reset it to empty
    ///
    /// The whole scan runs under one lock. Buffers are emptied in place so
    /// their allocation is kept for the next round of appends.
    pub fn drain_all(&self) -> Vec<FlushBatch> {
        let mut buffers = self.buffers.lock();
        buffers
            .iter_mut()
            .filter(|(_, records)| !records.is_empty())
            .map(|(destination, records)| FlushBatch {
                destination: destination.clone(),
                records: records.drain(..).collect(),
            })
            .collect()
    }

    /// Records waiting for the next flush of `destination`
    pub fn pending(&self, destination: &str) -> usize {
        self.buffers
            .lock()
            .get(destination)
            .map(Vec::len)
            .unwrap_or(0)
    }

    pub fn total_pending(&self) -> usize {
        self.buffers.lock().values().map(Vec::len).sum()
    }
}
