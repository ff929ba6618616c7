//! Destination registry and delivery workers

use std::collections::HashMap;
use std::sync::Arc;

use async_channel::{bounded, Receiver, Sender, TrySendError};
use contracts::{DestinationKey, EngineConfig, Record};
use parking_lot::Mutex;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, instrument, trace, warn};

use crate::buffer::BufferCache;
use crate::error::{IngestionError, Result};
use crate::metrics::IngestionMetrics;

/// Per-destination delivery settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliverySettings {
    /// Delivery channel capacity
    pub channel_capacity: usize,
    /// Workers started on registration
    pub initial_workers: usize,
    /// Upper bound on workers per destination
    pub max_workers: usize,
}

impl Default for DeliverySettings {
    fn default() -> Self {
        Self::from(&EngineConfig::default())
    }
}

impl From<&EngineConfig> for DeliverySettings {
    fn from(config: &EngineConfig) -> Self {
        Self {
            channel_capacity: config.delivery_capacity,
            initial_workers: config.initial_delivery_workers,
            max_workers: config.max_delivery_workers,
        }
    }
}

/// Result of routing one record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOutcome {
    /// Accepted by the delivery channel without waiting
    Delivered,
    /// Channel was full; the record was delivered after a blocking send
    Backpressured { worker_spawned: bool },
    /// No entry for the destination, record dropped
    Unregistered,
    /// Delivery channel already closed, record dropped
    Closed,
}

impl RouteOutcome {
    /// Record reached a delivery channel
    pub fn is_routed(self) -> bool {
        matches!(self, Self::Delivered | Self::Backpressured { .. })
    }
}

/// Read-only view of one destination entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationStatus {
    pub destination: DestinationKey,
    pub workers: usize,
    pub queued: usize,
}

struct DestinationEntry {
    tx: Sender<Record>,
    rx: Receiver<Record>,
    worker_count: usize,
}

#[derive(Default)]
struct RegistryInner {
    entries: HashMap<DestinationKey, DestinationEntry>,
    closed: bool,
}

/// Destination -> delivery channel map
///
/// Entries are created on first registration and live as long as the
/// registry. Worker counts only grow. All methods that spawn workers must be
/// called from within a tokio runtime.
pub struct DestinationRegistry {
    inner: Mutex<RegistryInner>,
    cache: Arc<BufferCache>,
    settings: DeliverySettings,
    workers: TaskTracker,
    metrics: Arc<IngestionMetrics>,
}

impl DestinationRegistry {
    pub fn new(
        settings: DeliverySettings,
        cache: Arc<BufferCache>,
        metrics: Arc<IngestionMetrics>,
    ) -> Self {
        Self {
            inner: Mutex::new(RegistryInner::default()),
            cache,
            settings,
            workers: TaskTracker::new(),
            metrics,
        }
    }

    pub fn settings(&self) -> DeliverySettings {
        self.settings
    }

    /// Register a destination
    ///
    /// Returns `Ok(true)` when a new entry was created and `Ok(false)` when
    /// the destination was already present.
    #[instrument(name = "registry_register", skip(self), fields(destination = %key))]
    pub fn register(&self, key: DestinationKey) -> Result<bool> {
        let mut inner = self.inner.lock();
        if inner.closed {
            return Err(IngestionError::RegistryClosed {
                destination: key.to_string(),
            });
        }
        if inner.entries.contains_key(&key) {
            debug!("destination already registered");
            return Ok(false);
        }

        let (tx, rx) = bounded(self.settings.channel_capacity);
        for _ in 0..self.settings.initial_workers {
            self.spawn_worker(&key, rx.clone());
        }
        observability::record_delivery_workers(&key, self.settings.initial_workers);
        inner.entries.insert(
            key.clone(),
            DestinationEntry {
                tx,
                rx,
                worker_count: self.settings.initial_workers,
            },
        );

        info!(
            workers = self.settings.initial_workers,
            capacity = self.settings.channel_capacity,
            "destination registered"
        );
        Ok(true)
    }

    /// Hand a record to its destination's delivery channel
    ///
    /// The non-blocking attempt and any worker growth happen under the
    /// registry lock. The blocking send on a full channel runs after the
    /// lock is released.
    pub async fn route(&self, record: Record) -> RouteOutcome {
        let (tx, record, worker_spawned) = {
            let mut inner = self.inner.lock();
            let Some(entry) = inner.entries.get_mut(&record.destination) else {
                self.metrics.inc_routing_failures();
                observability::record_routing_failure(&record.destination);
                warn!(
                    destination = %record.destination,
                    "no delivery channel for destination, record dropped"
                );
                return RouteOutcome::Unregistered;
            };

            match entry.tx.try_send(record) {
                Ok(()) => {
                    self.metrics.inc_routed();
                    return RouteOutcome::Delivered;
                }
                Err(TrySendError::Closed(record)) => {
                    self.metrics.inc_dropped_on_close();
                    warn!(
                        destination = %record.destination,
                        "delivery channel closed, record dropped"
                    );
                    return RouteOutcome::Closed;
                }
                Err(TrySendError::Full(record)) => {
                    self.metrics.inc_backpressure_events();
                    observability::record_backpressure(&record.destination);

                    let spawned = entry.worker_count < self.settings.max_workers;
                    if spawned {
                        self.spawn_worker(&record.destination, entry.rx.clone());
                        entry.worker_count += 1;
                        observability::record_delivery_workers(
                            &record.destination,
                            entry.worker_count,
                        );
                    }
                    debug!(
                        destination = %record.destination,
                        workers = entry.worker_count,
                        worker_spawned = spawned,
                        "delivery channel full"
                    );
                    (entry.tx.clone(), record, spawned)
                }
            }
        };

        let destination = record.destination.clone();
        match tx.send(record).await {
            Ok(()) => {
                self.metrics.inc_routed();
                RouteOutcome::Backpressured { worker_spawned }
            }
            Err(_) => {
                self.metrics.inc_dropped_on_close();
                warn!(%destination, "delivery channel closed during send, record dropped");
                RouteOutcome::Closed
            }
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.inner.lock().entries.contains_key(key)
    }

    /// Live delivery workers for `key` (0 when unregistered)
    pub fn worker_count(&self, key: &str) -> usize {
        self.inner
            .lock()
            .entries
            .get(key)
            .map(|e| e.worker_count)
            .unwrap_or(0)
    }

    /// All registered destinations, sorted by key
    pub fn destinations(&self) -> Vec<DestinationStatus> {
        let inner = self.inner.lock();
        let mut statuses: Vec<_> = inner
            .entries
            .iter()
            .map(|(key, entry)| DestinationStatus {
                destination: key.clone(),
                workers: entry.worker_count,
                queued: entry.tx.len(),
            })
            .collect();
        statuses.sort_by(|a, b| a.destination.as_str().cmp(b.destination.as_str()));
        statuses
    }

    pub fn is_closed(&self) -> bool {
        self.inner.lock().closed
    }

    /// Close every delivery channel and refuse further registrations
    ///
    /// Records already queued stay readable until the workers drain them.
    pub fn close(&self) {
        let mut inner = self.inner.lock();
        if inner.closed {
            return;
        }
        inner.closed = true;
        for entry in inner.entries.values() {
            entry.tx.close();
        }
        debug!(destinations = inner.entries.len(), "delivery channels closed");
    }

    /// Wait until every delivery worker has drained its channel and exited
    pub async fn wait_workers(&self) {
        self.workers.close();
        self.workers.wait().await;
    }

    fn spawn_worker(&self, destination: &DestinationKey, rx: Receiver<Record>) {
        self.metrics.inc_workers_spawned();
        self.workers.spawn(delivery_worker(
            destination.clone(),
            rx,
            Arc::clone(&self.cache),
            Arc::clone(&self.metrics),
        ));
    }
}

async fn delivery_worker(
    destination: DestinationKey,
    rx: Receiver<Record>,
    cache: Arc<BufferCache>,
    metrics: Arc<IngestionMetrics>,
) {
    trace!(%destination, "delivery worker started");
    while let Ok(record) = rx.recv().await {
        cache.append(record);
        metrics.inc_buffered();
    }
    trace!(%destination, "delivery worker stopped");
}
