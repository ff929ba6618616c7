//! Ingress dispatcher - bounded queue in front of the destination registry

use std::sync::Arc;

use async_channel::{bounded, Receiver, Sender, TrySendError};
use contracts::Record;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, instrument};

use crate::error::{IngestionError, Result};
use crate::metrics::IngestionMetrics;
use crate::registry::DestinationRegistry;

/// Producer-side handle to the ingress queue
#[derive(Clone)]
pub struct IngressHandle {
    tx: Sender<Record>,
    metrics: Arc<IngestionMetrics>,
}

impl IngressHandle {
    /// Enqueue a record, waiting while the queue is full
    ///
    /// Fails only once the queue has been closed for shutdown.
    pub async fn submit(&self, record: Record) -> Result<()> {
        self.tx
            .send(record)
            .await
            .map_err(|e| IngestionError::Closed {
                destination: e.0.destination.to_string(),
            })?;
        self.accepted();
        Ok(())
    }

    /// Enqueue a record without waiting
    pub fn try_submit(&self, record: Record) -> Result<()> {
        match self.tx.try_send(record) {
            Ok(()) => {
                self.accepted();
                Ok(())
            }
            Err(TrySendError::Full(record)) => Err(IngestionError::QueueFull {
                destination: record.destination.to_string(),
            }),
            Err(TrySendError::Closed(record)) => Err(IngestionError::Closed {
                destination: record.destination.to_string(),
            }),
        }
    }

    /// Whether the queue stopped accepting records
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    fn accepted(&self) {
        self.metrics.inc_submitted();
        observability::record_submitted();
    }
}

/// Ingress queue plus the worker pool that routes it
pub struct IngressDispatcher {
    tx: Sender<Record>,
    rx: Receiver<Record>,
    registry: Arc<DestinationRegistry>,
    metrics: Arc<IngestionMetrics>,
    workers: TaskTracker,
}

impl IngressDispatcher {
    pub fn new(
        capacity: usize,
        registry: Arc<DestinationRegistry>,
        metrics: Arc<IngestionMetrics>,
    ) -> Self {
        let (tx, rx) = bounded(capacity);
        Self {
            tx,
            rx,
            registry,
            metrics,
            workers: TaskTracker::new(),
        }
    }

    pub fn handle(&self) -> IngressHandle {
        IngressHandle {
            tx: self.tx.clone(),
            metrics: Arc::clone(&self.metrics),
        }
    }

    /// Start `count` routing workers
    #[instrument(name = "ingress_spawn_workers", skip(self))]
    pub fn spawn_workers(&self, count: usize) {
        for id in 0..count {
            self.workers.spawn(dispatch_worker(
                id,
                self.rx.clone(),
                Arc::clone(&self.registry),
            ));
        }
        info!(workers = count, "ingress dispatcher started");
    }

    /// Stop accepting records; queued records are still routed
    ///
    /// Returns `false` if the queue was already closed.
    pub fn close(&self) -> bool {
        self.tx.close()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Wait for the routing workers to drain the queue and exit
    pub async fn wait_workers(&self) {
        self.workers.close();
        self.workers.wait().await;
    }

    /// Records waiting in the ingress queue
    pub fn queue_len(&self) -> usize {
        self.rx.len()
    }
}

async fn dispatch_worker(
    id: usize,
    rx: Receiver<Record>,
    registry: Arc<DestinationRegistry>,
) {
    debug!(worker = id, "dispatch worker started");
    let mut routed = 0u64;
    while let Ok(record) = rx.recv().await {
        if registry.route(record).await.is_routed() {
            routed += 1;
        }
    }
    debug!(worker = id, routed, "dispatch worker stopped");
}
