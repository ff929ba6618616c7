//! Engine lifecycle - owns the buffering pipeline from start to drain

use std::sync::Arc;
use std::time::Instant;

use contracts::{DestinationKey, EngineConfig, RecordSink, RetryPolicy};
use flusher::FlushScheduler;
use ingestion::{
    BufferCache, DeliverySettings, DestinationRegistry, IngestionMetrics, IngressDispatcher,
    IngressHandle,
};
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument};

use crate::error::{EngineError, Result};
use crate::stats::EngineStats;

/// Lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Stopped,
    Running,
    Draining,
}

struct Lifecycle {
    state: EngineState,
    /// Set once `shutdown` completes; an engine is not restartable
    finished: bool,
    started_at: Option<Instant>,
    timer: Option<(CancellationToken, JoinHandle<()>)>,
}

/// Buffering and flush engine
///
/// Wires the ingress dispatcher, destination registry, buffer cache and
/// flush scheduler around one sink.
pub struct Engine<S> {
    config: EngineConfig,
    lifecycle: Mutex<Lifecycle>,
    cache: Arc<BufferCache>,
    registry: Arc<DestinationRegistry>,
    dispatcher: IngressDispatcher,
    scheduler: Arc<FlushScheduler<S>>,
    metrics: Arc<IngestionMetrics>,
}

impl<S> Engine<S>
where
    S: RecordSink + Send + Sync + 'static,
{
    pub fn new(config: EngineConfig, retry: RetryPolicy, sink: Arc<S>) -> Self {
        let cache = Arc::new(BufferCache::new());
        let metrics = Arc::new(IngestionMetrics::new());
        let registry = Arc::new(DestinationRegistry::new(
            DeliverySettings::from(&config),
            Arc::clone(&cache),
            Arc::clone(&metrics),
        ));
        let dispatcher = IngressDispatcher::new(
            config.ingress_capacity,
            Arc::clone(&registry),
            Arc::clone(&metrics),
        );
        let scheduler = Arc::new(FlushScheduler::new(
            Arc::clone(&cache),
            sink,
            retry,
            config.flush_interval(),
        ));

        Self {
            config,
            lifecycle: Mutex::new(Lifecycle {
                state: EngineState::Stopped,
                finished: false,
                started_at: None,
                timer: None,
            }),
            cache,
            registry,
            dispatcher,
            scheduler,
            metrics,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn state(&self) -> EngineState {
        self.lifecycle.lock().state
    }

    /// Producer handle for submitting records
    pub fn handle(&self) -> IngressHandle {
        self.dispatcher.handle()
    }

    pub fn registry(&self) -> &Arc<DestinationRegistry> {
        &self.registry
    }

    pub fn cache(&self) -> &Arc<BufferCache> {
        &self.cache
    }

    /// Register a destination; allowed before start and while running
    ///
    /// Returns `Ok(false)` if it was already registered.
    pub fn register_destination(&self, key: DestinationKey) -> Result<bool> {
        Ok(self.registry.register(key)?)
    }

    /// Register `destinations`, start the dispatcher pool and the flush timer
    #[instrument(name = "engine_start", skip_all)]
    pub fn start<I>(&self, destinations: I) -> Result<()>
    where
        I: IntoIterator<Item = DestinationKey>,
    {
        let mut lifecycle = self.lifecycle.lock();
        if lifecycle.finished {
            return Err(EngineError::Terminated);
        }
        if lifecycle.state != EngineState::Stopped {
            return Err(EngineError::AlreadyRunning);
        }

        for key in destinations {
            self.registry.register(key)?;
        }
        self.dispatcher.spawn_workers(self.config.dispatcher_workers);

        let cancel = CancellationToken::new();
        let timer = self.scheduler.spawn_timer(cancel.clone());
        lifecycle.timer = Some((cancel, timer));
        lifecycle.started_at = Some(Instant::now());
        lifecycle.state = EngineState::Running;

        info!(
            destinations = self.registry.destinations().len(),
            dispatcher_workers = self.config.dispatcher_workers,
            flush_interval_ms = self.config.flush_interval_ms,
            "engine started"
        );
        Ok(())
    }

    /// Start, wait for `cancel`, then shut down
    pub async fn run<I>(&self, destinations: I, cancel: CancellationToken) -> Result<EngineStats>
    where
        I: IntoIterator<Item = DestinationKey>,
    {
        self.start(destinations)?;
        cancel.cancelled().await;
        info!("shutdown requested");
        self.shutdown().await
    }

    /// Drain everything in flight and stop
    ///
    /// Order: close ingress, stop the timer, drain the dispatcher, close and
    /// drain delivery channels, run a final flush, wait for every write task.
    #[instrument(name = "engine_shutdown", skip(self))]
    pub async fn shutdown(&self) -> Result<EngineStats> {
        let timer = {
            let mut lifecycle = self.lifecycle.lock();
            match lifecycle.state {
                EngineState::Running => {}
                EngineState::Stopped if lifecycle.finished => {
                    return Err(EngineError::Terminated)
                }
                EngineState::Stopped | EngineState::Draining => {
                    return Err(EngineError::NotRunning)
                }
            }
            lifecycle.state = EngineState::Draining;
            lifecycle.timer.take()
        };

        self.dispatcher.close();

        if let Some((cancel, handle)) = timer {
            cancel.cancel();
            if let Err(e) = handle.await {
                error!(error = ?e, "flush timer task panicked");
            }
        }

        self.dispatcher.wait_workers().await;
        info!(queued = self.dispatcher.queue_len(), "ingress drained");

        self.registry.close();
        self.registry.wait_workers().await;

        let batches = self.scheduler.flush_once();
        info!(
            batches,
            in_flight = self.scheduler.in_flight(),
            "final flush started"
        );
        self.scheduler.wait_writes().await;

        {
            let mut lifecycle = self.lifecycle.lock();
            lifecycle.state = EngineState::Stopped;
            lifecycle.finished = true;
        }

        let stats = self.stats();
        info!(
            written = stats.flush.records_written,
            lost = stats.flush.records_lost,
            "engine stopped"
        );
        Ok(stats)
    }

    /// Snapshot of the current counters
    pub fn stats(&self) -> EngineStats {
        let uptime = self
            .lifecycle
            .lock()
            .started_at
            .map(|t| t.elapsed())
            .unwrap_or_default();
        let destinations = self.registry.destinations();

        EngineStats {
            ingestion: self.metrics.snapshot(),
            flush: self.scheduler.metrics().snapshot(),
            destinations: destinations.len(),
            delivery_workers: destinations.iter().map(|d| d.workers).sum(),
            uptime,
        }
    }
}
