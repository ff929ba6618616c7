//! Flush scheduler - periodic drain of the buffer cache into the sink

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use contracts::{DestinationKey, RecordSink, RetryPolicy};
use ingestion::BufferCache;
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, instrument};

use crate::metrics::FlushMetrics;
use crate::writer::write_with_retry;

/// Drains the buffer cache on a fixed interval and writes each destination's
/// snapshot on its own tracked task
///
/// Write tasks for different destinations run concurrently. Write tasks for
/// the same destination run one after another, in flush order.
pub struct FlushScheduler<S> {
    cache: Arc<BufferCache>,
    sink: Arc<S>,
    policy: RetryPolicy,
    interval: Duration,
    tasks: TaskTracker,
    /// Completion signal of the latest write task per destination
    write_chain: Mutex<HashMap<DestinationKey, oneshot::Receiver<()>>>,
    metrics: Arc<FlushMetrics>,
}

impl<S> FlushScheduler<S>
where
    S: RecordSink + Send + Sync + 'static,
{
    pub fn new(
        cache: Arc<BufferCache>,
        sink: Arc<S>,
        policy: RetryPolicy,
        interval: Duration,
    ) -> Self {
        Self {
            cache,
            sink,
            policy,
            interval,
            tasks: TaskTracker::new(),
            write_chain: Mutex::new(HashMap::new()),
            metrics: Arc::new(FlushMetrics::new()),
        }
    }

    pub fn metrics(&self) -> &Arc<FlushMetrics> {
        &self.metrics
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Write tasks not yet finished
    pub fn in_flight(&self) -> usize {
        self.tasks.len()
    }

    /// Run one flush cycle
    ///
    /// Snapshots every non-empty buffer and spawns one write task per
    /// destination. A task starts writing only after the previous task for
    /// its destination has finished. Returns the number of batches handed
    /// off; does not wait for the writes.
    pub fn flush_once(&self) -> usize {
        self.metrics.inc_flush_cycles();
        let batches = self.cache.drain_all();
        if batches.is_empty() {
            return 0;
        }

        let count = batches.len();
        let records: usize = batches.iter().map(|b| b.len()).sum();
        observability::record_flush_cycle(count, records);
        debug!(batches = count, records, "flush cycle");

        for batch in batches {
            let (done, done_rx) = oneshot::channel::<()>();
            let previous = self
                .write_chain
                .lock()
                .insert(batch.destination.clone(), done_rx);

            let sink = Arc::clone(&self.sink);
            let metrics = Arc::clone(&self.metrics);
            let policy = self.policy;
            self.tasks.spawn(async move {
                // Dropped when this task ends, releasing the next one
                let _done = done;
                if let Some(previous) = previous {
                    let _ = previous.await;
                }
                write_with_retry(sink.as_ref(), &batch, &policy, &metrics).await;
            });
        }
        count
    }

    /// Start the interval timer; it stops when `cancel` fires
    ///
    /// The first tick fires one full interval after the call.
    pub fn spawn_timer(self: &Arc<Self>, cancel: CancellationToken) -> JoinHandle<()> {
        let scheduler = Arc::clone(self);
        tokio::spawn(async move {
            scheduler.run_timer(cancel).await;
        })
    }

    #[instrument(
        name = "flush_timer",
        skip_all,
        fields(interval_ms = self.interval.as_millis() as u64)
    )]
    async fn run_timer(&self, cancel: CancellationToken) {
        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!("flush timer started");

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    self.flush_once();
                }
            }
        }
        info!("flush timer stopped");
    }

    /// Wait for every spawned write task, including ones spawned while waiting
    pub async fn wait_writes(&self) {
        self.tasks.close();
        self.tasks.wait().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{ContractError, DestinationKey, Record};
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex as StdMutex;

    /// Records every successful write per destination
    #[derive(Default)]
    struct RecordingSink {
        delay: Duration,
        /// Only the first write to this destination sleeps
        slow_first: Option<(&'static str, Duration)>,
        seen: StdMutex<HashSet<String>>,
        active: AtomicUsize,
        max_active: AtomicUsize,
        writes: StdMutex<HashMap<String, Vec<String>>>,
    }

    impl RecordingSink {
        fn slow(delay: Duration) -> Self {
            Self {
                delay,
                ..Default::default()
            }
        }

        fn slow_first(destination: &'static str, delay: Duration) -> Self {
            Self {
                slow_first: Some((destination, delay)),
                ..Default::default()
            }
        }

        fn max_active(&self) -> usize {
            self.max_active.load(Ordering::SeqCst)
        }

        fn written(&self, destination: &str) -> Vec<String> {
            self.writes
                .lock()
                .unwrap()
                .get(destination)
                .cloned()
                .unwrap_or_default()
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
            let first = self.seen.lock().unwrap().insert(destination.to_string());
            let delay = match self.slow_first {
                Some((key, delay)) if first && destination.as_str() == key => delay,
                _ => self.delay,
            };

            let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_active.fetch_max(active, Ordering::SeqCst);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            self.active.fetch_sub(1, Ordering::SeqCst);

            self.writes
                .lock()
                .unwrap()
                .entry(destination.to_string())
                .or_default()
                .extend(records.iter().map(|r| r.payload.clone()));
            Ok(())
        }
    }

    type Fixture = (
        Arc<BufferCache>,
        Arc<RecordingSink>,
        Arc<FlushScheduler<RecordingSink>>,
    );

    fn scheduler(sink: RecordingSink, interval: Duration) -> Fixture {
        let cache = Arc::new(BufferCache::new());
        let sink = Arc::new(sink);
        let scheduler = Arc::new(FlushScheduler::new(
            Arc::clone(&cache),
            Arc::clone(&sink),
            RetryPolicy::new(3, Duration::from_millis(10)),
            interval,
        ));
        (cache, sink, scheduler)
    }

    #[tokio::test]
    async fn test_flush_empty_cache_spawns_nothing() {
        let (_cache, _sink, scheduler) =
            scheduler(RecordingSink::default(), Duration::from_secs(1));

        assert_eq!(scheduler.flush_once(), 0);
        assert_eq!(scheduler.in_flight(), 0);
        assert_eq!(scheduler.metrics().snapshot().flush_cycles, 1);
    }

    #[tokio::test]
    async fn test_flush_writes_each_destination() {
        let (cache, sink, scheduler) =
            scheduler(RecordingSink::default(), Duration::from_secs(1));
        cache.append(Record::new("a", "1"));
        cache.append(Record::new("b", "2"));
        cache.append(Record::new("a", "3"));

        assert_eq!(scheduler.flush_once(), 2);
        scheduler.wait_writes().await;

        assert_eq!(sink.written("a"), vec!["1", "3"]);
        assert_eq!(sink.written("b"), vec!["2"]);
        assert_eq!(scheduler.metrics().records_written(), 3);
    }

    #[tokio::test]
    async fn test_records_during_inflight_write_are_not_lost() {
        let (cache, sink, scheduler) = scheduler(
            RecordingSink::slow(Duration::from_millis(100)),
            Duration::from_secs(1),
        );

        for i in 0..10 {
            cache.append(Record::new("file1", format!("first{i}")));
        }
        scheduler.flush_once();

        // First write is still sleeping inside the sink.
        tokio::time::sleep(Duration::from_millis(20)).await;
        for i in 0..10 {
            cache.append(Record::new("file1", format!("second{i}")));
        }
        assert_eq!(cache.pending("file1"), 10);

        scheduler.flush_once();
        scheduler.wait_writes().await;

        let mut written = sink.written("file1");
        written.sort();
        written.dedup();
        assert_eq!(written.len(), 20);
        assert_eq!(cache.total_pending(), 0);
    }

    #[tokio::test]
    async fn test_timer_flushes_until_cancelled() {
        let (cache, sink, scheduler) =
            scheduler(RecordingSink::default(), Duration::from_millis(20));
        let cancel = CancellationToken::new();
        let timer = scheduler.spawn_timer(cancel.clone());

        cache.append(Record::new("file1", "tick"));
        tokio::time::sleep(Duration::from_millis(100)).await;

        cancel.cancel();
        timer.await.unwrap();
        scheduler.wait_writes().await;

        assert_eq!(sink.written("file1"), vec!["tick"]);
        assert!(scheduler.metrics().snapshot().flush_cycles >= 1);
    }

    #[tokio::test]
    async fn test_slow_write_holds_back_later_batches_of_same_destination() {
        let (cache, sink, scheduler) = scheduler(
            RecordingSink::slow_first("file1", Duration::from_millis(300)),
            Duration::from_secs(1),
        );

        for i in 0..5 {
            cache.append(Record::new("file1", format!("data{i}")));
        }
        scheduler.flush_once();
        tokio::time::sleep(Duration::from_millis(50)).await;

        for i in 5..10 {
            cache.append(Record::new("file1", format!("data{i}")));
        }
        scheduler.flush_once();
        scheduler.wait_writes().await;

        let expected: Vec<_> = (0..10).map(|i| format!("data{i}")).collect();
        assert_eq!(sink.written("file1"), expected);
        assert_eq!(sink.max_active(), 1);
    }

    #[tokio::test]
    async fn test_slow_destination_does_not_block_others() {
        let (cache, sink, scheduler) = scheduler(
            RecordingSink::slow_first("slow", Duration::from_millis(300)),
            Duration::from_secs(1),
        );
        cache.append(Record::new("slow", "s"));
        cache.append(Record::new("fast", "f"));

        assert_eq!(scheduler.flush_once(), 2);
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(sink.written("fast"), vec!["f"]);
        assert!(sink.written("slow").is_empty());

        scheduler.wait_writes().await;
        assert_eq!(sink.written("slow"), vec!["s"]);
    }
}
