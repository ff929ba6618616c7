//! Engine end-to-end: producers -> dispatcher -> delivery -> cache -> sink

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use contracts::{DestinationKey, EngineConfig, Record, RetryPolicy};
use engine::{Engine, EngineState};
use flusher::FileSink;
use tokio_util::sync::CancellationToken;

use crate::support::{expected_payloads, ordered_config, read_lines, RecordingSink};

fn fast_retry() -> RetryPolicy {
    RetryPolicy::new(3, Duration::from_millis(10))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_hundred_messages_land_in_file_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let sink = Arc::new(FileSink::new("file", dir.path()).unwrap());
    let engine = Engine::new(EngineConfig::default(), fast_retry(), Arc::clone(&sink));
    engine.start([DestinationKey::from("file1")]).unwrap();

    let handle = engine.handle();
    for i in 0..100 {
        handle
            .submit(Record::new("file1", format!("data{i}")))
            .await
            .unwrap();
    }

    let stats = engine.shutdown().await.unwrap();

    let path = sink.path_for(&DestinationKey::from("file1"));
    assert_eq!(read_lines(&path), expected_payloads("data", 100));
    assert_eq!(stats.flush.records_written, 100);
    assert_eq!(stats.flush.records_lost, 0);
}

#[tokio::test]
async fn test_unregistered_destination_is_a_no_op() {
    let dir = tempfile::tempdir().unwrap();
    let sink = Arc::new(FileSink::new("file", dir.path()).unwrap());
    let engine = Engine::new(ordered_config(60_000), fast_retry(), Arc::clone(&sink));
    engine.start([DestinationKey::from("file1")]).unwrap();

    engine
        .handle()
        .submit(Record::new("ghost", "lost"))
        .await
        .unwrap();

    let stats = engine.shutdown().await.unwrap();

    assert!(!sink.path_for(&DestinationKey::from("ghost")).exists());
    assert!(!sink.path_for(&DestinationKey::from("file1")).exists());
    assert_eq!(stats.ingestion.routing_failures, 1);
    assert_eq!(stats.flush.records_written, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_producers_deliver_exactly_once() {
    const PRODUCERS: usize = 4;
    const PER_PRODUCER: usize = 2500;

    let sink = Arc::new(RecordingSink::new());
    let config = EngineConfig {
        flush_interval_ms: 20,
        ..Default::default()
    };
    let engine = Engine::new(config, fast_retry(), Arc::clone(&sink));
    engine.start([DestinationKey::from("shared")]).unwrap();

    let producers: Vec<_> = (0..PRODUCERS)
        .map(|p| {
            let handle = engine.handle();
            tokio::spawn(async move {
                for i in 0..PER_PRODUCER {
                    handle
                        .submit(Record::new("shared", format!("p{p}-{i}")))
                        .await
                        .unwrap();
                }
            })
        })
        .collect();
    for producer in producers {
        producer.await.unwrap();
    }

    let stats = engine.shutdown().await.unwrap();

    let mut seen: HashMap<String, usize> = HashMap::new();
    for payload in sink.payloads("shared") {
        *seen.entry(payload).or_default() += 1;
    }
    assert_eq!(seen.len(), PRODUCERS * PER_PRODUCER);
    assert!(seen.values().all(|&n| n == 1));
    assert_eq!(stats.flush.records_written, (PRODUCERS * PER_PRODUCER) as u64);
    assert_eq!(engine.cache().total_pending(), 0);
}

#[tokio::test]
async fn test_per_producer_order_with_single_workers() {
    let sink = Arc::new(RecordingSink::new());
    let engine = Engine::new(ordered_config(5), fast_retry(), Arc::clone(&sink));
    engine
        .start([DestinationKey::from("a"), DestinationKey::from("b")])
        .unwrap();

    let handle = engine.handle();
    for i in 0..50 {
        handle.submit(Record::new("a", format!("a{i}"))).await.unwrap();
        handle.submit(Record::new("b", format!("b{i}"))).await.unwrap();
    }
    engine.shutdown().await.unwrap();

    assert_eq!(sink.payloads("a"), expected_payloads("a", 50));
    assert_eq!(sink.payloads("b"), expected_payloads("b", 50));
}

#[tokio::test]
async fn test_shutdown_drains_before_first_tick() {
    let sink = Arc::new(RecordingSink::new());
    let engine = Engine::new(ordered_config(60_000), fast_retry(), Arc::clone(&sink));
    engine.start([DestinationKey::from("file1")]).unwrap();

    let handle = engine.handle();
    for i in 0..10 {
        handle
            .submit(Record::new("file1", format!("m{i}")))
            .await
            .unwrap();
    }

    let stats = engine.shutdown().await.unwrap();

    assert_eq!(sink.payloads("file1"), expected_payloads("m", 10));
    assert_eq!(stats.flush.flush_cycles, 1);
    assert!(handle.submit(Record::new("file1", "late")).await.is_err());
    assert_eq!(engine.state(), EngineState::Stopped);
}

#[tokio::test]
async fn test_transient_failures_are_retried() {
    let sink = Arc::new(RecordingSink::failing(2));
    let engine = Engine::new(ordered_config(60_000), fast_retry(), Arc::clone(&sink));
    engine.start([DestinationKey::from("file1")]).unwrap();

    engine
        .handle()
        .submit(Record::new("file1", "survivor"))
        .await
        .unwrap();
    let stats = engine.shutdown().await.unwrap();

    assert_eq!(sink.calls(), 3);
    assert_eq!(sink.payloads("file1"), vec!["survivor"]);
    assert_eq!(stats.flush.write_failures, 2);
    assert_eq!(stats.flush.records_lost, 0);
}

#[tokio::test]
async fn test_persistent_failure_drops_batch_after_max_attempts() {
    let sink = Arc::new(RecordingSink::failing(u32::MAX));
    let engine = Engine::new(ordered_config(60_000), fast_retry(), Arc::clone(&sink));
    engine.start([DestinationKey::from("file1")]).unwrap();

    let handle = engine.handle();
    for i in 0..5 {
        handle
            .submit(Record::new("file1", format!("doomed{i}")))
            .await
            .unwrap();
    }
    let stats = engine.shutdown().await.unwrap();

    assert_eq!(sink.calls(), 3);
    assert_eq!(sink.total(), 0);
    assert_eq!(stats.flush.batches_lost, 1);
    assert_eq!(stats.flush.records_lost, 5);
    assert_eq!(engine.cache().total_pending(), 0);
}

#[tokio::test]
async fn test_delivery_workers_grow_to_ceiling() {
    let sink = Arc::new(RecordingSink::new());
    let config = EngineConfig {
        dispatcher_workers: 1,
        initial_delivery_workers: 1,
        max_delivery_workers: 4,
        ingress_capacity: 2000,
        delivery_capacity: 1,
        flush_interval_ms: 60_000,
    };
    let engine = Engine::new(config, fast_retry(), Arc::clone(&sink));
    engine.start([DestinationKey::from("hot")]).unwrap();

    let handle = engine.handle();
    for i in 0..1000 {
        handle
            .submit(Record::new("hot", format!("h{i}")))
            .await
            .unwrap();
    }
    let stats = engine.shutdown().await.unwrap();

    assert_eq!(stats.delivery_workers, 4);
    assert_eq!(stats.ingestion.workers_spawned, 4);
    assert!(stats.ingestion.backpressure_events >= 3);
    assert_eq!(sink.total(), 1000);
}

#[tokio::test]
async fn test_records_arriving_during_slow_flush_are_kept() {
    let sink = Arc::new(RecordingSink::slow(Duration::from_millis(200)));
    let engine = Engine::new(ordered_config(50), fast_retry(), Arc::clone(&sink));
    engine.start([DestinationKey::from("file1")]).unwrap();

    let handle = engine.handle();
    for i in 0..10 {
        handle
            .submit(Record::new("file1", format!("early{i}")))
            .await
            .unwrap();
    }
    // First tick has drained the cache and its write is still in flight.
    tokio::time::sleep(Duration::from_millis(120)).await;
    assert_eq!(engine.cache().pending("file1"), 0);

    for i in 0..10 {
        handle
            .submit(Record::new("file1", format!("late{i}")))
            .await
            .unwrap();
    }
    let stats = engine.shutdown().await.unwrap();

    let mut payloads = sink.payloads("file1");
    payloads.sort();
    let mut expected = expected_payloads("early", 10);
    expected.extend(expected_payloads("late", 10));
    expected.sort();
    assert_eq!(payloads, expected);
    assert_eq!(stats.flush.records_written, 20);
}

#[tokio::test]
async fn test_run_drains_on_cancel() {
    let dir = tempfile::tempdir().unwrap();
    let sink = Arc::new(FileSink::new("file", dir.path()).unwrap());
    let engine = Arc::new(Engine::new(
        ordered_config(60_000),
        fast_retry(),
        Arc::clone(&sink),
    ));
    let cancel = CancellationToken::new();

    let runner = {
        let engine = Arc::clone(&engine);
        let cancel = cancel.clone();
        tokio::spawn(async move { engine.run([DestinationKey::from("file1")], cancel).await })
    };
    while engine.state() != EngineState::Running {
        tokio::task::yield_now().await;
    }

    let handle = engine.handle();
    for i in 0..20 {
        handle
            .submit(Record::new("file1", format!("data{i}")))
            .await
            .unwrap();
    }
    cancel.cancel();

    let stats = runner.await.unwrap().unwrap();
    assert_eq!(stats.flush.records_written, 20);
    assert_eq!(
        read_lines(&sink.path_for(&DestinationKey::from("file1"))),
        expected_payloads("data", 20)
    );
}

#[tokio::test]
async fn test_slow_flush_does_not_reorder_destination_file() {
    let sink = Arc::new(RecordingSink::slow_first(Duration::from_millis(300)));
    let engine = Engine::new(ordered_config(50), fast_retry(), Arc::clone(&sink));
    engine.start([DestinationKey::from("file1")]).unwrap();

    let handle = engine.handle();
    for i in 0..5 {
        handle
            .submit(Record::new("file1", format!("data{i}")))
            .await
            .unwrap();
    }
    // First tick is now writing data0..4 and sleeping inside the sink.
    tokio::time::sleep(Duration::from_millis(100)).await;
    for i in 5..10 {
        handle
            .submit(Record::new("file1", format!("data{i}")))
            .await
            .unwrap();
    }
    engine.shutdown().await.unwrap();

    assert_eq!(sink.payloads("file1"), expected_payloads("data", 10));
    assert_eq!(sink.max_active(), 1);
}
