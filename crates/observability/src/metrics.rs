//! 缓冲引擎指标收集模块
//!
//! 对 `metrics` facade 的薄封装，统一指标名称与标签。
//! 未安装 recorder 时所有调用均为空操作。

use contracts::DestinationKey;
use metrics::{counter, gauge, histogram};

/// 记录进入 ingress 队列的记录
pub fn record_submitted() {
    counter!("bufferd_records_submitted_total").increment(1);
}

/// 记录路由失败 (目的地未注册)
pub fn record_routing_failure(destination: &DestinationKey) {
    counter!(
        "bufferd_routing_failures_total",
        "destination" => destination.to_string()
    )
    .increment(1);
}

/// 记录 delivery channel 满载事件
pub fn record_backpressure(destination: &DestinationKey) {
    counter!(
        "bufferd_backpressure_events_total",
        "destination" => destination.to_string()
    )
    .increment(1);
}

/// 记录目的地当前 delivery worker 数量
pub fn record_delivery_workers(destination: &DestinationKey, workers: usize) {
    gauge!(
        "bufferd_delivery_workers",
        "destination" => destination.to_string()
    )
    .set(workers as f64);
}

/// 记录一次 flush 周期
pub fn record_flush_cycle(batches: usize, records: usize) {
    counter!("bufferd_flush_cycles_total").increment(1);
    histogram!("bufferd_flush_cycle_records").record(records as f64);
    gauge!("bufferd_flush_last_batches").set(batches as f64);
}

/// 记录单次写入尝试失败
pub fn record_write_attempt_failed(destination: &DestinationKey) {
    counter!(
        "bufferd_write_attempt_failures_total",
        "destination" => destination.to_string()
    )
    .increment(1);
}

/// 记录批次写入成功
pub fn record_batch_written(destination: &DestinationKey, records: usize, latency_ms: f64) {
    counter!(
        "bufferd_flush_batches_total",
        "destination" => destination.to_string(),
        "status" => "written"
    )
    .increment(1);
    counter!(
        "bufferd_records_written_total",
        "destination" => destination.to_string()
    )
    .increment(records as u64);
    histogram!(
        "bufferd_batch_write_latency_ms",
        "destination" => destination.to_string()
    )
    .record(latency_ms);
}

/// 记录批次在重试耗尽后丢弃
pub fn record_batch_lost(destination: &DestinationKey, records: usize) {
    counter!(
        "bufferd_flush_batches_total",
        "destination" => destination.to_string(),
        "status" => "lost"
    )
    .increment(1);
    counter!(
        "bufferd_records_lost_total",
        "destination" => destination.to_string()
    )
    .increment(records as u64);
}
