//! # Flusher
//!
//! 缓冲落盘模块。
//!
//! 负责：
//! - 定时 drain `BufferCache`，每个目的地一个独立写入任务
//! - 写入失败按 `RetryPolicy` 重试，耗尽后记录数据丢失
//! - 提供 FileSink / LogSink 等 `RecordSink` 实现
//! - 关停时等待所有在途写入完成

pub mod error;
pub mod metrics;
pub mod scheduler;
pub mod sinks;
pub mod writer;

pub use contracts::{RecordSink, RetryPolicy};
pub use error::FlushError;
pub use metrics::{FlushMetrics, FlushSnapshot};
pub use scheduler::FlushScheduler;
pub use sinks::{FileSink, LogSink, StorageSink};
pub use writer::{write_with_retry, WriteOutcome};
