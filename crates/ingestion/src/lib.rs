//! # Ingestion
//!
//! 记录接入与缓冲模块。
//!
//! 负责：
//! - 有界 ingress 队列 + 分发 worker 池 (`IngressDispatcher`)
//! - 目的地注册表，每个目的地一个有界 delivery channel (`DestinationRegistry`)
//! - delivery worker 将记录写入共享缓冲 (`BufferCache`)
//! - 背压时按目的地扩容 delivery worker (有上限)
//!
//! ## 使用示例
//!
//! ```ignore
//! use ingestion::{BufferCache, DeliverySettings, DestinationRegistry, IngressDispatcher, IngestionMetrics};
//!
//! let cache = Arc::new(BufferCache::new());
//! let metrics = Arc::new(IngestionMetrics::new());
//! let registry = Arc::new(DestinationRegistry::new(settings, cache.clone(), metrics.clone()));
//! registry.register("file1".into())?;
//!
//! let dispatcher = IngressDispatcher::new(1000, registry.clone(), metrics);
//! dispatcher.spawn_workers(4);
//! dispatcher.handle().submit(Record::new("file1", "hello")).await?;
//!
//! let batches = cache.drain_all();
//! ```

mod buffer;
mod dispatcher;
mod error;
mod metrics;
mod registry;

// Re-exports
pub use buffer::{BufferCache, FlushBatch};
pub use contracts::Record;
pub use dispatcher::{IngressDispatcher, IngressHandle};
pub use error::{IngestionError, Result};
pub use metrics::{IngestionMetrics, MetricsSnapshot};
pub use registry::{DeliverySettings, DestinationRegistry, DestinationStatus, RouteOutcome};
