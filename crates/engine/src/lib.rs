//! # Engine
//!
//! 缓冲引擎生命周期模块。
//!
//! 负责：
//! - 组装 ingress dispatcher、目的地注册表、缓冲与 flush 调度
//! - `start` / `run` / `shutdown` 状态机 (Stopped → Running → Draining → Stopped)
//! - 关停时按顺序排空，保证已缓冲记录完成最终写入
//! - 汇总运行统计 (`EngineStats`)

mod engine;
mod error;
mod stats;

pub use engine::{Engine, EngineState};
pub use error::{EngineError, Result};
pub use stats::EngineStats;
