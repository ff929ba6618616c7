//! Ingestion 错误类型

use thiserror::Error;

/// Ingestion 错误
#[derive(Debug, Error)]
pub enum IngestionError {
    /// Ingress 队列已关闭 (引擎正在排空或已停止)
    #[error("ingress queue closed, record for '{destination}' rejected")]
    Closed {
        /// 目的地
        destination: String,
    },

    /// Ingress 队列已满 (仅 try_submit 返回)
    #[error("ingress queue full, record for '{destination}' rejected")]
    QueueFull {
        /// 目的地
        destination: String,
    },

    /// 注册表已关闭，无法再注册目的地
    #[error("destination registry closed, cannot register '{destination}'")]
    RegistryClosed {
        /// 目的地
        destination: String,
    },
}

/// Ingestion Result 类型别名
pub type Result<T> = std::result::Result<T, IngestionError>;
