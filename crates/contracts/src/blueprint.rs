//! ServiceBlueprint - Config Loader 输出
//!
//! 描述完整的服务配置：监听地址、引擎参数、重试策略、存储位置、凭证与目的地。

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::{DestinationKey, EngineConfig, RetryPolicy};

/// 配置版本
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// 完整的服务配置蓝图
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceBlueprint {
    /// 配置版本
    #[serde(default)]
    pub version: ConfigVersion,

    /// HTTP 接入配置
    #[serde(default)]
    pub server: ServerConfig,

    /// 缓冲引擎参数
    #[serde(default)]
    pub engine: EngineConfig,

    /// 写入重试策略
    #[serde(default)]
    pub retry: RetryPolicy,

    /// 持久化存储
    #[serde(default)]
    pub storage: StorageConfig,

    /// 凭证配置
    #[serde(default)]
    pub auth: AuthConfig,

    /// 启动时注册的目的地
    #[serde(default)]
    pub destinations: Vec<DestinationConfig>,

    /// 启动时预绑定的凭证
    #[serde(default)]
    pub bindings: Vec<BindingConfig>,
}

/// HTTP 接入配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// 监听地址
    pub listen_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".to_string(),
        }
    }
}

/// 存储类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageKind {
    /// 追加写入 `<files_dir>/<destination>.txt`
    #[default]
    File,
    /// 仅输出日志 (调试用)
    Log,
}

/// 持久化存储配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub kind: StorageKind,

    /// 文件目录
    pub files_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            kind: StorageKind::File,
            files_dir: PathBuf::from("files"),
        }
    }
}

/// 凭证配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// 允许绑定的 token 列表
    pub valid_tokens: Vec<String>,
}

/// 目的地配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DestinationConfig {
    pub key: DestinationKey,
}

/// 凭证绑定配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BindingConfig {
    pub token: String,
    pub destination: DestinationKey,
}

impl ServiceBlueprint {
    /// 所有配置的目的地
    pub fn destination_keys(&self) -> Vec<DestinationKey> {
        self.destinations.iter().map(|d| d.key.clone()).collect()
    }
}
