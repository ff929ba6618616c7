//! # Gateway
//!
//! HTTP 接入模块 (axum)。
//!
//! 负责：
//! - `/add-user`：绑定 token 并注册目的地
//! - `/add-message`：校验 token / 目的地后提交记录到 ingress 队列
//! - `/destinations`、`/health`：运行状态查询
//! - 校验失败统一映射为 JSON 错误响应

mod error;
mod routes;
mod server;
mod state;

pub use error::{ErrorResponse, GatewayError, Result};
pub use routes::{router, AddMessageParams, AddUserParams, DestinationView};
pub use server::{bind, serve};
pub use state::AppState;
