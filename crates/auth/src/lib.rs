//! # Auth
//!
//! 凭证校验模块。
//!
//! 负责：
//! - 维护有效 token 集合 (来自 `[auth] valid_tokens`)
//! - token → 目的地绑定，一个 token 最多绑定一个目的地

mod error;
mod store;

pub use error::{AuthError, Result};
pub use store::CredentialStore;
