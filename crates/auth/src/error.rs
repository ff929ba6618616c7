//! Credential errors

use thiserror::Error;

/// Credential store errors
#[derive(Debug, Error)]
pub enum AuthError {
    /// Empty token
    #[error("token cannot be empty")]
    EmptyToken,

    /// Token already bound, possibly to the same destination
    #[error("token already bound to destination '{destination}'")]
    AlreadyBound { destination: String },
}

pub type Result<T> = std::result::Result<T, AuthError>;
