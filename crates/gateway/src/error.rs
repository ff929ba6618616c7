//! Gateway error types
//!
//! Maps request validation failures onto HTTP responses.

use auth::AuthError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use ingestion::IngestionError;
use serde::Serialize;
use thiserror::Error;

/// Request errors
#[derive(Debug, Error)]
pub enum GatewayError {
    /// A required query parameter is missing or empty
    #[error("missing parameters: {0}")]
    MissingParams(&'static str),

    /// Payload cannot be stored as a single line
    #[error("invalid data: {0}")]
    InvalidPayload(&'static str),

    /// Destination key cannot name a file
    #[error("invalid destination: {0}")]
    InvalidDestination(String),

    /// Token not in the valid set
    #[error("invalid token")]
    InvalidToken,

    /// Token is valid but was never bound
    #[error("token is not bound to a destination")]
    TokenNotBound,

    /// Token already bound
    #[error("token already bound to '{0}'")]
    AlreadyBound(String),

    /// Request names a destination other than the token's
    #[error("fileID does not match the destination bound to this token")]
    DestinationMismatch,

    /// Destination has no delivery channel
    #[error("destination '{0}' is not registered")]
    UnknownDestination(String),

    /// Engine is draining or stopped
    #[error("service unavailable: {0}")]
    Unavailable(String),
}

impl GatewayError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingParams(_) => StatusCode::BAD_REQUEST,
            Self::InvalidPayload(_) => StatusCode::BAD_REQUEST,
            Self::InvalidDestination(_) => StatusCode::BAD_REQUEST,
            Self::InvalidToken => StatusCode::UNAUTHORIZED,
            Self::TokenNotBound => StatusCode::UNAUTHORIZED,
            Self::AlreadyBound(_) => StatusCode::CONFLICT,
            Self::DestinationMismatch => StatusCode::BAD_REQUEST,
            Self::UnknownDestination(_) => StatusCode::BAD_REQUEST,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Get the error code for this error
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingParams(_) => "MISSING_PARAMETERS",
            Self::InvalidPayload(_) => "INVALID_DATA",
            Self::InvalidDestination(_) => "INVALID_DESTINATION",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::TokenNotBound => "TOKEN_NOT_BOUND",
            Self::AlreadyBound(_) => "ALREADY_BOUND",
            Self::DestinationMismatch => "DESTINATION_MISMATCH",
            Self::UnknownDestination(_) => "UNKNOWN_DESTINATION",
            Self::Unavailable(_) => "UNAVAILABLE",
        }
    }
}

impl From<AuthError> for GatewayError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::EmptyToken => Self::MissingParams("token is required"),
            AuthError::AlreadyBound { destination } => Self::AlreadyBound(destination),
        }
    }
}

impl From<IngestionError> for GatewayError {
    fn from(err: IngestionError) -> Self {
        Self::Unavailable(err.to_string())
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code (machine-readable)
    pub error: &'static str,
    /// Error message (human-readable)
    pub message: String,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: self.code(),
            message: self.to_string(),
        };

        tracing::warn!(
            error_code = body.error,
            error_message = %body.message,
            status = %status,
            "request rejected"
        );

        (status, Json(body)).into_response()
    }
}

/// Result type for handlers
pub type Result<T> = std::result::Result<T, GatewayError>;
