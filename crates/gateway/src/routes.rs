//! HTTP routes
//!
//! Query-parameter API: parameters are read from the URL for both GET and
//! POST.

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use contracts::{DestinationKey, Record};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{GatewayError, Result};
use crate::state::AppState;

/// Build the gateway router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/add-user", get(add_user).post(add_user))
        .route("/add-message", get(add_message).post(add_message))
        .route("/destinations", get(list_destinations))
        .route("/health", get(health))
        .with_state(state)
}

/// `/add-user` query parameters
#[derive(Debug, Deserialize)]
pub struct AddUserParams {
    pub token: Option<String>,
    #[serde(rename = "fileID")]
    pub file_id: Option<String>,
}

/// `/add-message` query parameters
#[derive(Debug, Deserialize)]
pub struct AddMessageParams {
    pub token: Option<String>,
    #[serde(rename = "fileID")]
    pub file_id: Option<String>,
    pub data: Option<String>,
}

/// Empty values count as missing
fn required(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Sign up a token, bind it to a destination and register the destination
pub async fn add_user(
    State(state): State<AppState>,
    Query(params): Query<AddUserParams>,
) -> Result<&'static str> {
    let (Some(token), Some(file_id)) = (required(params.token), required(params.file_id)) else {
        return Err(GatewayError::MissingParams("token and fileID are required"));
    };

    let destination = DestinationKey::from(file_id);
    destination
        .validate()
        .map_err(|e| GatewayError::InvalidDestination(e.to_string()))?;

    // Nothing is bound once the engine stops taking new destinations
    if state.registry.is_closed() {
        return Err(GatewayError::Unavailable(
            "engine is shutting down".to_string(),
        ));
    }
    state.credentials.bind(&token, destination.clone())?;
    let created = state.registry.register(destination.clone())?;

    info!(%destination, created, "user added");
    Ok("user added")
}

/// Validate a message and submit it to the ingress queue
///
/// Waits while the ingress queue is full.
pub async fn add_message(
    State(state): State<AppState>,
    Query(params): Query<AddMessageParams>,
) -> Result<&'static str> {
    let (Some(token), Some(file_id), Some(data)) = (
        required(params.token),
        required(params.file_id),
        required(params.data),
    ) else {
        return Err(GatewayError::MissingParams(
            "token, fileID and data are required",
        ));
    };

    if data.contains(['\n', '\r']) {
        return Err(GatewayError::InvalidPayload("data must be a single line"));
    }
    if !state.credentials.is_valid(&token) {
        return Err(GatewayError::InvalidToken);
    }
    let bound = state
        .credentials
        .destination_of(&token)
        .ok_or(GatewayError::TokenNotBound)?;
    if bound != file_id.as_str() {
        return Err(GatewayError::DestinationMismatch);
    }
    if !state.registry.contains(&file_id) {
        return Err(GatewayError::UnknownDestination(file_id));
    }

    state.ingress.submit(Record::new(bound, data)).await?;
    debug!(destination = %file_id, "message accepted");
    Ok("message accepted")
}

/// One registered destination
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DestinationView {
    pub destination: String,
    pub workers: usize,
    pub queued: usize,
}

/// GET /destinations
pub async fn list_destinations(State(state): State<AppState>) -> Json<Vec<DestinationView>> {
    let views = state
        .registry
        .destinations()
        .into_iter()
        .map(|status| DestinationView {
            destination: status.destination.to_string(),
            workers: status.workers,
            queued: status.queued,
        })
        .collect();
    Json(views)
}

/// Health check endpoint
pub async fn health() -> impl IntoResponse {
    "OK"
}
