//! Shared handler state

use std::sync::Arc;

use auth::CredentialStore;
use ingestion::{DestinationRegistry, IngressHandle};

/// State cloned into every request handler
#[derive(Clone)]
pub struct AppState {
    pub credentials: Arc<CredentialStore>,
    pub registry: Arc<DestinationRegistry>,
    pub ingress: IngressHandle,
}

impl AppState {
    pub fn new(
        credentials: Arc<CredentialStore>,
        registry: Arc<DestinationRegistry>,
        ingress: IngressHandle,
    ) -> Self {
        Self {
            credentials,
            registry,
            ingress,
        }
    }
}
