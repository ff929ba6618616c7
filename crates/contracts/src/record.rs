//! Record - the unit of data flowing through the engine

use serde::{Deserialize, Serialize};

use crate::DestinationKey;

/// A payload tagged with the destination it must be persisted to.
///
/// Immutable once created: it is moved through the ingress queue, a delivery
/// channel and the buffer cache, then borrowed by the sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Target destination
    pub destination: DestinationKey,

    /// Opaque payload, persisted as one line by the file sink
    pub payload: String,
}

impl Record {
    pub fn new(destination: impl Into<DestinationKey>, payload: impl Into<String>) -> Self {
        Self {
            destination: destination.into(),
            payload: payload.into(),
        }
    }
}
