//! RecordSink trait - flush output interface
//!
//! Defines the abstract durable append target.

use crate::{ContractError, DestinationKey, Record};

/// Durable append target
///
/// All sink implementations must implement this trait. A sink is shared by
/// every concurrent write task, so `write` takes `&self` and must be safe to
/// call concurrently for different destinations.
#[trait_variant::make(RecordSink: Send)]
pub trait LocalRecordSink {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Persist `records` for `destination` as one unit, in order
    ///
    /// # Errors
    /// Any condition that prevents durable persistence of the whole batch.
    /// The caller retries the full batch, so partial writes may duplicate.
    async fn write(
        &self,
        destination: &DestinationKey,
        records: &[Record],
    ) -> Result<(), ContractError>;
}
