//! LogSink - logs batch summaries via tracing

use contracts::{ContractError, DestinationKey, Record, RecordSink};
use tracing::{info, instrument};

/// Sink that logs batch summaries instead of persisting them
pub struct LogSink {
    name: String,
}

impl LogSink {
    /// Create a new LogSink with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    fn log_batch_summary(&self, destination: &DestinationKey, records: &[Record]) {
        let bytes: usize = records.iter().map(|r| r.payload.len()).sum();

        info!(
            sink = %self.name,
            destination = %destination,
            records = records.len(),
            bytes,
            first = records.first().map(|r| r.payload.as_str()),
            "Batch received"
        );
    }
}

impl RecordSink for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_sink_write",
        skip(self, records),
        fields(sink = %self.name, destination = %destination)
    )]
    async fn write(
        &self,
        destination: &DestinationKey,
        records: &[Record],
    ) -> Result<(), ContractError> {
        self.log_batch_summary(destination, records);
        Ok(())
    }
}
