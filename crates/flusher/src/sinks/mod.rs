//! Sink implementations
//!
//! Contains FileSink, LogSink and the config-selected StorageSink.

mod file;
mod log;

use contracts::{ContractError, DestinationKey, Record, RecordSink, StorageConfig, StorageKind};

pub use self::file::FileSink;
pub use self::log::LogSink;

use crate::error::FlushError;

/// Sink chosen by the `[storage]` section
pub enum StorageSink {
    File(FileSink),
    Log(LogSink),
}

impl StorageSink {
    /// Build the sink named by `config.kind`
    pub fn from_config(config: &StorageConfig) -> Result<Self, FlushError> {
        match config.kind {
            StorageKind::File => Ok(Self::File(FileSink::new("file", &config.files_dir)?)),
            StorageKind::Log => Ok(Self::Log(LogSink::new("log"))),
        }
    }
}

impl RecordSink for StorageSink {
    fn name(&self) -> &str {
        match self {
            Self::File(sink) => sink.name(),
            Self::Log(sink) => sink.name(),
        }
    }

    async fn write(
        &self,
        destination: &DestinationKey,
        records: &[Record],
    ) -> Result<(), ContractError> {
        match self {
            Self::File(sink) => sink.write(destination, records).await,
            Self::Log(sink) => sink.write(destination, records).await,
        }
    }
}
