//! FileSink - appends records to `<files_dir>/<destination>.txt`

use std::path::{Path, PathBuf};

use contracts::{ContractError, DestinationKey, Record, RecordSink};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, instrument};

use crate::error::FlushError;

/// Sink that appends one line per record to a per-destination text file
pub struct FileSink {
    name: String,
    files_dir: PathBuf,
}

impl FileSink {
    /// Create a new FileSink rooted at `files_dir`
    pub fn new(name: impl Into<String>, files_dir: impl Into<PathBuf>) -> Result<Self, FlushError> {
        let name = name.into();
        let files_dir = files_dir.into();
        // Create base directory if it doesn't exist
        std::fs::create_dir_all(&files_dir).map_err(|e| {
            FlushError::sink_creation(&name, format!("{}: {e}", files_dir.display()))
        })?;

        Ok(Self { name, files_dir })
    }

    pub fn files_dir(&self) -> &Path {
        &self.files_dir
    }

    /// File a destination's records are appended to
    pub fn path_for(&self, destination: &DestinationKey) -> PathBuf {
        self.files_dir.join(format!("{destination}.txt"))
    }

    async fn append_lines(&self, path: &Path, records: &[Record]) -> std::io::Result<()> {
        let mut buf = String::with_capacity(records.iter().map(|r| r.payload.len() + 1).sum());
        for record in records {
            buf.push_str(&record.payload);
            buf.push('\n');
        }

        fs::create_dir_all(&self.files_dir).await?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await?;
        file.write_all(buf.as_bytes()).await?;
        file.flush().await
    }
}

impl RecordSink for FileSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "file_sink_write",
        skip(self, records),
        fields(sink = %self.name, destination = %destination, records = records.len())
    )]
    async fn write(
        &self,
        destination: &DestinationKey,
        records: &[Record],
    ) -> Result<(), ContractError> {
        destination.validate()?;
        let path = self.path_for(destination);

        self.append_lines(&path, records).await.map_err(|e| {
            error!(sink = %self.name, path = %path.display(), error = %e, "Append failed");
            ContractError::sink_write(&self.name, format!("{}: {e}", path.display()))
        })?;

        debug!(path = %path.display(), "batch appended");
        Ok(())
    }
}
