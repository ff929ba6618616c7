//! Write-with-retry for a single flush batch

use std::time::Instant;

use contracts::{RecordSink, RetryPolicy};
use ingestion::FlushBatch;
use tracing::{debug, error, instrument, warn};

use crate::metrics::FlushMetrics;

/// How a batch left the writer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Persisted on attempt `attempts`
    Written { attempts: u32 },
    /// Every attempt failed; the batch was discarded
    Exhausted { attempts: u32 },
}

impl WriteOutcome {
    pub fn is_written(&self) -> bool {
        matches!(self, Self::Written { .. })
    }

    pub fn attempts(&self) -> u32 {
        match self {
            Self::Written { attempts } | Self::Exhausted { attempts } => *attempts,
        }
    }
}

/// Write `batch` to `sink`, retrying up to `policy.max_attempts` in total
///
/// Sleeps `policy.retry_delay()` between attempts, never after the last one.
/// A batch that exhausts its attempts is reported as lost and dropped.
#[instrument(
    name = "flush_write",
    skip_all,
    fields(sink = %sink.name(), destination = %batch.destination, records = batch.len())
)]
pub async fn write_with_retry<S: RecordSink>(
    sink: &S,
    batch: &FlushBatch,
    policy: &RetryPolicy,
    metrics: &FlushMetrics,
) -> WriteOutcome {
    let max_attempts = policy.max_attempts.max(1);
    let started = Instant::now();
    let mut attempt = 1;

    loop {
        match sink.write(&batch.destination, &batch.records).await {
            Ok(()) => {
                let latency_ms = started.elapsed().as_secs_f64() * 1000.0;
                metrics.record_written(batch.len());
                observability::record_batch_written(&batch.destination, batch.len(), latency_ms);
                debug!(attempt, latency_ms, "batch written");
                return WriteOutcome::Written { attempts: attempt };
            }
            Err(e) => {
                metrics.inc_write_failures();
                observability::record_write_attempt_failed(&batch.destination);

                if attempt >= max_attempts {
                    metrics.record_lost(batch.len());
                    observability::record_batch_lost(&batch.destination, batch.len());
                    error!(
                        attempts = attempt,
                        error = %e,
                        "write retries exhausted, batch lost"
                    );
                    return WriteOutcome::Exhausted { attempts: attempt };
                }

                warn!(
                    attempt,
                    max_attempts,
                    error = %e,
                    "write failed, retrying"
                );
                tokio::time::sleep(policy.retry_delay()).await;
                attempt += 1;
            }
        }
    }
}
