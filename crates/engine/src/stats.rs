//! Engine statistics.

use std::time::Duration;

use flusher::FlushSnapshot;
use ingestion::MetricsSnapshot;

/// Counters collected over an engine run
#[derive(Debug, Clone, Default)]
pub struct EngineStats {
    /// Ingress and delivery counters
    pub ingestion: MetricsSnapshot,

    /// Flush and sink counters
    pub flush: FlushSnapshot,

    /// Registered destinations
    pub destinations: usize,

    /// Delivery workers across all destinations
    pub delivery_workers: usize,

    /// Time since `start`
    pub uptime: Duration,
}

impl EngineStats {
    /// Records written per second of uptime
    pub fn throughput(&self) -> f64 {
        if self.uptime.as_secs_f64() > 0.0 {
            self.flush.records_written as f64 / self.uptime.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Share of submitted records that were lost or dropped, as percentage
    pub fn loss_rate(&self) -> f64 {
        let lost = self.flush.records_lost
            + self.ingestion.routing_failures
            + self.ingestion.dropped_on_close;
        if self.ingestion.submitted > 0 {
            (lost as f64 / self.ingestion.submitted as f64) * 100.0
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                      Engine Statistics                       ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        println!("📊 Overview");
        println!("   ├─ Uptime: {:.2}s", self.uptime.as_secs_f64());
        println!("   ├─ Destinations: {}", self.destinations);
        println!("   ├─ Delivery workers: {}", self.delivery_workers);
        println!("   └─ Throughput: {:.2} records/s", self.throughput());

        println!("\n📥 Ingestion");
        println!("   ├─ Submitted: {}", self.ingestion.submitted);
        println!("   ├─ Routed: {}", self.ingestion.routed);
        println!("   ├─ Buffered: {}", self.ingestion.buffered);
        println!("   ├─ Routing failures: {}", self.ingestion.routing_failures);
        println!("   ├─ Backpressure events: {}", self.ingestion.backpressure_events);
        println!("   └─ Workers spawned: {}", self.ingestion.workers_spawned);

        println!("\n💾 Flush");
        println!("   ├─ Cycles: {}", self.flush.flush_cycles);
        println!("   ├─ Batches written: {}", self.flush.batches_written);
        println!("   ├─ Records written: {}", self.flush.records_written);
        println!("   ├─ Failed attempts: {}", self.flush.write_failures);
        println!(
            "   └─ Records lost: {} ({:.2}%)",
            self.flush.records_lost,
            self.loss_rate()
        );

        println!();
    }
}
