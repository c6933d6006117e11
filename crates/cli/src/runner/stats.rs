//! Run statistics and reporting.

use std::time::Duration;

use dispatcher::MetricsSnapshot;

/// Statistics from a pipeline run
#[derive(Debug, Clone, Default)]
pub struct RunStats {
    /// Total records read from the input stream
    pub records_read: u64,

    /// Total events emitted into the pipeline
    pub events_emitted: u64,

    /// Records skipped because they could not be parsed
    pub invalid_records: u64,

    /// Errors reported through the pipeline error callback
    pub pipeline_errors: u64,

    /// Total duration of the run
    pub duration: Duration,

    /// Number of configured destinations
    pub active_destinations: usize,

    /// Per-destination delivery metrics
    pub deliveries: Vec<(String, MetricsSnapshot)>,
}

impl RunStats {
    /// Calculate events per second throughput
    pub fn eps(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.events_emitted as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                      Run Statistics                          ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        println!("📊 Overview");
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Records read: {}", self.records_read);
        println!("   ├─ Events emitted: {}", self.events_emitted);
        println!("   ├─ Invalid records: {}", self.invalid_records);
        println!("   ├─ Pipeline errors: {}", self.pipeline_errors);
        println!("   ├─ Events/s: {:.2}", self.eps());
        println!("   └─ Destinations: {}", self.active_destinations);

        if !self.deliveries.is_empty() {
            println!("\n📤 Deliveries");
            for (i, (name, snapshot)) in self.deliveries.iter().enumerate() {
                let is_last = i == self.deliveries.len() - 1;
                let prefix = if is_last { "└─" } else { "├─" };
                println!(
                    "   {} {}: {} sent, {} batches, {} failures",
                    prefix, name, snapshot.sent_count, snapshot.batch_count, snapshot.failure_count
                );
            }
        }

        println!();
    }
}
