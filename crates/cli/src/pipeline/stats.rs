//! Pipeline statistics and metrics.

use std::time::Duration;

use observability::DispatchMetricsAggregator;
use station::MetricsSnapshot;

/// Statistics from a pipeline run
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    /// Input lines parsed into messages and routed
    pub messages_read: u64,

    /// Input lines that were not valid JSON messages
    pub messages_invalid: u64,

    /// Routed messages whose propagation returned an error
    pub messages_failed: u64,

    /// Total duration of the pipeline run
    pub duration: Duration,

    /// Per-station counters, in declaration order
    pub stations: Vec<(String, MetricsSnapshot)>,

    /// Number of listeners registered with the dispatcher
    pub active_listeners: usize,

    /// Dispatcher loop aggregator
    pub dispatch_metrics: DispatchMetricsAggregator,
}

impl PipelineStats {
    /// Messages routed per second
    pub fn throughput(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.messages_read as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                    Pipeline Statistics                       ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        println!("📊 Overview");
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Messages routed: {}", self.messages_read);
        println!("   ├─ Invalid input lines: {}", self.messages_invalid);
        println!("   ├─ Failed propagations: {}", self.messages_failed);
        println!("   ├─ Throughput: {:.2} msg/s", self.throughput());
        println!("   └─ Active listeners: {}", self.active_listeners);

        if !self.stations.is_empty() {
            println!("\n🚉 Stations");
            for (i, (name, snapshot)) in self.stations.iter().enumerate() {
                let prefix = if i == self.stations.len() - 1 { "└─" } else { "├─" };
                println!(
                    "   {} {}: processed={} unhandled={} dispatched={} delivered={}",
                    prefix,
                    name,
                    snapshot.processed,
                    snapshot.unhandled,
                    snapshot.dispatched,
                    snapshot.delivered
                );
            }
        }

        let summary = self.dispatch_metrics.summary();

        println!("\n📤 Dispatcher");
        println!("   ├─ Messages broadcast: {}", summary.total_messages);
        println!(
            "   ├─ Messages with failures: {} ({:.2}%)",
            summary.messages_with_failures, summary.failure_rate
        );
        println!("   ├─ Listener failures: {}", summary.total_failures);
        println!("   └─ Latency (ms): {}", summary.latency_ms);

        if !summary.listener_failure_counts.is_empty() {
            println!("\n⚠️  Failures by listener");
            for (listener, count) in &summary.listener_failure_counts {
                println!("   ├─ {}: {}", listener, count);
            }
        }

        println!();
    }
}
