//! Counter sinks for decommissioning events.

use tracing::info;

pub trait MetricsSink: Send + Sync {
    fn incr_counter(&self, key: &[&str], value: u64);
}

/// Emits every increment as a structured event on the `metrics` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMetrics;

impl MetricsSink for LogMetrics {
    fn incr_counter(&self, key: &[&str], value: u64) {
        info!(target: "metrics", key = %key.join("."), value, "counter incremented");
    }
}
