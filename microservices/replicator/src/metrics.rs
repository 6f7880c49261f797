//! Replication metrics

use bridge_telemetry::{Counter, Gauge, Histogram, HistogramSnapshot};
use serde::Serialize;

#[derive(Clone)]
pub struct ReplicatorMetrics {
    pub cycles_total: Counter,
    pub cycles_failed: Counter,
    /// Ticks where the clock had not moved past the cursor
    pub cycles_skipped: Counter,
    pub write_batches_total: Counter,
    pub write_batches_failed: Counter,
    pub series_forwarded: Counter,
    pub samples_forwarded: Counter,
    pub cursor_ms: Gauge,
    pub cycle_duration_ms: Histogram,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub cycles_total: u64,
    pub cycles_failed: u64,
    pub cycles_skipped: u64,
    pub write_batches_total: u64,
    pub write_batches_failed: u64,
    pub series_forwarded: u64,
    pub samples_forwarded: u64,
    pub cursor_ms: u64,
    pub cycle_duration_ms: HistogramSnapshot,
}

impl ReplicatorMetrics {
    pub fn new() -> Self {
        Self {
            cycles_total: Counter::new("cycles_total"),
            cycles_failed: Counter::new("cycles_failed"),
            cycles_skipped: Counter::new("cycles_skipped"),
            write_batches_total: Counter::new("write_batches_total"),
            write_batches_failed: Counter::new("write_batches_failed"),
            series_forwarded: Counter::new("series_forwarded"),
            samples_forwarded: Counter::new("samples_forwarded"),
            cursor_ms: Gauge::new("cursor_ms"),
            cycle_duration_ms: Histogram::new("cycle_duration_ms"),
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            cycles_total: self.cycles_total.get(),
            cycles_failed: self.cycles_failed.get(),
            cycles_skipped: self.cycles_skipped.get(),
            write_batches_total: self.write_batches_total.get(),
            write_batches_failed: self.write_batches_failed.get(),
            series_forwarded: self.series_forwarded.get(),
            samples_forwarded: self.samples_forwarded.get(),
            cursor_ms: self.cursor_ms.get(),
            cycle_duration_ms: self.cycle_duration_ms.snapshot(),
        }
    }
}

impl Default for ReplicatorMetrics {
    fn default() -> Self {
        Self::new()
    }
}
