//! Station metrics for observability

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for a single station
#[derive(Debug, Default)]
pub struct StationMetrics {
    /// Messages a handler ran for
    processed: AtomicU64,
    /// Messages dropped because no handler matched their type
    unhandled: AtomicU64,
    /// Non-empty dispatch calls
    dispatched: AtomicU64,
    /// Deliveries that reached a live channel
    delivered: AtomicU64,
}

impl StationMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Get processed count
    pub fn processed(&self) -> u64 {
        self.processed.load(Ordering::Relaxed)
    }

    /// Increment processed count
    pub fn inc_processed(&self) {
        self.processed.fetch_add(1, Ordering::Relaxed);
    }

    /// Get unhandled count
    pub fn unhandled(&self) -> u64 {
        self.unhandled.load(Ordering::Relaxed)
    }

    /// Increment unhandled count
    pub fn inc_unhandled(&self) {
        self.unhandled.fetch_add(1, Ordering::Relaxed);
    }

    /// Get dispatched count
    pub fn dispatched(&self) -> u64 {
        self.dispatched.load(Ordering::Relaxed)
    }

    /// Increment dispatched count
    pub fn inc_dispatched(&self) {
        self.dispatched.fetch_add(1, Ordering::Relaxed);
    }

    /// Get delivered count
    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }

    /// Increment delivered count
    pub fn inc_delivered(&self) {
        self.delivered.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            processed: self.processed(),
            unhandled: self.unhandled(),
            dispatched: self.dispatched(),
            delivered: self.delivered(),
        }
    }
}

/// Snapshot of station metrics (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub processed: u64,
    pub unhandled: u64,
    pub dispatched: u64,
    pub delivered: u64,
}
