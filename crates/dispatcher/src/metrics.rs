//! Dispatcher metrics for observability

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for one priority dispatcher
#[derive(Debug, Default)]
pub struct DispatcherMetrics {
    /// Messages broadcast
    message_count: AtomicU64,
    /// Listener invocations across all tiers
    invocation_count: AtomicU64,
    /// Listener invocations that returned an error
    failure_count: AtomicU64,
}

impl DispatcherMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Get message count
    pub fn message_count(&self) -> u64 {
        self.message_count.load(Ordering::Relaxed)
    }

    /// Get invocation count
    pub fn invocation_count(&self) -> u64 {
        self.invocation_count.load(Ordering::Relaxed)
    }

    /// Get failure count
    pub fn failure_count(&self) -> u64 {
        self.failure_count.load(Ordering::Relaxed)
    }

    /// Record one finished broadcast
    pub fn record_dispatch(&self, invocations: usize, failures: usize) {
        self.message_count.fetch_add(1, Ordering::Relaxed);
        self.invocation_count
            .fetch_add(invocations as u64, Ordering::Relaxed);
        self.failure_count
            .fetch_add(failures as u64, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            message_count: self.message_count(),
            invocation_count: self.invocation_count(),
            failure_count: self.failure_count(),
        }
    }
}

/// Snapshot of dispatcher metrics (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub message_count: u64,
    pub invocation_count: u64,
    pub failure_count: u64,
}
