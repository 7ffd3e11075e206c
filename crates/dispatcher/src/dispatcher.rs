//! PriorityDispatcher - tiered broadcast to listeners

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use contracts::{ListenerConfig, ListenerType, Message};
use observability::{
    DispatchMetricsAggregator, record_dispatch_latency_ms, record_listener_failure,
    record_tier_completed,
};

use crate::error::DispatcherError;
use crate::listeners::{FileListener, LogListener};
use crate::metrics::DispatcherMetrics;
use crate::report::{DispatchReport, ListenerFailure, TierReport};
use crate::request::RegisterRequest;

/// Broadcasts each message to listeners grouped by priority.
///
/// Tiers run in ascending priority. Every listener of a tier is started
/// before any is awaited, and the next tier starts only once all of them
/// have finished. A failing listener is recorded in the report and does not
/// stop the remaining listeners or tiers.
#[derive(Default)]
pub struct PriorityDispatcher {
    tiers: BTreeMap<u32, Vec<RegisterRequest>>,
    metrics: Arc<DispatcherMetrics>,
}

impl PriorityDispatcher {
    /// Create an empty dispatcher
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener. Within a tier, listeners keep registration order.
    pub fn register(&mut self, mut request: RegisterRequest) {
        let tier = self.tiers.entry(request.priority).or_default();
        if request.name.is_none() {
            request.name = Some(format!("p{}#{}", request.priority, tier.len()));
        }
        debug!(
            priority = request.priority,
            listener = request.name.as_deref(),
            "Listener registered"
        );
        tier.push(request);
    }

    /// Registered priorities, ascending
    pub fn priorities(&self) -> Vec<u32> {
        self.tiers.keys().copied().collect()
    }

    /// Number of listeners registered at `priority`
    pub fn tier_len(&self, priority: u32) -> usize {
        self.tiers.get(&priority).map_or(0, Vec::len)
    }

    /// Total registered listeners
    pub fn listener_count(&self) -> usize {
        self.tiers.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }

    /// Listener names in invocation order
    pub fn listener_names(&self) -> Vec<(u32, String)> {
        self.tiers
            .iter()
            .flat_map(|(&priority, tier)| {
                tier.iter()
                    .map(move |r| (priority, r.name().unwrap_or_default().to_string()))
            })
            .collect()
    }

    /// Shared counters
    pub fn metrics(&self) -> &Arc<DispatcherMetrics> {
        &self.metrics
    }

    /// Broadcast `message` to every registered listener
    #[instrument(
        name = "priority_dispatch",
        skip(self, message),
        fields(tiers = self.tiers.len(), type_tag = ?message.kind())
    )]
    pub async fn dispatch(&self, message: &Message) -> DispatchReport {
        let started = Instant::now();
        let mut report = DispatchReport::default();

        for (&priority, tier) in &self.tiers {
            let pending: Vec<_> = tier.iter().map(|r| r.listener.call(message)).collect();
            let results = join_all(pending).await;

            let failures: Vec<ListenerFailure> = results
                .into_iter()
                .zip(tier)
                .enumerate()
                .filter_map(|(index, (result, request))| {
                    let error = result.err()?;
                    let listener = request.name().unwrap_or_default().to_string();
                    warn!(priority, listener = %listener, error = %error, "Listener failed");
                    record_listener_failure(&listener);
                    Some(ListenerFailure {
                        priority,
                        index,
                        listener,
                        error,
                    })
                })
                .collect();

            record_tier_completed(priority, tier.len(), failures.len());
            report.tiers.push(TierReport {
                priority,
                listeners: tier.len(),
                failures,
            });
        }

        let latency_ms = started.elapsed().as_secs_f64() * 1000.0;
        record_dispatch_latency_ms(latency_ms);
        self.metrics
            .record_dispatch(report.listeners_invoked(), report.failure_count());
        report
    }

    /// Run the dispatcher main loop
    ///
    /// Broadcasts every message received on `input_rx`, one at a time.
    /// Returns when the input channel is closed.
    #[instrument(name = "priority_dispatcher_run", skip(self, input_rx))]
    pub async fn run(self, mut input_rx: mpsc::UnboundedReceiver<Message>) -> DispatchMetricsAggregator {
        info!(
            tiers = self.tiers.len(),
            listeners = self.listener_count(),
            "Dispatcher started"
        );

        let mut aggregator = DispatchMetricsAggregator::new();
        while let Some(message) = input_rx.recv().await {
            let started = Instant::now();
            let report = self.dispatch(&message).await;
            let latency_ms = started.elapsed().as_secs_f64() * 1000.0;
            aggregator.update(latency_ms, report.failures().map(|f| f.listener.as_str()));

            if aggregator.total_messages.is_multiple_of(100) {
                debug!(messages = aggregator.total_messages, "Dispatcher progress");
            }
        }

        info!(
            messages = aggregator.total_messages,
            failures = aggregator.total_failures,
            "Dispatcher input closed, shutting down"
        );
        aggregator
    }

    /// Spawn the run loop as a background task
    pub fn spawn(
        self,
        input_rx: mpsc::UnboundedReceiver<Message>,
    ) -> JoinHandle<DispatchMetricsAggregator> {
        tokio::spawn(self.run(input_rx))
    }
}

/// Create a listener request from configuration
#[instrument(
    name = "dispatcher_create_listener",
    skip(config),
    fields(listener = %config.name, listener_type = ?config.listener_type)
)]
pub fn create_listener(config: &ListenerConfig) -> Result<RegisterRequest, DispatcherError> {
    let request = match config.listener_type {
        ListenerType::Log => RegisterRequest::new(LogListener::new(&config.name)),
        ListenerType::File => {
            let listener = FileListener::from_params(&config.name, &config.params)
                .map_err(|e| DispatcherError::listener_creation(&config.name, e.to_string()))?;
            RegisterRequest::new(listener)
        }
    };
    Ok(request
        .with_priority(config.priority)
        .with_name(&config.name))
}

/// Convenience function to create a dispatcher from listener configs
#[instrument(name = "dispatcher_create", skip(configs), fields(listeners = configs.len()))]
pub fn create_dispatcher(configs: &[ListenerConfig]) -> Result<PriorityDispatcher, DispatcherError> {
    let mut dispatcher = PriorityDispatcher::new();
    for config in configs {
        dispatcher.register(create_listener(config)?);
    }
    Ok(dispatcher)
}
