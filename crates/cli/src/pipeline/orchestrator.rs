//! Pipeline orchestrator - coordinates graph, input and dispatcher.
//!
//! Input lines are routed synchronously through the station graph from the
//! entry station. Messages reaching an `emit` handler are queued to the
//! priority dispatcher, which broadcasts them on its own task.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use contracts::{GraphBlueprint, Message};
use station::{BuiltinHandlers, StationGraph};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::PipelineStats;
use crate::error::{CliError, Result};

/// Time allowed for the dispatcher to drain after input ends
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// The graph blueprint configuration
    pub blueprint: GraphBlueprint,

    /// JSON lines input ("-" = stdin)
    pub input: PathBuf,

    /// Maximum number of messages to route (None = unlimited)
    pub max_messages: Option<u64>,
}

/// Main pipeline orchestrator
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a new pipeline with the given configuration
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run until input is exhausted, the message limit is hit, or
    /// `shutdown` resolves.
    pub async fn run<S>(self, shutdown: S) -> Result<PipelineStats>
    where
        S: Future<Output = ()>,
    {
        let start_time = Instant::now();
        let blueprint = &self.config.blueprint;

        // Setup Dispatcher
        let dispatcher = dispatcher::create_dispatcher(&blueprint.listeners)?;
        if dispatcher.is_empty() {
            warn!("No listeners configured - emitted messages will be dropped");
        }
        let active_listeners = dispatcher.listener_count();
        let (emit_tx, emit_rx) = mpsc::unbounded_channel::<Message>();
        let dispatcher_handle = dispatcher.spawn(emit_rx);

        info!(active_listeners, "Dispatcher started");

        // Setup station graph
        let graph =
            StationGraph::from_blueprint(blueprint, &BuiltinHandlers::with_output(emit_tx))?;
        let entry = match blueprint.entry_station() {
            Some(name) => graph.get(name)?.clone(),
            None => return Err(CliError::NoEntry),
        };

        info!(entry = %entry.name(), stations = graph.len(), "Station graph ready");

        let mut stats = PipelineStats {
            active_listeners,
            ..Default::default()
        };

        let mut lines = BufReader::new(open_input(&self.config.input).await?).lines();
        tokio::pin!(shutdown);

        loop {
            let line = tokio::select! {
                line = lines.next_line() => {
                    line.map_err(|e| CliError::input(&self.config.input, e))?
                }
                _ = &mut shutdown => break,
            };
            let Some(line) = line else {
                debug!("Input exhausted");
                break;
            };
            if line.trim().is_empty() {
                continue;
            }

            let message: Message = match serde_json::from_str(&line) {
                Ok(message) => message,
                Err(e) => {
                    warn!(error = %e, "Skipping invalid input line");
                    stats.messages_invalid += 1;
                    continue;
                }
            };

            stats.messages_read += 1;
            if let Err(e) = entry.dispatch(message) {
                warn!(error = %e, "Message propagation failed");
                stats.messages_failed += 1;
            }

            if let Some(max) = self.config.max_messages {
                if stats.messages_read >= max {
                    info!(messages = stats.messages_read, "Reached max messages limit");
                    break;
                }
            }
        }

        stats.stations = graph
            .stations()
            .map(|s| (s.name().to_string(), s.metrics()))
            .collect();

        // Dropping the graph releases the emit senders and closes the dispatcher input
        drop(entry);
        drop(graph);

        info!("Waiting for dispatcher to drain...");
        stats.dispatch_metrics = match tokio::time::timeout(DRAIN_TIMEOUT, dispatcher_handle).await
        {
            Ok(Ok(aggregator)) => aggregator,
            Ok(Err(e)) => {
                return Err(CliError::pipeline_execution(format!(
                    "dispatcher task failed: {e}"
                )))
            }
            Err(_) => {
                warn!(timeout_secs = DRAIN_TIMEOUT.as_secs(), "Dispatcher drain timed out");
                Default::default()
            }
        };
        stats.duration = start_time.elapsed();

        info!(
            duration_secs = stats.duration.as_secs_f64(),
            throughput = format!("{:.2}", stats.throughput()),
            "Pipeline shutdown complete"
        );

        Ok(stats)
    }
}

async fn open_input(path: &Path) -> Result<Box<dyn AsyncRead + Unpin + Send>> {
    if path.as_os_str() == "-" {
        return Ok(Box::new(tokio::io::stdin()));
    }
    let file = tokio::fs::File::open(path)
        .await
        .map_err(|e| CliError::input(path, e))?;
    Ok(Box::new(file))
}
