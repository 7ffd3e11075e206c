//! `run` command implementation.

use anyhow::{Context, Result};
use contracts::GraphBlueprint;
use tracing::{info, warn};

use crate::cli::RunArgs;
use crate::error::CliError;
use crate::pipeline::{Pipeline, PipelineConfig};

/// Execute the `run` command
pub async fn run_pipeline(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    if !args.config.exists() {
        return Err(CliError::config_not_found(args.config.display().to_string()).into());
    }

    let mut blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    // Apply CLI overrides
    if let Some(ref entry) = args.entry {
        info!(entry = %entry, "Overriding entry station from CLI");
        blueprint.runtime.entry = Some(entry.clone());
    }

    info!(
        stations = blueprint.stations.len(),
        listeners = blueprint.listeners.len(),
        entry = ?blueprint.entry_station(),
        "Configuration loaded"
    );

    // Dry run - just validate and exit
    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&blueprint);
        return Ok(());
    }

    let pipeline = Pipeline::new(PipelineConfig {
        blueprint,
        input: args.input.clone(),
        max_messages: if args.max_messages == 0 {
            None
        } else {
            Some(args.max_messages)
        },
    });

    info!("Starting pipeline...");

    let stats = pipeline
        .run(shutdown_signal())
        .await
        .context("Pipeline execution failed")?;

    info!(
        messages = stats.messages_read,
        failed = stats.messages_failed,
        duration_secs = stats.duration.as_secs_f64(),
        throughput = format!("{:.2}", stats.throughput()),
        "Pipeline completed"
    );
    stats.print_summary();

    info!("PipeFlux finished");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    warn!("Received shutdown signal, stopping input");
}

/// Print configuration summary for dry-run mode
fn print_config_summary(blueprint: &GraphBlueprint) {
    println!("\n=== Configuration Summary ===\n");
    println!("Runtime:");
    println!("  Max depth: {}", blueprint.runtime.max_depth);
    println!("  Entry: {}", blueprint.entry_station().unwrap_or("(none)"));

    println!("\nStations ({}):", blueprint.stations.len());
    for station in &blueprint.stations {
        println!(
            "  - {} ({} sources, {} handlers)",
            station.name,
            station.sources.len(),
            station.handlers.len()
        );
    }

    if !blueprint.listeners.is_empty() {
        println!("\nListeners ({}):", blueprint.listeners.len());
        for listener in &blueprint.listeners {
            println!(
                "  - {} ({:?}, priority {})",
                listener.name, listener.listener_type, listener.priority
            );
        }
    }

    println!();
}
