//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// PipeFlux - typed message routing through station graphs
#[derive(Parser, Debug)]
#[command(
    name = "pipeflux",
    author,
    version,
    about = "Typed message routing through station graphs",
    long_about = "Builds a graph of stations from a TOML/JSON blueprint, routes JSON \n\
                  messages through it by type, and broadcasts emitted messages to \n\
                  prioritized listeners."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "PIPEFLUX_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "PIPEFLUX_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    /// Prometheus exporter port (disabled when unset)
    #[arg(long, global = true, env = "PIPEFLUX_METRICS_PORT")]
    pub metrics_port: Option<u16>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Route input messages through the configured graph
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display graph topology
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(
        short,
        long,
        default_value = "pipeflux.toml",
        env = "PIPEFLUX_CONFIG"
    )]
    pub config: PathBuf,

    /// JSON lines input file ("-" reads stdin)
    #[arg(short, long, default_value = "-")]
    pub input: PathBuf,

    /// Override the entry station from configuration
    #[arg(long)]
    pub entry: Option<String>,

    /// Maximum number of input messages to route (0 = unlimited)
    #[arg(long, default_value = "0", env = "PIPEFLUX_MAX_MESSAGES")]
    pub max_messages: u64,

    /// Validate configuration and exit without routing
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "pipeflux.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "pipeflux.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Show handlers registered on each station
    #[arg(long)]
    pub handlers: bool,

    /// Show listener configuration
    #[arg(long)]
    pub listeners: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}
