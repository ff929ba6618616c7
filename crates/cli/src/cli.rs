//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// bufferd - destination-buffered ingestion and flush service
#[derive(Parser, Debug)]
#[command(
    name = "bufferd",
    author,
    version,
    about = "Destination-buffered ingestion and flush service",
    long_about = "Accepts records over HTTP, buffers them per destination in memory and \n\
                  periodically appends each destination's records to durable storage, \n\
                  retrying failed writes and draining everything on shutdown."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "BUFFERD_VERBOSE")]
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
        env = "BUFFERD_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the ingestion service
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(short, long, default_value = "config.toml", env = "BUFFERD_CONFIG")]
    pub config: PathBuf,

    /// Override HTTP listen address from configuration
    #[arg(long, env = "BUFFERD_LISTEN")]
    pub listen: Option<String>,

    /// Override storage directory from configuration
    #[arg(long, env = "BUFFERD_FILES_DIR")]
    pub files_dir: Option<PathBuf>,

    /// Validate configuration and exit without starting the service
    #[arg(long)]
    pub dry_run: bool,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "9000", env = "BUFFERD_METRICS_PORT")]
    pub metrics_port: u16,
}

impl RunArgs {
    pub fn metrics_port(&self) -> Option<u16> {
        if self.metrics_port == 0 {
            None
        } else {
            Some(self.metrics_port)
        }
    }
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Show token bindings
    #[arg(long)]
    pub bindings: bool,
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
