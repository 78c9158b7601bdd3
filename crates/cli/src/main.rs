//! # avsync CLI
//!
//! Command-line entry point.
//!
//! Provides:
//! - Offset estimation between two recordings
//! - Offset materialization through ffmpeg
//! - Artifact inspection and configuration validation

mod cli;
mod commands;
mod error;
mod pipeline;

use anyhow::Result;
use clap::Parser;
use observability::ObservabilityConfig;
use tracing::info;

use cli::{Cli, Commands};
use commands::{run_apply, run_inspect, run_offset, run_validate};
use error::CliError;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    init_logging(&cli)?;

    info!(version = env!("CARGO_PKG_VERSION"), "avsync starting");

    let result = match &cli.command {
        Commands::Offset(args) => run_offset(args).await,
        Commands::Apply(args) => run_apply(args).await,
        Commands::Inspect(args) => run_inspect(args),
        Commands::Validate(args) => run_validate(args),
    };

    if let Err(ref e) = result {
        tracing::error!(error = format!("{e:#}"), "Command failed");
        // Blocking work may still be running; do not wait for it
        if let Some(cli_error) = e.downcast_ref::<CliError>() {
            eprintln!("Error: {e:#}");
            std::process::exit(cli_error.exit_code());
        }
    }

    result
}

/// Initialize logging based on CLI options
fn init_logging(cli: &Cli) -> Result<()> {
    let default_log_level = if cli.quiet {
        "warn"
    } else {
        match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    observability::init_with_config(ObservabilityConfig {
        log_format: cli.log_format.into(),
        metrics_port: cli.metrics_port,
        default_log_level: default_log_level.to_string(),
    })
}
