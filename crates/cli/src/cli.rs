//! CLI argument definitions using clap.

use clap::{Args, Parser, Subcommand, ValueEnum};
use contracts::{Placement, SyncError};
use std::path::PathBuf;

/// avsync - find and apply the time offset between two recordings of the same event
#[derive(Parser, Debug)]
#[command(
    name = "avsync",
    author,
    version,
    about = "Audio-based offset detection between two recordings",
    long_about = "Aligns the soundtracks of two recordings of the same event, estimates \n\
                  their relative offset and speed, and optionally pads or trims the \n\
                  media so both start in sync."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "AVSYNC_VERBOSE")]
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
        env = "AVSYNC_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    /// Prometheus metrics port (disabled when unset)
    #[arg(long, global = true, env = "AVSYNC_METRICS_PORT")]
    pub metrics_port: Option<u16>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Estimate the offset of B relative to A
    Offset(OffsetArgs),

    /// Estimate the offset and write synchronized copies of both inputs
    Apply(ApplyArgs),

    /// Re-run the estimate from a persisted alignment artifact
    Inspect(InspectArgs),

    /// Validate a configuration file
    Validate(ValidateArgs),
}

/// Configuration file plus per-run overrides
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// Configuration file (TOML or JSON); defaults apply when omitted
    #[arg(short, long, env = "AVSYNC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override the artifact cache directory
    #[arg(long, env = "AVSYNC_CACHE_DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Override the extraction worker count
    #[arg(long, env = "AVSYNC_WORKERS")]
    pub workers: Option<usize>,

    /// Override the maximum accepted slope standard error
    #[arg(long, env = "AVSYNC_MAX_STDERR")]
    pub max_stderr: Option<f64>,

    /// Override the maximum accepted |slope - 1|
    #[arg(long, env = "AVSYNC_MAX_SPEED_ERROR")]
    pub max_speed_error: Option<f64>,
}

#[derive(Parser, Debug, Clone)]
pub struct OffsetArgs {
    /// Reference recording (A)
    pub a: PathBuf,

    /// Recording to measure against A (B)
    pub b: PathBuf,

    #[command(flatten)]
    pub config: ConfigArgs,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct ApplyArgs {
    /// Reference recording (A)
    pub a: PathBuf,

    /// Recording to measure against A (B)
    pub b: PathBuf,

    /// Output file for the adjusted A
    #[arg(long)]
    pub out_a: PathBuf,

    /// Output file for the adjusted B
    #[arg(long)]
    pub out_b: PathBuf,

    /// Placement mode: pad, keep_a or keep_b
    #[arg(long, env = "AVSYNC_MODE", value_parser = parse_placement)]
    pub mode: Option<Placement>,

    /// Fade-in after inserted blank, in seconds
    #[arg(long, env = "AVSYNC_FADE")]
    pub fade: Option<f64>,

    /// ffmpeg executable
    #[arg(long, default_value = "ffmpeg", env = "AVSYNC_FFMPEG")]
    pub ffmpeg: PathBuf,

    /// ffprobe executable
    #[arg(long, default_value = "ffprobe", env = "AVSYNC_FFPROBE")]
    pub ffprobe: PathBuf,

    /// Print the ffmpeg invocations instead of running them
    #[arg(long)]
    pub dry_run: bool,

    #[command(flatten)]
    pub config: ConfigArgs,
}

#[derive(Parser, Debug, Clone)]
pub struct InspectArgs {
    /// Persisted `.npy` alignment artifact
    pub artifact: PathBuf,

    #[command(flatten)]
    pub config: ConfigArgs,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "avsync.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
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

fn parse_placement(value: &str) -> Result<Placement, SyncError> {
    value.parse()
}
