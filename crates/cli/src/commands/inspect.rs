//! `inspect` command implementation.

use anyhow::{Context, Result};
use contracts::{AlignmentPath, SyncEstimate};
use serde::Serialize;
use sync_engine::{DriftEstimator, SyncValidator};
use tracing::info;

use crate::cli::InspectArgs;
use crate::error::CliError;
use crate::pipeline::load_config;

/// Inspection result for JSON output
#[derive(Serialize)]
struct InspectResult {
    artifact: String,
    path_len: usize,
    last_a: usize,
    last_b: usize,
    estimate: SyncEstimate,
    #[serde(skip_serializing_if = "Option::is_none")]
    offset_seconds: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    rejected: Option<String>,
}

/// Execute the `inspect` command
pub fn run_inspect(args: &InspectArgs) -> Result<()> {
    if !args.artifact.exists() {
        return Err(CliError::not_found(&args.artifact).into());
    }
    let config = load_config(&args.config)?;
    info!(artifact = %args.artifact.display(), "Inspecting artifact");

    let path = sync_cache::load_file(&args.artifact)
        .with_context(|| format!("Failed to read artifact {}", args.artifact.display()))?;
    let result = inspect(
        &path,
        &DriftEstimator::from_config(&config.alignment),
        &SyncValidator::from_config(&config),
    )?;
    let result = InspectResult {
        artifact: args.artifact.display().to_string(),
        ..result
    };

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize inspection result")?;
        println!("{json}");
    } else {
        print_inspect_result(&result);
    }

    match result.rejected {
        Some(message) => Err(CliError::Rejected { message }.into()),
        None => Ok(()),
    }
}

fn inspect(
    path: &AlignmentPath,
    estimator: &DriftEstimator,
    validator: &SyncValidator,
) -> Result<InspectResult> {
    let estimate = estimator.estimate(path)?;
    let (offset_seconds, rejected) = match validator.validate(&estimate) {
        Ok(offset) => (Some(offset.seconds), None),
        Err(e) => (None, Some(e.to_string())),
    };
    let (last_a, last_b) = path.last();

    Ok(InspectResult {
        artifact: String::new(),
        path_len: path.len(),
        last_a,
        last_b,
        estimate,
        offset_seconds,
        rejected,
    })
}

fn print_inspect_result(result: &InspectResult) {
    let e = &result.estimate;
    println!("Artifact: {}", result.artifact);
    println!(
        "  Path: {} steps, ends at A={} B={}",
        result.path_len, result.last_a, result.last_b
    );
    println!("  Slope: {:.6}", e.slope);
    println!("  Intercept: {:.3} frames", e.intercept);
    println!("  Correlation: {:.6}", e.correlation);
    println!("  Stderr: {:.3e} ({} samples)", e.stderr, e.samples);
    match (&result.offset_seconds, &result.rejected) {
        (Some(offset), _) => println!("\n✓ Offset: {offset:.4} s"),
        (None, Some(reason)) => println!("\n✗ {reason}"),
        (None, None) => {}
    }
}
