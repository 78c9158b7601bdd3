//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::SyncConfig;
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    hop_seconds: f64,
    window_frames: usize,
    commit_steps: usize,
    feature_dimension: usize,
    cache_dir: String,
    workers: usize,
    placement: String,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{json}");
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(config) => {
            let warnings = collect_warnings(&config);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: (!warnings.is_empty()).then_some(warnings),
                summary: Some(summarize(&config)),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

fn summarize(config: &SyncConfig) -> ConfigSummary {
    ConfigSummary {
        version: format!("{:?}", config.version),
        hop_seconds: config.audio.hop_seconds(),
        window_frames: config.window_frames(),
        commit_steps: config.commit_steps(),
        feature_dimension: config.audio.feature_dimension,
        cache_dir: config.cache.dir.display().to_string(),
        workers: config.pool.workers,
        placement: config.placement.mode.to_string(),
    }
}

/// Non-fatal issues
fn collect_warnings(config: &SyncConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if config.pool.workers > 2 {
        warnings.push(format!(
            "pool.workers = {}: each request extracts two inputs, extra workers stay idle",
            config.pool.workers
        ));
    }

    if config.alignment.cutoff_fraction == 0.0 {
        warnings.push(
            "alignment.cutoff_fraction = 0: path ends enter the regression untrimmed".to_string(),
        );
    }

    if config.window_frames() < 1000 {
        warnings.push(format!(
            "alignment window is only {} frames; short windows follow local mismatches",
            config.window_frames()
        ));
    }

    if !config.cache.dir.exists() {
        warnings.push(format!(
            "cache directory {} does not exist yet and will be created",
            config.cache.dir.display()
        ));
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Hop: {:.6} s", summary.hop_seconds);
            println!(
                "  Window: {} frames, {} committed per step",
                summary.window_frames, summary.commit_steps
            );
            println!("  Features: {} coefficients", summary.feature_dimension);
            println!("  Cache: {}", summary.cache_dir);
            println!("  Workers: {}", summary.workers);
            println!("  Placement: {}", summary.placement);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {warning}");
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {error}");
        }
    }
}
