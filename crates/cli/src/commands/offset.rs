//! `offset` command implementation.

use anyhow::{Context, Result};
use tracing::info;

use crate::cli::OffsetArgs;
use crate::pipeline::{load_config, SyncSession};

/// Execute the `offset` command
pub async fn run_offset(args: &OffsetArgs) -> Result<()> {
    let config = load_config(&args.config)?;
    info!(a = %args.a.display(), b = %args.b.display(), "Estimating offset");

    let session = SyncSession::open(config, &args.a, &args.b)?;
    let report = session.synchronize().await?;

    info!(
        offset_seconds = report.offset.seconds,
        slope = report.estimate.slope,
        "Offset accepted"
    );

    if args.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
        println!("{json}");
    } else {
        println!("{report}");
        match report.offset.delayed_track() {
            Some(track) => println!(
                "Delay track {track} by {:.4} s to line up",
                report.offset.magnitude()
            ),
            None => println!("Tracks are already in sync"),
        }
    }
    Ok(())
}
