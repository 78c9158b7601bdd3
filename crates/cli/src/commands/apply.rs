//! `apply` command implementation.

use std::path::PathBuf;

use anyhow::Result;
use placement::{FfmpegRenderer, MediaClip, OffsetApplier, Timeline};
use tracing::info;

use crate::cli::ApplyArgs;
use crate::pipeline::{load_config, run_blocking, SyncSession};

/// Execute the `apply` command
pub async fn run_apply(args: &ApplyArgs) -> Result<()> {
    let mut config = load_config(&args.config)?;
    if let Some(mode) = args.mode {
        config.placement.mode = mode;
    }
    if let Some(fade) = args.fade {
        config.placement.fade_seconds = fade;
    }
    config_loader::ConfigLoader::validate(&config)?;

    let mode = config.placement.mode;
    let applier = OffsetApplier::from_config(&config.placement);

    let session = SyncSession::open(config, &args.a, &args.b)?;
    let report = session.synchronize().await?;
    println!("{report}");

    let renderer = FfmpegRenderer {
        ffmpeg: args.ffmpeg.clone(),
        ..FfmpegRenderer::default()
    };
    let ffprobe = args.ffprobe.clone();
    let inputs = (args.a.clone(), args.b.clone());
    let outputs: [PathBuf; 2] = [args.out_a.clone(), args.out_b.clone()];
    let dry_run = args.dry_run;

    let durations = run_blocking("render", move || {
        let clip_a = Timeline::probe(&ffprobe, &inputs.0)?;
        let clip_b = Timeline::probe(&ffprobe, &inputs.1)?;
        let (out_a, out_b) = applier.apply(&clip_a, &clip_b, report.offset, mode)?;

        for (clip, output) in [(&out_a, &outputs[0]), (&out_b, &outputs[1])] {
            if dry_run {
                let args = renderer.args(clip, output)?;
                println!("{} {}", renderer.ffmpeg.display(), args.join(" "));
            } else {
                renderer.render(clip, output)?;
            }
        }
        Ok((out_a.duration(), out_b.duration()))
    })
    .await?;

    info!(
        mode = %mode,
        duration_a = durations.0,
        duration_b = durations.1,
        out_a = %args.out_a.display(),
        out_b = %args.out_b.display(),
        dry_run,
        "Offset applied"
    );
    Ok(())
}
