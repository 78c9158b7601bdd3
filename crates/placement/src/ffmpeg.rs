//! Render a [`Timeline`] to a file through the ffmpeg CLI

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::process::Command;

use contracts::SyncError;
use tracing::{debug, info, instrument};

use crate::{MediaClip, Segment, Timeline};

/// ffmpeg invocation settings
#[derive(Debug, Clone)]
pub struct FfmpegRenderer {
    pub ffmpeg: PathBuf,
    pub frame_rate: u32,
    pub audio_rate: u32,
    pub video_codec: String,
    pub audio_codec: String,
}

impl Default for FfmpegRenderer {
    fn default() -> Self {
        Self {
            ffmpeg: PathBuf::from("ffmpeg"),
            frame_rate: 30,
            audio_rate: 48_000,
            video_codec: "libx264".to_string(),
            audio_codec: "aac".to_string(),
        }
    }
}

impl FfmpegRenderer {
    /// Command-line arguments that render `timeline` into `output`.
    ///
    /// Each source file is opened once as an input; every segment becomes one
    /// normalized video/audio pair feeding a single `concat` filter.
    pub fn args(&self, timeline: &Timeline, output: &Path) -> Result<Vec<String>, SyncError> {
        let segments = timeline.segments();
        if segments.is_empty() {
            return Err(SyncError::placement("nothing to render: empty timeline"));
        }

        let mut inputs: Vec<&Path> = Vec::new();
        let mut graph = String::new();
        let (w, h) = (timeline.width(), timeline.height());
        let video_norm = format!(
            "scale={w}:{h},setsar=1,fps={},format=yuv420p",
            self.frame_rate
        );
        let audio_norm = format!(
            "aresample={},aformat=sample_fmts=fltp:channel_layouts=stereo",
            self.audio_rate
        );

        for (i, segment) in segments.iter().enumerate() {
            match segment {
                Segment::Blank { duration } => {
                    let d = secs(*duration);
                    let _ = write!(
                        graph,
                        "color=c=black:s={w}x{h}:r={}:d={d},{video_norm}[v{i}];",
                        self.frame_rate
                    );
                    let _ = write!(
                        graph,
                        "anullsrc=r={}:cl=stereo,atrim=duration={d},{audio_norm}[a{i}];",
                        self.audio_rate
                    );
                }
                Segment::Source {
                    path,
                    start,
                    end,
                    fade_in,
                } => {
                    let input = match inputs.iter().position(|p| *p == path.as_path()) {
                        Some(index) => index,
                        None => {
                            inputs.push(path);
                            inputs.len() - 1
                        }
                    };
                    let (s, e) = (secs(*start), secs(*end));
                    let (video_fade, audio_fade) = if *fade_in > 0.0 {
                        let f = secs(*fade_in);
                        (
                            format!(",fade=t=in:st=0:d={f}"),
                            format!(",afade=t=in:st=0:d={f}"),
                        )
                    } else {
                        (String::new(), String::new())
                    };
                    let _ = write!(
                        graph,
                        "[{input}:v]trim=start={s}:end={e},setpts=PTS-STARTPTS,{video_norm}{video_fade}[v{i}];"
                    );
                    let _ = write!(
                        graph,
                        "[{input}:a]atrim=start={s}:end={e},asetpts=PTS-STARTPTS,{audio_norm}{audio_fade}[a{i}];"
                    );
                }
            }
        }

        for i in 0..segments.len() {
            let _ = write!(graph, "[v{i}][a{i}]");
        }
        let _ = write!(graph, "concat=n={}:v=1:a=1[vout][aout]", segments.len());

        let mut args = vec!["-y".to_string(), "-v".to_string(), "error".to_string()];
        for path in inputs {
            args.push("-i".to_string());
            args.push(path.to_string_lossy().into_owned());
        }
        args.extend(
            [
                "-filter_complex",
                graph.as_str(),
                "-map",
                "[vout]",
                "-map",
                "[aout]",
                "-c:v",
                self.video_codec.as_str(),
                "-c:a",
                self.audio_codec.as_str(),
            ]
            .map(String::from),
        );
        args.push(output.to_string_lossy().into_owned());
        Ok(args)
    }

    /// Run ffmpeg, failing with the tail of its stderr on a non-zero exit
    #[instrument(level = "info", name = "ffmpeg_render", skip(self, timeline, output), fields(output = %output.display()))]
    pub fn render(&self, timeline: &Timeline, output: &Path) -> Result<(), SyncError> {
        let args = self.args(timeline, output)?;
        debug!(?args, "running ffmpeg");

        let result = Command::new(&self.ffmpeg).args(&args).output().map_err(|e| {
            SyncError::placement(format!("failed to run {}: {e}", self.ffmpeg.display()))
        })?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            let tail: Vec<&str> = stderr.lines().rev().take(5).collect();
            let tail: Vec<&str> = tail.into_iter().rev().collect();
            return Err(SyncError::placement(format!(
                "ffmpeg exited with {}: {}",
                result.status,
                tail.join(" | ")
            )));
        }

        info!(duration = timeline.duration(), "rendered");
        Ok(())
    }
}

fn secs(value: f64) -> String {
    format!("{value:.6}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{Offset, Placement};

    use crate::OffsetApplier;

    fn graph(args: &[String]) -> &str {
        let i = args.iter().position(|a| a == "-filter_complex").unwrap();
        &args[i + 1]
    }

    #[test]
    fn test_args_for_padded_clip() {
        let a = Timeline::from_source("/media/a.mp4", 10.0, 640, 360);
        let b = Timeline::from_source("/media/b.mp4", 12.0, 640, 360);
        let (padded, _) = OffsetApplier::new(0.5)
            .apply(&a, &b, Offset::new(2.0), Placement::Pad)
            .unwrap();

        let args = FfmpegRenderer::default()
            .args(&padded, Path::new("/out/a.mp4"))
            .unwrap();

        let inputs: Vec<&String> = args
            .iter()
            .zip(args.iter().skip(1))
            .filter(|(flag, _)| *flag == "-i")
            .map(|(_, value)| value)
            .collect();
        assert_eq!(inputs, ["/media/a.mp4"]);
        assert_eq!(args.last().unwrap(), "/out/a.mp4");

        let g = graph(&args);
        assert!(g.contains("color=c=black:s=640x360:r=30:d=2.000000"), "{g}");
        assert!(g.contains("atrim=duration=2.000000"), "{g}");
        assert!(g.contains("[0:v]trim=start=0.000000:end=10.000000"), "{g}");
        assert!(g.contains("fade=t=in:st=0:d=0.500000"), "{g}");
        assert!(g.contains("afade=t=in:st=0:d=0.500000"), "{g}");
        assert!(g.ends_with("[v0][a0][v1][a1]concat=n=2:v=1:a=1[vout][aout]"), "{g}");
    }

    #[test]
    fn test_args_reuse_input_for_repeated_source() {
        let clip = Timeline::from_source("x.mkv", 8.0, 320, 240);
        let split = clip
            .trimmed(0.0, 2.0)
            .unwrap()
            .concat(&clip.trimmed(4.0, 8.0).unwrap())
            .unwrap();

        let args = FfmpegRenderer::default()
            .args(&split, Path::new("out.mkv"))
            .unwrap();
        assert_eq!(args.iter().filter(|a| *a == "-i").count(), 1);
        let g = graph(&args);
        assert!(g.contains("[0:a]atrim=start=4.000000:end=8.000000"), "{g}");
        assert!(!g.contains("fade=t=in"), "{g}");
    }

    #[test]
    fn test_args_reject_empty_timeline() {
        let empty = Timeline::blank(0.0, 320, 240).unwrap();
        assert!(FfmpegRenderer::default()
            .args(&empty, Path::new("out.mp4"))
            .is_err());
    }
}
