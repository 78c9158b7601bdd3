//! Edit-list clip over media files

use std::path::{Path, PathBuf};
use std::process::Command;

use contracts::SyncError;
use serde::Deserialize;
use tracing::debug;

use crate::MediaClip;

/// Slack for floating point range checks, well below one video frame
const TIME_EPSILON: f64 = 1e-6;

/// One piece of a [`Timeline`]
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// Black video with silent audio
    Blank { duration: f64 },
    /// `[start, end)` of a media file, optionally fading in
    Source {
        path: PathBuf,
        start: f64,
        end: f64,
        fade_in: f64,
    },
}

impl Segment {
    pub fn duration(&self) -> f64 {
        match self {
            Segment::Blank { duration } => *duration,
            Segment::Source { start, end, .. } => end - start,
        }
    }

    /// Part of this segment between local times `from` and `to`
    fn slice(&self, from: f64, to: f64) -> Segment {
        match self {
            Segment::Blank { .. } => Segment::Blank { duration: to - from },
            Segment::Source {
                path,
                start,
                fade_in,
                ..
            } => Segment::Source {
                path: path.clone(),
                start: start + from,
                end: start + to,
                fade_in: (fade_in - from).max(0.0),
            },
        }
    }
}

/// Sequence of segments rendered back to back at a fixed frame size.
///
/// Operations only rewrite the edit list; nothing is decoded until the
/// timeline is handed to [`crate::FfmpegRenderer`].
#[derive(Debug, Clone, PartialEq)]
pub struct Timeline {
    segments: Vec<Segment>,
    width: u32,
    height: u32,
}

impl Timeline {
    /// Whole file as a single segment
    pub fn from_source(path: impl Into<PathBuf>, duration: f64, width: u32, height: u32) -> Self {
        Self {
            segments: vec![Segment::Source {
                path: path.into(),
                start: 0.0,
                end: duration,
                fade_in: 0.0,
            }],
            width,
            height,
        }
    }

    /// Build a single-segment timeline from ffprobe's view of `path`
    pub fn probe(ffprobe: &Path, path: &Path) -> Result<Self, SyncError> {
        let info = probe_media(ffprobe, path)?;
        Ok(Self::from_source(path, info.duration, info.width, info.height))
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    fn push(&mut self, segment: Segment) {
        if segment.duration() <= 0.0 {
            return;
        }
        if let (Some(Segment::Blank { duration }), Segment::Blank { duration: extra }) =
            (self.segments.last_mut(), &segment)
        {
            *duration += extra;
            return;
        }
        self.segments.push(segment);
    }
}

impl MediaClip for Timeline {
    fn duration(&self) -> f64 {
        self.segments.iter().map(Segment::duration).sum()
    }

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn trimmed(&self, start: f64, end: f64) -> Result<Self, SyncError> {
        let total = self.duration();
        if start < 0.0 || end < start || end > total + TIME_EPSILON {
            return Err(SyncError::placement(format!(
                "trim range [{start:.3}, {end:.3}) outside clip of {total:.3}s"
            )));
        }

        let mut out = Self {
            segments: Vec::new(),
            width: self.width,
            height: self.height,
        };
        let mut cursor = 0.0;
        for segment in &self.segments {
            let seg_start = cursor;
            let seg_end = cursor + segment.duration();
            cursor = seg_end;

            let from = start.max(seg_start);
            let to = end.min(seg_end);
            if to > from {
                out.push(segment.slice(from - seg_start, to - seg_start));
            }
        }
        Ok(out)
    }

    fn faded_in(&self, seconds: f64) -> Result<Self, SyncError> {
        let mut out = self.clone();
        if let Some(Segment::Source { start, end, fade_in, .. }) = out.segments.first_mut() {
            *fade_in = seconds.clamp(0.0, *end - *start);
        }
        Ok(out)
    }

    fn blank(duration: f64, width: u32, height: u32) -> Result<Self, SyncError> {
        if !(duration.is_finite() && duration >= 0.0) {
            return Err(SyncError::placement(format!(
                "invalid blank duration {duration}"
            )));
        }
        let mut out = Self {
            segments: Vec::new(),
            width,
            height,
        };
        out.push(Segment::Blank { duration });
        Ok(out)
    }

    fn concat(&self, next: &Self) -> Result<Self, SyncError> {
        if (self.width, self.height) != (next.width, next.height) {
            return Err(SyncError::placement(format!(
                "cannot concatenate {}x{} with {}x{}",
                self.width, self.height, next.width, next.height
            )));
        }
        let mut out = self.clone();
        for segment in &next.segments {
            out.push(segment.clone());
        }
        Ok(out)
    }
}

/// Duration and frame size of a media file
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbeInfo {
    pub duration: f64,
    pub width: u32,
    pub height: u32,
}

#[derive(Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: ProbeFormat,
}

#[derive(Deserialize)]
struct ProbeStream {
    width: Option<u32>,
    height: Option<u32>,
}

#[derive(Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

/// Query duration and first video stream size with ffprobe
pub fn probe_media(ffprobe: &Path, path: &Path) -> Result<ProbeInfo, SyncError> {
    let output = Command::new(ffprobe)
        .args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=width,height:format=duration",
            "-of",
            "json",
        ])
        .arg(path)
        .output()
        .map_err(|e| {
            SyncError::placement(format!("failed to run {}: {e}", ffprobe.display()))
        })?;

    if !output.status.success() {
        return Err(SyncError::placement(format!(
            "ffprobe failed on {}: {}",
            path.display(),
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    let info = parse_probe_output(&output.stdout).map_err(|message| {
        SyncError::placement(format!("{}: {message}", path.display()))
    })?;
    debug!(path = %path.display(), ?info, "probed media");
    Ok(info)
}

fn parse_probe_output(json: &[u8]) -> Result<ProbeInfo, String> {
    let parsed: ProbeOutput =
        serde_json::from_slice(json).map_err(|e| format!("unreadable ffprobe output: {e}"))?;

    let duration = parsed
        .format
        .duration
        .as_deref()
        .and_then(|d| d.trim().parse::<f64>().ok())
        .ok_or("ffprobe reported no duration")?;

    let (width, height) = parsed
        .streams
        .iter()
        .find_map(|s| Some((s.width?, s.height?)))
        .ok_or("no video stream")?;

    Ok(ProbeInfo {
        duration,
        width,
        height,
    })
}
