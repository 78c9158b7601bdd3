//! # Placement
//!
//! Materializes a validated offset on a pair of media clips: the delayed
//! track is padded with blank frames and silence, or the other track is
//! trimmed, depending on the [`contracts::Placement`] mode.
//!
//! [`OffsetApplier`] works on any [`MediaClip`]. [`Timeline`] is the
//! file-backed clip; [`FfmpegRenderer`] turns it into an output file.

mod applier;
mod clip;
mod ffmpeg;
mod timeline;

pub use applier::OffsetApplier;
pub use clip::MediaClip;
pub use ffmpeg::FfmpegRenderer;
pub use timeline::{probe_media, ProbeInfo, Segment, Timeline};
