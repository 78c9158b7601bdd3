//! Offset materialization: pad or trim two clips so their content lines up.

use contracts::{Offset, Placement, PlacementConfig, SyncError, Track};
use tracing::{debug, instrument};

use crate::MediaClip;

/// Applies a validated [`Offset`] to a pair of clips.
///
/// | mode | offset > 0 (B has lead-in) | offset < 0 (A has lead-in) |
/// |---|---|---|
/// | `Pad` | A padded by `offset` | B padded by `|offset|` |
/// | `KeepA` | B trimmed at start | B padded |
/// | `KeepB` | A padded | A trimmed at start |
///
/// `KeepA` / `KeepB` additionally cut the adjusted clip so it never outlasts
/// the kept one.
#[derive(Debug, Clone, Copy)]
pub struct OffsetApplier {
    fade_seconds: f64,
}

impl Default for OffsetApplier {
    fn default() -> Self {
        Self::from_config(&PlacementConfig::default())
    }
}

impl OffsetApplier {
    pub fn new(fade_seconds: f64) -> Self {
        Self {
            fade_seconds: fade_seconds.max(0.0),
        }
    }

    pub fn from_config(config: &PlacementConfig) -> Self {
        Self::new(config.fade_seconds)
    }

    pub fn fade_seconds(&self) -> f64 {
        self.fade_seconds
    }

    #[instrument(level = "debug", name = "apply_offset", skip_all, fields(offset = offset.seconds, mode = %mode))]
    pub fn apply<C: MediaClip>(
        &self,
        a: &C,
        b: &C,
        offset: Offset,
        mode: Placement,
    ) -> Result<(C, C), SyncError> {
        let shift = offset.magnitude();
        let result = match mode {
            Placement::Pad => match offset.delayed_track() {
                Some(Track::A) => (self.pad(a, shift)?, b.clone()),
                Some(Track::B) => (a.clone(), self.pad(b, shift)?),
                None => (a.clone(), b.clone()),
            },
            Placement::KeepA => {
                let adjusted = if offset.seconds >= 0.0 {
                    trim_start(b, shift, Track::B)?
                } else {
                    self.pad(b, shift)?
                };
                (a.clone(), cap_duration(&adjusted, a.duration())?)
            }
            Placement::KeepB => {
                let adjusted = if offset.seconds <= 0.0 {
                    trim_start(a, shift, Track::A)?
                } else {
                    self.pad(a, shift)?
                };
                (cap_duration(&adjusted, b.duration())?, b.clone())
            }
        };

        debug!(
            duration_a = result.0.duration(),
            duration_b = result.1.duration(),
            "offset applied"
        );
        Ok(result)
    }

    /// `seconds` of blank followed by `clip` faded in
    fn pad<C: MediaClip>(&self, clip: &C, seconds: f64) -> Result<C, SyncError> {
        if seconds <= 0.0 {
            return Ok(clip.clone());
        }
        let fade = self.fade_seconds.min(clip.duration());
        let content = if fade > 0.0 {
            clip.faded_in(fade)?
        } else {
            clip.clone()
        };
        C::blank(seconds, clip.width(), clip.height())?.concat(&content)
    }
}

fn trim_start<C: MediaClip>(clip: &C, seconds: f64, track: Track) -> Result<C, SyncError> {
    if seconds <= 0.0 {
        return Ok(clip.clone());
    }
    let duration = clip.duration();
    if seconds >= duration {
        return Err(SyncError::placement(format!(
            "offset {seconds:.3}s consumes all of track {track} ({duration:.3}s)"
        )));
    }
    clip.trimmed(seconds, duration)
}

fn cap_duration<C: MediaClip>(clip: &C, max: f64) -> Result<C, SyncError> {
    if clip.duration() > max {
        clip.trimmed(0.0, max)
    } else {
        Ok(clip.clone())
    }
}
