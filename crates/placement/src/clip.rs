//! Editable media clip abstraction

use contracts::SyncError;

/// Clip operations needed to materialize an offset.
///
/// Operations return new clips; the receiver is left untouched. Times are
/// seconds relative to the clip's own start.
pub trait MediaClip: Clone + Sized {
    fn duration(&self) -> f64;

    fn width(&self) -> u32;

    fn height(&self) -> u32;

    /// Sub-clip covering `[start, end)`
    fn trimmed(&self, start: f64, end: f64) -> Result<Self, SyncError>;

    /// Same clip, fading in from black/silence over `seconds`
    fn faded_in(&self, seconds: f64) -> Result<Self, SyncError>;

    /// Black, silent clip
    fn blank(duration: f64, width: u32, height: u32) -> Result<Self, SyncError>;

    /// `self` followed by `next`
    fn concat(&self, next: &Self) -> Result<Self, SyncError>;
}
