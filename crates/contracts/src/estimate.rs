//! SyncEstimate / Offset - DriftEstimator and SyncValidator outputs

use serde::{Deserialize, Serialize};
use std::fmt;

/// Linear fit of B's frame index against A's over an alignment path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SyncEstimate {
    /// Relative speed of B with respect to A
    pub slope: f64,
    /// Frame offset of B relative to A
    pub intercept: f64,
    /// Pearson correlation of the fit
    pub correlation: f64,
    /// Standard error of the slope
    pub stderr: f64,
    /// Path samples retained for the regression
    pub samples: usize,
}

/// One of the two synchronized inputs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Track {
    A,
    B,
}

impl Track {
    /// The other track
    pub fn other(self) -> Self {
        match self {
            Track::A => Track::B,
            Track::B => Track::A,
        }
    }
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Track::A => f.write_str("A"),
            Track::B => f.write_str("B"),
        }
    }
}

/// Validated time offset between the two inputs.
///
/// Sign convention: a positive value means the shared content appears that
/// many seconds later in B's timeline than in A's (B carries extra lead-in
/// material). A negative value means A carries the extra lead-in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Offset {
    pub seconds: f64,
}

impl Offset {
    pub fn new(seconds: f64) -> Self {
        Self { seconds }
    }

    /// Magnitude in seconds
    pub fn magnitude(&self) -> f64 {
        self.seconds.abs()
    }

    /// The track whose content starts earlier and must be delayed to line up.
    pub fn delayed_track(&self) -> Option<Track> {
        if self.seconds > 0.0 {
            Some(Track::A)
        } else if self.seconds < 0.0 {
            Some(Track::B)
        } else {
            None
        }
    }
}

/// Human-readable summary of one accepted synchronization
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SyncReport {
    pub estimate: SyncEstimate,
    pub offset: Offset,
    /// Seconds per feature frame
    pub hop_seconds: f64,
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let e = &self.estimate;
        writeln!(f, "B runs at {:.6}x the speed of A", e.slope)?;
        writeln!(
            f,
            "B is shifted by {:.3} frames = {:.4} s relative to A",
            e.intercept, self.offset.seconds
        )?;
        writeln!(f, "Correlation: {:.6}", e.correlation)?;
        write!(
            f,
            "Standard error of slope: {:.3e} ({} samples)",
            e.stderr, e.samples
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delayed_track_follows_sign() {
        assert_eq!(Offset::new(2.0).delayed_track(), Some(Track::A));
        assert_eq!(Offset::new(-0.5).delayed_track(), Some(Track::B));
        assert_eq!(Offset::new(0.0).delayed_track(), None);
        assert_eq!(Offset::new(-0.5).magnitude(), 0.5);
    }

    #[test]
    fn test_report_display() {
        let report = SyncReport {
            estimate: SyncEstimate {
                slope: 1.0,
                intercept: 43.0,
                correlation: 1.0,
                stderr: 0.0,
                samples: 100,
            },
            offset: Offset::new(43.0 * 512.0 / 22050.0),
            hop_seconds: 512.0 / 22050.0,
        };
        let text = report.to_string();
        assert!(text.contains("43.000 frames"), "got: {text}");
        assert!(text.contains("0.9985 s"), "got: {text}");
    }
}
