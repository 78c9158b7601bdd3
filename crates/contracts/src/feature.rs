//! FeatureSequence - FeatureExtractor output
//!
//! One fixed-dimension vector per hop of decoded audio.

use std::sync::Arc;

use crate::SyncError;

/// Ordered, immutable sequence of feature vectors.
///
/// Stored as one contiguous row-major buffer (`frames × dimension`) behind an
/// `Arc`, so clones are cheap and windows are plain slices.
#[derive(Clone, PartialEq)]
pub struct FeatureSequence {
    data: Arc<[f32]>,
    dimension: usize,
}

impl FeatureSequence {
    /// Create from a flat row-major buffer.
    ///
    /// # Errors
    /// `dimension` is zero or does not divide the buffer length.
    pub fn from_flat(dimension: usize, data: Vec<f32>) -> Result<Self, SyncError> {
        if dimension == 0 {
            return Err(SyncError::alignment("feature dimension must be > 0"));
        }
        if data.len() % dimension != 0 {
            return Err(SyncError::alignment(format!(
                "feature buffer of {} values is not a multiple of dimension {}",
                data.len(),
                dimension
            )));
        }
        Ok(Self {
            data: data.into(),
            dimension,
        })
    }

    /// Create from per-frame vectors.
    ///
    /// # Errors
    /// Frames have differing lengths, or the first frame is empty.
    pub fn from_frames(frames: &[Vec<f32>]) -> Result<Self, SyncError> {
        let dimension = frames.first().map(Vec::len).unwrap_or(1);
        let mut data = Vec::with_capacity(frames.len() * dimension);
        for (idx, frame) in frames.iter().enumerate() {
            if frame.len() != dimension {
                return Err(SyncError::alignment(format!(
                    "frame {idx} has {} coefficients, expected {dimension}",
                    frame.len()
                )));
            }
            data.extend_from_slice(frame);
        }
        Self::from_flat(dimension, data)
    }

    /// Number of frames
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len() / self.dimension
    }

    /// Whether the sequence has no frames
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Coefficients per frame
    #[inline]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Frame `idx`. Panics when out of range, like slice indexing.
    #[inline]
    pub fn frame(&self, idx: usize) -> &[f32] {
        let start = idx * self.dimension;
        &self.data[start..start + self.dimension]
    }

    /// Bounded window `[start, start + len)`, clamped to the sequence end.
    pub fn window(&self, start: usize, len: usize) -> FeatureWindow<'_> {
        let start = start.min(self.len());
        let end = start.saturating_add(len).min(self.len());
        FeatureWindow {
            data: &self.data[start * self.dimension..end * self.dimension],
            dimension: self.dimension,
        }
    }

    /// Whole sequence as a window
    pub fn as_window(&self) -> FeatureWindow<'_> {
        FeatureWindow {
            data: &self.data,
            dimension: self.dimension,
        }
    }
}

impl std::fmt::Debug for FeatureSequence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeatureSequence")
            .field("frames", &self.len())
            .field("dimension", &self.dimension)
            .finish()
    }
}

/// Borrowed, bounded view into a `FeatureSequence`
#[derive(Debug, Clone, Copy)]
pub struct FeatureWindow<'a> {
    data: &'a [f32],
    dimension: usize,
}

impl<'a> FeatureWindow<'a> {
    /// Number of frames in the window
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len() / self.dimension
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    #[inline]
    pub fn frame(&self, idx: usize) -> &'a [f32] {
        let start = idx * self.dimension;
        &self.data[start..start + self.dimension]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_flat_rejects_ragged_buffer() {
        assert!(FeatureSequence::from_flat(3, vec![0.0; 7]).is_err());
        assert!(FeatureSequence::from_flat(0, vec![]).is_err());
        let seq = FeatureSequence::from_flat(3, vec![0.0; 9]).unwrap();
        assert_eq!(seq.len(), 3);
    }

    #[test]
    fn test_from_frames_checks_dimension() {
        let frames = vec![vec![1.0, 2.0], vec![3.0]];
        assert!(FeatureSequence::from_frames(&frames).is_err());
    }

    #[test]
    fn test_window_is_clamped() {
        let frames: Vec<Vec<f32>> = (0..5).map(|i| vec![i as f32, 0.0]).collect();
        let seq = FeatureSequence::from_frames(&frames).unwrap();

        let w = seq.window(3, 10);
        assert_eq!(w.len(), 2);
        assert_eq!(w.frame(0), &[3.0, 0.0]);

        let empty = seq.window(7, 2);
        assert!(empty.is_empty());
    }
}
