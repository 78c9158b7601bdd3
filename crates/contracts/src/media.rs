//! Media collaborator traits
//!
//! Decouples the synchronization core from decoding and feature extraction.
//! Real files and in-memory test fixtures implement the same interfaces.

use crate::{FeatureSequence, SyncError};

/// An input recording as seen by feature extraction.
///
/// # Design Principles
///
/// 1. **Stable identity**: `identity()` must change whenever the content
///    changes and must not change otherwise; it feeds the cache key.
/// 2. **Mono PCM**: rendering always yields one channel at the requested rate.
pub trait MediaSource: Send + Sync {
    /// Stable content-identity string
    fn identity(&self) -> &str;

    /// Mono PCM rendering at `sample_rate`, samples in `[-1, 1]`
    fn mono_pcm(&self, sample_rate: u32) -> Result<Vec<f32>, SyncError>;

    /// Duration in seconds
    fn duration(&self) -> Result<f64, SyncError>;
}

/// Turns a media input into its feature sequence.
///
/// Invoked from worker threads of the extraction pool, hence `Send + Sync`.
pub trait FeatureExtractor: Send + Sync {
    fn extract(&self, media: &dyn MediaSource) -> Result<FeatureSequence, SyncError>;
}
