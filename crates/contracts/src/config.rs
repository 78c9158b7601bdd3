//! Synchronization configuration contracts that can be shared across crates.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::Placement;

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete synchronization configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Configuration version
    #[serde(default)]
    pub version: ConfigVersion,

    /// PCM rendering and feature extraction
    #[serde(default)]
    pub audio: AudioConfig,

    /// Windowed alignment and regression trimming
    #[serde(default)]
    pub alignment: AlignmentConfig,

    /// Reliability thresholds
    #[serde(default)]
    pub validation: ValidationConfig,

    /// Persisted artifact store
    #[serde(default)]
    pub cache: CacheConfig,

    /// Extraction worker pool
    #[serde(default)]
    pub pool: PoolConfig,

    /// Offset materialization
    #[serde(default)]
    pub placement: PlacementConfig,
}

impl SyncConfig {
    /// DTW window length in feature frames
    pub fn window_frames(&self) -> usize {
        let frames = self.alignment.window_span_seconds * self.audio.sample_rate as f64
            / self.audio.hop_length as f64;
        frames.floor().max(0.0) as usize
    }

    /// Local path steps committed per window
    pub fn commit_steps(&self) -> usize {
        (self.window_frames() as f64 * self.alignment.commit_ratio).floor() as usize
    }
}

/// PCM rendering and MFCC parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// PCM rate fed to feature extraction (Hz)
    pub sample_rate: u32,
    /// Samples per feature frame
    pub hop_length: usize,
    /// STFT frame length
    pub n_fft: usize,
    /// Mel bands before the DCT
    pub n_mels: usize,
    /// Coefficients kept per feature vector
    pub feature_dimension: usize,
}

impl AudioConfig {
    /// Duration of one feature hop in seconds
    pub fn hop_seconds(&self) -> f64 {
        self.hop_length as f64 / self.sample_rate as f64
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 22050,
            hop_length: 512,
            n_fft: 2048,
            n_mels: 128,
            feature_dimension: 10,
        }
    }
}

/// Windowed alignment parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignmentConfig {
    /// DTW window span before conversion to frames
    pub window_span_seconds: f64,
    /// Fraction of each window's path committed before re-windowing
    pub commit_ratio: f64,
    /// Fraction of path samples trimmed from each end before regression
    pub cutoff_fraction: f64,
}

impl Default for AlignmentConfig {
    fn default() -> Self {
        Self {
            window_span_seconds: 240.0,
            commit_ratio: 0.75,
            cutoff_fraction: 0.125,
        }
    }
}

/// SyncValidator thresholds
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Maximum accepted standard error of the slope
    pub max_stderr: f64,
    /// Maximum accepted `|slope - 1|`
    pub max_speed_error: f64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_stderr: 1e-5,
            max_speed_error: 1e-3,
        }
    }
}

/// Artifact store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Directory holding `<identity>.npy` artifacts
    pub dir: PathBuf,
    /// Type tag mixed into every identity
    pub tag: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(".avsync-cache"),
            tag: "SynchronizedObject".to_string(),
        }
    }
}

/// Extraction worker pool configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Worker threads (minimum 1)
    pub workers: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self { workers: 1 }
    }
}

/// OffsetApplier configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    pub mode: Placement,
    /// Fade-in applied after a synthesized blank
    pub fade_seconds: f64,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            mode: Placement::Pad,
            fade_seconds: 0.5,
        }
    }
}
