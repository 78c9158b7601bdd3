//! # Sync Engine
//!
//! Audio alignment core: elementary DTW, windowed stitching, drift
//! regression and reliability validation. Pure computation, no I/O.
//!
//! ## Usage
//!
//! ```ignore
//! use sync_engine::{DriftEstimator, DtwAligner, SyncValidator, WindowedAligner};
//!
//! let aligner = WindowedAligner::from_config(DtwAligner, &config)?;
//! let path = aligner.align(&features_a, &features_b)?;
//! let estimate = DriftEstimator::from_config(&config.alignment).estimate(&path)?;
//! let offset = SyncValidator::from_config(&config).validate(&estimate)?;
//! ```

mod drift;
mod dtw;
mod validator;
mod windowed;

pub use drift::{linregress, DriftEstimator};
pub use dtw::{euclidean, DtwAligner, ElementaryAligner, LocalAlignment};
pub use validator::SyncValidator;
pub use windowed::WindowedAligner;

// Re-export contracts types
pub use contracts::{AlignmentPath, FeatureSequence, Offset, SyncEstimate, SyncReport};
