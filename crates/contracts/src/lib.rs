//! # Contracts
//!
//! Frozen interface contracts, defining inter-module data structures and traits.
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Index Model
//! - Feature frames are indexed from 0 at the start of each recording
//! - One frame spans `hop_length / sample_rate` seconds
//! - Offsets are expressed in seconds, positive when B carries extra lead-in

mod config;
mod error;
mod estimate;
mod feature;
mod identity;
mod media;
mod path;
mod placement;

pub use config::*;
pub use error::*;
pub use estimate::*;
pub use feature::{FeatureSequence, FeatureWindow};
pub use identity::SyncIdentity;
pub use media::{FeatureExtractor, MediaSource};
pub use path::AlignmentPath;
pub use placement::Placement;
