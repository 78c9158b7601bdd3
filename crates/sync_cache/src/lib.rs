//! # Sync Cache
//!
//! Content-addressed memoization of alignment paths and the service that
//! drives a full synchronization.
//!
//! ## Usage
//!
//! ```ignore
//! let service = SyncService::new(config)?;
//! let report = service.synchronize(&media_a, &media_b)?;
//! println!("{report}");
//! ```

mod artifact;
mod cache;
mod identity;
mod service;
mod store;

pub use artifact::{read_npy, write_npy, ArtifactError};
pub use cache::{Availability, CacheState, SyncCache, DEFAULT_MEMORY_ENTRIES};
pub use identity::{sync_identity, DEFAULT_TAG};
pub use service::SyncService;
pub use store::{load_file, ArtifactStore, ARTIFACT_EXTENSION};
