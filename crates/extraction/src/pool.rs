//! Explicitly sized worker pool for feature extraction.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use contracts::{FeatureExtractor, FeatureSequence, MediaSource, SyncError};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::{debug, error, instrument};

/// Dedicated rayon pool with a fixed number of extraction threads.
///
/// Owned by the synchronization service; dropping it (or calling
/// [`ExtractionPool::shutdown`]) terminates the workers.
pub struct ExtractionPool {
    pool: Option<ThreadPool>,
}

impl ExtractionPool {
    /// # Errors
    /// `workers == 0`, or the worker threads could not be spawned.
    pub fn new(workers: usize) -> Result<Self, SyncError> {
        if workers == 0 {
            return Err(SyncError::config_validation(
                "pool.workers",
                "at least one worker is required",
            ));
        }

        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|idx| format!("avsync-extract-{idx}"))
            .build()
            .map_err(|e| SyncError::extraction("pool", e.to_string()))?;

        debug!(workers, "extraction pool started");
        Ok(Self { pool: Some(pool) })
    }

    /// Number of worker threads, 0 after shutdown
    pub fn size(&self) -> usize {
        self.pool
            .as_ref()
            .map_or(0, ThreadPool::current_num_threads)
    }

    /// Extract features for every input concurrently.
    ///
    /// Results are returned in input order regardless of completion order.
    /// When several inputs fail, the error of the earliest input is returned.
    #[instrument(level = "debug", name = "pool_extract_all", skip_all, fields(inputs = inputs.len()))]
    pub fn extract_all(
        &self,
        extractor: Arc<dyn FeatureExtractor>,
        inputs: &[Arc<dyn MediaSource>],
    ) -> Result<Vec<FeatureSequence>, SyncError> {
        let pool = self
            .pool
            .as_ref()
            .ok_or_else(|| SyncError::extraction("pool", "extraction pool is shut down"))?;

        let results: Vec<Result<FeatureSequence, SyncError>> = pool.install(|| {
            inputs
                .par_iter()
                .map(|media| extract_one(extractor.as_ref(), media.as_ref()))
                .collect()
        });
        results.into_iter().collect()
    }

    /// Release the worker threads. Idempotent.
    pub fn shutdown(&mut self) {
        if self.pool.take().is_some() {
            debug!("extraction pool stopped");
        }
    }
}

/// Run one extraction, turning a panic into an extraction error
fn extract_one(
    extractor: &dyn FeatureExtractor,
    media: &dyn MediaSource,
) -> Result<FeatureSequence, SyncError> {
    catch_unwind(AssertUnwindSafe(|| extractor.extract(media))).unwrap_or_else(|_| {
        error!(input = media.identity(), "extraction job panicked");
        Err(SyncError::extraction(media.identity(), "extractor panicked"))
    })
}
