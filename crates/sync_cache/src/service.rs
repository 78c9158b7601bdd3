//! Synchronization service: the owner of pool, cache and pipeline stages.

use std::sync::Arc;

use contracts::{
    AlignmentPath, FeatureExtractor, MediaSource, SyncConfig, SyncError, SyncEstimate,
    SyncIdentity, SyncReport,
};
use extraction::{ExtractionPool, MfccExtractor};
use sync_engine::{DriftEstimator, DtwAligner, ElementaryAligner, SyncValidator, WindowedAligner};
use tracing::{debug, info, instrument};

use crate::cache::{CacheState, SyncCache};
use crate::identity::sync_identity;
use crate::store::ArtifactStore;

/// Computes, caches and validates offsets between ordered pairs of inputs.
///
/// Owns an explicitly sized [`ExtractionPool`]; dropping the service (or
/// calling [`SyncService::shutdown`]) stops its workers. Computed paths are
/// kept in memory up to [`DEFAULT_MEMORY_ENTRIES`](crate::DEFAULT_MEMORY_ENTRIES)
/// identities; older ones are read back from their artifacts.
pub struct SyncService {
    config: SyncConfig,
    pool: ExtractionPool,
    extractor: Arc<dyn FeatureExtractor>,
    aligner: WindowedAligner<Arc<dyn ElementaryAligner>>,
    estimator: DriftEstimator,
    validator: SyncValidator,
    cache: SyncCache,
}

impl SyncService {
    /// Service with MFCC extraction and DTW alignment
    pub fn new(config: SyncConfig) -> Result<Self, SyncError> {
        let extractor = Arc::new(MfccExtractor::new(&config.audio)?);
        Self::with_components(config, extractor, Arc::new(DtwAligner))
    }

    /// Service with caller-supplied extraction and elementary alignment
    pub fn with_components(
        config: SyncConfig,
        extractor: Arc<dyn FeatureExtractor>,
        aligner: Arc<dyn ElementaryAligner>,
    ) -> Result<Self, SyncError> {
        let pool = ExtractionPool::new(config.pool.workers)?;
        let aligner = WindowedAligner::from_config(aligner, &config)?;
        let cache = SyncCache::new(ArtifactStore::open(&config.cache.dir)?);

        debug!(
            workers = pool.size(),
            window_frames = aligner.window_frames(),
            commit_steps = aligner.commit_steps(),
            cache_dir = %config.cache.dir.display(),
            "sync service ready"
        );

        Ok(Self {
            estimator: DriftEstimator::from_config(&config.alignment),
            validator: SyncValidator::from_config(&config),
            config,
            pool,
            extractor,
            aligner,
            cache,
        })
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn cache(&self) -> &SyncCache {
        &self.cache
    }

    pub fn validator(&self) -> &SyncValidator {
        &self.validator
    }

    /// Cache identity of the ordered pair `(a, b)`
    pub fn identity(&self, a: &dyn MediaSource, b: &dyn MediaSource) -> SyncIdentity {
        sync_identity(&self.config.cache.tag, a.identity(), b.identity())
    }

    pub fn state(&self, a: &dyn MediaSource, b: &dyn MediaSource) -> CacheState {
        self.cache.state(&self.identity(a, b))
    }

    /// Compute and persist the alignment path of `(a, b)` unless cached
    #[instrument(level = "debug", name = "sync_ensure_computed", skip_all, fields(a = a.identity(), b = b.identity()))]
    pub fn ensure_computed(
        &self,
        a: &Arc<dyn MediaSource>,
        b: &Arc<dyn MediaSource>,
    ) -> Result<SyncIdentity, SyncError> {
        let identity = self.identity(a.as_ref(), b.as_ref());
        self.cache
            .ensure_computed(&identity, || self.compute_path(a, b))?;
        Ok(identity)
    }

    /// Drift estimate of B against A, computing the path only if needed
    pub fn get_estimate(
        &self,
        a: &Arc<dyn MediaSource>,
        b: &Arc<dyn MediaSource>,
    ) -> Result<SyncEstimate, SyncError> {
        let identity = self.ensure_computed(a, b)?;
        self.estimate_for(&identity)
    }

    /// Drift estimate from an already available path
    pub fn estimate_for(&self, identity: &SyncIdentity) -> Result<SyncEstimate, SyncError> {
        let path = self.cache.load_path(identity)?;
        let estimate = self.estimator.estimate(&path)?;
        info!(
            identity = %identity,
            slope = estimate.slope,
            intercept = estimate.intercept,
            correlation = estimate.correlation,
            stderr = estimate.stderr,
            "drift estimated"
        );
        Ok(estimate)
    }

    /// Validated offset of B against A
    pub fn synchronize(
        &self,
        a: &Arc<dyn MediaSource>,
        b: &Arc<dyn MediaSource>,
    ) -> Result<SyncReport, SyncError> {
        let estimate = self.get_estimate(a, b)?;
        self.validator.report(&estimate)
    }

    /// Stop the extraction workers
    pub fn shutdown(mut self) {
        self.pool.shutdown();
    }

    fn compute_path(
        &self,
        a: &Arc<dyn MediaSource>,
        b: &Arc<dyn MediaSource>,
    ) -> Result<AlignmentPath, SyncError> {
        let inputs = [Arc::clone(a), Arc::clone(b)];
        let mut features = self
            .pool
            .extract_all(Arc::clone(&self.extractor), &inputs)?
            .into_iter();
        let (Some(features_a), Some(features_b)) = (features.next(), features.next()) else {
            return Err(SyncError::extraction("pool", "expected two feature sequences"));
        };

        let (path, stats) = self.aligner.align_with_stats(&features_a, &features_b)?;
        debug!(path_len = path.len(), "alignment finished\n{stats}");
        Ok(path)
    }
}
