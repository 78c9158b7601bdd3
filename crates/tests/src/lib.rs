//! # Integration Tests
//!
//! Cross-crate end-to-end tests.
//!
//! Covers:
//! - MFCC extraction through alignment, estimation and validation
//! - Cache persistence across service instances
//! - Configuration files driving the service
//! - Estimated offsets driving placement

#[cfg(test)]
mod support {
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use contracts::{FeatureExtractor, FeatureSequence, MediaSource, SyncConfig, SyncError};
    use extraction::{MemoryMedia, MfccExtractor};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    pub const RATE: u32 = 22050;
    pub const HOP: usize = 512;
    /// Lead-in of B, in feature frames
    pub const SHIFT_FRAMES: usize = 43;
    /// Length of the shared content
    pub const CONTENT_SAMPLES: usize = 20 * RATE as usize;

    pub fn expected_offset() -> f64 {
        SHIFT_FRAMES as f64 * HOP as f64 / RATE as f64
    }

    /// Noise whose gain and colour change every 100 ms
    pub fn textured_noise(seed: u64, samples: usize, level: f32) -> Vec<f32> {
        let mut rng = StdRng::seed_from_u64(seed);
        let segment = RATE as usize / 10;
        let mut out = Vec::with_capacity(samples);
        let mut state = 0.0f32;
        while out.len() < samples {
            let gain = rng.random_range(0.3..1.0) * level;
            let smoothing: f32 = rng.random_range(0.0..0.8);
            for _ in 0..segment.min(samples - out.len()) {
                let x: f32 = rng.random_range(-1.0..1.0);
                state = smoothing * state + (1.0 - smoothing) * x;
                out.push(state * gain);
            }
        }
        out
    }

    /// `(a, b)` where `b` is a quiet lead-in of [`SHIFT_FRAMES`] hops followed by `a`
    pub fn shifted_pair() -> (Vec<f32>, Vec<f32>) {
        let a = textured_noise(1, CONTENT_SAMPLES, 0.8);
        let mut b = textured_noise(2, SHIFT_FRAMES * HOP, 0.1);
        b.extend_from_slice(&a);
        (a, b)
    }

    pub fn memory_pair() -> (Arc<dyn MediaSource>, Arc<dyn MediaSource>) {
        let (a, b) = shifted_pair();
        (
            Arc::new(MemoryMedia::new("content-a", a, RATE)),
            Arc::new(MemoryMedia::new("content-b", b, RATE)),
        )
    }

    pub fn config_in(dir: &Path) -> SyncConfig {
        let mut config = SyncConfig::default();
        config.cache.dir = dir.to_path_buf();
        config
    }

    /// MFCC extractor that counts its invocations
    pub struct CountingMfcc {
        inner: MfccExtractor,
        calls: AtomicUsize,
    }

    impl CountingMfcc {
        pub fn new(config: &SyncConfig) -> Self {
            Self {
                inner: MfccExtractor::new(&config.audio).unwrap(),
                calls: AtomicUsize::new(0),
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl FeatureExtractor for CountingMfcc {
        fn extract(&self, media: &dyn MediaSource) -> Result<FeatureSequence, SyncError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.extract(media)
        }
    }

    /// Write mono samples as 16-bit PCM WAV
    pub fn write_wav(path: &Path, samples: &[f32]) {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: RATE,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for &s in samples {
            writer
                .write_sample((s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
                .unwrap();
        }
        writer.finalize().unwrap();
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::sync::Arc;

    use contracts::{MediaSource, Track};
    use extraction::FileMedia;
    use sync_cache::{Availability, CacheState, SyncService};
    use sync_engine::DtwAligner;

    use crate::support::*;

    fn assert_shift(report: &contracts::SyncReport, frames: f64) {
        let e = &report.estimate;
        assert!((e.slope - 1.0).abs() < 1e-9, "slope {}", e.slope);
        assert!(
            (e.intercept - frames).abs() < 1e-6,
            "intercept {} expected {frames}",
            e.intercept
        );
        assert!(e.stderr < 1e-9, "stderr {}", e.stderr);
        let expected = frames * HOP as f64 / RATE as f64;
        assert!(
            (report.offset.seconds - expected).abs() < 1e-6,
            "offset {} expected {expected}",
            report.offset.seconds
        );
    }

    /// Memory inputs -> MFCC -> windowed DTW -> regression -> validation
    #[test]
    fn test_e2e_detects_lead_in() {
        let dir = tempfile::tempdir().unwrap();
        let service = SyncService::new(config_in(dir.path())).unwrap();
        let (a, b) = memory_pair();

        let report = service.synchronize(&a, &b).unwrap();
        assert_shift(&report, SHIFT_FRAMES as f64);
        assert_eq!(report.offset.delayed_track(), Some(Track::A));
        assert!((report.offset.seconds - expected_offset()).abs() < 1e-6);
    }

    #[test]
    fn test_e2e_swapped_order_negates_offset() {
        let dir = tempfile::tempdir().unwrap();
        let service = SyncService::new(config_in(dir.path())).unwrap();
        let (a, b) = memory_pair();

        assert_ne!(
            service.identity(a.as_ref(), b.as_ref()),
            service.identity(b.as_ref(), a.as_ref())
        );
        let report = service.synchronize(&b, &a).unwrap();
        assert_shift(&report, -(SHIFT_FRAMES as f64));
        assert_eq!(report.offset.delayed_track(), Some(Track::B));
    }

    /// Small windows force several stitched DTW passes over real features
    #[test]
    fn test_e2e_multi_window_matches_single_window() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_in(dir.path());
        config.alignment.window_span_seconds = 6.0;
        assert!(config.window_frames() < 300);

        let service = SyncService::new(config).unwrap();
        let (a, b) = memory_pair();
        let report = service.synchronize(&a, &b).unwrap();
        assert_shift(&report, SHIFT_FRAMES as f64);
    }

    #[test]
    fn test_e2e_persisted_artifact_skips_extraction() {
        let dir = tempfile::tempdir().unwrap();
        let (a, b) = memory_pair();

        let first = SyncService::new(config_in(dir.path())).unwrap();
        let expected = first.get_estimate(&a, &b).unwrap();
        first.shutdown();

        let config = config_in(dir.path());
        let counting = Arc::new(CountingMfcc::new(&config));
        let second =
            SyncService::with_components(config, counting.clone(), Arc::new(DtwAligner)).unwrap();

        assert_eq!(
            second.state(a.as_ref(), b.as_ref()),
            CacheState::Available(Availability::Persisted)
        );
        let estimate = second.get_estimate(&a, &b).unwrap();
        assert_eq!(estimate, expected);
        assert_eq!(counting.calls(), 0, "persisted path must not re-extract");

        assert_eq!(second.state(b.as_ref(), a.as_ref()), CacheState::Unbuilt);
    }

    #[test]
    fn test_e2e_repeated_requests_extract_once() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let counting = Arc::new(CountingMfcc::new(&config));
        let service =
            SyncService::with_components(config, counting.clone(), Arc::new(DtwAligner)).unwrap();
        let (a, b) = memory_pair();

        let first = service.synchronize(&a, &b).unwrap();
        let second = service.synchronize(&a, &b).unwrap();
        assert_eq!(first, second);
        assert_eq!(counting.calls(), 2, "one extraction per input");
        assert_eq!(
            service.state(a.as_ref(), b.as_ref()),
            CacheState::Available(Availability::InMemory)
        );
    }

    /// WAV files decoded by symphonia, identified by md5
    #[test]
    fn test_e2e_wav_files() {
        let dir = tempfile::tempdir().unwrap();
        let (a, b) = shifted_pair();
        let path_a = dir.path().join("a.wav");
        let path_b = dir.path().join("b.wav");
        write_wav(&path_a, &a);
        write_wav(&path_b, &b);

        let media_a: Arc<dyn MediaSource> = Arc::new(FileMedia::open(&path_a).unwrap());
        let media_b: Arc<dyn MediaSource> = Arc::new(FileMedia::open(&path_b).unwrap());
        assert_eq!(media_a.identity().len(), 32);

        let service = SyncService::new(config_in(&dir.path().join("cache"))).unwrap();
        let report = service.synchronize(&media_a, &media_b).unwrap();
        assert_shift(&report, SHIFT_FRAMES as f64);

        let duration_b = media_b.duration().unwrap();
        let expected = (CONTENT_SAMPLES + SHIFT_FRAMES * HOP) as f64 / RATE as f64;
        assert!((duration_b - expected).abs() < 1e-3, "duration {duration_b}");
    }
}

#[cfg(test)]
mod config_tests {
    use config_loader::ConfigLoader;
    use sync_cache::SyncService;

    use crate::support::*;

    #[test]
    fn test_config_file_drives_service() {
        let dir = tempfile::tempdir().unwrap();
        let cache_dir = dir.path().join("artifacts");
        let config_path = dir.path().join("avsync.toml");
        std::fs::write(
            &config_path,
            format!(
                "[alignment]\nwindow_span_seconds = 8.0\n\n[cache]\ndir = {:?}\n\n[pool]\nworkers = 2\n",
                cache_dir.display().to_string()
            ),
        )
        .unwrap();

        let config = ConfigLoader::load_from_path(&config_path).unwrap();
        assert_eq!(config.window_frames(), 344);
        assert_eq!(config.commit_steps(), 258);

        let service = SyncService::new(config).unwrap();
        let (a, b) = memory_pair();
        let identity = service.ensure_computed(&a, &b).unwrap();

        let artifact = cache_dir.join(identity.artifact_file_name("npy"));
        assert!(artifact.exists(), "missing {}", artifact.display());
        let report = service.validator().report(&service.estimate_for(&identity).unwrap());
        assert!(report.is_ok(), "{report:?}");
    }
}

#[cfg(test)]
mod artifact_tests {
    use sync_cache::{load_file, SyncService};
    use sync_engine::DriftEstimator;

    use crate::support::*;

    /// A persisted artifact alone reproduces the service's estimate
    #[test]
    fn test_artifact_reproduces_estimate() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let estimator = DriftEstimator::from_config(&config.alignment);
        let service = SyncService::new(config).unwrap();
        let (a, b) = memory_pair();

        let identity = service.ensure_computed(&a, &b).unwrap();
        let expected = service.estimate_for(&identity).unwrap();

        let file = service.cache().store().path_for(&identity);
        let path = load_file(&file).unwrap();
        assert_eq!(estimator.estimate(&path).unwrap(), expected);
        assert_eq!(path.idx_a()[0], 0);
        assert_eq!(path.idx_b()[0], 0);
    }
}

#[cfg(test)]
mod placement_tests {
    use std::path::Path;

    use contracts::{MediaSource, Placement, PlacementConfig};
    use placement::{FfmpegRenderer, MediaClip, OffsetApplier, Segment, Timeline};
    use sync_cache::SyncService;

    use crate::support::*;

    #[test]
    fn test_estimated_offset_pads_delayed_track() {
        let dir = tempfile::tempdir().unwrap();
        let service = SyncService::new(config_in(dir.path())).unwrap();
        let (a, b) = memory_pair();
        let report = service.synchronize(&a, &b).unwrap();

        let duration_a = a.duration().unwrap();
        let duration_b = b.duration().unwrap();
        let clip_a = Timeline::from_source("a.mp4", duration_a, 1280, 720);
        let clip_b = Timeline::from_source("b.mp4", duration_b, 1280, 720);

        let applier = OffsetApplier::from_config(&PlacementConfig::default());
        let (out_a, out_b) = applier
            .apply(&clip_a, &clip_b, report.offset, Placement::Pad)
            .unwrap();

        assert_eq!(out_b, clip_b);
        assert!((out_a.duration() - duration_b).abs() < 1e-6);
        match out_a.segments() {
            [Segment::Blank { duration }, Segment::Source { fade_in, .. }] => {
                assert!((duration - expected_offset()).abs() < 1e-6);
                assert_eq!(*fade_in, 0.5);
            }
            other => panic!("unexpected segments {other:?}"),
        }

        let args = FfmpegRenderer::default()
            .args(&out_a, Path::new("synced_a.mp4"))
            .unwrap();
        let graph = args.join(" ");
        assert!(
            graph.contains(&format!("d={:.6}", report.offset.seconds)),
            "{graph}"
        );
    }

    #[test]
    fn test_keep_a_trims_b_onto_a_timeline() {
        let dir = tempfile::tempdir().unwrap();
        let service = SyncService::new(config_in(dir.path())).unwrap();
        let (a, b) = memory_pair();
        let report = service.synchronize(&a, &b).unwrap();

        let duration_a = a.duration().unwrap();
        let clip_a = Timeline::from_source("a.mp4", duration_a, 640, 360);
        let clip_b = Timeline::from_source("b.mp4", b.duration().unwrap(), 640, 360);

        let (_, out_b) = OffsetApplier::new(0.0)
            .apply(&clip_a, &clip_b, report.offset, Placement::KeepA)
            .unwrap();
        assert!((out_b.duration() - duration_a).abs() < 1e-6);
        match out_b.segments() {
            [Segment::Source { start, .. }] => {
                assert!((start - expected_offset()).abs() < 1e-6, "start {start}");
            }
            other => panic!("unexpected segments {other:?}"),
        }
    }
}
