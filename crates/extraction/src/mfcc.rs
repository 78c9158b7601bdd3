//! Mel-frequency cepstral coefficients.
//!
//! Matches the common librosa defaults: centered frames with reflect
//! padding, periodic Hann window, power spectrum, Slaney mel filterbank with
//! area normalization, `10·log10` with an 80 dB floor below the peak, and an
//! orthonormal DCT-II over the mel bands.

use std::f64::consts::PI;
use std::sync::Arc;
use std::time::Instant;

use contracts::{AudioConfig, FeatureExtractor, FeatureSequence, MediaSource, SyncError};
use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use tracing::instrument;

const AMIN: f32 = 1e-10;
const TOP_DB: f32 = 80.0;

/// MFCC feature extractor with precomputed window, filterbank and DCT.
pub struct MfccExtractor {
    sample_rate: u32,
    hop_length: usize,
    n_fft: usize,
    n_mels: usize,
    n_mfcc: usize,
    window: Vec<f32>,
    /// `n_mels` rows of `n_fft / 2 + 1` weights
    mel_basis: Vec<Vec<f32>>,
    /// `n_mfcc` rows of `n_mels` weights
    dct: Vec<Vec<f32>>,
    fft: Arc<dyn Fft<f32>>,
}

impl std::fmt::Debug for MfccExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MfccExtractor")
            .field("sample_rate", &self.sample_rate)
            .field("hop_length", &self.hop_length)
            .field("n_fft", &self.n_fft)
            .field("n_mels", &self.n_mels)
            .field("n_mfcc", &self.n_mfcc)
            .finish()
    }
}

impl MfccExtractor {
    pub fn new(config: &AudioConfig) -> Result<Self, SyncError> {
        let AudioConfig {
            sample_rate,
            hop_length,
            n_fft,
            n_mels,
            feature_dimension,
        } = *config;

        if sample_rate == 0 || hop_length == 0 || n_fft < 2 {
            return Err(SyncError::config_validation(
                "audio",
                "sample_rate, hop_length and n_fft must be positive",
            ));
        }
        if feature_dimension == 0 || feature_dimension > n_mels {
            return Err(SyncError::config_validation(
                "audio.feature_dimension",
                format!("must be in 1..={n_mels}"),
            ));
        }

        let fft = FftPlanner::<f32>::new().plan_fft_forward(n_fft);

        Ok(Self {
            sample_rate,
            hop_length,
            n_fft,
            n_mels,
            n_mfcc: feature_dimension,
            window: hann_window(n_fft),
            mel_basis: mel_filterbank(sample_rate, n_fft, n_mels),
            dct: dct_ortho(feature_dimension, n_mels),
            fft,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of frames produced for `samples` input samples
    pub fn frame_count(&self, samples: usize) -> usize {
        1 + samples / self.hop_length
    }

    /// MFCC sequence of a mono signal already at `sample_rate`
    #[instrument(level = "debug", name = "mfcc", skip(self, pcm), fields(samples = pcm.len()))]
    pub fn mfcc(&self, pcm: &[f32]) -> Result<FeatureSequence, SyncError> {
        if pcm.is_empty() {
            return Err(SyncError::extraction("mfcc", "no audio samples"));
        }

        let n_frames = self.frame_count(pcm.len());
        let n_bins = self.n_fft / 2 + 1;
        let pad = (self.n_fft / 2) as isize;

        let mut buffer = vec![Complex::new(0.0f32, 0.0); self.n_fft];
        let mut scratch = vec![Complex::new(0.0f32, 0.0); self.fft.get_inplace_scratch_len()];
        let mut power = vec![0.0f32; n_bins];
        let mut mel_db = Vec::with_capacity(n_frames * self.n_mels);
        let mut peak = f32::NEG_INFINITY;

        for t in 0..n_frames {
            let start = (t * self.hop_length) as isize - pad;
            for (k, slot) in buffer.iter_mut().enumerate() {
                let sample = pcm[reflect_index(start + k as isize, pcm.len())];
                *slot = Complex::new(sample * self.window[k], 0.0);
            }
            self.fft.process_with_scratch(&mut buffer, &mut scratch);

            for (p, c) in power.iter_mut().zip(&buffer[..n_bins]) {
                *p = c.norm_sqr();
            }

            for filter in &self.mel_basis {
                let energy: f32 = filter.iter().zip(&power).map(|(w, p)| w * p).sum();
                let db = 10.0 * energy.max(AMIN).log10();
                peak = peak.max(db);
                mel_db.push(db);
            }
        }

        let floor = peak - TOP_DB;
        let mut coefficients = Vec::with_capacity(n_frames * self.n_mfcc);
        for frame in mel_db.chunks_exact(self.n_mels) {
            for row in &self.dct {
                let c: f32 = row.iter().zip(frame).map(|(w, db)| w * db.max(floor)).sum();
                coefficients.push(c);
            }
        }

        FeatureSequence::from_flat(self.n_mfcc, coefficients)
    }
}

impl FeatureExtractor for MfccExtractor {
    #[instrument(level = "debug", name = "mfcc_extract", skip(self, media), fields(identity = media.identity()))]
    fn extract(&self, media: &dyn MediaSource) -> Result<FeatureSequence, SyncError> {
        let started = Instant::now();
        let pcm = media.mono_pcm(self.sample_rate)?;
        let features = self.mfcc(&pcm).map_err(|e| match e {
            SyncError::ExtractionFailure { message, source, .. } => SyncError::ExtractionFailure {
                input: media.identity().to_string(),
                message,
                source,
            },
            other => other,
        })?;
        observability::record_extraction_seconds(started.elapsed().as_secs_f64());
        tracing::debug!(frames = features.len(), "features extracted");
        Ok(features)
    }
}

/// numpy-style `reflect` index (edge sample not repeated)
fn reflect_index(i: isize, len: usize) -> usize {
    if len == 1 {
        return 0;
    }
    let period = 2 * (len as isize - 1);
    let m = i.rem_euclid(period);
    if m < len as isize {
        m as usize
    } else {
        (period - m) as usize
    }
}

/// Periodic Hann window
fn hann_window(n: usize) -> Vec<f32> {
    (0..n)
        .map(|i| (0.5 - 0.5 * (2.0 * PI * i as f64 / n as f64).cos()) as f32)
        .collect()
}

fn hz_to_mel(hz: f64) -> f64 {
    const F_SP: f64 = 200.0 / 3.0;
    const MIN_LOG_HZ: f64 = 1000.0;
    let min_log_mel = MIN_LOG_HZ / F_SP;
    let logstep = 6.4f64.ln() / 27.0;
    if hz >= MIN_LOG_HZ {
        min_log_mel + (hz / MIN_LOG_HZ).ln() / logstep
    } else {
        hz / F_SP
    }
}

fn mel_to_hz(mel: f64) -> f64 {
    const F_SP: f64 = 200.0 / 3.0;
    const MIN_LOG_HZ: f64 = 1000.0;
    let min_log_mel = MIN_LOG_HZ / F_SP;
    let logstep = 6.4f64.ln() / 27.0;
    if mel >= min_log_mel {
        MIN_LOG_HZ * (logstep * (mel - min_log_mel)).exp()
    } else {
        F_SP * mel
    }
}

/// Slaney mel filterbank spanning `0..sr/2`, area normalized
fn mel_filterbank(sample_rate: u32, n_fft: usize, n_mels: usize) -> Vec<Vec<f32>> {
    let n_bins = n_fft / 2 + 1;
    let sr = sample_rate as f64;
    let fft_freqs: Vec<f64> = (0..n_bins).map(|k| k as f64 * sr / n_fft as f64).collect();

    let mel_max = hz_to_mel(sr / 2.0);
    let mel_f: Vec<f64> = (0..n_mels + 2)
        .map(|i| mel_to_hz(mel_max * i as f64 / (n_mels + 1) as f64))
        .collect();

    (0..n_mels)
        .map(|m| {
            let (lo, center, hi) = (mel_f[m], mel_f[m + 1], mel_f[m + 2]);
            let enorm = 2.0 / (hi - lo);
            fft_freqs
                .iter()
                .map(|&f| {
                    let lower = (f - lo) / (center - lo);
                    let upper = (hi - f) / (hi - center);
                    (lower.min(upper).max(0.0) * enorm) as f32
                })
                .collect()
        })
        .collect()
}

/// Orthonormal DCT-II basis, first `n_out` rows
fn dct_ortho(n_out: usize, n_in: usize) -> Vec<Vec<f32>> {
    let n = n_in as f64;
    (0..n_out)
        .map(|k| {
            let scale = if k == 0 { (1.0 / n).sqrt() } else { (2.0 / n).sqrt() };
            (0..n_in)
                .map(|m| (scale * (PI * k as f64 * (2 * m + 1) as f64 / (2.0 * n)).cos()) as f32)
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryMedia;

    fn tone(freq: f32, sample_rate: u32, samples: usize) -> Vec<f32> {
        (0..samples)
            .map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / sample_rate as f32).sin())
            .collect()
    }

    #[test]
    fn test_frame_count_is_centered() {
        let extractor = MfccExtractor::new(&AudioConfig::default()).unwrap();
        let features = extractor.mfcc(&tone(440.0, 22050, 22050)).unwrap();
        assert_eq!(features.len(), 1 + 22050 / 512);
        assert_eq!(features.dimension(), 10);
    }

    #[test]
    fn test_silence_gives_flat_cepstrum() {
        let extractor = MfccExtractor::new(&AudioConfig::default()).unwrap();
        let features = extractor.mfcc(&vec![0.0; 4096]).unwrap();

        let expected_c0 = -100.0 * (128.0f32).sqrt();
        for i in 0..features.len() {
            let frame = features.frame(i);
            assert!((frame[0] - expected_c0).abs() < 1e-2, "c0 = {}", frame[0]);
            assert!(frame[1..].iter().all(|c| c.abs() < 1e-2));
        }
    }

    #[test]
    fn test_distinct_tones_distinct_features() {
        let extractor = MfccExtractor::new(&AudioConfig::default()).unwrap();
        let low = extractor.mfcc(&tone(220.0, 22050, 8192)).unwrap();
        let high = extractor.mfcc(&tone(3000.0, 22050, 8192)).unwrap();

        let mid = low.len() / 2;
        let distance: f32 = low
            .frame(mid)
            .iter()
            .zip(high.frame(mid))
            .map(|(a, b)| (a - b) * (a - b))
            .sum::<f32>()
            .sqrt();
        assert!(distance > 10.0, "distance {distance}");
    }

    #[test]
    fn test_dct_rows_are_orthonormal() {
        let dct = dct_ortho(10, 128);
        for i in 0..10 {
            for j in 0..10 {
                let dot: f32 = dct[i].iter().zip(&dct[j]).map(|(a, b)| a * b).sum();
                let expected = if i == j { 1.0 } else { 0.0 };
                assert!((dot - expected).abs() < 1e-4, "row {i}·{j} = {dot}");
            }
        }
    }

    #[test]
    fn test_mel_scale_round_trip_and_knee() {
        assert!((hz_to_mel(1000.0) - 15.0).abs() < 1e-12);
        for hz in [0.0, 300.0, 999.0, 1000.0, 4000.0, 11025.0] {
            assert!((mel_to_hz(hz_to_mel(hz)) - hz).abs() < 1e-6);
        }
    }

    #[test]
    fn test_filterbank_covers_spectrum() {
        let basis = mel_filterbank(22050, 2048, 128);
        assert_eq!(basis.len(), 128);
        assert!(basis.iter().all(|row| row.len() == 1025));
        assert!(basis.iter().all(|row| row.iter().any(|&w| w > 0.0)));
        assert!(basis.iter().flatten().all(|&w| w >= 0.0));
    }

    #[test]
    fn test_reflect_index() {
        let idx: Vec<usize> = (-3..7).map(|i| reflect_index(i, 4)).collect();
        assert_eq!(idx, vec![3, 2, 1, 0, 1, 2, 3, 2, 1, 0]);
        assert_eq!(reflect_index(-5, 1), 0);
    }

    #[test]
    fn test_extract_resamples_media() {
        let extractor = MfccExtractor::new(&AudioConfig::default()).unwrap();
        let media = MemoryMedia::new("tone", tone(440.0, 44100, 44100), 44100);
        let features = extractor.extract(&media).unwrap();
        assert_eq!(features.len(), 1 + 22050 / 512);
    }

    #[test]
    fn test_empty_media_reports_identity() {
        let extractor = MfccExtractor::new(&AudioConfig::default()).unwrap();
        let media = MemoryMedia::new("silent-input", Vec::new(), 22050);
        match extractor.extract(&media).unwrap_err() {
            SyncError::ExtractionFailure { input, .. } => assert_eq!(input, "silent-input"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
