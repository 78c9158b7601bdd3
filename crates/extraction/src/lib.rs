//! # Extraction
//!
//! Media decoding and MFCC feature extraction.
//!
//! - [`FileMedia`]: media file decoded with symphonia, resampled with rubato,
//!   identified by the md5 of its bytes
//! - [`MemoryMedia`]: in-memory mono signal
//! - [`MfccExtractor`]: the [`FeatureExtractor`](contracts::FeatureExtractor)
//! - [`ExtractionPool`]: explicitly sized rayon pool running extractions

mod decode;
mod media;
mod mfcc;
mod pool;
mod resample;

pub use decode::{decode_mono, probe_duration, DecodedAudio};
pub use media::{file_md5, FileMedia, MemoryMedia};
pub use mfcc::MfccExtractor;
pub use pool::ExtractionPool;
pub use resample::resample_mono;

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::Path;

    /// Write interleaved samples as 16-bit PCM WAV
    pub fn write_wav(path: &Path, sample_rate: u32, channels: u16, interleaved: &[f32]) {
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for &s in interleaved {
            writer
                .write_sample((s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
                .unwrap();
        }
        writer.finalize().unwrap();
    }
}
