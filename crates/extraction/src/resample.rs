//! Sample-rate conversion using rubato

use contracts::SyncError;
use rubato::{FftFixedIn, Resampler};

const CHUNK_SIZE: usize = 1024;
const SUB_CHUNKS: usize = 2;

/// Resample a mono signal from `source_rate` to `target_rate`.
///
/// The resampler's group delay is removed so sample 0 of the output lines up
/// with sample 0 of the input; output length is `ceil(len · target / source)`.
pub fn resample_mono(
    samples: &[f32],
    source_rate: u32,
    target_rate: u32,
) -> Result<Vec<f32>, SyncError> {
    if source_rate == target_rate || samples.is_empty() {
        return Ok(samples.to_vec());
    }
    if source_rate == 0 || target_rate == 0 {
        return Err(SyncError::extraction(
            "resampler",
            format!("invalid sample rates {source_rate} -> {target_rate}"),
        ));
    }

    let mut resampler = FftFixedIn::<f32>::new(
        source_rate as usize,
        target_rate as usize,
        CHUNK_SIZE,
        SUB_CHUNKS,
        1,
    )
    .map_err(|e| SyncError::extraction_with("resampler", "failed to build resampler", e))?;

    let delay = resampler.output_delay();
    let expected =
        (samples.len() as f64 * target_rate as f64 / source_rate as f64).ceil() as usize;
    let mut output = Vec::with_capacity(expected + delay + CHUNK_SIZE);

    let mut pos = 0;
    while output.len() < delay + expected {
        let needed = resampler.input_frames_next();
        let mut chunk = vec![0.0f32; needed];
        if pos < samples.len() {
            let take = needed.min(samples.len() - pos);
            chunk[..take].copy_from_slice(&samples[pos..pos + take]);
        }
        pos += needed;

        let processed = resampler
            .process(&[chunk], None)
            .map_err(|e| SyncError::extraction_with("resampler", "resampling failed", e))?;
        output.extend_from_slice(&processed[0]);
    }

    output.drain(..delay);
    output.truncate(expected);
    Ok(output)
}
