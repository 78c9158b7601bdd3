//! Container demux + codec decode to mono f32 PCM.

use std::fs::File;
use std::path::Path;

use contracts::SyncError;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader, Track};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, instrument, warn};

const MAX_CONSECUTIVE_ERRORS: usize = 10;

/// Decoded mono signal at the stream's native rate
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl DecodedAudio {
    pub fn duration(&self) -> f64 {
        if self.sample_rate == 0 {
            0.0
        } else {
            self.samples.len() as f64 / self.sample_rate as f64
        }
    }
}

fn open(path: &Path) -> Result<Box<dyn FormatReader>, SyncError> {
    let input = path.display().to_string();
    let file = File::open(path)
        .map_err(|e| SyncError::extraction_with(input.clone(), "failed to open media", e))?;

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let mss = MediaSourceStream::new(Box::new(file), Default::default());
    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| SyncError::extraction_with(input, "failed to probe format", e))?;

    Ok(probed.format)
}

/// First decodable audio track
fn audio_track(reader: &dyn FormatReader) -> Option<&Track> {
    reader
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL && t.codec_params.sample_rate.is_some())
}

/// Track duration from container metadata, if the container records it.
pub fn probe_duration(path: &Path) -> Result<Option<f64>, SyncError> {
    let reader = open(path)?;
    let Some(track) = audio_track(reader.as_ref()) else {
        return Err(SyncError::extraction(
            path.display().to_string(),
            "no decodable audio track",
        ));
    };
    let params = &track.codec_params;
    Ok(match (params.n_frames, params.sample_rate) {
        (Some(frames), Some(rate)) if rate > 0 => Some(frames as f64 / rate as f64),
        _ => None,
    })
}

/// Decode the first audio track of `path`, averaging all channels to mono.
#[instrument(level = "debug", name = "decode_mono", skip(path), fields(path = %path.display()))]
pub fn decode_mono(path: &Path) -> Result<DecodedAudio, SyncError> {
    let input = path.display().to_string();
    let mut reader = open(path)?;

    let track = audio_track(reader.as_ref())
        .ok_or_else(|| SyncError::extraction(input.clone(), "no decodable audio track"))?;
    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| SyncError::extraction(input.clone(), "missing sample rate"))?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| SyncError::extraction_with(input.clone(), "unsupported codec", e))?;

    let mut samples = Vec::new();
    let mut buffer: Option<SampleBuffer<f32>> = None;
    let mut consecutive_errors = 0;

    loop {
        let packet = match reader.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(e) => {
                return Err(SyncError::extraction_with(input, "failed to read packet", e));
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                consecutive_errors = 0;
                let channels = decoded.spec().channels.count().max(1);
                let buf = buffer.get_or_insert_with(|| {
                    SampleBuffer::<f32>::new(decoded.capacity() as u64, *decoded.spec())
                });
                if buf.capacity() < decoded.capacity() * channels {
                    *buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, *decoded.spec());
                }
                buf.copy_interleaved_ref(decoded);
                samples.extend(
                    buf.samples()
                        .chunks_exact(channels)
                        .map(|frame| frame.iter().sum::<f32>() / channels as f32),
                );
            }
            Err(SymphoniaError::DecodeError(err)) => {
                consecutive_errors += 1;
                warn!(path = %input, error = err, "skipping undecodable packet");
                if consecutive_errors >= MAX_CONSECUTIVE_ERRORS {
                    return Err(SyncError::extraction(
                        input,
                        format!("{MAX_CONSECUTIVE_ERRORS} consecutive decode errors: {err}"),
                    ));
                }
            }
            Err(e) => {
                return Err(SyncError::extraction_with(input, "failed to decode packet", e));
            }
        }
    }

    debug!(
        frames = samples.len(),
        sample_rate,
        "decoded audio track"
    );

    Ok(DecodedAudio {
        samples,
        sample_rate,
    })
}
