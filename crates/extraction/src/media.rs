//! `MediaSource` implementations: files on disk and in-memory signals.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use contracts::{MediaSource, SyncError};

use crate::decode::{decode_mono, probe_duration};
use crate::resample::resample_mono;

const HASH_CHUNK: usize = 1 << 16;

/// Hex md5 of a file's bytes, streamed in chunks
pub fn file_md5(path: &Path) -> Result<String, SyncError> {
    let input = path.display().to_string();
    let file = File::open(path)
        .map_err(|e| SyncError::extraction_with(input.clone(), "failed to open media", e))?;
    let mut reader = BufReader::with_capacity(HASH_CHUNK, file);
    let mut hasher = md5::Context::new();
    let mut chunk = vec![0u8; HASH_CHUNK];
    loop {
        let read = reader
            .read(&mut chunk)
            .map_err(|e| SyncError::extraction_with(input.clone(), "failed to read media", e))?;
        if read == 0 {
            break;
        }
        hasher.consume(&chunk[..read]);
    }
    Ok(format!("{:x}", hasher.compute()))
}

/// A media file decoded on demand.
///
/// The content identity is computed once when the file is opened.
#[derive(Debug, Clone)]
pub struct FileMedia {
    path: PathBuf,
    identity: String,
}

impl FileMedia {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, SyncError> {
        let path = path.into();
        let identity = file_md5(&path)?;
        tracing::debug!(path = %path.display(), identity = %identity, "media opened");
        Ok(Self { path, identity })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl MediaSource for FileMedia {
    fn identity(&self) -> &str {
        &self.identity
    }

    fn mono_pcm(&self, sample_rate: u32) -> Result<Vec<f32>, SyncError> {
        let decoded = decode_mono(&self.path)?;
        resample_mono(&decoded.samples, decoded.sample_rate, sample_rate)
    }

    fn duration(&self) -> Result<f64, SyncError> {
        match probe_duration(&self.path)? {
            Some(duration) => Ok(duration),
            None => Ok(decode_mono(&self.path)?.duration()),
        }
    }
}

/// Mono signal held in memory, identified by a caller-chosen string
#[derive(Debug, Clone)]
pub struct MemoryMedia {
    identity: String,
    samples: Arc<[f32]>,
    sample_rate: u32,
}

impl MemoryMedia {
    pub fn new(identity: impl Into<String>, samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            identity: identity.into(),
            samples: samples.into(),
            sample_rate,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

impl MediaSource for MemoryMedia {
    fn identity(&self) -> &str {
        &self.identity
    }

    fn mono_pcm(&self, sample_rate: u32) -> Result<Vec<f32>, SyncError> {
        resample_mono(&self.samples, self.sample_rate, sample_rate)
    }

    fn duration(&self) -> Result<f64, SyncError> {
        if self.sample_rate == 0 {
            return Err(SyncError::extraction(&*self.identity, "sample rate is zero"));
        }
        Ok(self.samples.len() as f64 / self.sample_rate as f64)
    }
}
