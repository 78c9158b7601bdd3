//! Directory of persisted alignment paths, one `.npy` per identity.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind};
use std::path::{Path, PathBuf};

use contracts::{AlignmentPath, SyncError, SyncIdentity};
use tempfile::NamedTempFile;
use tracing::{debug, instrument};

use crate::artifact::{read_npy, write_npy, ArtifactError};

/// File extension of persisted artifacts
pub const ARTIFACT_EXTENSION: &str = "npy";

/// Content-addressed artifact directory.
///
/// Writes go to a temporary file in the same directory and are then linked
/// into place without clobbering, so an artifact is either complete or
/// absent, and once written it is never replaced.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    /// Open (creating if needed) the store rooted at `dir`
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, SyncError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| SyncError::cache_io_from(&dir, e))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Artifact location for `identity`
    pub fn path_for(&self, identity: &SyncIdentity) -> PathBuf {
        self.dir
            .join(identity.artifact_file_name(ARTIFACT_EXTENSION))
    }

    pub fn contains(&self, identity: &SyncIdentity) -> bool {
        self.path_for(identity).is_file()
    }

    #[instrument(level = "debug", name = "artifact_load", skip(self), fields(identity = %identity))]
    pub fn load(&self, identity: &SyncIdentity) -> Result<AlignmentPath, SyncError> {
        load_file(&self.path_for(identity))
    }

    /// Persist `path` unless an artifact for `identity` already exists.
    ///
    /// Returns the artifact location either way.
    #[instrument(level = "debug", name = "artifact_save", skip(self, path), fields(identity = %identity, len = path.len()))]
    pub fn save(&self, identity: &SyncIdentity, path: &AlignmentPath) -> Result<PathBuf, SyncError> {
        let target = self.path_for(identity);
        if target.is_file() {
            debug!(path = %target.display(), "artifact already present");
            return Ok(target);
        }

        let tmp = NamedTempFile::new_in(&self.dir).map_err(|e| SyncError::cache_io_from(&self.dir, e))?;
        {
            let mut writer = BufWriter::new(tmp.as_file());
            write_npy(&mut writer, path).map_err(|e| artifact_error(&target, e))?;
        }
        tmp.as_file()
            .sync_all()
            .map_err(|e| SyncError::cache_io_from(tmp.path(), e))?;

        match tmp.persist_noclobber(&target) {
            Ok(_) => {
                debug!(path = %target.display(), "artifact persisted");
                Ok(target)
            }
            Err(err) if err.error.kind() == ErrorKind::AlreadyExists => Ok(target),
            Err(err) => Err(SyncError::cache_io_from(&target, err.error)),
        }
    }
}

/// Read any persisted artifact by path
pub fn load_file(path: &Path) -> Result<AlignmentPath, SyncError> {
    let file = File::open(path).map_err(|e| SyncError::cache_io_from(path, e))?;
    read_npy(BufReader::new(file)).map_err(|e| artifact_error(path, e))
}

fn artifact_error(path: &Path, err: ArtifactError) -> SyncError {
    match err {
        ArtifactError::Io(io) => SyncError::cache_io_from(path, io),
        other => SyncError::cache_io(path, other.to_string()),
    }
}
