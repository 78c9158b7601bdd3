//! Error types for CLI operations.

use std::path::PathBuf;

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// An input or configuration path does not exist
    #[error("File not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// Ctrl+C / SIGTERM arrived while work was running
    #[error("Interrupted while running {task}")]
    Interrupted { task: &'static str },

    /// The estimate was computed but failed validation
    #[error("Synchronization rejected: {message}")]
    Rejected { message: String },
}

impl CliError {
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Self::NotFound { path: path.into() }
    }

    /// Process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NotFound { .. } => 2,
            Self::Interrupted { .. } => 130,
            Self::Rejected { .. } => 3,
        }
    }
}
