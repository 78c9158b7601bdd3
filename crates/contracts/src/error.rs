//! Layered error definitions
//!
//! Categorized by source: config / extraction / alignment / estimate / cache / placement

use std::path::PathBuf;

use thiserror::Error;

use crate::SyncIdentity;

/// Unified error type
#[derive(Debug, Error)]
pub enum SyncError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Extraction Errors =====
    /// Decoding or feature extraction failed for one input
    #[error("feature extraction failed for '{input}': {message}")]
    ExtractionFailure {
        input: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    // ===== Alignment Errors =====
    /// Elementary aligner contract violation
    #[error("alignment error: {message}")]
    Alignment { message: String },

    // ===== Estimate Errors =====
    /// Regression standard error above threshold
    #[error(
        "sync unreliable: stderr {stderr:.3e} exceeds max {max_stderr:.3e} \
         (slope={slope:.6}, correlation={correlation:.6})"
    )]
    SyncUnreliable {
        stderr: f64,
        max_stderr: f64,
        slope: f64,
        correlation: f64,
    },

    /// Tracks run at different speeds
    #[error(
        "speed mismatch: slope {slope:.6} deviates from 1 by more than {max_speed_error:.3e} \
         (stderr={stderr:.3e}, correlation={correlation:.6})"
    )]
    SpeedMismatch {
        slope: f64,
        max_speed_error: f64,
        stderr: f64,
        correlation: f64,
    },

    /// Regression undefined for the retained samples
    #[error("degenerate alignment over {samples} samples: {reason}")]
    DegenerateAlignment { samples: usize, reason: String },

    // ===== Cache Errors =====
    /// Persisted artifact unreadable or unwritable
    #[error("cache io error at '{}': {message}", path.display())]
    CacheIo {
        path: PathBuf,
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    /// The in-flight computation this caller waited on failed
    #[error("computation for {identity} was abandoned: {message}")]
    Abandoned {
        identity: SyncIdentity,
        message: String,
    },

    // ===== Placement Errors =====
    /// Unrecognized placement mode
    #[error("invalid placement mode '{mode}' (expected pad, keep_a or keep_b)")]
    InvalidMode { mode: String },

    /// Clip editing / rendering error
    #[error("placement error: {message}")]
    Placement { message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl SyncError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create extraction error without an underlying source
    pub fn extraction(input: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ExtractionFailure {
            input: input.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Create extraction error wrapping the collaborator's error
    pub fn extraction_with<E>(input: impl Into<String>, message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::ExtractionFailure {
            input: input.into(),
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create alignment error
    pub fn alignment(message: impl Into<String>) -> Self {
        Self::Alignment {
            message: message.into(),
        }
    }

    /// Create degenerate alignment error
    pub fn degenerate(samples: usize, reason: impl Into<String>) -> Self {
        Self::DegenerateAlignment {
            samples,
            reason: reason.into(),
        }
    }

    /// Create cache io error
    pub fn cache_io(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::CacheIo {
            path: path.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Create cache io error from an io failure on `path`
    pub fn cache_io_from(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::CacheIo {
            path: path.into(),
            message: source.to_string(),
            source: Some(source),
        }
    }

    /// Create placement error
    pub fn placement(message: impl Into<String>) -> Self {
        Self::Placement {
            message: message.into(),
        }
    }

    /// Stable short label, used as a metrics tag
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ConfigParse { .. } => "config_parse",
            Self::ConfigValidation { .. } => "config_validation",
            Self::ExtractionFailure { .. } => "extraction_failure",
            Self::Alignment { .. } => "alignment",
            Self::SyncUnreliable { .. } => "sync_unreliable",
            Self::SpeedMismatch { .. } => "speed_mismatch",
            Self::DegenerateAlignment { .. } => "degenerate_alignment",
            Self::CacheIo { .. } => "cache_io",
            Self::Abandoned { .. } => "abandoned",
            Self::InvalidMode { .. } => "invalid_mode",
            Self::Placement { .. } => "placement",
            Self::Io(_) => "io",
        }
    }
}
