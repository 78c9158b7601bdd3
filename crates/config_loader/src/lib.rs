//! # Config Loader
//!
//! Loads and validates [`SyncConfig`] from TOML or JSON.
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let config = ConfigLoader::load_from_path(Path::new("avsync.toml")).unwrap();
//! println!("window: {} frames", config.window_frames());
//! ```

mod parser;
mod validator;

pub use contracts::SyncConfig;
pub use parser::ConfigFormat;

use contracts::SyncError;
use std::path::Path;
use tracing::debug;

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a file, detecting the format from its extension.
    ///
    /// # Errors
    /// - File read failure
    /// - Unsupported format
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_path(path: &Path) -> Result<SyncConfig, SyncError> {
        let format = Self::detect_format(path)?;
        let content = std::fs::read_to_string(path)?;
        let config = Self::load_from_str(&content, format)?;
        debug!(path = %path.display(), ?format, "configuration loaded");
        Ok(config)
    }

    /// Parse and validate configuration text
    pub fn load_from_str(content: &str, format: ConfigFormat) -> Result<SyncConfig, SyncError> {
        let config = parser::parse(content, format)?;
        validator::validate(&config)?;
        Ok(config)
    }

    /// Validate an already built configuration, e.g. after CLI overrides
    pub fn validate(config: &SyncConfig) -> Result<(), SyncError> {
        validator::validate(config)
    }

    pub fn to_toml(config: &SyncConfig) -> Result<String, SyncError> {
        toml::to_string_pretty(config)
            .map_err(|e| SyncError::config_parse(format!("TOML serialize error: {e}")))
    }

    pub fn to_json(config: &SyncConfig) -> Result<String, SyncError> {
        serde_json::to_string_pretty(config)
            .map_err(|e| SyncError::config_parse(format!("JSON serialize error: {e}")))
    }
}

impl ConfigLoader {
    fn detect_format(path: &Path) -> Result<ConfigFormat, SyncError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            SyncError::config_parse("cannot determine file format from extension")
        })?;

        ConfigFormat::from_extension(ext)
            .ok_or_else(|| SyncError::config_parse(format!("unsupported config format: .{ext}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::Placement;

    const SAMPLE_TOML: &str = r#"
[audio]
sample_rate = 16000
hop_length = 160
n_fft = 400
n_mels = 40
feature_dimension = 13

[alignment]
window_span_seconds = 60.0

[validation]
max_speed_error = 5e-4

[cache]
dir = "/tmp/avsync"

[placement]
mode = "keep_a"
fade_seconds = 0.0
"#;

    #[test]
    fn test_load_from_str_toml() {
        let config = ConfigLoader::load_from_str(SAMPLE_TOML, ConfigFormat::Toml).unwrap();
        assert_eq!(config.audio.sample_rate, 16000);
        assert_eq!(config.window_frames(), 6000);
        assert_eq!(config.commit_steps(), 4500);
        assert_eq!(config.placement.mode, Placement::KeepA);
    }

    #[test]
    fn test_round_trip_toml() {
        let config = ConfigLoader::load_from_str(SAMPLE_TOML, ConfigFormat::Toml).unwrap();
        let serialized = ConfigLoader::to_toml(&config).unwrap();
        let back = ConfigLoader::load_from_str(&serialized, ConfigFormat::Toml).unwrap();
        assert_eq!(back.audio.n_mels, 40);
        assert_eq!(back.cache.dir, config.cache.dir);
        assert_eq!(back.validation.max_speed_error, 5e-4);
        assert_eq!(back.placement.mode, Placement::KeepA);
    }

    #[test]
    fn test_round_trip_json() {
        let config = ConfigLoader::load_from_str(SAMPLE_TOML, ConfigFormat::Toml).unwrap();
        let json = ConfigLoader::to_json(&config).unwrap();
        assert!(json.contains("\"keep_a\""), "got: {json}");
        let back = ConfigLoader::load_from_str(&json, ConfigFormat::Json).unwrap();
        assert_eq!(back.audio.hop_length, 160);
    }

    #[test]
    fn test_validation_runs_after_parse() {
        let err = ConfigLoader::load_from_str("[pool]\nworkers = 0\n", ConfigFormat::Toml)
            .unwrap_err();
        assert!(err.to_string().contains("pool.workers"), "got: {err}");
    }

    #[test]
    fn test_load_from_path_detects_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("avsync.json");
        std::fs::write(&path, r#"{"pool": {"workers": 3}}"#).unwrap();
        let config = ConfigLoader::load_from_path(&path).unwrap();
        assert_eq!(config.pool.workers, 3);

        let yaml = dir.path().join("avsync.yaml");
        std::fs::write(&yaml, "pool: {}").unwrap();
        let err = ConfigLoader::load_from_path(&yaml).unwrap_err();
        assert!(err.to_string().contains(".yaml"), "got: {err}");
    }
}
