//! Configuration parsing
//!
//! TOML is the primary format, JSON is accepted as well.

use contracts::{SyncConfig, SyncError};

/// Configuration file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Json,
}

impl ConfigFormat {
    /// Infer format from a file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

pub fn parse_toml(content: &str) -> Result<SyncConfig, SyncError> {
    toml::from_str(content).map_err(|e| SyncError::ConfigParse {
        message: format!("TOML parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

pub fn parse_json(content: &str) -> Result<SyncConfig, SyncError> {
    serde_json::from_str(content).map_err(|e| SyncError::ConfigParse {
        message: format!("JSON parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

pub fn parse(content: &str, format: ConfigFormat) -> Result<SyncConfig, SyncError> {
    match format {
        ConfigFormat::Toml => parse_toml(content),
        ConfigFormat::Json => parse_json(content),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::Placement;

    #[test]
    fn test_parse_toml_partial_sections() {
        let content = r#"
[audio]
hop_length = 256

[placement]
mode = "keep_b"
"#;
        let config = parse_toml(content).unwrap();
        assert_eq!(config.audio.hop_length, 256);
        assert_eq!(config.audio.sample_rate, 22050, "unset keys keep defaults");
        assert_eq!(config.placement.mode, Placement::KeepB);
        assert_eq!(config.alignment.commit_ratio, 0.75);
    }

    #[test]
    fn test_parse_empty_toml_is_default() {
        let config = parse_toml("").unwrap();
        assert_eq!(config.window_frames(), 10335);
        assert_eq!(config.cache.tag, "SynchronizedObject");
    }

    #[test]
    fn test_parse_json_minimal() {
        let content = r#"{
            "validation": { "max_stderr": 2e-5 },
            "pool": { "workers": 4 }
        }"#;
        let config = parse_json(content).unwrap();
        assert_eq!(config.validation.max_stderr, 2e-5);
        assert_eq!(config.validation.max_speed_error, 1e-3);
        assert_eq!(config.pool.workers, 4);
    }

    #[test]
    fn test_unknown_placement_mode_fails_parse() {
        let err = parse_toml("[placement]\nmode = \"stretch\"\n").unwrap_err();
        assert!(matches!(err, SyncError::ConfigParse { .. }));
        assert!(err.to_string().contains("stretch"), "got: {err}");
    }

    #[test]
    fn test_parse_toml_syntax_error() {
        let err = parse_toml("invalid toml [[[").unwrap_err();
        assert!(matches!(err, SyncError::ConfigParse { .. }));
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(ConfigFormat::from_extension("toml"), Some(ConfigFormat::Toml));
        assert_eq!(ConfigFormat::from_extension("TOML"), Some(ConfigFormat::Toml));
        assert_eq!(ConfigFormat::from_extension("json"), Some(ConfigFormat::Json));
        assert_eq!(ConfigFormat::from_extension("yaml"), None);
    }
}
