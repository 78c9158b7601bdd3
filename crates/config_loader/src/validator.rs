//! Configuration validation
//!
//! Rules are checked section by section; the first violation wins.

use contracts::{SyncConfig, SyncError};

/// Validate a parsed [`SyncConfig`]
pub fn validate(config: &SyncConfig) -> Result<(), SyncError> {
    validate_audio(config)?;
    validate_alignment(config)?;
    validate_thresholds(config)?;
    validate_runtime(config)?;
    Ok(())
}

fn ensure(ok: bool, field: &str, message: impl FnOnce() -> String) -> Result<(), SyncError> {
    if ok {
        Ok(())
    } else {
        Err(SyncError::config_validation(field, message()))
    }
}

fn validate_audio(config: &SyncConfig) -> Result<(), SyncError> {
    let audio = &config.audio;
    ensure(audio.sample_rate > 0, "audio.sample_rate", || {
        "sample_rate must be > 0".to_string()
    })?;
    ensure(audio.hop_length > 0, "audio.hop_length", || {
        "hop_length must be > 0".to_string()
    })?;
    ensure(audio.n_fft >= audio.hop_length, "audio.n_fft", || {
        format!(
            "n_fft ({}) must be >= hop_length ({})",
            audio.n_fft, audio.hop_length
        )
    })?;
    ensure(audio.feature_dimension >= 1, "audio.feature_dimension", || {
        "feature_dimension must be >= 1".to_string()
    })?;
    ensure(audio.n_mels >= audio.feature_dimension, "audio.n_mels", || {
        format!(
            "n_mels ({}) must be >= feature_dimension ({})",
            audio.n_mels, audio.feature_dimension
        )
    })
}

fn validate_alignment(config: &SyncConfig) -> Result<(), SyncError> {
    let alignment = &config.alignment;
    ensure(
        alignment.window_span_seconds > 0.0,
        "alignment.window_span_seconds",
        || {
            format!(
                "window_span_seconds must be > 0, got {}",
                alignment.window_span_seconds
            )
        },
    )?;
    ensure(
        alignment.commit_ratio > 0.0 && alignment.commit_ratio < 1.0,
        "alignment.commit_ratio",
        || {
            format!(
                "commit_ratio must be in (0, 1), got {}",
                alignment.commit_ratio
            )
        },
    )?;
    ensure(
        (0.0..0.5).contains(&alignment.cutoff_fraction),
        "alignment.cutoff_fraction",
        || {
            format!(
                "cutoff_fraction must be in [0, 0.5), got {}",
                alignment.cutoff_fraction
            )
        },
    )?;
    ensure(config.commit_steps() >= 1, "alignment.commit_ratio", || {
        format!(
            "window of {} frames commits no steps at ratio {}",
            config.window_frames(),
            alignment.commit_ratio
        )
    })
}

fn validate_thresholds(config: &SyncConfig) -> Result<(), SyncError> {
    let validation = &config.validation;
    ensure(validation.max_stderr > 0.0, "validation.max_stderr", || {
        format!("max_stderr must be > 0, got {}", validation.max_stderr)
    })?;
    ensure(
        validation.max_speed_error > 0.0,
        "validation.max_speed_error",
        || {
            format!(
                "max_speed_error must be > 0, got {}",
                validation.max_speed_error
            )
        },
    )
}

fn validate_runtime(config: &SyncConfig) -> Result<(), SyncError> {
    ensure(config.pool.workers >= 1, "pool.workers", || {
        "workers must be >= 1".to_string()
    })?;
    ensure(
        config.placement.fade_seconds >= 0.0,
        "placement.fade_seconds",
        || {
            format!(
                "fade_seconds must be >= 0, got {}",
                config.placement.fade_seconds
            )
        },
    )?;
    ensure(!config.cache.tag.is_empty(), "cache.tag", || {
        "cache tag cannot be empty".to_string()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_of(config: &SyncConfig) -> String {
        match validate(config) {
            Err(SyncError::ConfigValidation { field, .. }) => field,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_default_is_valid() {
        assert!(validate(&SyncConfig::default()).is_ok());
    }

    #[test]
    fn test_zero_hop_length() {
        let mut config = SyncConfig::default();
        config.audio.hop_length = 0;
        assert_eq!(field_of(&config), "audio.hop_length");
    }

    #[test]
    fn test_n_fft_shorter_than_hop() {
        let mut config = SyncConfig::default();
        config.audio.n_fft = 256;
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("n_fft (256) must be >= hop_length (512)"), "got: {err}");
    }

    #[test]
    fn test_more_coefficients_than_mels() {
        let mut config = SyncConfig::default();
        config.audio.n_mels = 8;
        assert_eq!(field_of(&config), "audio.n_mels");
        config.audio.feature_dimension = 0;
        assert_eq!(field_of(&config), "audio.feature_dimension");
    }

    #[test]
    fn test_commit_ratio_bounds() {
        for ratio in [0.0, 1.0, -0.1, 1.5] {
            let mut config = SyncConfig::default();
            config.alignment.commit_ratio = ratio;
            assert_eq!(field_of(&config), "alignment.commit_ratio", "ratio {ratio}");
        }
    }

    #[test]
    fn test_window_too_small_to_commit() {
        let mut config = SyncConfig::default();
        // 0.05 s at 22050/512 is two frames, 0.25 of which floors to zero
        config.alignment.window_span_seconds = 0.05;
        config.alignment.commit_ratio = 0.25;
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("commits no steps"), "got: {err}");
    }

    #[test]
    fn test_cutoff_fraction_bounds() {
        let mut config = SyncConfig::default();
        config.alignment.cutoff_fraction = 0.5;
        assert_eq!(field_of(&config), "alignment.cutoff_fraction");
        config.alignment.cutoff_fraction = 0.0;
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_thresholds_must_be_positive() {
        let mut config = SyncConfig::default();
        config.validation.max_speed_error = 0.0;
        assert_eq!(field_of(&config), "validation.max_speed_error");
        config.validation.max_stderr = -1.0;
        assert_eq!(field_of(&config), "validation.max_stderr");
    }

    #[test]
    fn test_runtime_sections() {
        let mut config = SyncConfig::default();
        config.cache.tag.clear();
        assert_eq!(field_of(&config), "cache.tag");
        config.placement.fade_seconds = -0.1;
        assert_eq!(field_of(&config), "placement.fade_seconds");
        config.pool.workers = 0;
        assert_eq!(field_of(&config), "pool.workers");
    }
}
