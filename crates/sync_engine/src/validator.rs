//! Reliability gate turning a drift estimate into a time offset.

use contracts::{Offset, SyncConfig, SyncError, SyncEstimate, SyncReport, ValidationConfig};

/// Accepts or rejects a [`SyncEstimate`].
///
/// Checks run in order and the first violation wins:
/// 1. `stderr > max_stderr` → [`SyncError::SyncUnreliable`]
/// 2. `|slope - 1| > max_speed_error` → [`SyncError::SpeedMismatch`]
#[derive(Debug, Clone, Copy)]
pub struct SyncValidator {
    thresholds: ValidationConfig,
    hop_seconds: f64,
}

impl SyncValidator {
    pub fn new(thresholds: ValidationConfig, hop_seconds: f64) -> Self {
        Self {
            thresholds,
            hop_seconds,
        }
    }

    pub fn from_config(config: &SyncConfig) -> Self {
        Self::new(config.validation, config.audio.hop_seconds())
    }

    pub fn hop_seconds(&self) -> f64 {
        self.hop_seconds
    }

    /// Offset in seconds (`intercept × hop_seconds`) if the estimate is trusted
    pub fn validate(&self, estimate: &SyncEstimate) -> Result<Offset, SyncError> {
        let result = self.check(estimate);
        match &result {
            Ok(offset) => tracing::info!(
                slope = estimate.slope,
                intercept = estimate.intercept,
                offset_seconds = offset.seconds,
                correlation = estimate.correlation,
                stderr = estimate.stderr,
                "sync estimate accepted"
            ),
            Err(err) => {
                tracing::warn!(error = %err, "sync estimate rejected");
                observability::record_rejection(err.kind());
            }
        }
        result
    }

    /// Validated offset together with the estimate it came from
    pub fn report(&self, estimate: &SyncEstimate) -> Result<SyncReport, SyncError> {
        let offset = self.validate(estimate)?;
        Ok(SyncReport {
            estimate: *estimate,
            offset,
            hop_seconds: self.hop_seconds,
        })
    }

    fn check(&self, estimate: &SyncEstimate) -> Result<Offset, SyncError> {
        let ValidationConfig {
            max_stderr,
            max_speed_error,
        } = self.thresholds;

        // NaN never passes
        if !(estimate.stderr <= max_stderr) {
            return Err(SyncError::SyncUnreliable {
                stderr: estimate.stderr,
                max_stderr,
                slope: estimate.slope,
                correlation: estimate.correlation,
            });
        }
        if !((estimate.slope - 1.0).abs() <= max_speed_error) {
            return Err(SyncError::SpeedMismatch {
                slope: estimate.slope,
                max_speed_error,
                stderr: estimate.stderr,
                correlation: estimate.correlation,
            });
        }

        Ok(Offset::new(estimate.intercept * self.hop_seconds))
    }
}
