//! Drift estimation: least-squares line through a trimmed alignment path.

use contracts::{AlignmentConfig, AlignmentPath, SyncError, SyncEstimate};
use tracing::instrument;

/// Minimum retained samples for a defined slope standard error
const MIN_SAMPLES: usize = 3;

/// Fits `idx_b ≈ slope · idx_a + intercept` over the interior of a path.
#[derive(Debug, Clone, Copy)]
pub struct DriftEstimator {
    cutoff_fraction: f64,
}

impl Default for DriftEstimator {
    fn default() -> Self {
        Self::from_config(&AlignmentConfig::default())
    }
}

impl DriftEstimator {
    /// `cutoff_fraction` of the samples is dropped from each end, clamped to `[0, 0.5)`.
    pub fn new(cutoff_fraction: f64) -> Self {
        Self {
            cutoff_fraction: cutoff_fraction.clamp(0.0, 0.499_999),
        }
    }

    pub fn from_config(config: &AlignmentConfig) -> Self {
        Self::new(config.cutoff_fraction)
    }

    /// Retained sample range `[cutoff, len - cutoff)`
    pub fn retained_range(&self, len: usize) -> std::ops::Range<usize> {
        let cutoff = (len as f64 * self.cutoff_fraction).floor() as usize;
        cutoff..len.saturating_sub(cutoff).max(cutoff)
    }

    /// # Errors
    /// [`SyncError::DegenerateAlignment`] when fewer than three samples are
    /// retained or the retained `idx_a` values are all equal.
    #[instrument(level = "debug", name = "drift_estimate", skip(self, path), fields(len = path.len()))]
    pub fn estimate(&self, path: &AlignmentPath) -> Result<SyncEstimate, SyncError> {
        let range = self.retained_range(path.len());
        let estimate = linregress(&path.idx_a()[range.clone()], &path.idx_b()[range])?;
        observability::record_estimate(&estimate);
        Ok(estimate)
    }
}

/// Ordinary least squares of `ys` on `xs` with Pearson correlation and
/// slope standard error.
pub fn linregress(xs: &[usize], ys: &[usize]) -> Result<SyncEstimate, SyncError> {
    let n = xs.len().min(ys.len());
    if n < MIN_SAMPLES {
        return Err(SyncError::degenerate(
            n,
            format!("at least {MIN_SAMPLES} retained samples are required"),
        ));
    }

    let nf = n as f64;
    let x_mean = xs[..n].iter().map(|&x| x as f64).sum::<f64>() / nf;
    let y_mean = ys[..n].iter().map(|&y| y as f64).sum::<f64>() / nf;

    let (mut ssxm, mut ssym, mut ssxym) = (0.0, 0.0, 0.0);
    for (&x, &y) in xs[..n].iter().zip(&ys[..n]) {
        let dx = x as f64 - x_mean;
        let dy = y as f64 - y_mean;
        ssxm += dx * dx;
        ssym += dy * dy;
        ssxym += dx * dy;
    }
    ssxm /= nf;
    ssym /= nf;
    ssxym /= nf;

    if ssxm == 0.0 {
        return Err(SyncError::degenerate(
            n,
            "retained A indices have zero variance",
        ));
    }

    let correlation = if ssym == 0.0 {
        0.0
    } else {
        (ssxym / (ssxm * ssym).sqrt()).clamp(-1.0, 1.0)
    };
    let slope = ssxym / ssxm;
    let intercept = y_mean - slope * x_mean;
    let df = nf - 2.0;
    let stderr = ((1.0 - correlation * correlation).max(0.0) * ssym / ssxm / df).sqrt();

    Ok(SyncEstimate {
        slope,
        intercept,
        correlation,
        stderr,
        samples: n,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shifted_path(len: usize, k: usize) -> AlignmentPath {
        let mut a = vec![0];
        let mut b = vec![0];
        for i in 1..len {
            a.push(i);
            b.push(i + k);
        }
        AlignmentPath::new(a, b).unwrap()
    }

    #[test]
    fn test_exact_shift_regression() {
        let estimate = DriftEstimator::default()
            .estimate(&shifted_path(2000, 42))
            .unwrap();

        assert!((estimate.slope - 1.0).abs() < 1e-12, "slope {}", estimate.slope);
        assert!((estimate.intercept - 42.0).abs() < 1e-8);
        assert!((estimate.correlation - 1.0).abs() < 1e-12);
        assert!(estimate.stderr < 1e-9, "stderr {}", estimate.stderr);
        assert_eq!(estimate.samples, 1500);
    }

    #[test]
    fn test_retained_range_floors_cutoff() {
        let estimator = DriftEstimator::new(0.125);
        assert_eq!(estimator.retained_range(100), 12..88);
        assert_eq!(estimator.retained_range(7), 0..7);
        assert_eq!(DriftEstimator::new(0.0).retained_range(5), 0..5);
    }

    #[test]
    fn test_known_line_fit() {
        // y = 2x + 1 with residuals +1, -1, -1, +1
        let xs = [0, 1, 2, 3];
        let ys = [2, 2, 4, 8];
        let estimate = linregress(&xs, &ys).unwrap();

        assert!((estimate.slope - 2.0).abs() < 1e-12);
        assert!((estimate.intercept - 1.0).abs() < 1e-12);
        // ssxm = 1.25, ssym = 6, r = 2.5 / sqrt(7.5)
        let r = 2.5 / 7.5f64.sqrt();
        assert!((estimate.correlation - r).abs() < 1e-12);
        let stderr = ((1.0 - r * r) * 6.0 / 1.25 / 2.0).sqrt();
        assert!((estimate.stderr - stderr).abs() < 1e-12);
    }

    #[test]
    fn test_zero_variance_in_a_is_degenerate() {
        let err = linregress(&[5, 5, 5, 5], &[1, 2, 3, 4]).unwrap_err();
        assert!(matches!(err, SyncError::DegenerateAlignment { samples: 4, .. }));
    }

    #[test]
    fn test_too_few_samples_is_degenerate() {
        let path = AlignmentPath::new(vec![0, 1], vec![0, 1]).unwrap();
        let err = DriftEstimator::default().estimate(&path).unwrap_err();
        assert!(matches!(err, SyncError::DegenerateAlignment { samples: 2, .. }));
    }

    #[test]
    fn test_flat_b_gives_zero_correlation() {
        let estimate = linregress(&[0, 1, 2, 3], &[7, 7, 7, 7]).unwrap();
        assert_eq!(estimate.slope, 0.0);
        assert_eq!(estimate.correlation, 0.0);
        assert_eq!(estimate.stderr, 0.0);
    }
}
