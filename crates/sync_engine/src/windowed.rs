//! Windowed alignment: stitch bounded DTW passes into one global path.

use contracts::{AlignmentPath, FeatureSequence, SyncConfig, SyncError};
use observability::AlignmentStats;
use tracing::instrument;

use crate::ElementaryAligner;

/// Runs an [`ElementaryAligner`] over sliding windows of two long sequences.
///
/// Each window starts at the last committed point and only its first
/// `commit_steps` local steps are kept, so the DP never exceeds
/// `window_frames × window_frames` regardless of recording length.
pub struct WindowedAligner<E> {
    aligner: E,
    window_frames: usize,
    commit_steps: usize,
}

impl<E: ElementaryAligner> WindowedAligner<E> {
    /// # Errors
    /// `window_frames < 2` or `commit_steps` outside `1..window_frames`.
    pub fn new(aligner: E, window_frames: usize, commit_steps: usize) -> Result<Self, SyncError> {
        if window_frames < 2 {
            return Err(SyncError::config_validation(
                "alignment.window_span_seconds",
                format!("window must span at least 2 frames, got {window_frames}"),
            ));
        }
        if commit_steps == 0 || commit_steps >= window_frames {
            return Err(SyncError::config_validation(
                "alignment.commit_ratio",
                format!("commit steps {commit_steps} must be in 1..{window_frames}"),
            ));
        }
        Ok(Self {
            aligner,
            window_frames,
            commit_steps,
        })
    }

    /// Window geometry derived from the audio and alignment sections
    pub fn from_config(aligner: E, config: &SyncConfig) -> Result<Self, SyncError> {
        Self::new(aligner, config.window_frames(), config.commit_steps())
    }

    pub fn window_frames(&self) -> usize {
        self.window_frames
    }

    pub fn commit_steps(&self) -> usize {
        self.commit_steps
    }

    /// Global alignment path of `a` against `b`
    pub fn align(
        &self,
        a: &FeatureSequence,
        b: &FeatureSequence,
    ) -> Result<AlignmentPath, SyncError> {
        self.align_with_stats(a, b).map(|(path, _)| path)
    }

    /// Global alignment path plus per-window progress statistics
    #[instrument(
        level = "debug",
        name = "windowed_align",
        skip(self, a, b),
        fields(len_a = a.len(), len_b = b.len(), window = self.window_frames)
    )]
    pub fn align_with_stats(
        &self,
        a: &FeatureSequence,
        b: &FeatureSequence,
    ) -> Result<(AlignmentPath, AlignmentStats), SyncError> {
        if a.is_empty() || b.is_empty() {
            return Err(SyncError::alignment(format!(
                "cannot align empty feature sequence ({} x {} frames)",
                a.len(),
                b.len()
            )));
        }

        let (len_a, len_b) = (a.len(), b.len());
        let mut idx_a = vec![0usize];
        let mut idx_b = vec![0usize];
        let mut stats = AlignmentStats::new();
        let (mut a0, mut b0) = (0usize, 0usize);

        while a0 < len_a - 1 && b0 < len_b - 1 {
            let wa = a.window(a0, self.window_frames);
            let wb = b.window(b0, self.window_frames);
            let local = self.aligner.align(wa, wb)?;

            let reaches_end = a0 + wa.len() == len_a && b0 + wb.len() == len_b;
            let available = local.len().saturating_sub(1);
            let steps = if reaches_end {
                available
            } else {
                available.min(self.commit_steps)
            };

            for k in 1..=steps {
                idx_a.push(a0 + local.path_a[k]);
                idx_b.push(b0 + local.path_b[k]);
            }

            let (next_a, next_b) = (idx_a[idx_a.len() - 1], idx_b[idx_b.len() - 1]);
            if (next_a, next_b) == (a0, b0) {
                return Err(SyncError::alignment(format!(
                    "window at ({a0}, {b0}) made no progress"
                )));
            }

            let percent = 100.0 * (next_a as f64 / (len_a - 1) as f64)
                .max(next_b as f64 / (len_b - 1) as f64)
                .min(1.0);
            tracing::debug!(
                committed_a = next_a,
                committed_b = next_b,
                len_a,
                len_b,
                percent,
                "alignment window committed"
            );
            observability::record_window_committed(next_a - a0, next_b - b0, percent);
            stats.update(next_a - a0, next_b - b0);

            a0 = next_a;
            b0 = next_b;
        }

        let path = AlignmentPath::new(idx_a, idx_b)?;
        observability::record_path_len(path.len());
        Ok((path, stats))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DtwAligner;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn noise(frames: usize, dimension: usize, seed: u64) -> Vec<Vec<f32>> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..frames)
            .map(|_| (0..dimension).map(|_| rng.random_range(-1.0..1.0)).collect())
            .collect()
    }

    fn sequence(frames: &[Vec<f32>]) -> FeatureSequence {
        FeatureSequence::from_frames(frames).unwrap()
    }

    fn assert_monotonic(path: &AlignmentPath) {
        assert_eq!(path.idx_a().len(), path.idx_b().len());
        assert_eq!((path.idx_a()[0], path.idx_b()[0]), (0, 0));
        for w in path.idx_a().windows(2) {
            assert!(w[1] >= w[0], "idx_a decreased: {:?}", w);
        }
        for w in path.idx_b().windows(2) {
            assert!(w[1] >= w[0], "idx_b decreased: {:?}", w);
        }
    }

    #[test]
    fn test_small_window_equals_direct_alignment() {
        let a = sequence(&noise(40, 3, 1));
        let b = sequence(&noise(35, 3, 2));

        let windowed = WindowedAligner::new(DtwAligner, 64, 48).unwrap();
        let path = windowed.align(&a, &b).unwrap();
        let direct = DtwAligner.align(a.as_window(), b.as_window()).unwrap();

        assert_eq!(path.idx_a(), direct.path_a.as_slice());
        assert_eq!(path.idx_b(), direct.path_b.as_slice());
    }

    #[test]
    fn test_stitched_path_is_monotonic_and_reaches_an_end() {
        let a = sequence(&noise(300, 4, 7));
        let b = sequence(&noise(260, 4, 8));

        let windowed = WindowedAligner::new(DtwAligner, 50, 37).unwrap();
        let (path, stats) = windowed.align_with_stats(&a, &b).unwrap();

        assert_monotonic(&path);
        let (last_a, last_b) = path.last();
        assert!(last_a == a.len() - 1 || last_b == b.len() - 1);
        assert!(stats.windows > 1, "expected several windows");
    }

    #[test]
    fn test_shifted_copy_recovers_shift() {
        let base = noise(400, 5, 11);
        let shift = 17;
        let a = sequence(&base[..350]);
        let b = sequence(&base[shift..]);

        let windowed = WindowedAligner::new(DtwAligner, 80, 60).unwrap();
        let path = windowed.align(&a, &b).unwrap();

        assert_monotonic(&path);
        // Past the lead-in, A's frame k pairs with B's frame k - shift.
        let matched = path
            .points()
            .filter(|&(ia, ib)| ia >= shift && ib + shift == ia)
            .count();
        assert!(matched > 250, "only {matched} points on the shifted diagonal");
    }

    #[test]
    fn test_deterministic() {
        let a = sequence(&noise(120, 2, 3));
        let b = sequence(&noise(110, 2, 4));
        let windowed = WindowedAligner::new(DtwAligner, 30, 22).unwrap();

        assert_eq!(windowed.align(&a, &b).unwrap(), windowed.align(&a, &b).unwrap());
    }

    #[test]
    fn test_single_frame_input_gives_origin() {
        let a = sequence(&noise(1, 2, 5));
        let b = sequence(&noise(10, 2, 6));
        let path = WindowedAligner::new(DtwAligner, 8, 6)
            .unwrap()
            .align(&a, &b)
            .unwrap();
        assert_eq!(path.len(), 1);
        assert_eq!(path.last(), (0, 0));
    }

    #[test]
    fn test_empty_input_rejected() {
        let a = FeatureSequence::from_flat(2, Vec::new()).unwrap();
        let b = sequence(&noise(10, 2, 6));
        let err = WindowedAligner::new(DtwAligner, 8, 6)
            .unwrap()
            .align(&a, &b)
            .unwrap_err();
        assert_eq!(err.kind(), "alignment");
    }

    #[test]
    fn test_invalid_geometry_rejected() {
        assert!(WindowedAligner::new(DtwAligner, 1, 1).is_err());
        assert!(WindowedAligner::new(DtwAligner, 10, 0).is_err());
        assert!(WindowedAligner::new(DtwAligner, 10, 10).is_err());
    }

    #[test]
    fn test_default_config_geometry() {
        let windowed = WindowedAligner::from_config(DtwAligner, &SyncConfig::default()).unwrap();
        assert_eq!(windowed.window_frames(), 10335);
        assert_eq!(windowed.commit_steps(), 7751);
    }
}
