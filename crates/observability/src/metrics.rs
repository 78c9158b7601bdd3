//! Alignment metrics
//!
//! Thin wrappers over the `metrics` facade plus an in-memory aggregator for
//! per-window progress. Without an installed recorder every call is a no-op.

use contracts::SyncEstimate;
use metrics::{counter, gauge, histogram};

/// Record one committed alignment window.
///
/// `advance_a` / `advance_b` are the frames the window moved each pointer.
pub fn record_window_committed(advance_a: usize, advance_b: usize, percent: f64) {
    counter!("avsync_windows_total").increment(1);
    histogram!("avsync_window_advance_frames", "track" => "a").record(advance_a as f64);
    histogram!("avsync_window_advance_frames", "track" => "b").record(advance_b as f64);
    gauge!("avsync_alignment_progress_percent").set(percent);
}

/// Record the length of a finished global path
pub fn record_path_len(len: usize) {
    histogram!("avsync_alignment_path_len").record(len as f64);
}

/// Record a cache hit (artifact or in-memory path reused)
pub fn record_cache_hit(source: &'static str) {
    counter!("avsync_cache_hits_total", "source" => source).increment(1);
}

/// Record a cache miss (full computation started)
pub fn record_cache_miss() {
    counter!("avsync_cache_misses_total").increment(1);
}

/// Record how long feature extraction took for one input
pub fn record_extraction_seconds(seconds: f64) {
    histogram!("avsync_extraction_seconds").record(seconds);
}

/// Record a drift estimate
pub fn record_estimate(estimate: &SyncEstimate) {
    gauge!("avsync_estimate_slope").set(estimate.slope);
    gauge!("avsync_estimate_intercept_frames").set(estimate.intercept);
    gauge!("avsync_estimate_correlation").set(estimate.correlation);
    histogram!("avsync_estimate_stderr").record(estimate.stderr);
}

/// Record a rejected synchronization, tagged by error kind
pub fn record_rejection(kind: &'static str) {
    counter!("avsync_sync_rejected_total", "reason" => kind).increment(1);
}

/// Per-window progress aggregator
///
/// Tracks how far each window moved both pointers, and the local speed
/// ratio `advance_b / advance_a`, which exposes drift that varies along the
/// recording before the global regression averages it away.
#[derive(Debug, Clone, Default)]
pub struct AlignmentStats {
    /// Windows committed
    pub windows: u64,
    /// Frames advanced in A per window
    pub advance_a: RunningStats,
    /// Frames advanced in B per window
    pub advance_b: RunningStats,
    /// Local B/A speed ratio per window
    pub local_ratio: RunningStats,
}

impl AlignmentStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Update with one committed window
    pub fn update(&mut self, advance_a: usize, advance_b: usize) {
        self.windows += 1;
        self.advance_a.push(advance_a as f64);
        self.advance_b.push(advance_b as f64);
        if advance_a > 0 {
            self.local_ratio.push(advance_b as f64 / advance_a as f64);
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

impl std::fmt::Display for AlignmentStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Windows: {}", self.windows)?;
        writeln!(f, "Advance A (frames): {}", StatsSummary::from(&self.advance_a))?;
        writeln!(f, "Advance B (frames): {}", StatsSummary::from(&self.advance_b))?;
        write!(f, "Local B/A ratio: {}", StatsSummary::from(&self.local_ratio))
    }
}

/// Statistics summary
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online statistics (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}
