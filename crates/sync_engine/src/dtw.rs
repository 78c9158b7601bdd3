//! Elementary dynamic time warping over two bounded windows.

use std::sync::Arc;

use contracts::{FeatureWindow, SyncError};
use nalgebra::DMatrix;

/// Result of one elementary alignment.
///
/// `path_a` / `path_b` are local to the windows that were aligned and run
/// from `(0, 0)` to `(len_a - 1, len_b - 1)`.
#[derive(Debug, Clone)]
pub struct LocalAlignment {
    /// Accumulated cost at the path end
    pub total_cost: f64,
    /// Accumulated cost matrix (`len_a × len_b`)
    pub cost_matrix: DMatrix<f64>,
    pub path_a: Vec<usize>,
    pub path_b: Vec<usize>,
}

impl LocalAlignment {
    /// Number of path points
    pub fn len(&self) -> usize {
        self.path_a.len()
    }

    pub fn is_empty(&self) -> bool {
        self.path_a.is_empty()
    }
}

/// Minimum-cost monotonic correspondence between two feature windows.
///
/// Implementations must be pure: identical windows give identical paths.
pub trait ElementaryAligner: Send + Sync {
    fn align(
        &self,
        a: FeatureWindow<'_>,
        b: FeatureWindow<'_>,
    ) -> Result<LocalAlignment, SyncError>;
}

impl<T: ElementaryAligner + ?Sized> ElementaryAligner for Arc<T> {
    fn align(
        &self,
        a: FeatureWindow<'_>,
        b: FeatureWindow<'_>,
    ) -> Result<LocalAlignment, SyncError> {
        (**self).align(a, b)
    }
}

impl<T: ElementaryAligner + ?Sized> ElementaryAligner for Box<T> {
    fn align(
        &self,
        a: FeatureWindow<'_>,
        b: FeatureWindow<'_>,
    ) -> Result<LocalAlignment, SyncError> {
        (**self).align(a, b)
    }
}

/// Classic O(n·m) DTW with Euclidean frame distance.
///
/// Ties are broken diagonal first, then `(i-1, j)`, then `(i, j-1)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DtwAligner;

impl DtwAligner {
    pub fn new() -> Self {
        Self
    }
}

impl ElementaryAligner for DtwAligner {
    fn align(
        &self,
        a: FeatureWindow<'_>,
        b: FeatureWindow<'_>,
    ) -> Result<LocalAlignment, SyncError> {
        if a.is_empty() || b.is_empty() {
            return Err(SyncError::alignment(format!(
                "cannot align empty window ({} x {} frames)",
                a.len(),
                b.len()
            )));
        }
        if a.dimension() != b.dimension() {
            return Err(SyncError::alignment(format!(
                "feature dimensions differ: {} vs {}",
                a.dimension(),
                b.dimension()
            )));
        }

        let (n, m) = (a.len(), b.len());
        let mut acc = DMatrix::<f64>::zeros(n, m);

        // Column-major storage: walk j outer so the inner loop is contiguous.
        for j in 0..m {
            let fb = b.frame(j);
            for i in 0..n {
                let d = euclidean(a.frame(i), fb);
                let best = best_predecessor(&acc, i, j).map_or(0.0, |(_, cost)| cost);
                acc[(i, j)] = d + best;
            }
        }

        let (path_a, path_b) = backtrack(&acc);

        Ok(LocalAlignment {
            total_cost: acc[(n - 1, m - 1)],
            cost_matrix: acc,
            path_a,
            path_b,
        })
    }
}

/// Euclidean distance between two frames, accumulated in f64
#[inline]
pub fn euclidean(x: &[f32], y: &[f32]) -> f64 {
    x.iter()
        .zip(y)
        .map(|(&p, &q)| {
            let d = p as f64 - q as f64;
            d * d
        })
        .sum::<f64>()
        .sqrt()
}

/// Cheapest already-filled predecessor of `(i, j)`, or `None` at the origin.
#[inline]
fn best_predecessor(acc: &DMatrix<f64>, i: usize, j: usize) -> Option<((usize, usize), f64)> {
    let candidates = [
        (i > 0 && j > 0).then(|| (i - 1, j - 1)),
        (i > 0).then(|| (i - 1, j)),
        (j > 0).then(|| (i, j - 1)),
    ];

    let mut best: Option<((usize, usize), f64)> = None;
    for cell in candidates.into_iter().flatten() {
        let cost = acc[cell];
        match best {
            Some((_, current)) if cost >= current => {}
            _ => best = Some((cell, cost)),
        }
    }
    best
}

fn backtrack(acc: &DMatrix<f64>) -> (Vec<usize>, Vec<usize>) {
    let (n, m) = acc.shape();
    let mut path_a = Vec::with_capacity(n + m);
    let mut path_b = Vec::with_capacity(n + m);

    let mut cell = (n - 1, m - 1);
    path_a.push(cell.0);
    path_b.push(cell.1);
    while let Some((prev, _)) = best_predecessor(acc, cell.0, cell.1) {
        cell = prev;
        path_a.push(cell.0);
        path_b.push(cell.1);
    }

    path_a.reverse();
    path_b.reverse();
    (path_a, path_b)
}
