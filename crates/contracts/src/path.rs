//! AlignmentPath - WindowedAligner output
//!
//! Persisted as a two-row integer array: row 0 indexes sequence A, row 1
//! indexes sequence B.

use crate::SyncError;

/// Monotonic correspondence between frame indices of A and B.
///
/// Invariants (checked by [`AlignmentPath::new`]):
/// - both rows have the same non-zero length
/// - the first point is `(0, 0)`
/// - both rows are non-decreasing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignmentPath {
    idx_a: Vec<usize>,
    idx_b: Vec<usize>,
}

impl AlignmentPath {
    /// Build a path, validating its invariants.
    pub fn new(idx_a: Vec<usize>, idx_b: Vec<usize>) -> Result<Self, SyncError> {
        if idx_a.len() != idx_b.len() {
            return Err(SyncError::alignment(format!(
                "path rows differ in length: {} vs {}",
                idx_a.len(),
                idx_b.len()
            )));
        }
        match (idx_a.first(), idx_b.first()) {
            (Some(0), Some(0)) => {}
            (None, _) | (_, None) => return Err(SyncError::alignment("path is empty")),
            (Some(a), Some(b)) => {
                return Err(SyncError::alignment(format!(
                    "path must start at (0, 0), starts at ({a}, {b})"
                )))
            }
        }
        for (row, name) in [(&idx_a, "a"), (&idx_b, "b")] {
            if let Some(pos) = row.windows(2).position(|w| w[1] < w[0]) {
                return Err(SyncError::alignment(format!(
                    "path row {name} decreases at position {}",
                    pos + 1
                )));
            }
        }
        Ok(Self { idx_a, idx_b })
    }

    /// Number of points on the path
    #[inline]
    pub fn len(&self) -> usize {
        self.idx_a.len()
    }

    /// Always false for a validated path; provided for API symmetry
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.idx_a.is_empty()
    }

    /// Indices into sequence A
    #[inline]
    pub fn idx_a(&self) -> &[usize] {
        &self.idx_a
    }

    /// Indices into sequence B
    #[inline]
    pub fn idx_b(&self) -> &[usize] {
        &self.idx_b
    }

    /// Last point on the path
    pub fn last(&self) -> (usize, usize) {
        // Non-empty by construction
        let n = self.idx_a.len() - 1;
        (self.idx_a[n], self.idx_b[n])
    }

    /// Iterate over `(a, b)` pairs
    pub fn points(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.idx_a.iter().copied().zip(self.idx_b.iter().copied())
    }

    /// Split into the two rows
    pub fn into_rows(self) -> (Vec<usize>, Vec<usize>) {
        (self.idx_a, self.idx_b)
    }
}
