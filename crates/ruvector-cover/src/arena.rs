//! Triplet arena for incremental sparse assembly.
//!
//! [`TripletArena`] accumulates `(row, col, value)` coordinates into three
//! growable buffers while a cover is being lifted, then finalises them into
//! an immutable [`CsrMatrix`] in one sort-and-merge pass. Duplicate
//! coordinates are summed on finalisation, so parallel arcs become edge
//! multiplicities.
//!
//! The arena can be [`reset`](TripletArena::reset) and reused across trials;
//! the backing buffers keep their capacity.

use crate::types::CsrMatrix;

/// Growable coordinate buffers for one sparse matrix under construction.
///
/// # Example
///
/// ```
/// use ruvector_cover::arena::TripletArena;
///
/// let mut arena = TripletArena::with_capacity(3, 8);
/// arena.push_symmetric(0, 1, 1.0);
/// arena.push_symmetric(0, 1, 1.0);
/// arena.push_diagonal(0.5);
/// assert_eq!(arena.len(), 7);
///
/// let m = arena.finish();
/// assert_eq!(m.get(0, 1), 2.0);
/// assert_eq!(m.get(2, 2), 0.5);
/// ```
#[derive(Debug, Clone)]
pub struct TripletArena {
    dim: usize,
    rows: Vec<usize>,
    cols: Vec<usize>,
    values: Vec<f64>,
}

impl TripletArena {
    /// Create an arena for a `dim x dim` matrix with room for `capacity`
    /// triplets before reallocating.
    pub fn with_capacity(dim: usize, capacity: usize) -> Self {
        Self {
            dim,
            rows: Vec::with_capacity(capacity),
            cols: Vec::with_capacity(capacity),
            values: Vec::with_capacity(capacity),
        }
    }

    /// Matrix dimension this arena assembles.
    #[inline]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of triplets pushed so far (before duplicate merging).
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// `true` if nothing has been pushed.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Append one coordinate.
    ///
    /// # Panics
    ///
    /// Debug-asserts that both indices are below [`dim`](Self::dim).
    #[inline]
    pub fn push(&mut self, row: usize, col: usize, value: f64) {
        debug_assert!(row < self.dim && col < self.dim, "triplet ({row}, {col}) out of bounds");
        self.rows.push(row);
        self.cols.push(col);
        self.values.push(value);
    }

    /// Append `(row, col, value)` and its mirror `(col, row, value)`.
    ///
    /// For `row == col` this contributes `2 * value` to the diagonal, which
    /// matches the convention that a loop counts twice.
    #[inline]
    pub fn push_symmetric(&mut self, row: usize, col: usize, value: f64) {
        self.push(row, col, value);
        self.push(col, row, value);
    }

    /// Add `shift` to every diagonal position. A zero shift pushes nothing.
    pub fn push_diagonal(&mut self, shift: f64) {
        if shift == 0.0 {
            return;
        }
        self.reserve(self.dim);
        for i in 0..self.dim {
            self.push(i, i, shift);
        }
    }

    /// Reserve room for `additional` more triplets.
    pub fn reserve(&mut self, additional: usize) {
        self.rows.reserve(additional);
        self.cols.reserve(additional);
        self.values.reserve(additional);
    }

    /// Clear the buffers, keeping their capacity.
    pub fn reset(&mut self) {
        self.rows.clear();
        self.cols.clear();
        self.values.clear();
    }

    /// Finalise into a CSR matrix, summing duplicate coordinates.
    ///
    /// Leaves the arena empty and ready for reuse.
    pub fn finish(&mut self) -> CsrMatrix<f64> {
        let entries = self
            .rows
            .drain(..)
            .zip(self.cols.drain(..))
            .zip(self.values.drain(..))
            .map(|((r, c), v)| (r, c, v));
        CsrMatrix::from_coo(self.dim, self.dim, entries.collect::<Vec<_>>())
    }
}
