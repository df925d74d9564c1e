//! Core types for random covers.
//!
//! Provides [`CsrMatrix`] for compressed sparse row storage of base and cover
//! adjacency matrices, plus the [`SignPolicy`] and [`Direction`] enums that
//! steer the extremal eigenvalue queries.

use std::fmt;
use std::str::FromStr;

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

// ---------------------------------------------------------------------------
// CsrMatrix<T>
// ---------------------------------------------------------------------------

/// Compressed Sparse Row (CSR) matrix.
///
/// Stores only non-zero entries for efficient sparse matrix-vector
/// multiplication in O(nnz) time with excellent cache locality.
///
/// # Layout
///
/// For a matrix with `m` rows and `nnz` non-zeros:
/// - `row_ptr` has length `m + 1`
/// - `col_indices` and `values` each have length `nnz`
/// - Row `i` spans indices `row_ptr[i]..row_ptr[i+1]`
/// - Column indices are sorted and unique within each row when the matrix
///   was built with [`from_coo`](CsrMatrix::from_coo)
#[derive(Debug, Clone, PartialEq)]
pub struct CsrMatrix<T> {
    /// Row pointers: `row_ptr[i]` is the start index in `col_indices`/`values`
    /// for row `i`.
    pub row_ptr: Vec<usize>,
    /// Column indices for each non-zero entry.
    pub col_indices: Vec<usize>,
    /// Values for each non-zero entry.
    pub values: Vec<T>,
    /// Number of rows.
    pub rows: usize,
    /// Number of columns.
    pub cols: usize,
}

impl<T: Copy + Default + std::ops::Mul<Output = T> + std::ops::AddAssign> CsrMatrix<T> {
    /// Sparse matrix-vector multiply: `y = A * x`.
    ///
    /// # Panics
    ///
    /// Debug-asserts that `x.len() >= self.cols` and `y.len() >= self.rows`.
    #[inline]
    pub fn spmv(&self, x: &[T], y: &mut [T]) {
        debug_assert!(
            x.len() >= self.cols,
            "spmv: x.len()={} < cols={}",
            x.len(),
            self.cols,
        );
        debug_assert!(
            y.len() >= self.rows,
            "spmv: y.len()={} < rows={}",
            y.len(),
            self.rows,
        );

        for i in 0..self.rows {
            let mut sum = T::default();
            for idx in self.row_ptr[i]..self.row_ptr[i + 1] {
                sum += self.values[idx] * x[self.col_indices[idx]];
            }
            y[i] = sum;
        }
    }
}

impl<T> CsrMatrix<T> {
    /// Number of stored entries.
    #[inline]
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// `true` if the matrix has as many rows as columns.
    #[inline]
    pub fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    /// Number of stored entries in a specific row.
    #[inline]
    pub fn row_degree(&self, row: usize) -> usize {
        self.row_ptr[row + 1] - self.row_ptr[row]
    }

    /// Iterate over `(col_index, &value)` pairs for the given row.
    #[inline]
    pub fn row_entries(&self, row: usize) -> impl Iterator<Item = (usize, &T)> {
        let start = self.row_ptr[row];
        let end = self.row_ptr[row + 1];
        self.col_indices[start..end]
            .iter()
            .copied()
            .zip(self.values[start..end].iter())
    }

    /// Iterate over every stored `(row, col, &value)` triple in row order.
    pub fn triplets(&self) -> impl Iterator<Item = (usize, usize, &T)> {
        (0..self.rows).flat_map(move |row| {
            self.row_entries(row).map(move |(col, value)| (row, col, value))
        })
    }
}

impl<T: Copy + Default> CsrMatrix<T> {
    /// Transpose: produces `A^T` in CSR form.
    ///
    /// Uses a two-pass counting sort in O(nnz + rows + cols) time. Column
    /// indices of the result stay sorted within each row.
    pub fn transpose(&self) -> CsrMatrix<T> {
        let nnz = self.nnz();
        let t_rows = self.cols;

        // Pass 1: count entries per new row (= old column).
        let mut row_ptr = vec![0usize; t_rows + 1];
        for &c in &self.col_indices {
            row_ptr[c + 1] += 1;
        }
        for i in 1..=t_rows {
            row_ptr[i] += row_ptr[i - 1];
        }

        // Pass 2: scatter entries into the transposed arrays.
        let mut col_indices = vec![0usize; nnz];
        let mut values = vec![T::default(); nnz];
        let mut cursor = row_ptr.clone();

        for row in 0..self.rows {
            for idx in self.row_ptr[row]..self.row_ptr[row + 1] {
                let c = self.col_indices[idx];
                let dest = cursor[c];
                col_indices[dest] = row;
                values[dest] = self.values[idx];
                cursor[c] += 1;
            }
        }

        CsrMatrix {
            row_ptr,
            col_indices,
            values,
            rows: t_rows,
            cols: self.rows,
        }
    }
}

impl CsrMatrix<f64> {
    /// Build a CSR matrix from COO (coordinate) triplets.
    ///
    /// Entries are sorted by (row, col) and duplicate positions are summed,
    /// so parallel arcs accumulate into edge multiplicities.
    ///
    /// # Panics
    ///
    /// Panics if a row or column index is out of bounds.
    pub fn from_coo(
        rows: usize,
        cols: usize,
        entries: impl IntoIterator<Item = (usize, usize, f64)>,
    ) -> Self {
        let mut sorted: Vec<_> = entries.into_iter().collect();
        sorted.sort_unstable_by_key(|(r, c, _)| (*r, *c));

        let mut row_ptr = vec![0usize; rows + 1];
        let mut col_indices = Vec::with_capacity(sorted.len());
        let mut values: Vec<f64> = Vec::with_capacity(sorted.len());
        let mut last: Option<(usize, usize)> = None;

        for (r, c, v) in sorted {
            assert!(r < rows, "row index {} out of bounds (rows={})", r, rows);
            assert!(c < cols, "col index {} out of bounds (cols={})", c, cols);
            if last == Some((r, c)) {
                if let Some(acc) = values.last_mut() {
                    *acc += v;
                }
                continue;
            }
            row_ptr[r + 1] += 1;
            col_indices.push(c);
            values.push(v);
            last = Some((r, c));
        }
        for i in 1..=rows {
            row_ptr[i] += row_ptr[i - 1];
        }

        Self {
            row_ptr,
            col_indices,
            values,
            rows,
            cols,
        }
    }

    /// Build a CSR matrix from a dense row-major slice of rows.
    ///
    /// Exact zeros are not stored.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::DimensionMismatch`] if the rows are ragged.
    pub fn from_dense(rows: &[Vec<f64>]) -> Result<Self, ValidationError> {
        let n_rows = rows.len();
        let n_cols = rows.first().map_or(0, Vec::len);
        let mut entries = Vec::new();
        for (i, row) in rows.iter().enumerate() {
            if row.len() != n_cols {
                return Err(ValidationError::DimensionMismatch(format!(
                    "row {} has length {} (expected {})",
                    i,
                    row.len(),
                    n_cols,
                )));
            }
            for (j, &v) in row.iter().enumerate() {
                if v != 0.0 {
                    entries.push((i, j, v));
                }
            }
        }
        Ok(Self::from_coo(n_rows, n_cols, entries))
    }

    /// Build a square identity matrix of dimension `n` in CSR format.
    pub fn identity(n: usize) -> Self {
        Self {
            row_ptr: (0..=n).collect(),
            col_indices: (0..n).collect(),
            values: vec![1.0; n],
            rows: n,
            cols: n,
        }
    }

    /// Value stored at `(row, col)`, or `0.0` if the position is empty.
    ///
    /// Relies on sorted column indices within the row.
    pub fn get(&self, row: usize, col: usize) -> f64 {
        let start = self.row_ptr[row];
        let end = self.row_ptr[row + 1];
        match self.col_indices[start..end].binary_search(&col) {
            Ok(pos) => self.values[start + pos],
            Err(_) => 0.0,
        }
    }

    /// Diagonal entries as a dense vector (length `min(rows, cols)`).
    pub fn diagonal(&self) -> Vec<f64> {
        (0..self.rows.min(self.cols)).map(|i| self.get(i, i)).collect()
    }

    /// Sum of each row's stored values.
    pub fn row_sums(&self) -> Vec<f64> {
        (0..self.rows)
            .map(|row| self.row_entries(row).map(|(_, v)| *v).sum())
            .collect()
    }

    /// Largest stored value, or `None` for an empty matrix.
    pub fn max_value(&self) -> Option<f64> {
        self.values.iter().copied().reduce(f64::max)
    }

    /// Return `A + shift * I` (square matrices only).
    ///
    /// # Panics
    ///
    /// Debug-asserts that the matrix is square.
    pub fn with_diagonal_shift(&self, shift: f64) -> CsrMatrix<f64> {
        debug_assert!(self.is_square(), "diagonal shift needs a square matrix");
        if shift == 0.0 {
            return self.clone();
        }
        let diagonal = (0..self.rows).map(|i| (i, i, shift));
        Self::from_coo(
            self.rows,
            self.cols,
            self.triplets().map(|(r, c, v)| (r, c, *v)).chain(diagonal),
        )
    }

    /// `true` if `|A[i,j] - A[j,i]| <= tol` for every stored entry.
    ///
    /// Compares against the transpose so entries present on only one side
    /// are detected.
    pub fn is_symmetric(&self, tol: f64) -> bool {
        if !self.is_square() {
            return false;
        }
        let t = self.transpose();
        for row in 0..self.rows {
            for (col, &v) in self.row_entries(row) {
                if (v - t.get(row, col)).abs() > tol {
                    return false;
                }
            }
            for (col, &v) in t.row_entries(row) {
                if (v - self.get(row, col)).abs() > tol {
                    return false;
                }
            }
        }
        true
    }

    /// Densify into an nalgebra matrix.
    ///
    /// Intended for small matrices (dense eigen-decomposition, test oracles).
    pub fn to_dense(&self) -> DMatrix<f64> {
        let mut dense = DMatrix::<f64>::zeros(self.rows, self.cols);
        for (r, c, &v) in self.triplets() {
            dense[(r, c)] += v;
        }
        dense
    }
}

// ---------------------------------------------------------------------------
// Sign policy and eigensolver direction
// ---------------------------------------------------------------------------

/// Which end of the spectrum the caller is studying.
///
/// Resolved once at the API boundary into a shift multiplier, an eigensolver
/// [`Direction`], and a sign filter for the base-spectrum cutoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignPolicy {
    /// Largest positive new eigenvalue.
    MaxPositive,
    /// Most negative new eigenvalue.
    MaxNegative,
    /// New eigenvalue of largest absolute value.
    MaxMagnitude,
}

impl SignPolicy {
    /// Shift multiplier: `+1`, `-1`, or `0`.
    #[inline]
    pub fn sign(self) -> f64 {
        match self {
            SignPolicy::MaxPositive => 1.0,
            SignPolicy::MaxNegative => -1.0,
            SignPolicy::MaxMagnitude => 0.0,
        }
    }

    /// Identity shift `sign * floor(trivial_eigenvalue / 2)`.
    ///
    /// Pushes the region of interest to one extreme of the spectrum.
    #[inline]
    pub fn identity_shift(self, trivial_eigenvalue: f64) -> f64 {
        let half = (trivial_eigenvalue / 2.0).floor();
        match self {
            SignPolicy::MaxMagnitude => 0.0,
            _ => self.sign() * half,
        }
    }

    /// Eigensolver direction that captures this end of the spectrum.
    #[inline]
    pub fn direction(self) -> Direction {
        match self {
            SignPolicy::MaxPositive => Direction::LargestAlgebraic,
            SignPolicy::MaxNegative => Direction::SmallestAlgebraic,
            SignPolicy::MaxMagnitude => Direction::LargestMagnitude,
        }
    }

    /// `true` if `value` has the sign this policy cares about.
    #[inline]
    pub fn matches_sign(self, value: f64) -> bool {
        match self {
            SignPolicy::MaxPositive => value > 0.0,
            SignPolicy::MaxNegative => value < 0.0,
            SignPolicy::MaxMagnitude => true,
        }
    }

    /// Canonical string tag.
    pub fn as_str(self) -> &'static str {
        match self {
            SignPolicy::MaxPositive => "max_positive",
            SignPolicy::MaxNegative => "max_negative",
            SignPolicy::MaxMagnitude => "max_magnitude",
        }
    }
}

impl fmt::Display for SignPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignPolicy {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "max_positive" => Ok(SignPolicy::MaxPositive),
            "max_negative" => Ok(SignPolicy::MaxNegative),
            "max_magnitude" => Ok(SignPolicy::MaxMagnitude),
            other => Err(ValidationError::UnknownSignPolicy(other.to_string())),
        }
    }
}

/// Which extreme eigenvalues an eigensolver query should return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// The `k` algebraically largest eigenvalues.
    LargestAlgebraic,
    /// The `k` algebraically smallest eigenvalues.
    SmallestAlgebraic,
    /// The `k` eigenvalues of largest absolute value.
    LargestMagnitude,
}

impl Direction {
    /// Select the `k` extreme values from `values` and return them in
    /// ascending order.
    pub fn select(self, values: &[f64], k: usize) -> Vec<f64> {
        let mut sorted = values.to_vec();
        match self {
            Direction::LargestAlgebraic => sorted.sort_by(|a, b| b.total_cmp(a)),
            Direction::SmallestAlgebraic => sorted.sort_by(|a, b| a.total_cmp(b)),
            Direction::LargestMagnitude => sorted.sort_by(|a, b| b.abs().total_cmp(&a.abs())),
        }
        sorted.truncate(k);
        sorted.sort_by(|a, b| a.total_cmp(b));
        sorted
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::LargestAlgebraic => write!(f, "largest-algebraic"),
            Direction::SmallestAlgebraic => write!(f, "smallest-algebraic"),
            Direction::LargestMagnitude => write!(f, "largest-magnitude"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_coo_sums_duplicates() {
        let m = CsrMatrix::from_coo(2, 2, vec![(0, 1, 1.0), (1, 0, 1.0), (0, 1, 1.0)]);
        assert_eq!(m.nnz(), 2);
        assert_eq!(m.get(0, 1), 2.0);
        assert_eq!(m.get(1, 0), 1.0);
        assert_eq!(m.get(0, 0), 0.0);
    }

    #[test]
    fn symmetric_detection() {
        let sym = CsrMatrix::from_coo(2, 2, vec![(0, 1, 3.0), (1, 0, 3.0)]);
        assert!(sym.is_symmetric(0.0));
        let asym = CsrMatrix::from_coo(2, 2, vec![(0, 1, 3.0)]);
        assert!(!asym.is_symmetric(0.0));
    }

    #[test]
    fn diagonal_shift_adds_to_existing_entries() {
        let m = CsrMatrix::from_coo(2, 2, vec![(0, 0, 2.0), (0, 1, 1.0), (1, 0, 1.0)]);
        let shifted = m.with_diagonal_shift(-1.5);
        assert_eq!(shifted.diagonal(), vec![0.5, -1.5]);
        assert_eq!(shifted.get(0, 1), 1.0);
    }

    #[test]
    fn sign_policy_round_trips_through_strings() {
        for policy in [
            SignPolicy::MaxPositive,
            SignPolicy::MaxNegative,
            SignPolicy::MaxMagnitude,
        ] {
            assert_eq!(policy.as_str().parse::<SignPolicy>().unwrap(), policy);
        }
        assert!(matches!(
            "largest".parse::<SignPolicy>(),
            Err(ValidationError::UnknownSignPolicy(_))
        ));
    }

    #[test]
    fn identity_shift_uses_floor_of_half() {
        assert_eq!(SignPolicy::MaxPositive.identity_shift(3.0), 1.0);
        assert_eq!(SignPolicy::MaxNegative.identity_shift(4.0), -2.0);
        assert_eq!(SignPolicy::MaxMagnitude.identity_shift(7.0), 0.0);
    }

    #[test]
    fn direction_select_returns_ascending() {
        let values = [-3.0, 1.0, 2.5, -0.5, 0.0];
        assert_eq!(Direction::LargestAlgebraic.select(&values, 2), vec![1.0, 2.5]);
        assert_eq!(Direction::SmallestAlgebraic.select(&values, 2), vec![-3.0, -0.5]);
        assert_eq!(Direction::LargestMagnitude.select(&values, 2), vec![-3.0, 2.5]);
    }
}
