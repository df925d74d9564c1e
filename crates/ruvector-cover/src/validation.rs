//! Input validation for base graphs and cover parameters.
//!
//! All validation functions run eagerly before any computation begins, so
//! callers receive clear diagnostics instead of silently truncated loop
//! counts or asymmetric covers. Every public function returns
//! [`ValidationError`] on failure, which converts into
//! [`CoverError::InvalidInput`](crate::error::CoverError::InvalidInput) via
//! `From`.
//!
//! # Limits
//!
//! | Resource            | Limit        | Constant          |
//! |---------------------|--------------|-------------------|
//! | Cover vertices      | 10,000,000   | [`MAX_NODES`]     |
//! | Stored entries      | 100,000,000  | [`MAX_EDGES`]     |

use crate::error::ValidationError;
use crate::types::CsrMatrix;

// ---------------------------------------------------------------------------
// Resource limits
// ---------------------------------------------------------------------------

/// Maximum number of vertices of a base graph or cover.
pub const MAX_NODES: usize = 10_000_000;

/// Maximum number of stored entries in a cover adjacency matrix.
pub const MAX_EDGES: usize = 100_000_000;

// ---------------------------------------------------------------------------
// CSR structure
// ---------------------------------------------------------------------------

/// Validate the structural integrity of a CSR matrix.
///
/// Checks, in order:
///
/// 1. `rows` and `cols` are within [`MAX_NODES`].
/// 2. `row_ptr` length equals `rows + 1`, starts at 0, and is monotonically
///    non-decreasing.
/// 3. `row_ptr[rows]`, `col_indices.len()` and `values.len()` agree.
/// 4. All column indices are less than `cols` and strictly increasing within
///    each row.
/// 5. No `NaN` or `Inf` values.
///
/// # Errors
///
/// Returns [`ValidationError`] describing the first violation found.
///
/// # Examples
///
/// ```
/// use ruvector_cover::types::CsrMatrix;
/// use ruvector_cover::validation::validate_csr_matrix;
///
/// let m = CsrMatrix::from_coo(2, 2, vec![(0, 0, 1.0), (1, 1, 2.0)]);
/// assert!(validate_csr_matrix(&m).is_ok());
/// ```
pub fn validate_csr_matrix(matrix: &CsrMatrix<f64>) -> Result<(), ValidationError> {
    let largest = matrix.rows.max(matrix.cols);
    if largest > MAX_NODES {
        return Err(ValidationError::MatrixTooLarge {
            dim: largest,
            max_dim: MAX_NODES,
        });
    }

    if matrix.row_ptr.len() != matrix.rows + 1 {
        return Err(ValidationError::DimensionMismatch(format!(
            "row_ptr length {} does not equal rows + 1 = {}",
            matrix.row_ptr.len(),
            matrix.rows + 1,
        )));
    }
    if matrix.row_ptr[0] != 0 {
        return Err(ValidationError::DimensionMismatch(format!(
            "row_ptr[0] = {} (expected 0)",
            matrix.row_ptr[0],
        )));
    }
    for i in 1..matrix.row_ptr.len() {
        if matrix.row_ptr[i] < matrix.row_ptr[i - 1] {
            return Err(ValidationError::DimensionMismatch(format!(
                "row_ptr is not monotonically non-decreasing at position {}",
                i,
            )));
        }
    }

    let nnz = matrix.values.len();
    if nnz > MAX_EDGES {
        return Err(ValidationError::DimensionMismatch(format!(
            "nnz {} exceeds maximum allowed {}",
            nnz, MAX_EDGES,
        )));
    }
    if matrix.row_ptr[matrix.rows] != nnz || matrix.col_indices.len() != nnz {
        return Err(ValidationError::DimensionMismatch(format!(
            "row_ptr[rows] = {}, col_indices length {}, values length {}",
            matrix.row_ptr[matrix.rows],
            matrix.col_indices.len(),
            nnz,
        )));
    }

    for row in 0..matrix.rows {
        let mut prev_col: Option<usize> = None;
        for (col, &value) in matrix.row_entries(row) {
            if col >= matrix.cols {
                return Err(ValidationError::DimensionMismatch(format!(
                    "column index {} out of bounds for {} columns (row {})",
                    col, matrix.cols, row,
                )));
            }
            if prev_col.is_some_and(|pc| col <= pc) {
                return Err(ValidationError::DimensionMismatch(format!(
                    "column indices in row {} are not strictly increasing",
                    row,
                )));
            }
            if !value.is_finite() {
                return Err(ValidationError::NonFiniteValue(format!(
                    "matrix[{}, {}] = {}",
                    row, col, value,
                )));
            }
            prev_col = Some(col);
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Base graph validation
// ---------------------------------------------------------------------------

/// Validate a base-graph adjacency matrix.
///
/// Beyond [`validate_csr_matrix`], a base graph must be:
///
/// 1. square with at least one vertex;
/// 2. non-negative;
/// 3. integer-valued off the diagonal (edge multiplicities);
/// 4. even-integer-valued on the diagonal (each loop counts twice);
/// 5. exactly symmetric.
///
/// # Errors
///
/// Returns [`ValidationError`] describing the first violation found.
pub fn validate_base_adjacency(matrix: &CsrMatrix<f64>) -> Result<(), ValidationError> {
    if !matrix.is_square() {
        return Err(ValidationError::NotSquare {
            rows: matrix.rows,
            cols: matrix.cols,
        });
    }
    if matrix.rows == 0 {
        return Err(ValidationError::Empty);
    }
    validate_csr_matrix(matrix)?;

    for (row, col, &value) in matrix.triplets() {
        if value < 0.0 {
            return Err(ValidationError::NegativeEntry { row, col, value });
        }
        if row == col {
            if value.fract() != 0.0 || value % 2.0 != 0.0 {
                return Err(ValidationError::OddLoopEntry { vertex: row, value });
            }
        } else if value.fract() != 0.0 {
            return Err(ValidationError::NonIntegerEntry { row, col, value });
        }
    }

    // Every stored entry is visited, so a one-sided entry is caught from the
    // side where it is stored.
    for (row, col, &upper) in matrix.triplets() {
        let lower = matrix.get(col, row);
        if upper != lower {
            return Err(ValidationError::Asymmetric {
                row,
                col,
                upper,
                lower,
            });
        }
    }

    Ok(())
}

/// Validate that a (valid) base adjacency matrix describes a simple graph:
/// no loops and no parallel edges.
///
/// # Errors
///
/// Returns [`ValidationError::NotSimple`] naming the first offending entry.
pub fn validate_simple(matrix: &CsrMatrix<f64>) -> Result<(), ValidationError> {
    for (row, col, &value) in matrix.triplets() {
        if row == col && value != 0.0 {
            return Err(ValidationError::NotSimple(format!(
                "vertex {} carries a loop",
                row,
            )));
        }
        if value > 1.0 {
            return Err(ValidationError::NotSimple(format!(
                "A[{}, {}] = {} is a multi-edge",
                row, col, value,
            )));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Parameter validation
// ---------------------------------------------------------------------------

/// Validate a cover degree against the size of the base graph.
///
/// # Errors
///
/// - [`ValidationError::ParameterOutOfRange`] if `degree == 0`.
/// - [`ValidationError::MatrixTooLarge`] if `base_size * degree` overflows or
///   exceeds [`MAX_NODES`].
pub fn validate_cover_degree(degree: usize, base_size: usize) -> Result<usize, ValidationError> {
    if degree == 0 {
        return Err(ValidationError::ParameterOutOfRange {
            name: "cover_degree".into(),
            value: "0".into(),
            expected: ">= 1".into(),
        });
    }
    match base_size.checked_mul(degree) {
        Some(n) if n <= MAX_NODES => Ok(n),
        Some(n) => Err(ValidationError::MatrixTooLarge {
            dim: n,
            max_dim: MAX_NODES,
        }),
        None => Err(ValidationError::MatrixTooLarge {
            dim: usize::MAX,
            max_dim: MAX_NODES,
        }),
    }
}

/// Validate an eigensolver window: `1 <= k <= n`.
///
/// # Errors
///
/// Returns [`ValidationError::ParameterOutOfRange`] otherwise.
pub fn validate_window(k: usize, n: usize) -> Result<(), ValidationError> {
    if k == 0 || k > n {
        return Err(ValidationError::ParameterOutOfRange {
            name: "k".into(),
            value: k.to_string(),
            expected: format!("[1, {}]", n),
        });
    }
    Ok(())
}

/// Validate a numerical tolerance: finite and strictly positive.
///
/// # Errors
///
/// Returns [`ValidationError::ParameterOutOfRange`] otherwise.
pub fn validate_tolerance(name: &str, tolerance: f64) -> Result<(), ValidationError> {
    if !tolerance.is_finite() || tolerance <= 0.0 {
        return Err(ValidationError::ParameterOutOfRange {
            name: name.into(),
            value: format!("{tolerance:.2e}"),
            expected: "finite positive value".into(),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
