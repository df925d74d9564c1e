//! Extremal eigenvalue engines.
//!
//! The extraction pipeline only needs a handful of extreme eigenvalues of a
//! symmetric sparse matrix. [`ExtremalEigensolver`] is that contract; this
//! module provides the dense engine and the size-based router, and
//! [`lanczos`](crate::lanczos) provides the sparse engine.
//!
//! | Engine | Method | Use |
//! |--------|--------|-----|
//! | [`DenseEigensolver`] | nalgebra `SymmetricEigen` on the densified matrix | small matrices, full spectra |
//! | [`LanczosEigensolver`] | Lanczos with full reorthogonalisation | large sparse matrices |
//! | [`AutoEigensolver`] | dense below a size threshold, Lanczos above | default |

use nalgebra::SymmetricEigen;
use tracing::{debug, instrument};

use crate::error::{CoverError, ValidationError};
use crate::lanczos::LanczosEigensolver;
use crate::types::{CsrMatrix, Direction};
use crate::validation::{validate_csr_matrix, validate_window};

/// Largest dimension the dense engine accepts.
pub const MAX_DENSE_DIM: usize = 20_000;

/// Capability: return the `k` extreme eigenvalues of a symmetric matrix.
pub trait ExtremalEigensolver: Send + Sync {
    /// The `k` eigenvalues at the `direction` end of the spectrum, in
    /// ascending order.
    ///
    /// # Errors
    ///
    /// - [`ValidationError::ParameterOutOfRange`] unless `1 <= k <= n`.
    /// - [`ValidationError::NotSquare`] or a structural CSR error.
    /// - [`CoverError::NonConvergence`] if an iterative engine gives up.
    fn extremal_eigenvalues(
        &self,
        matrix: &CsrMatrix<f64>,
        k: usize,
        direction: Direction,
    ) -> Result<Vec<f64>, CoverError>;

    /// Engine name for logs.
    fn name(&self) -> &'static str;
}

impl<T: ExtremalEigensolver + ?Sized> ExtremalEigensolver for &T {
    fn extremal_eigenvalues(
        &self,
        matrix: &CsrMatrix<f64>,
        k: usize,
        direction: Direction,
    ) -> Result<Vec<f64>, CoverError> {
        (**self).extremal_eigenvalues(matrix, k, direction)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

/// Shared argument checks for every engine.
pub(crate) fn validate_query(matrix: &CsrMatrix<f64>, k: usize) -> Result<(), ValidationError> {
    if !matrix.is_square() {
        return Err(ValidationError::NotSquare {
            rows: matrix.rows,
            cols: matrix.cols,
        });
    }
    validate_csr_matrix(matrix)?;
    validate_window(k, matrix.rows)
}

/// All eigenvalues of a symmetric matrix, ascending.
///
/// # Errors
///
/// [`ValidationError::NotSquare`], a structural CSR error, or
/// [`ValidationError::MatrixTooLarge`] above [`MAX_DENSE_DIM`].
#[instrument(skip(matrix), fields(n = matrix.rows, nnz = matrix.nnz()))]
pub fn full_spectrum(matrix: &CsrMatrix<f64>) -> Result<Vec<f64>, CoverError> {
    if !matrix.is_square() {
        return Err(ValidationError::NotSquare {
            rows: matrix.rows,
            cols: matrix.cols,
        }
        .into());
    }
    validate_csr_matrix(matrix)?;
    if matrix.rows > MAX_DENSE_DIM {
        return Err(ValidationError::MatrixTooLarge {
            dim: matrix.rows,
            max_dim: MAX_DENSE_DIM,
        }
        .into());
    }
    if matrix.rows == 0 {
        return Ok(Vec::new());
    }

    let eig = SymmetricEigen::new(matrix.to_dense());
    let mut values: Vec<f64> = eig.eigenvalues.iter().copied().collect();
    values.sort_by(|a, b| a.total_cmp(b));
    debug!(
        min = values.first().copied(),
        max = values.last().copied(),
        "dense spectrum"
    );
    Ok(values)
}

/// Exact engine: full dense decomposition, then selection.
#[derive(Debug, Clone, Copy, Default)]
pub struct DenseEigensolver;

impl ExtremalEigensolver for DenseEigensolver {
    fn extremal_eigenvalues(
        &self,
        matrix: &CsrMatrix<f64>,
        k: usize,
        direction: Direction,
    ) -> Result<Vec<f64>, CoverError> {
        validate_query(matrix, k)?;
        let spectrum = full_spectrum(matrix)?;
        Ok(direction.select(&spectrum, k))
    }

    fn name(&self) -> &'static str {
        "dense"
    }
}

/// Size-based router between the dense and Lanczos engines.
///
/// # Example
///
/// ```
/// use ruvector_cover::eigensolver::{AutoEigensolver, ExtremalEigensolver};
/// use ruvector_cover::graph::BaseGraph;
/// use ruvector_cover::types::Direction;
///
/// let k4 = BaseGraph::complete(4).unwrap();
/// let top = AutoEigensolver::default()
///     .extremal_eigenvalues(k4.adjacency(), 1, Direction::LargestAlgebraic)
///     .unwrap();
/// assert!((top[0] - 3.0).abs() < 1e-10);
/// ```
#[derive(Debug, Clone)]
pub struct AutoEigensolver {
    /// Matrices with at most this many rows use the dense engine.
    ///
    /// Default: `400`.
    pub dense_threshold: usize,
    /// Engine for everything larger.
    pub lanczos: LanczosEigensolver,
}

impl Default for AutoEigensolver {
    fn default() -> Self {
        Self {
            dense_threshold: 400,
            lanczos: LanczosEigensolver::default(),
        }
    }
}

impl ExtremalEigensolver for AutoEigensolver {
    fn extremal_eigenvalues(
        &self,
        matrix: &CsrMatrix<f64>,
        k: usize,
        direction: Direction,
    ) -> Result<Vec<f64>, CoverError> {
        if matrix.rows <= self.dense_threshold {
            DenseEigensolver.extremal_eigenvalues(matrix, k, direction)
        } else {
            self.lanczos.extremal_eigenvalues(matrix, k, direction)
        }
    }

    fn name(&self) -> &'static str {
        "auto"
    }
}
