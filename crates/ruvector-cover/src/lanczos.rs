//! Sparse extremal eigenvalues by the Lanczos method.
//!
//! Builds an orthonormal Krylov basis `q_0, q_1, ...` with the three-term
//! recurrence and **full reorthogonalisation** (two Gram-Schmidt passes per
//! step), so the projected tridiagonal matrix `T_m` stays faithful even
//! after many steps. Ritz values of `T_m` are accepted once every wanted
//! value satisfies
//!
//! ```text
//! |beta_m * s_{m,i}| <= tol * max(1, |theta_i|)
//! ```
//!
//! where `s_{m,i}` is the last component of the Ritz vector.
//!
//! # Breakdown and repeated eigenvalues
//!
//! A single Krylov sequence only sees one copy of each distinct eigenvalue.
//! When the residual collapses (an invariant subspace has been found) the
//! iteration restarts from a fresh random vector orthogonal to the whole
//! basis, with a zero coupling in `T_m`. Each restart can discover one more
//! copy of a repeated eigenvalue, which matters for disconnected covers.
//! Convergence is only tested on steps that did not break down, so the
//! active block always contributes a genuine residual.
//!
//! Once the basis spans the space the Ritz values are the exact spectrum.

use nalgebra::{DMatrix, SymmetricEigen};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, trace, warn};

use crate::eigensolver::{validate_query, ExtremalEigensolver};
use crate::error::CoverError;
use crate::types::{CsrMatrix, Direction};
use crate::validation::validate_tolerance;

/// Relative residual norm below which a step counts as a breakdown.
const BREAKDOWN_TOL: f64 = 1e-10;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Tuning knobs for [`LanczosEigensolver`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanczosConfig {
    /// Relative residual tolerance for accepting a Ritz value.
    ///
    /// Default: `1e-10`.
    pub tolerance: f64,

    /// Steps between Ritz checks. Each check diagonalises `T_m`, so
    /// checking every step is wasteful for large bases.
    ///
    /// Default: `10`.
    pub check_interval: usize,

    /// Krylov dimension at which to give up with
    /// [`CoverError::NonConvergence`]. `None` lets the basis grow to the
    /// full dimension, where the answer is exact.
    ///
    /// Default: `None`.
    pub max_krylov_dim: Option<usize>,

    /// Seed for the random start and restart vectors. Fixed so repeated
    /// queries on the same matrix return identical values.
    ///
    /// Default: `0x5eed`.
    pub seed: u64,
}

impl Default for LanczosConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-10,
            check_interval: 10,
            max_krylov_dim: None,
            seed: 0x5eed,
        }
    }
}

// ---------------------------------------------------------------------------
// Vector kernels
// ---------------------------------------------------------------------------

#[inline]
fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[inline]
fn axpy(alpha: f64, x: &[f64], y: &mut [f64]) {
    for (yi, xi) in y.iter_mut().zip(x) {
        *yi += alpha * xi;
    }
}

#[inline]
fn norm(v: &[f64]) -> f64 {
    dot(v, v).sqrt()
}

/// Two classical Gram-Schmidt passes against the whole basis.
fn orthogonalise(w: &mut [f64], basis: &[Vec<f64>]) {
    for _ in 0..2 {
        for b in basis {
            let d = dot(w, b);
            axpy(-d, b, w);
        }
    }
}

/// Random unit vector orthogonal to `basis`, or `None` if every draw
/// collapsed (the basis already spans the space numerically).
fn random_unit<R: Rng + ?Sized>(n: usize, basis: &[Vec<f64>], rng: &mut R) -> Option<Vec<f64>> {
    for _ in 0..4 {
        let mut v: Vec<f64> = (0..n).map(|_| rng.gen_range(-1.0..1.0)).collect();
        orthogonalise(&mut v, basis);
        let nrm = norm(&v);
        if nrm > 1e-8 {
            v.iter_mut().for_each(|x| *x /= nrm);
            return Some(v);
        }
    }
    None
}

// ---------------------------------------------------------------------------
// Ritz extraction
// ---------------------------------------------------------------------------

/// Indices of the `k` wanted values, most extreme first.
fn wanted(direction: Direction, values: &[f64], k: usize) -> Vec<usize> {
    let mut idx: Vec<usize> = (0..values.len()).collect();
    match direction {
        Direction::LargestAlgebraic => idx.sort_by(|&a, &b| values[b].total_cmp(&values[a])),
        Direction::SmallestAlgebraic => idx.sort_by(|&a, &b| values[a].total_cmp(&values[b])),
        Direction::LargestMagnitude => {
            idx.sort_by(|&a, &b| values[b].abs().total_cmp(&values[a].abs()))
        }
    }
    idx.truncate(k);
    idx
}

/// Wanted Ritz values of `T_m` (ascending) and whether all of them pass
/// the residual test against `last_beta`.
fn ritz_values(
    alpha: &[f64],
    beta: &[f64],
    last_beta: f64,
    k: usize,
    direction: Direction,
    tol: f64,
) -> (Vec<f64>, bool) {
    let m = alpha.len();
    let mut t = DMatrix::<f64>::zeros(m, m);
    for (i, &a) in alpha.iter().enumerate() {
        t[(i, i)] = a;
    }
    for (i, &b) in beta.iter().enumerate().take(m.saturating_sub(1)) {
        t[(i, i + 1)] = b;
        t[(i + 1, i)] = b;
    }

    let eig = SymmetricEigen::new(t);
    let theta: Vec<f64> = eig.eigenvalues.iter().copied().collect();
    let picked = wanted(direction, &theta, k);
    let converged = picked.iter().all(|&i| {
        let residual = (last_beta * eig.eigenvectors[(m - 1, i)]).abs();
        residual <= tol * theta[i].abs().max(1.0)
    });

    let mut values: Vec<f64> = picked.iter().map(|&i| theta[i]).collect();
    values.sort_by(|a, b| a.total_cmp(b));
    (values, converged)
}

// ---------------------------------------------------------------------------
// LanczosEigensolver
// ---------------------------------------------------------------------------

/// Lanczos engine for large sparse symmetric matrices.
#[derive(Debug, Clone, Default)]
pub struct LanczosEigensolver {
    /// Tuning knobs.
    pub config: LanczosConfig,
}

impl LanczosEigensolver {
    /// Create an engine with the given configuration.
    pub fn new(config: LanczosConfig) -> Self {
        Self { config }
    }
}

impl ExtremalEigensolver for LanczosEigensolver {
    #[instrument(skip(self, matrix), fields(n = matrix.rows, nnz = matrix.nnz()))]
    fn extremal_eigenvalues(
        &self,
        matrix: &CsrMatrix<f64>,
        k: usize,
        direction: Direction,
    ) -> Result<Vec<f64>, CoverError> {
        validate_query(matrix, k)?;
        let tol = self.config.tolerance;
        validate_tolerance("lanczos.tolerance", tol)?;

        let n = matrix.rows;
        let max_dim = self.config.max_krylov_dim.unwrap_or(n).clamp(k, n);
        let interval = self.config.check_interval.max(1);
        let mut rng = StdRng::seed_from_u64(self.config.seed);

        let mut basis: Vec<Vec<f64>> = Vec::with_capacity(max_dim);
        let mut alpha: Vec<f64> = Vec::with_capacity(max_dim);
        // beta[j] couples basis[j] and basis[j + 1]; zero after a restart.
        let mut beta: Vec<f64> = Vec::with_capacity(max_dim);
        let mut w = vec![0.0f64; n];
        let mut scale = 0.0f64;
        let mut last_check = 0usize;
        let mut restarts = 0usize;

        let mut q = random_unit(n, &basis, &mut rng).ok_or(CoverError::NonConvergence {
            requested: k,
            krylov_dim: 0,
        })?;

        loop {
            matrix.spmv(&q, &mut w);
            let a = dot(&w, &q);
            axpy(-a, &q, &mut w);
            if let (Some(&b_prev), Some(q_prev)) = (beta.last(), basis.last()) {
                axpy(-b_prev, q_prev, &mut w);
            }
            basis.push(q);
            alpha.push(a);
            orthogonalise(&mut w, &basis);

            let b = norm(&w);
            scale = scale.max(a.abs() + b + beta.last().copied().unwrap_or(0.0));
            let m = basis.len();

            if m == n {
                let (values, _) = ritz_values(&alpha, &beta, 0.0, k, direction, tol);
                debug!(m, restarts, "krylov basis spans the space");
                return Ok(values);
            }

            let breakdown = b <= BREAKDOWN_TOL * scale.max(1.0);
            if m >= k && (m == max_dim || (!breakdown && m - last_check >= interval)) {
                last_check = m;
                let (values, converged) = ritz_values(&alpha, &beta, b, k, direction, tol);
                trace!(m, converged, "ritz check");
                if converged {
                    debug!(m, restarts, "lanczos converged");
                    return Ok(values);
                }
            }
            if m == max_dim {
                return Err(CoverError::NonConvergence {
                    requested: k,
                    krylov_dim: m,
                });
            }

            if breakdown {
                restarts += 1;
                if restarts == 1 {
                    warn!(m, residual = b, "lanczos breakdown, restarting orthogonal to the basis");
                } else {
                    trace!(m, restarts, "lanczos restart");
                }
                beta.push(0.0);
                q = random_unit(n, &basis, &mut rng).ok_or(CoverError::NonConvergence {
                    requested: k,
                    krylov_dim: m,
                })?;
            } else {
                beta.push(b);
                q = w.iter().map(|x| x / b).collect();
            }
        }
    }

    fn name(&self) -> &'static str {
        "lanczos"
    }
}
