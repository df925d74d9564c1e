//! Shared test helpers for the ruvector-cover integration test suite.
//!
//! Provides deterministic random base graphs, a dense reference
//! eigensolver, fixed permutation generators, and spectrum comparison
//! utilities used across all test modules.

#![allow(dead_code)]

use nalgebra::{DMatrix, SymmetricEigen};
use rand::Rng;
use ruvector_cover::error::CoverError;
use ruvector_cover::graph::BaseGraph;
use ruvector_cover::permutation::{Permutation, PermutationGenerator};
use ruvector_cover::types::CsrMatrix;

// ---------------------------------------------------------------------------
// Random number generator (simple LCG for deterministic reproducibility)
// ---------------------------------------------------------------------------

/// A minimal linear congruential generator for deterministic test data.
///
/// Independent of `rand`, so test graphs stay fixed across `rand` upgrades.
pub struct Lcg {
    state: u64,
}

impl Lcg {
    /// Create a new LCG with the given seed.
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Generate the next u64 value.
    pub fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.state
    }

    /// Generate a uniform f64 in [0, 1).
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Generate a uniform index in `0..n`.
    pub fn next_index(&mut self, n: usize) -> usize {
        (self.next_f64() * n as f64) as usize % n
    }
}

// ---------------------------------------------------------------------------
// Base graph generators
// ---------------------------------------------------------------------------

/// Random multigraph on `n` vertices with `edges` edges.
///
/// Endpoints are uniform, so loops and parallel edges occur.
pub fn random_multigraph(n: usize, edges: usize, seed: u64) -> BaseGraph {
    let mut rng = Lcg::new(seed);
    let list: Vec<(usize, usize)> = (0..edges)
        .map(|_| (rng.next_index(n), rng.next_index(n)))
        .collect();
    BaseGraph::from_edges(n, &list).unwrap()
}

/// Random simple graph on `n` vertices with edge probability `density`,
/// plus the path `0 - 1 - ... - n-1` so it is connected.
pub fn random_simple_graph(n: usize, density: f64, seed: u64) -> BaseGraph {
    let mut rng = Lcg::new(seed);
    let mut list = Vec::new();
    for i in 0..n {
        for j in (i + 1)..n {
            if j == i + 1 || rng.next_f64() < density {
                list.push((i, j));
            }
        }
    }
    BaseGraph::from_edges(n, &list).unwrap()
}

/// Disjoint union of `K_a` and `K_b` followed by `isolated` isolated
/// vertices.
pub fn two_cliques(a: usize, b: usize, isolated: usize) -> BaseGraph {
    let mut list = Vec::new();
    for (offset, size) in [(0, a), (a, b)] {
        for i in 0..size {
            for j in (i + 1)..size {
                list.push((offset + i, offset + j));
            }
        }
    }
    BaseGraph::from_edges(a + b + isolated, &list).unwrap()
}

// ---------------------------------------------------------------------------
// Fixed permutation generators
// ---------------------------------------------------------------------------

/// Always the rotation `t -> t + step (mod n)`.
///
/// With `step = 1` and `n = 2` every edge is lifted crosswise, giving the
/// bipartite double cover whose new spectrum is the negated base spectrum.
pub struct Rotation(pub usize);

impl PermutationGenerator for Rotation {
    fn generate<R: Rng + ?Sized>(
        &self,
        n: usize,
        _history: &[Permutation],
        _rng: &mut R,
    ) -> Result<Permutation, CoverError> {
        let images = (0..n).map(|t| (t + self.0) % n.max(1)).collect();
        Ok(Permutation::from_vec(images)?)
    }

    fn name(&self) -> &'static str {
        "rotation"
    }
}

// ---------------------------------------------------------------------------
// Dense reference spectra
// ---------------------------------------------------------------------------

/// All eigenvalues of a symmetric CSR matrix, ascending, via nalgebra.
pub fn dense_spectrum(matrix: &CsrMatrix<f64>) -> Vec<f64> {
    let n = matrix.rows;
    let mut dense = DMatrix::<f64>::zeros(n, n);
    for (row, col, &value) in matrix.triplets() {
        dense[(row, col)] += value;
    }
    let mut values: Vec<f64> = SymmetricEigen::new(dense).eigenvalues.iter().copied().collect();
    values.sort_by(|a, b| a.total_cmp(b));
    values
}

/// `true` if `sub` is contained in `sup` as a multiset up to `tol`.
///
/// Both inputs must be sorted ascending.
pub fn multiset_contains(sup: &[f64], sub: &[f64], tol: f64) -> bool {
    let mut used = vec![false; sup.len()];
    sub.iter().all(|&v| {
        match sup
            .iter()
            .enumerate()
            .find(|&(i, &s)| !used[i] && (s - v).abs() <= tol)
        {
            Some((i, _)) => {
                used[i] = true;
                true
            }
            None => false,
        }
    })
}

/// Check `A[i][j] == A[j][i]` exactly for every stored entry.
pub fn assert_exactly_symmetric(matrix: &CsrMatrix<f64>) {
    for (row, col, &value) in matrix.triplets() {
        assert_eq!(
            matrix.get(col, row),
            value,
            "A[{row},{col}] = {value} but A[{col},{row}] = {}",
            matrix.get(col, row)
        );
    }
}
