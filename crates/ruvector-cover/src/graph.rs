//! Validated base graphs.
//!
//! A [`BaseGraph`] is the small seed graph whose random covers are studied.
//! It wraps a symmetric, non-negative, integer-weighted adjacency matrix in
//! which off-diagonal entries count parallel edges and diagonal entries
//! count each loop twice.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::types::CsrMatrix;
use crate::validation::{validate_base_adjacency, validate_simple};

/// One undirected base edge fibre and how many lift bundles it needs.
///
/// Produced by [`BaseGraph::edge_bundles`] with `high >= low`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeBundle {
    /// Larger endpoint.
    pub high: usize,
    /// Smaller endpoint (equal to `high` for a loop).
    pub low: usize,
    /// Number of independent permutations to draw for this pair: the edge
    /// multiplicity, or half the diagonal entry for a loop.
    pub bundles: usize,
}

impl EdgeBundle {
    /// `true` for a loop at a single vertex.
    #[inline]
    pub fn is_loop(&self) -> bool {
        self.high == self.low
    }
}

/// A validated base graph.
///
/// # Example
///
/// ```
/// use ruvector_cover::graph::BaseGraph;
///
/// let k4 = BaseGraph::complete(4).unwrap();
/// assert_eq!(k4.size(), 4);
/// assert_eq!(k4.edge_bundles().len(), 6);
/// assert!(k4.is_simple());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct BaseGraph {
    adjacency: CsrMatrix<f64>,
}

impl BaseGraph {
    /// Wrap an adjacency matrix after validating it.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] if the matrix is not square, empty,
    /// asymmetric, negative, non-integer, or has an odd diagonal entry.
    pub fn from_csr(adjacency: CsrMatrix<f64>) -> Result<Self, ValidationError> {
        validate_base_adjacency(&adjacency)?;
        Ok(Self { adjacency })
    }

    /// Build from dense rows.
    ///
    /// # Errors
    ///
    /// See [`from_csr`](Self::from_csr); ragged rows are a
    /// [`ValidationError::DimensionMismatch`].
    pub fn from_dense(rows: &[Vec<f64>]) -> Result<Self, ValidationError> {
        Self::from_csr(CsrMatrix::from_dense(rows)?)
    }

    /// Build a graph on `n` vertices from an undirected edge list.
    ///
    /// Repeated pairs become parallel edges; `(v, v)` adds one loop at `v`
    /// (diagonal entry 2).
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::DimensionMismatch`] for an endpoint
    /// `>= n`, plus anything [`from_csr`](Self::from_csr) rejects.
    pub fn from_edges(n: usize, edges: &[(usize, usize)]) -> Result<Self, ValidationError> {
        let mut entries = Vec::with_capacity(edges.len() * 2);
        for &(u, v) in edges {
            if u >= n || v >= n {
                return Err(ValidationError::DimensionMismatch(format!(
                    "edge ({}, {}) out of bounds for {} vertices",
                    u, v, n,
                )));
            }
            entries.push((u, v, 1.0));
            entries.push((v, u, 1.0));
        }
        Self::from_csr(CsrMatrix::from_coo(n, n, entries))
    }

    /// The one-vertex graph carrying `degree / 2` loops.
    ///
    /// Its `size`-fold covers are the `degree`-regular graphs on `size`
    /// vertices.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::OddLoopEntry`] if `degree` is odd.
    pub fn loop_graph(degree: usize) -> Result<Self, ValidationError> {
        Self::from_csr(CsrMatrix::from_coo(1, 1, vec![(0, 0, degree as f64)]))
    }

    /// The complete graph `K_n`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::Empty`] for `n == 0`.
    pub fn complete(n: usize) -> Result<Self, ValidationError> {
        let entries = (0..n).flat_map(|i| (0..n).filter(move |&j| j != i).map(move |j| (i, j, 1.0)));
        Self::from_csr(CsrMatrix::from_coo(n, n, entries))
    }

    /// The cycle `C_n` (`n >= 3`).
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::ParameterOutOfRange`] for `n < 3`.
    pub fn cycle(n: usize) -> Result<Self, ValidationError> {
        if n < 3 {
            return Err(ValidationError::ParameterOutOfRange {
                name: "cycle_length".into(),
                value: n.to_string(),
                expected: ">= 3".into(),
            });
        }
        let edges: Vec<(usize, usize)> = (0..n).map(|i| (i, (i + 1) % n)).collect();
        Self::from_edges(n, &edges)
    }

    /// Number of vertices.
    #[inline]
    pub fn size(&self) -> usize {
        self.adjacency.rows
    }

    /// The validated adjacency matrix.
    #[inline]
    pub fn adjacency(&self) -> &CsrMatrix<f64> {
        &self.adjacency
    }

    /// Consume the graph, returning its adjacency matrix.
    pub fn into_adjacency(self) -> CsrMatrix<f64> {
        self.adjacency
    }

    /// Sum of all adjacency entries (twice the number of edges, loops
    /// included).
    pub fn total_weight(&self) -> f64 {
        self.adjacency.values.iter().sum()
    }

    /// Row sums of the adjacency matrix (vertex degrees, loops counted
    /// twice).
    pub fn degrees(&self) -> Vec<f64> {
        self.adjacency.row_sums()
    }

    /// `true` if every vertex has the same degree.
    pub fn is_regular(&self) -> bool {
        let degrees = self.degrees();
        degrees.windows(2).all(|w| w[0] == w[1])
    }

    /// `true` if there are no loops and no parallel edges.
    pub fn is_simple(&self) -> bool {
        validate_simple(&self.adjacency).is_ok()
    }

    /// Enumerate each undirected pair once (lower triangle including the
    /// diagonal) with its number of lift bundles.
    ///
    /// Ordered by `(high, low)`.
    pub fn edge_bundles(&self) -> Vec<EdgeBundle> {
        self.adjacency
            .triplets()
            .filter(|&(row, col, _)| col <= row)
            .map(|(row, col, &value)| {
                // Validation guarantees whole (and, on the diagonal, even)
                // non-negative values.
                let count = if row == col { value / 2.0 } else { value };
                EdgeBundle {
                    high: row,
                    low: col,
                    bundles: count as usize,
                }
            })
            .filter(|bundle| bundle.bundles > 0)
            .collect()
    }
}
