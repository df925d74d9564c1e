//! Random cover construction.
//!
//! [`build_cover`] lifts a [`BaseGraph`] to a `degree`-fold cover: every base
//! vertex `i` becomes the fibre `degree*i .. degree*(i+1)` and every lift
//! bundle of a base edge `{i, j}` becomes the perfect matching
//! `degree*i + t <-> degree*j + p(t)` for a freshly drawn permutation `p`.
//!
//! [`build_matrix_cover`] replaces permutation matrices with orthogonal
//! blocks drawn from a [`MatrixGenerator`].
//!
//! Both assemble into a [`TripletArena`] and finalise once, so the output is
//! a sorted, duplicate-free [`CsrMatrix`] that is exactly symmetric.

use rand::Rng;
use tracing::{debug, instrument};

use crate::arena::TripletArena;
use crate::error::{CoverError, ValidationError};
use crate::graph::BaseGraph;
use crate::permutation::{Derangement, DerangementAvoidingSet, PermutationGenerator};
use crate::representation::MatrixGenerator;
use crate::types::CsrMatrix;
use crate::validation::{validate_cover_degree, validate_simple, MAX_NODES};

fn validate_shift(identity_shift: f64) -> Result<(), ValidationError> {
    if !identity_shift.is_finite() {
        return Err(ValidationError::NonFiniteValue(format!(
            "identity_shift = {identity_shift}"
        )));
    }
    Ok(())
}

/// Build a random `degree`-fold cover of `base` and add `identity_shift`
/// to every diagonal entry.
///
/// Each undirected base pair `{high, low}` with `b` lift bundles draws `b`
/// permutations from `generator`. The history handed to the generator is
/// the list of permutations already drawn for the same pair, so
/// avoiding-set policies keep parallel lifts of one edge disjoint.
///
/// The result has `base.size() * degree` rows, entries summing to
/// `degree * base.total_weight()` off the shift, and every row sum equal to
/// the base degree of its fibre (plus the shift).
///
/// # Errors
///
/// - [`ValidationError`] for `degree == 0`, an oversized cover or a
///   non-finite shift.
/// - Whatever the generator raises (for example
///   [`CoverError::DerangementImpossible`]).
#[instrument(
    skip(base, generator, rng),
    fields(base_size = base.size(), policy = generator.name())
)]
pub fn build_cover<G, R>(
    base: &BaseGraph,
    degree: usize,
    generator: &G,
    identity_shift: f64,
    rng: &mut R,
) -> Result<CsrMatrix<f64>, CoverError>
where
    G: PermutationGenerator + ?Sized,
    R: Rng + ?Sized,
{
    let n = validate_cover_degree(degree, base.size())?;
    validate_shift(identity_shift)?;

    let bundles = base.edge_bundles();
    let lifts: usize = bundles.iter().map(|b| b.bundles).sum();
    let mut arena = TripletArena::with_capacity(n, 2 * lifts * degree + n);
    let mut history = Vec::new();

    for bundle in &bundles {
        history.clear();
        let high = bundle.high * degree;
        let low = bundle.low * degree;
        for _ in 0..bundle.bundles {
            let p = generator.generate(degree, &history, rng)?;
            for (t, &image) in p.as_slice().iter().enumerate() {
                arena.push_symmetric(high + t, low + image, 1.0);
            }
            history.push(p);
        }
    }
    arena.push_diagonal(identity_shift);

    let cover = arena.finish();
    debug!(n, nnz = cover.nnz(), lifts, "cover assembled");
    Ok(cover)
}

/// Build the block cover of a simple base graph.
///
/// For every base edge `{high, low}` with `high > low` a block `B` is drawn
/// and written as `B` at block position `(low, high)` and `B^T` at
/// `(high, low)`, so the result is symmetric. The diagonal is shifted by
/// `identity_shift`.
///
/// # Errors
///
/// - [`ValidationError::NotSimple`] if the base has loops or multi-edges.
/// - [`ValidationError::DimensionMismatch`] if a drawn block is not
///   `block_size x block_size`.
/// - [`ValidationError::MatrixTooLarge`] / non-finite shift as for
///   [`build_cover`].
#[instrument(
    skip(base, generator, rng),
    fields(base_size = base.size(), generator = generator.name())
)]
pub fn build_matrix_cover<M, R>(
    base: &BaseGraph,
    generator: &M,
    identity_shift: f64,
    rng: &mut R,
) -> Result<CsrMatrix<f64>, CoverError>
where
    M: MatrixGenerator + ?Sized,
    R: Rng + ?Sized,
{
    validate_simple(base.adjacency())?;
    validate_shift(identity_shift)?;
    let s = generator.block_size();
    let n = validate_cover_degree(s, base.size())?;

    let edges = base.edge_bundles();
    let mut arena = TripletArena::with_capacity(n, 2 * edges.len() * s * s + n);

    for edge in &edges {
        let block = generator.generate(rng);
        if block.nrows() != s || block.ncols() != s {
            return Err(ValidationError::DimensionMismatch(format!(
                "generator '{}' produced a {}x{} block (expected {}x{})",
                generator.name(),
                block.nrows(),
                block.ncols(),
                s,
                s,
            ))
            .into());
        }
        let upper = edge.low * s;
        let lower = edge.high * s;
        for r in 0..s {
            for c in 0..s {
                let value = block[(r, c)];
                if value != 0.0 {
                    arena.push(upper + r, lower + c, value);
                    arena.push(lower + c, upper + r, value);
                }
            }
        }
    }
    arena.push_diagonal(identity_shift);

    let cover = arena.finish();
    debug!(n, nnz = cover.nnz(), edges = edges.len(), "matrix cover assembled");
    Ok(cover)
}

/// Random `deg`-regular graph on `size` vertices: a `size`-fold derangement
/// lift of the one-vertex loop graph.
///
/// The result has no loops but may have parallel edges.
///
/// # Errors
///
/// [`ValidationError::OddLoopEntry`] for odd `deg`, and the errors of
/// [`build_cover`].
pub fn random_regular_graph<R: Rng + ?Sized>(
    deg: usize,
    size: usize,
    identity_shift: f64,
    rng: &mut R,
) -> Result<CsrMatrix<f64>, CoverError> {
    let base = loop_base(deg)?;
    build_cover(&base, size, &Derangement, identity_shift, rng)
}

/// Random simple `deg`-regular graph on `size` vertices, built from
/// `deg / 2` mutually avoiding derangements.
///
/// # Errors
///
/// As [`random_regular_graph`], plus
/// [`CoverError::DerangementImpossible`] for `size <= 2` and
/// [`CoverError::PermutationSearchExhausted`] when `deg` is too large for
/// `size`.
pub fn random_simple_regular_graph<R: Rng + ?Sized>(
    deg: usize,
    size: usize,
    identity_shift: f64,
    rng: &mut R,
) -> Result<CsrMatrix<f64>, CoverError> {
    let base = loop_base(deg)?;
    build_cover(
        &base,
        size,
        &DerangementAvoidingSet::default(),
        identity_shift,
        rng,
    )
}

fn loop_base(deg: usize) -> Result<BaseGraph, ValidationError> {
    if deg > MAX_NODES {
        return Err(ValidationError::ParameterOutOfRange {
            name: "deg".into(),
            value: deg.to_string(),
            expected: format!("<= {MAX_NODES}"),
        });
    }
    BaseGraph::loop_graph(deg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permutation::{Permutation, UniformPermutation};
    use crate::representation::QuaternionRepresentation;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn loop_cover_is_regular_and_symmetric() {
        let mut rng = StdRng::seed_from_u64(42);
        let g = random_regular_graph(4, 5, 0.0, &mut rng).unwrap();
        assert_eq!(g.rows, 5);
        assert!(g.is_symmetric(0.0));
        assert!(g.row_sums().iter().all(|&s| s == 4.0));
        assert!(g.diagonal().iter().all(|&d| d == 0.0));
    }

    #[test]
    fn shift_lands_on_diagonal() {
        let mut rng = StdRng::seed_from_u64(1);
        let base = BaseGraph::cycle(4).unwrap();
        let cover = build_cover(&base, 3, &UniformPermutation, -1.0, &mut rng).unwrap();
        assert_eq!(cover.rows, 12);
        assert!(cover.diagonal().iter().all(|&d| d == -1.0));
        assert!(cover.row_sums().iter().all(|&s| s == 1.0));
    }

    #[test]
    fn degree_one_cover_is_the_base() {
        let mut rng = StdRng::seed_from_u64(0);
        let base = BaseGraph::from_edges(3, &[(0, 1), (0, 1), (1, 2), (2, 2)]).unwrap();
        let cover = build_cover(&base, 1, &UniformPermutation, 0.0, &mut rng).unwrap();
        assert_eq!(&cover, base.adjacency());
    }

    #[test]
    fn zero_degree_rejected() {
        let mut rng = StdRng::seed_from_u64(0);
        let base = BaseGraph::complete(3).unwrap();
        assert!(matches!(
            build_cover(&base, 0, &UniformPermutation, 0.0, &mut rng),
            Err(CoverError::InvalidInput(ValidationError::ParameterOutOfRange { .. }))
        ));
        assert!(build_cover(&base, 2, &UniformPermutation, f64::NAN, &mut rng).is_err());
    }

    #[test]
    fn derangement_lift_of_single_vertex_fails() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(
            random_regular_graph(2, 1, 0.0, &mut rng),
            Err(CoverError::DerangementImpossible { n: 1 })
        ));
        assert!(matches!(
            random_regular_graph(3, 10, 0.0, &mut rng),
            Err(CoverError::InvalidInput(ValidationError::OddLoopEntry { .. }))
        ));
    }

    #[test]
    fn simple_regular_graph_has_unit_entries() {
        let mut rng = StdRng::seed_from_u64(5);
        let g = random_simple_regular_graph(6, 30, 0.0, &mut rng).unwrap();
        assert_eq!(g.max_value(), Some(1.0));
        assert!(g.row_sums().iter().all(|&s| s == 6.0));
        assert!(g.diagonal().iter().all(|&d| d == 0.0));
    }

    /// Generator that replays a fixed permutation.
    struct Fixed(Vec<usize>);

    impl PermutationGenerator for Fixed {
        fn generate<R: Rng + ?Sized>(
            &self,
            _n: usize,
            _history: &[Permutation],
            _rng: &mut R,
        ) -> Result<Permutation, CoverError> {
            Ok(Permutation::from_vec(self.0.clone())?)
        }

        fn name(&self) -> &'static str {
            "fixed"
        }
    }

    #[test]
    fn lift_places_arcs_at_fibre_offsets() {
        let mut rng = StdRng::seed_from_u64(0);
        let base = BaseGraph::from_edges(2, &[(0, 1)]).unwrap();
        let cover = build_cover(&base, 3, &Fixed(vec![1, 2, 0]), 0.0, &mut rng).unwrap();
        // Bundle is (high = 1, low = 0): 3 + t <-> 0 + p(t).
        assert_eq!(cover.get(3, 1), 1.0);
        assert_eq!(cover.get(4, 2), 1.0);
        assert_eq!(cover.get(5, 0), 1.0);
        assert_eq!(cover.get(1, 3), 1.0);
        assert_eq!(cover.nnz(), 6);
    }

    #[test]
    fn quaternion_cover_is_symmetric_and_orthogonal_rows() {
        let mut rng = StdRng::seed_from_u64(8);
        let base = BaseGraph::complete(4).unwrap();
        let cover =
            build_matrix_cover(&base, &QuaternionRepresentation::new(), 0.0, &mut rng).unwrap();
        assert_eq!(cover.rows, 16);
        assert!(cover.is_symmetric(0.0));
        // Every row picks up one signed unit entry per incident base edge.
        for row in 0..cover.rows {
            assert_eq!(cover.row_degree(row), 3);
        }
    }

    #[test]
    fn matrix_cover_needs_simple_base() {
        let mut rng = StdRng::seed_from_u64(8);
        let base = BaseGraph::loop_graph(2).unwrap();
        assert!(matches!(
            build_matrix_cover(&base, &QuaternionRepresentation::new(), 0.0, &mut rng),
            Err(CoverError::InvalidInput(ValidationError::NotSimple(_)))
        ));
    }
}
