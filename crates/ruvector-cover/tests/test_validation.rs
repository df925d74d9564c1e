//! Integration tests for base-graph and parameter validation.
//!
//! Every malformed input must be rejected before any cover is built.

use rand::rngs::StdRng;
use rand::SeedableRng;

use ruvector_cover::cover::build_cover;
use ruvector_cover::error::{CoverError, ValidationError};
use ruvector_cover::extractor::ExtremalEigenExtractor;
use ruvector_cover::graph::BaseGraph;
use ruvector_cover::permutation::UniformPermutation;
use ruvector_cover::types::SignPolicy;

// ---------------------------------------------------------------------------
// Base graphs
// ---------------------------------------------------------------------------

#[test]
fn test_asymmetric_adjacency_rejected() {
    let err = BaseGraph::from_dense(&[vec![0.0, 1.0], vec![0.0, 0.0]]).unwrap_err();
    assert!(matches!(err, ValidationError::Asymmetric { .. }), "{err}");
}

#[test]
fn test_negative_and_fractional_entries_rejected() {
    let err = BaseGraph::from_dense(&[vec![0.0, -1.0], vec![-1.0, 0.0]]).unwrap_err();
    assert!(matches!(err, ValidationError::NegativeEntry { .. }));

    let err = BaseGraph::from_dense(&[vec![0.0, 0.5], vec![0.5, 0.0]]).unwrap_err();
    assert!(matches!(err, ValidationError::NonIntegerEntry { .. }));
}

#[test]
fn test_odd_loop_entry_rejected() {
    let err = BaseGraph::from_dense(&[vec![1.0]]).unwrap_err();
    assert!(matches!(err, ValidationError::OddLoopEntry { vertex: 0, .. }));
    assert!(BaseGraph::from_dense(&[vec![4.0]]).is_ok());
}

#[test]
fn test_non_finite_and_non_square_rejected() {
    assert!(BaseGraph::from_dense(&[vec![f64::NAN]]).is_err());
    assert!(BaseGraph::from_dense(&[vec![0.0, 1.0], vec![1.0]]).is_err());
    assert!(matches!(
        BaseGraph::from_dense(&[]),
        Err(ValidationError::Empty) | Err(ValidationError::NotSquare { .. })
    ));
}

#[test]
fn test_edge_endpoint_out_of_bounds_rejected() {
    assert!(matches!(
        BaseGraph::from_edges(3, &[(0, 3)]),
        Err(ValidationError::DimensionMismatch(_))
    ));
}

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

#[test]
fn test_zero_cover_degree_rejected() {
    let k3 = BaseGraph::complete(3).unwrap();
    let mut rng = StdRng::seed_from_u64(0);
    assert!(matches!(
        build_cover(&k3, 0, &UniformPermutation, 0.0, &mut rng),
        Err(CoverError::InvalidInput(ValidationError::ParameterOutOfRange { .. }))
    ));
}

#[test]
fn test_oversized_cover_rejected() {
    let k3 = BaseGraph::complete(3).unwrap();
    let mut rng = StdRng::seed_from_u64(0);
    assert!(matches!(
        build_cover(&k3, usize::MAX / 2, &UniformPermutation, 0.0, &mut rng),
        Err(CoverError::InvalidInput(ValidationError::MatrixTooLarge { .. }))
    ));
}

#[test]
fn test_non_finite_trivial_eigenvalue_rejected() {
    let k3 = BaseGraph::complete(3).unwrap();
    let extractor: ExtremalEigenExtractor = ExtremalEigenExtractor::default();
    let mut rng = StdRng::seed_from_u64(0);
    let result = extractor.generate_new_extremal_eigs(
        &k3,
        2,
        &UniformPermutation,
        1,
        f64::INFINITY,
        SignPolicy::MaxPositive,
        &mut rng,
    );
    assert!(matches!(
        result,
        Err(CoverError::InvalidInput(ValidationError::NonFiniteValue(_)))
    ));
}

#[test]
fn test_sign_policy_parsing() {
    for policy in [
        SignPolicy::MaxPositive,
        SignPolicy::MaxNegative,
        SignPolicy::MaxMagnitude,
    ] {
        assert_eq!(policy.as_str().parse::<SignPolicy>().unwrap(), policy);
    }
    let err = "largest".parse::<SignPolicy>().unwrap_err();
    assert!(matches!(err, ValidationError::UnknownSignPolicy(ref s) if s == "largest"));
    assert!(err.to_string().contains("max_magnitude"));
}
