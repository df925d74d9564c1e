//! Integration tests for the permutation generators.

use std::collections::{HashMap, HashSet};

use rand::rngs::StdRng;
use rand::SeedableRng;

use ruvector_cover::error::CoverError;
use ruvector_cover::permutation::{
    draw_family, AbelianCycle, Derangement, DerangementAvoidingSet, Permutation,
    PermutationGenerator, PermutationPolicy, UniformPermutation,
};

fn histogram<G: PermutationGenerator>(
    gen: &G,
    n: usize,
    draws: usize,
    seed: u64,
) -> HashMap<Permutation, usize> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut counts = HashMap::new();
    for _ in 0..draws {
        *counts.entry(gen.generate(n, &[], &mut rng).unwrap()).or_insert(0) += 1;
    }
    counts
}

#[test]
fn test_uniform_hits_every_permutation_evenly() {
    let counts = histogram(&UniformPermutation, 3, 6_000, 17);
    assert_eq!(counts.len(), 6);
    for (p, &c) in &counts {
        assert!((850..=1150).contains(&c), "{p:?} drawn {c} times");
    }
}

#[test]
fn test_derangement_reaches_every_derangement() {
    // Size 4 has 9 derangements.
    let counts = histogram(&Derangement, 4, 3_000, 23);
    assert_eq!(counts.len(), 9);
    assert!(counts.keys().all(Permutation::is_derangement));
}

#[test]
fn test_abelian_cycle_reaches_every_rotation() {
    let counts = histogram(&AbelianCycle, 5, 1_000, 29);
    assert_eq!(counts.len(), 5);
    for p in counts.keys() {
        let s = p[0];
        assert!((0..5).all(|i| p[i] == (i + s) % 5));
    }
}

#[test]
fn test_avoiding_family_gives_disjoint_arcs() {
    let mut rng = StdRng::seed_from_u64(31);
    let n = 60;
    let family = draw_family(&DerangementAvoidingSet::default(), n, 4, &mut rng).unwrap();

    // Every unordered pair {i, p(i)} appears at most once across the family.
    let mut arcs = HashSet::new();
    for p in &family {
        for i in 0..n {
            let arc = (i.min(p[i]), i.max(p[i]));
            assert_ne!(arc.0, arc.1);
            assert!(arcs.insert(arc), "arc {arc:?} repeated");
        }
    }
    assert_eq!(arcs.len(), 4 * n);
}

#[test]
fn test_avoiding_family_too_large_is_exhausted() {
    let mut rng = StdRng::seed_from_u64(37);
    // Four mutually avoiding derangements of size 5 would need an
    // 8-regular simple graph on 5 vertices.
    let gen = DerangementAvoidingSet { max_rounds: 5_000 };
    assert!(matches!(
        draw_family(&gen, 5, 4, &mut rng),
        Err(CoverError::PermutationSearchExhausted { n: 5, .. })
    ));
}

#[test]
fn test_policy_config_round_trip() {
    let policy = PermutationPolicy::DerangementAvoidingSet(DerangementAvoidingSet { max_rounds: 5 });
    let json = serde_json::to_string(&policy).unwrap();
    assert_eq!(json, r#"{"derangement_avoiding_set":{"max_rounds":5}}"#);
    let back: PermutationPolicy = serde_json::from_str(&json).unwrap();
    assert_eq!(back, policy);

    let uniform: PermutationPolicy = serde_json::from_str("\"uniform\"").unwrap();
    assert_eq!(uniform, PermutationPolicy::Uniform);
}

#[test]
fn test_permutation_serde_is_transparent_list() {
    let p = Permutation::from_vec(vec![2, 0, 1]).unwrap();
    let json = serde_json::to_string(&p).unwrap();
    assert_eq!(json, "[2,0,1]");
}

#[test]
fn test_permutation_deserialize_rejects_non_bijections() {
    for bad in ["[0,7,7]", "[0,0,0,0,0]", "[1,2,3]"] {
        let err = serde_json::from_str::<Permutation>(bad).unwrap_err();
        assert!(err.to_string().contains("permutation["), "{bad}: {err}");
    }

    let p: Permutation = serde_json::from_str("[2,0,1]").unwrap();
    assert_eq!(p, Permutation::from_vec(vec![2, 0, 1]).unwrap());
    assert_eq!(p.inverse().as_slice(), &[1, 2, 0]);
}

#[test]
fn test_loaded_history_drives_avoiding_set() {
    let history: Vec<Permutation> = serde_json::from_str("[[1,2,3,4,0]]").unwrap();
    let mut rng = StdRng::seed_from_u64(5);
    let p = DerangementAvoidingSet::default()
        .generate(5, &history, &mut rng)
        .unwrap();
    let (q, q_inv) = (&history[0], history[0].inverse());
    for i in 0..5 {
        assert_ne!(p[i], i);
        assert_ne!(p[i], q[i]);
        assert_ne!(p[i], q_inv[i]);
    }
}
