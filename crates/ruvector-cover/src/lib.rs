//! Random graph covers and their new extremal adjacency eigenvalues.
//!
//! A degree-`d` cover of a base graph replaces every vertex with a fibre of
//! `d` vertices and every edge bundle with permutation-matched arcs between
//! fibres. The cover's spectrum contains the base spectrum; this crate
//! builds random covers and extracts, per trial, the most extreme
//! eigenvalue that is *not* inherited from the base.
//!
//! # Modules
//!
//! | Module | Role |
//! |--------|------|
//! | [`graph`] | base graphs as validated symmetric adjacency matrices |
//! | [`permutation`] | permutation generators (uniform, derangement, avoiding set, cyclic) |
//! | [`representation`] | orthogonal block generators for representation covers |
//! | [`cover`] | cover construction and random regular graphs |
//! | [`eigensolver`], [`lanczos`] | dense and sparse extremal eigenvalue engines |
//! | [`spectrum`] | exact or partial reference spectrum of the base |
//! | [`extractor`] | per-trial filtering, window widening and certification |
//! | [`batch`] | chunked, seeded fan-out of independent trials |
//!
//! # Example
//!
//! ```rust
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//! use ruvector_cover::extractor::ExtremalEigenExtractor;
//! use ruvector_cover::graph::BaseGraph;
//! use ruvector_cover::permutation::Derangement;
//! use ruvector_cover::types::SignPolicy;
//!
//! // K4 has spectrum {3, -1, -1, -1}.
//! let k4 = BaseGraph::complete(4).unwrap();
//! let extractor: ExtremalEigenExtractor = ExtremalEigenExtractor::default();
//! let mut rng = StdRng::seed_from_u64(42);
//!
//! let eigs = extractor
//!     .generate_new_extremal_eigs(&k4, 5, &Derangement, 4, 3.0, SignPolicy::MaxNegative, &mut rng)
//!     .unwrap();
//! assert_eq!(eigs.len(), 4);
//! assert!(eigs.iter().all(|&e| e >= -3.0 - 1e-9 && (e + 1.0).abs() > 1e-10));
//! ```

pub mod arena;
pub mod batch;
pub mod cover;
pub mod eigensolver;
pub mod error;
pub mod events;
pub mod extractor;
pub mod graph;
pub mod lanczos;
pub mod permutation;
pub mod representation;
pub mod spectrum;
pub mod types;
pub mod validation;
