//! Random permutation policies for lifting base edges.
//!
//! Every policy implements [`PermutationGenerator`]: given a size `n`, the
//! permutations already drawn for the same edge fibre, and a random source,
//! produce a permutation of `{0, ..., n-1}`.
//!
//! | Policy | Constraint |
//! |--------|------------|
//! | [`UniformPermutation`] | none (uniform over the symmetric group) |
//! | [`Derangement`] | no fixed points |
//! | [`DerangementAvoidingSet`] | no fixed points, no 2-cycles, disjoint from the history and its inverses |
//! | [`AbelianCycle`] | one of the `n` cyclic rotations |
//!
//! The derangement variants are rejection-and-patch loops: draw a uniform
//! permutation, find the coordinates that violate the constraint, reshuffle
//! only those coordinates, and repeat. They terminate with probability one
//! but have no deterministic bound on the number of rounds.

use std::ops::Index;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{CoverError, ValidationError};

// ---------------------------------------------------------------------------
// Permutation
// ---------------------------------------------------------------------------

/// A bijection on `{0, ..., n-1}` stored as its image sequence.
///
/// Deserialization goes through [`Permutation::from_vec`], so a loaded
/// sequence is always a bijection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<usize>")]
pub struct Permutation(Vec<usize>);

impl Permutation {
    /// The identity permutation of size `n`.
    pub fn identity(n: usize) -> Self {
        Self((0..n).collect())
    }

    /// Wrap an image sequence after checking that it is a bijection.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::ParameterOutOfRange`] if a value is out of
    /// range or repeated.
    pub fn from_vec(images: Vec<usize>) -> Result<Self, ValidationError> {
        let n = images.len();
        let mut seen = vec![false; n];
        for (i, &v) in images.iter().enumerate() {
            if v >= n || seen[v] {
                return Err(ValidationError::ParameterOutOfRange {
                    name: format!("permutation[{i}]"),
                    value: v.to_string(),
                    expected: format!("distinct values in [0, {n})"),
                });
            }
            seen[v] = true;
        }
        Ok(Self(images))
    }

    /// Number of points permuted.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// `true` for the empty permutation.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Image sequence.
    #[inline]
    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    /// Consume into the image sequence.
    pub fn into_vec(self) -> Vec<usize> {
        self.0
    }

    /// The inverse permutation.
    pub fn inverse(&self) -> Permutation {
        let mut inv = vec![0usize; self.0.len()];
        for (i, &v) in self.0.iter().enumerate() {
            inv[v] = i;
        }
        Permutation(inv)
    }

    /// Points `i` with `p(i) == i`.
    pub fn fixed_points(&self) -> Vec<usize> {
        (0..self.0.len()).filter(|&i| self.0[i] == i).collect()
    }

    /// `true` if there are no fixed points.
    pub fn is_derangement(&self) -> bool {
        self.0.iter().enumerate().all(|(i, &v)| v != i)
    }
}

impl TryFrom<Vec<usize>> for Permutation {
    type Error = ValidationError;

    fn try_from(images: Vec<usize>) -> Result<Self, Self::Error> {
        Self::from_vec(images)
    }
}

impl Index<usize> for Permutation {
    type Output = usize;

    #[inline]
    fn index(&self, i: usize) -> &usize {
        &self.0[i]
    }
}

// ---------------------------------------------------------------------------
// Generator trait
// ---------------------------------------------------------------------------

/// Capability: produce a permutation of size `n`.
///
/// `history` holds the permutations already drawn for the same edge fibre
/// during the current cover construction. Policies that do not avoid
/// anything ignore it.
pub trait PermutationGenerator {
    /// Draw one permutation of `{0, ..., n-1}`.
    ///
    /// # Errors
    ///
    /// Returns [`CoverError`] when no permutation satisfies the policy's
    /// constraints for this `n` (or the history has the wrong size).
    fn generate<R: Rng + ?Sized>(
        &self,
        n: usize,
        history: &[Permutation],
        rng: &mut R,
    ) -> Result<Permutation, CoverError>;

    /// Short policy name for logs.
    fn name(&self) -> &'static str;
}

fn uniform<R: Rng + ?Sized>(n: usize, rng: &mut R) -> Vec<usize> {
    let mut images: Vec<usize> = (0..n).collect();
    images.shuffle(rng);
    images
}

/// Randomly permute the values sitting at `coords` among themselves.
fn reshuffle_coords<R: Rng + ?Sized>(images: &mut [usize], coords: &[usize], rng: &mut R) {
    let mut values: Vec<usize> = coords.iter().map(|&i| images[i]).collect();
    values.shuffle(rng);
    for (&i, v) in coords.iter().zip(values) {
        images[i] = v;
    }
}

/// Uniformly random permutation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UniformPermutation;

impl PermutationGenerator for UniformPermutation {
    fn generate<R: Rng + ?Sized>(
        &self,
        n: usize,
        _history: &[Permutation],
        rng: &mut R,
    ) -> Result<Permutation, CoverError> {
        Ok(Permutation(uniform(n, rng)))
    }

    fn name(&self) -> &'static str {
        "uniform"
    }
}

/// Random fixed-point-free permutation.
///
/// Lifting a loop with a derangement produces no loops in the cover.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Derangement;

impl PermutationGenerator for Derangement {
    fn generate<R: Rng + ?Sized>(
        &self,
        n: usize,
        _history: &[Permutation],
        rng: &mut R,
    ) -> Result<Permutation, CoverError> {
        if n == 1 {
            return Err(CoverError::DerangementImpossible { n });
        }
        let mut images = uniform(n, rng);
        loop {
            let fixed: Vec<usize> = (0..n).filter(|&i| images[i] == i).collect();
            match fixed.len() {
                0 => return Ok(Permutation(images)),
                1 => {
                    let swap = rng.gen_range(0..n);
                    images.swap(fixed[0], swap);
                }
                _ => reshuffle_coords(&mut images, &fixed, rng),
            }
        }
    }

    fn name(&self) -> &'static str {
        "derangement"
    }
}

/// Random derangement that shares no arc with earlier permutations.
///
/// A coordinate `i` is bad when any of these hold, where `p` is the
/// candidate and `q` ranges over the history:
///
/// - `p(i) == p⁻¹(i)` (a fixed point or a 2-cycle through `i`);
/// - `p(i)` or `p⁻¹(i)` equals `q(i)` or `q⁻¹(i)`.
///
/// Lifting the one-vertex loop graph with a family built this way gives a
/// simple graph: no loops, no multi-edges.
///
/// Each round reshuffles the bad coordinates together with one random good
/// coordinate, which lets the search escape configurations that would
/// otherwise cycle forever. The search is capped at
/// [`max_rounds`](Self::max_rounds).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerangementAvoidingSet {
    /// Rounds before giving up with
    /// [`CoverError::PermutationSearchExhausted`].
    ///
    /// Default: `1_000_000`.
    pub max_rounds: usize,
}

impl Default for DerangementAvoidingSet {
    fn default() -> Self {
        Self {
            max_rounds: 1_000_000,
        }
    }
}

impl PermutationGenerator for DerangementAvoidingSet {
    fn generate<R: Rng + ?Sized>(
        &self,
        n: usize,
        history: &[Permutation],
        rng: &mut R,
    ) -> Result<Permutation, CoverError> {
        if n == 0 {
            return Ok(Permutation(Vec::new()));
        }
        // Sizes 1 and 2 have no permutation free of fixed points and
        // 2-cycles.
        if n <= 2 {
            return Err(CoverError::DerangementImpossible { n });
        }
        if let Some(p) = history.iter().find(|p| p.len() != n) {
            return Err(ValidationError::DimensionMismatch(format!(
                "history permutation has size {} (expected {})",
                p.len(),
                n,
            ))
            .into());
        }

        let avoid: Vec<(&[usize], Permutation)> =
            history.iter().map(|p| (p.as_slice(), p.inverse())).collect();

        let mut images = uniform(n, rng);
        let mut inverse = vec![0usize; n];
        let mut bad = Vec::with_capacity(n);
        let mut good = Vec::with_capacity(n);

        for _ in 0..self.max_rounds {
            for (i, &v) in images.iter().enumerate() {
                inverse[v] = i;
            }
            bad.clear();
            good.clear();
            for i in 0..n {
                let (p, p_inv) = (images[i], inverse[i]);
                let clash = p == p_inv
                    || avoid.iter().any(|(q, q_inv)| {
                        p == q[i] || p == q_inv[i] || p_inv == q[i] || p_inv == q_inv[i]
                    });
                if clash {
                    bad.push(i);
                } else {
                    good.push(i);
                }
            }

            if bad.is_empty() {
                return Ok(Permutation(images));
            }
            if let Some(&extra) = good.choose(rng) {
                bad.push(extra);
            }
            reshuffle_coords(&mut images, &bad, rng);
        }

        Err(CoverError::PermutationSearchExhausted {
            n,
            rounds: self.max_rounds,
        })
    }

    fn name(&self) -> &'static str {
        "derangement-avoiding-set"
    }
}

/// One of the `n` cyclic rotations `i -> (i + s) mod n`, chosen uniformly.
///
/// Lifting with rotations gives covers whose deck group is the cyclic group
/// of order `n`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AbelianCycle;

impl PermutationGenerator for AbelianCycle {
    fn generate<R: Rng + ?Sized>(
        &self,
        n: usize,
        _history: &[Permutation],
        rng: &mut R,
    ) -> Result<Permutation, CoverError> {
        if n == 0 {
            return Ok(Permutation(Vec::new()));
        }
        let shift = rng.gen_range(0..n);
        Ok(Permutation((0..n).map(|i| (i + shift) % n).collect()))
    }

    fn name(&self) -> &'static str {
        "abelian-cycle"
    }
}

// ---------------------------------------------------------------------------
// Closed policy enum
// ---------------------------------------------------------------------------

/// Closed set of permutation policies, selectable from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermutationPolicy {
    /// See [`UniformPermutation`].
    Uniform,
    /// See [`Derangement`].
    Derangement,
    /// See [`DerangementAvoidingSet`].
    DerangementAvoidingSet(DerangementAvoidingSet),
    /// See [`AbelianCycle`].
    AbelianCycle,
}

impl PermutationGenerator for PermutationPolicy {
    fn generate<R: Rng + ?Sized>(
        &self,
        n: usize,
        history: &[Permutation],
        rng: &mut R,
    ) -> Result<Permutation, CoverError> {
        match self {
            PermutationPolicy::Uniform => UniformPermutation.generate(n, history, rng),
            PermutationPolicy::Derangement => Derangement.generate(n, history, rng),
            PermutationPolicy::DerangementAvoidingSet(g) => g.generate(n, history, rng),
            PermutationPolicy::AbelianCycle => AbelianCycle.generate(n, history, rng),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            PermutationPolicy::Uniform => UniformPermutation.name(),
            PermutationPolicy::Derangement => Derangement.name(),
            PermutationPolicy::DerangementAvoidingSet(g) => g.name(),
            PermutationPolicy::AbelianCycle => AbelianCycle.name(),
        }
    }
}

/// Draw `count` permutations of size `n`, each generated against all the
/// earlier ones.
///
/// # Errors
///
/// Propagates the generator's error.
pub fn draw_family<G, R>(
    generator: &G,
    n: usize,
    count: usize,
    rng: &mut R,
) -> Result<Vec<Permutation>, CoverError>
where
    G: PermutationGenerator + ?Sized,
    R: Rng + ?Sized,
{
    let mut family = Vec::with_capacity(count);
    for _ in 0..count {
        let p = generator.generate(n, &family, rng)?;
        family.push(p);
    }
    Ok(family)
}
