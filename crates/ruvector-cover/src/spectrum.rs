//! Base-graph reference spectra.
//!
//! Eigenvalues of a cover that coincide with eigenvalues of its base are
//! inherited, not new. [`BaseSpectrumEstimator`] computes the reference set
//! they are compared against:
//!
//! | Base size | Method | Cutoff |
//! |-----------|--------|--------|
//! | `< dense_threshold` | full dense spectrum | `0` |
//! | `<= moderate_limit` | `moderate_eigs` extreme values | smallest relevant magnitude |
//! | larger | `large_eigs` extreme values | smallest relevant magnitude |
//!
//! A partial spectrum is an approximation. Its magnitude cutoff is what the
//! extractor checks every certified eigenvalue against.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::eigensolver::{full_spectrum, AutoEigensolver, ExtremalEigensolver};
use crate::error::{CoverError, ValidationError};
use crate::graph::BaseGraph;
use crate::types::SignPolicy;

// ---------------------------------------------------------------------------
// SpectrumConfig
// ---------------------------------------------------------------------------

/// Size thresholds for the base-spectrum estimate.
///
/// # Example
///
/// ```
/// use ruvector_cover::spectrum::SpectrumConfig;
///
/// let config = SpectrumConfig { eigs_override: Some(80), ..Default::default() };
/// assert_eq!(config.eigs_for(5_000), 80);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpectrumConfig {
    /// Bases with fewer vertices get the full dense spectrum.
    ///
    /// Default: `1_000`.
    pub dense_threshold: usize,

    /// Largest base size that still counts as moderate.
    ///
    /// Default: `20_000`.
    pub moderate_limit: usize,

    /// Eigenvalues computed for a moderate base.
    ///
    /// Default: `50`.
    pub moderate_eigs: usize,

    /// Eigenvalues computed for a base above `moderate_limit`.
    ///
    /// Default: `20`.
    pub large_eigs: usize,

    /// Fixed eigenvalue count for every partial estimate, overriding the
    /// size rule.
    ///
    /// Default: `None`.
    pub eigs_override: Option<usize>,
}

impl Default for SpectrumConfig {
    fn default() -> Self {
        Self {
            dense_threshold: 1_000,
            moderate_limit: 20_000,
            moderate_eigs: 50,
            large_eigs: 20,
            eigs_override: None,
        }
    }
}

impl SpectrumConfig {
    /// Number of eigenvalues a partial estimate computes for a base of
    /// `size` vertices (capped at `size`).
    pub fn eigs_for(&self, size: usize) -> usize {
        let k = self.eigs_override.unwrap_or(if size <= self.moderate_limit {
            self.moderate_eigs
        } else {
            self.large_eigs
        });
        k.min(size)
    }
}

// ---------------------------------------------------------------------------
// BaseSpectrum
// ---------------------------------------------------------------------------

/// Reference eigenvalues of a base graph.
///
/// The eigenvalues are kept ascending; [`distance`](Self::distance) relies
/// on it. Deserialized spectra are sorted on load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawBaseSpectrum")]
pub struct BaseSpectrum {
    eigenvalues: Vec<f64>,
    magnitude_cutoff: f64,
    exact: bool,
}

#[derive(Deserialize)]
struct RawBaseSpectrum {
    eigenvalues: Vec<f64>,
    magnitude_cutoff: f64,
    exact: bool,
}

impl TryFrom<RawBaseSpectrum> for BaseSpectrum {
    type Error = ValidationError;

    fn try_from(raw: RawBaseSpectrum) -> Result<Self, Self::Error> {
        if let Some(v) = raw.eigenvalues.iter().find(|v| !v.is_finite()) {
            return Err(ValidationError::NonFiniteValue(format!("base eigenvalue = {v}")));
        }
        if !raw.magnitude_cutoff.is_finite() || raw.magnitude_cutoff < 0.0 {
            return Err(ValidationError::ParameterOutOfRange {
                name: "magnitude_cutoff".into(),
                value: raw.magnitude_cutoff.to_string(),
                expected: "finite and >= 0".into(),
            });
        }
        let mut eigenvalues = raw.eigenvalues;
        eigenvalues.sort_by(|a, b| a.total_cmp(b));
        Ok(Self {
            eigenvalues,
            magnitude_cutoff: raw.magnitude_cutoff,
            exact: raw.exact,
        })
    }
}

impl BaseSpectrum {
    /// Wrap a complete spectrum.
    pub fn exact(mut eigenvalues: Vec<f64>) -> Self {
        eigenvalues.sort_by(|a, b| a.total_cmp(b));
        Self {
            eigenvalues,
            magnitude_cutoff: 0.0,
            exact: true,
        }
    }

    /// Wrap a partial spectrum and derive its magnitude cutoff for
    /// `policy`.
    ///
    /// If no computed value has the relevant sign the cutoff falls back to
    /// the smallest magnitude overall.
    pub fn partial(mut eigenvalues: Vec<f64>, policy: SignPolicy) -> Self {
        eigenvalues.sort_by(|a, b| a.total_cmp(b));
        let relevant = eigenvalues
            .iter()
            .filter(|&&v| policy.matches_sign(v))
            .map(|v| v.abs())
            .reduce(f64::min);
        let magnitude_cutoff = match relevant {
            Some(cutoff) => cutoff,
            None => {
                warn!(
                    %policy,
                    computed = eigenvalues.len(),
                    "no base eigenvalue of the requested sign, using smallest magnitude overall"
                );
                eigenvalues.iter().map(|v| v.abs()).reduce(f64::min).unwrap_or(0.0)
            }
        };
        Self {
            eigenvalues,
            magnitude_cutoff,
            exact: false,
        }
    }

    /// Computed eigenvalues, ascending.
    pub fn eigenvalues(&self) -> &[f64] {
        &self.eigenvalues
    }

    /// Smallest magnitude among the computed eigenvalues of the relevant
    /// sign. `0` when the spectrum is exact.
    pub fn magnitude_cutoff(&self) -> f64 {
        self.magnitude_cutoff
    }

    /// `true` if the eigenvalues are the whole spectrum.
    pub fn is_exact(&self) -> bool {
        self.exact
    }

    /// Number of reference eigenvalues.
    pub fn len(&self) -> usize {
        self.eigenvalues.len()
    }

    /// `true` if there are no reference eigenvalues.
    pub fn is_empty(&self) -> bool {
        self.eigenvalues.is_empty()
    }

    /// Distance from `value` to the nearest reference eigenvalue, or
    /// `f64::INFINITY` for an empty reference set.
    pub fn distance(&self, value: f64) -> f64 {
        let pos = self.eigenvalues.partition_point(|&e| e < value);
        let above = self.eigenvalues.get(pos).map(|&e| e - value);
        let below = pos
            .checked_sub(1)
            .and_then(|i| self.eigenvalues.get(i))
            .map(|&e| value - e);
        match (above, below) {
            (Some(a), Some(b)) => a.min(b),
            (Some(d), None) | (None, Some(d)) => d,
            (None, None) => f64::INFINITY,
        }
    }

    /// `true` if `value` is within `tol` of a reference eigenvalue.
    ///
    /// A distance of exactly `tol` counts as inherited.
    pub fn is_inherited(&self, value: f64, tol: f64) -> bool {
        self.distance(value) <= tol
    }
}

// ---------------------------------------------------------------------------
// BaseSpectrumEstimator
// ---------------------------------------------------------------------------

/// Computes [`BaseSpectrum`]s with a configurable sparse engine.
#[derive(Debug, Clone, Default)]
pub struct BaseSpectrumEstimator<S = AutoEigensolver> {
    /// Size thresholds.
    pub config: SpectrumConfig,
    /// Engine for partial estimates.
    pub solver: S,
}

impl<S: ExtremalEigensolver> BaseSpectrumEstimator<S> {
    /// Create an estimator.
    pub fn new(config: SpectrumConfig, solver: S) -> Self {
        Self { config, solver }
    }

    /// Reference spectrum of `base` for a study of the `policy` end of the
    /// spectrum.
    ///
    /// The partial path queries the extreme values in the policy's own
    /// direction on the unshifted base adjacency.
    ///
    /// # Errors
    ///
    /// Propagates eigensolver errors.
    #[instrument(skip(self, base), fields(base_size = base.size()))]
    pub fn estimate(&self, base: &BaseGraph, policy: SignPolicy) -> Result<BaseSpectrum, CoverError> {
        let size = base.size();
        if size < self.config.dense_threshold {
            let spectrum = BaseSpectrum::exact(full_spectrum(base.adjacency())?);
            debug!(eigs = spectrum.len(), "exact base spectrum");
            return Ok(spectrum);
        }

        let k = self.config.eigs_for(size);
        let values = self
            .solver
            .extremal_eigenvalues(base.adjacency(), k, policy.direction())?;
        let spectrum = BaseSpectrum::partial(values, policy);
        debug!(
            eigs = k,
            solver = self.solver.name(),
            cutoff = spectrum.magnitude_cutoff(),
            "partial base spectrum"
        );
        Ok(spectrum)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eigensolver::DenseEigensolver;

    #[test]
    fn eigs_for_follows_size_bands() {
        let config = SpectrumConfig::default();
        assert_eq!(config.eigs_for(5_000), 50);
        assert_eq!(config.eigs_for(20_000), 50);
        assert_eq!(config.eigs_for(20_001), 20);
        assert_eq!(config.eigs_for(10), 10);
    }

    #[test]
    fn partial_cutoff_uses_relevant_sign() {
        let s = BaseSpectrum::partial(vec![3.0, -2.5, 0.5, -0.1], SignPolicy::MaxPositive);
        assert_eq!(s.magnitude_cutoff, 0.5);
        let s = BaseSpectrum::partial(vec![3.0, -2.5, 0.5, -0.1], SignPolicy::MaxNegative);
        assert_eq!(s.magnitude_cutoff, 0.1);
        let s = BaseSpectrum::partial(vec![3.0, -2.5, 0.5, -0.1], SignPolicy::MaxMagnitude);
        assert_eq!(s.magnitude_cutoff, 0.1);
        assert!(!s.exact);
    }

    #[test]
    fn partial_cutoff_falls_back_without_relevant_sign() {
        let s = BaseSpectrum::partial(vec![4.0, 2.0], SignPolicy::MaxNegative);
        assert_eq!(s.magnitude_cutoff, 2.0);
    }

    #[test]
    fn inherited_uses_nearest_reference() {
        let s = BaseSpectrum::exact(vec![2.0, -2.0, 0.0, 0.0]);
        assert_eq!(s.eigenvalues, vec![-2.0, 0.0, 0.0, 2.0]);
        assert!(s.is_inherited(2.0 + 1e-12, 1e-10));
        assert!(s.is_inherited(-1e-11, 1e-10));
        assert!(!s.is_inherited(1.0, 1e-10));
        assert!(!s.is_inherited(2.5, 1e-10));
        assert_eq!(BaseSpectrum::exact(Vec::new()).distance(1.0), f64::INFINITY);
    }

    #[test]
    fn deserialized_spectrum_is_sorted() {
        let json = r#"{"eigenvalues":[2.0,-2.0,0.0,0.0],"magnitude_cutoff":0.0,"exact":true}"#;
        let s: BaseSpectrum = serde_json::from_str(json).unwrap();
        assert_eq!(s.eigenvalues(), &[-2.0, 0.0, 0.0, 2.0]);
        assert_eq!(s.distance(-2.0), 0.0);
        assert!(s.is_inherited(-2.0, 1e-10));
        assert!(s.is_inherited(2.0, 1e-10));
        assert!(!s.is_inherited(1.0, 1e-10));
    }

    #[test]
    fn deserialized_spectrum_rejects_bad_values() {
        let negative = r#"{"eigenvalues":[1.0],"magnitude_cutoff":-1.0,"exact":false}"#;
        assert!(serde_json::from_str::<BaseSpectrum>(negative).is_err());
        let json = serde_json::to_string(&BaseSpectrum::partial(vec![3.0, 1.0], SignPolicy::MaxPositive)).unwrap();
        let back: BaseSpectrum = serde_json::from_str(&json).unwrap();
        assert_eq!(back.eigenvalues(), &[1.0, 3.0]);
        assert_eq!(back.magnitude_cutoff(), 1.0);
        assert!(!back.is_exact());
    }

    #[test]
    fn small_base_is_exact() {
        let estimator: BaseSpectrumEstimator = BaseSpectrumEstimator::default();
        let c4 = BaseGraph::cycle(4).unwrap();
        let s = estimator.estimate(&c4, SignPolicy::MaxPositive).unwrap();
        assert!(s.exact);
        assert_eq!(s.magnitude_cutoff, 0.0);
        let expected = [-2.0, 0.0, 0.0, 2.0];
        for (a, b) in s.eigenvalues.iter().zip(expected) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn lowered_threshold_takes_partial_path() {
        let estimator = BaseSpectrumEstimator::new(
            SpectrumConfig {
                dense_threshold: 3,
                eigs_override: Some(2),
                ..Default::default()
            },
            DenseEigensolver,
        );
        let k6 = BaseGraph::complete(6).unwrap();
        let s = estimator.estimate(&k6, SignPolicy::MaxPositive).unwrap();
        assert!(!s.exact);
        assert_eq!(s.len(), 2);
        assert!((s.magnitude_cutoff - 5.0).abs() < 1e-12);
    }
}
