//! New extremal eigenvalues of random covers.
//!
//! The spectrum of a cover contains the spectrum of its base. The
//! [`ExtremalEigenExtractor`] finds, per trial, the most extreme eigenvalue
//! that is *not* inherited:
//!
//! 1. Build a fresh cover with the identity shift of the [`SignPolicy`]
//!    already on its diagonal.
//! 2. Query the `k` extreme eigenvalues in the policy's direction and
//!    remove the shift.
//! 3. Drop every value within `inherited_tolerance` of the base spectrum.
//! 4. If nothing survives, widen `k` by `window_step` and query again;
//!    otherwise select the survivor of largest magnitude.
//! 5. Against a partial base spectrum, reject a selection smaller in
//!    magnitude than the spectrum's cutoff with
//!    [`CoverError::CertificationFailed`].
//!
//! The window is local to a trial: every trial starts again from
//! [`TrialPlan::window`], so trials are independent and can run in any
//! order or in parallel (see [`BatchRunner`](crate::batch::BatchRunner)).
//!
//! # Example
//!
//! ```
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//! use ruvector_cover::extractor::ExtremalEigenExtractor;
//! use ruvector_cover::graph::BaseGraph;
//! use ruvector_cover::permutation::UniformPermutation;
//! use ruvector_cover::types::SignPolicy;
//!
//! let k4 = BaseGraph::complete(4).unwrap();
//! let extractor: ExtremalEigenExtractor = ExtremalEigenExtractor::default();
//! let mut rng = StdRng::seed_from_u64(7);
//! let eigs = extractor
//!     .generate_new_extremal_eigs(&k4, 6, &UniformPermutation, 3, 3.0, SignPolicy::MaxPositive, &mut rng)
//!     .unwrap();
//! assert_eq!(eigs.len(), 3);
//! assert!(eigs.iter().all(|&e| e < 3.0 + 1e-9));
//! ```

use std::time::Instant;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::cover::{
    build_cover, build_matrix_cover, random_regular_graph, random_simple_regular_graph,
};
use crate::eigensolver::{AutoEigensolver, ExtremalEigensolver};
use crate::error::{CoverError, ValidationError};
use crate::events::CoverEvent;
use crate::graph::BaseGraph;
use crate::permutation::PermutationGenerator;
use crate::representation::MatrixGenerator;
use crate::spectrum::{BaseSpectrum, BaseSpectrumEstimator, SpectrumConfig};
use crate::types::{CsrMatrix, SignPolicy};
use crate::validation::{validate_cover_degree, validate_tolerance};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Filtering and window settings for the extractor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// Distance to the base spectrum at or below which an eigenvalue counts
    /// as inherited.
    ///
    /// Default: `1e-10`.
    pub inherited_tolerance: f64,

    /// First window of every trial. `None` derives it from the trial count:
    /// fewer trials make re-querying relatively more expensive, so they
    /// start wider.
    ///
    /// Default: `None`.
    pub initial_window: Option<usize>,

    /// Growth of the window after a fully inherited query.
    ///
    /// Default: `2`.
    pub window_step: usize,

    /// Covers a loop-graph trial may draw before giving up with
    /// [`CoverError::RedrawsExhausted`].
    ///
    /// Default: `1_000`.
    pub max_redraws: usize,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            inherited_tolerance: 1e-10,
            initial_window: None,
            window_step: 2,
            max_redraws: 1_000,
        }
    }
}

impl ExtractorConfig {
    /// Starting window for a run of `trials` trials.
    ///
    /// `initial_window` if set, otherwise `5` below 10 trials, `4` below
    /// 20 and `2` from then on.
    pub fn window_for(&self, trials: usize) -> usize {
        self.initial_window.unwrap_or(match trials {
            t if t < 10 => 5,
            t if t < 20 => 4,
            _ => 2,
        })
    }

    /// Check that the settings are usable.
    ///
    /// # Errors
    ///
    /// [`ValidationError::ParameterOutOfRange`] for a non-positive
    /// tolerance, a zero step, or a zero initial window.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_tolerance("inherited_tolerance", self.inherited_tolerance)?;
        if self.window_step == 0 {
            return Err(ValidationError::ParameterOutOfRange {
                name: "window_step".into(),
                value: "0".into(),
                expected: ">= 1".into(),
            });
        }
        if self.initial_window == Some(0) {
            return Err(ValidationError::ParameterOutOfRange {
                name: "initial_window".into(),
                value: "0".into(),
                expected: ">= 1".into(),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Trial plan and results
// ---------------------------------------------------------------------------

/// Everything a single trial needs besides the base, the generator and the
/// reference spectrum. Shared read-only by all trials of a run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrialPlan {
    /// Cover degree.
    pub degree: usize,
    /// End of the spectrum under study.
    pub policy: SignPolicy,
    /// Diagonal shift applied to every cover and removed from every value.
    pub identity_shift: f64,
    /// First eigensolver window of each trial.
    pub window: usize,
}

impl TrialPlan {
    /// Resolve a plan from user-facing parameters.
    ///
    /// # Errors
    ///
    /// [`ValidationError`] for a zero degree, a non-finite trivial
    /// eigenvalue or a zero window.
    pub fn new(
        degree: usize,
        trivial_eigenvalue: f64,
        policy: SignPolicy,
        window: usize,
    ) -> Result<Self, ValidationError> {
        if degree == 0 {
            return Err(ValidationError::ParameterOutOfRange {
                name: "cover_degree".into(),
                value: "0".into(),
                expected: ">= 1".into(),
            });
        }
        if !trivial_eigenvalue.is_finite() {
            return Err(ValidationError::NonFiniteValue(format!(
                "trivial_eigenvalue = {trivial_eigenvalue}"
            )));
        }
        if window == 0 {
            return Err(ValidationError::ParameterOutOfRange {
                name: "window".into(),
                value: "0".into(),
                expected: ">= 1".into(),
            });
        }
        Ok(Self {
            degree,
            policy,
            identity_shift: policy.identity_shift(trivial_eigenvalue),
            window,
        })
    }
}

impl TrialPlan {
    /// The eigensolver side of the plan, without the cover degree.
    pub fn query(&self) -> CoverQuery {
        CoverQuery {
            policy: self.policy,
            identity_shift: self.identity_shift,
            window: self.window,
        }
    }
}

/// How to query one already-built cover.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoverQuery {
    /// End of the spectrum under study.
    pub policy: SignPolicy,
    /// Diagonal shift carried by the cover, removed from every value.
    pub identity_shift: f64,
    /// First eigensolver window.
    pub window: usize,
}

/// Outcome of one successful extraction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extraction {
    /// The new eigenvalue, shift removed.
    pub eigenvalue: f64,
    /// Window of the query that produced it.
    pub window: usize,
    /// Eigensolver queries issued.
    pub queries: usize,
}

/// One trial's result together with its event log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialReport {
    /// Trial index within the run.
    pub trial: usize,
    /// The certified new eigenvalue.
    pub eigenvalue: f64,
    /// Final window.
    pub window: usize,
    /// Eigensolver queries issued.
    pub queries: usize,
    /// Events in the order they happened.
    pub events: Vec<CoverEvent>,
}

/// Survivor of largest magnitude after removing `shift` and dropping
/// inherited values, plus the number dropped. Ties keep the first value.
fn select_new(
    shifted: &[f64],
    shift: f64,
    reference: &BaseSpectrum,
    tol: f64,
) -> (Option<f64>, usize) {
    let mut best: Option<f64> = None;
    let mut inherited = 0;
    for &raw in shifted {
        let value = raw - shift;
        if reference.is_inherited(value, tol) {
            inherited += 1;
            continue;
        }
        if best.map_or(true, |b| value.abs() > b.abs()) {
            best = Some(value);
        }
    }
    (best, inherited)
}

// ---------------------------------------------------------------------------
// ExtremalEigenExtractor
// ---------------------------------------------------------------------------

/// Drives cover construction, eigenvalue queries, filtering and
/// certification.
#[derive(Debug, Clone, Default)]
pub struct ExtremalEigenExtractor<S = AutoEigensolver> {
    /// Filtering and window settings.
    pub config: ExtractorConfig,
    /// Base-spectrum size thresholds.
    pub spectrum: SpectrumConfig,
    /// Engine for cover and partial base queries.
    pub solver: S,
}

impl<S: ExtremalEigensolver> ExtremalEigenExtractor<S> {
    /// Create an extractor.
    pub fn new(config: ExtractorConfig, spectrum: SpectrumConfig, solver: S) -> Self {
        Self {
            config,
            spectrum,
            solver,
        }
    }

    /// Reference spectrum of `base` for `policy`, using this extractor's
    /// thresholds and engine.
    ///
    /// # Errors
    ///
    /// Propagates eigensolver errors.
    pub fn estimate_base(
        &self,
        base: &BaseGraph,
        policy: SignPolicy,
    ) -> Result<BaseSpectrum, CoverError> {
        BaseSpectrumEstimator::new(self.spectrum.clone(), &self.solver).estimate(base, policy)
    }

    /// Most extreme non-inherited eigenvalue of a cover that already
    /// carries `identity_shift` on its diagonal.
    ///
    /// Starts from a window of `min_eigs` (capped at the cover size) and
    /// widens until something survives filtering.
    ///
    /// # Errors
    ///
    /// - [`CoverError::CertificationFailed`] if the selection is smaller in
    ///   magnitude than `reference.magnitude_cutoff()`.
    /// - [`ValidationError::ParameterOutOfRange`] once the window has grown
    ///   to the whole cover and every eigenvalue is inherited.
    /// - Eigensolver errors.
    pub fn extract_new_eigenvalue(
        &self,
        cover: &CsrMatrix<f64>,
        reference: &BaseSpectrum,
        policy: SignPolicy,
        identity_shift: f64,
        min_eigs: usize,
    ) -> Result<f64, CoverError> {
        let query = CoverQuery {
            policy,
            identity_shift,
            window: min_eigs,
        };
        let mut events = Vec::new();
        self.extract_logged(0, cover, reference, &query, &mut events)
            .map(|x| x.eigenvalue)
    }

    /// [`extract_new_eigenvalue`](Self::extract_new_eigenvalue) with the
    /// trial's events appended to `events`, including the
    /// `CertificationFailed` event when that error is returned.
    ///
    /// # Errors
    ///
    /// As [`extract_new_eigenvalue`](Self::extract_new_eigenvalue).
    pub fn extract_logged(
        &self,
        trial: usize,
        cover: &CsrMatrix<f64>,
        reference: &BaseSpectrum,
        query: &CoverQuery,
        events: &mut Vec<CoverEvent>,
    ) -> Result<Extraction, CoverError> {
        self.config.validate()?;
        if query.window == 0 {
            return Err(ValidationError::ParameterOutOfRange {
                name: "window".into(),
                value: "0".into(),
                expected: ">= 1".into(),
            }
            .into());
        }
        let tol = self.config.inherited_tolerance;
        let step = self.config.window_step;
        let direction = query.policy.direction();
        let n = cover.rows;
        let start = Instant::now();

        let mut k = query.window.min(n);
        let mut queries = 0usize;
        loop {
            queries += 1;
            let shifted = self.solver.extremal_eigenvalues(cover, k, direction)?;
            let (best, inherited) = select_new(&shifted, query.identity_shift, reference, tol);

            let Some(eigenvalue) = best else {
                if k >= n {
                    return Err(ValidationError::ParameterOutOfRange {
                        name: "window".into(),
                        value: (k + step).to_string(),
                        expected: format!("[1, {n}]"),
                    }
                    .into());
                }
                let next = (k + step).min(n);
                debug!(trial, from = k, to = next, inherited, "window fully inherited, widening");
                events.push(CoverEvent::WindowWidened {
                    trial,
                    from: k,
                    to: next,
                    inherited,
                });
                k = next;
                continue;
            };

            if eigenvalue.abs() < reference.magnitude_cutoff() {
                warn!(
                    trial,
                    eigenvalue,
                    cutoff = reference.magnitude_cutoff(),
                    base_eigs = reference.len(),
                    "new eigenvalue below base cutoff"
                );
                events.push(CoverEvent::CertificationFailed {
                    trial,
                    eigenvalue,
                    cutoff: reference.magnitude_cutoff(),
                });
                return Err(CoverError::CertificationFailed {
                    eigenvalue,
                    cutoff: reference.magnitude_cutoff(),
                    base_eigs: reference.len(),
                });
            }

            debug!(trial, eigenvalue, window = k, queries, "new eigenvalue certified");
            events.push(CoverEvent::NewEigenvalueCertified {
                trial,
                eigenvalue,
                window: k,
                queries,
                elapsed: start.elapsed(),
            });
            return Ok(Extraction {
                eigenvalue,
                window: k,
                queries,
            });
        }
    }

    /// Build one cover and extract its new eigenvalue.
    ///
    /// # Errors
    ///
    /// Cover construction errors and those of
    /// [`extract_new_eigenvalue`](Self::extract_new_eigenvalue).
    #[instrument(skip(self, base, generator, reference, rng))]
    pub fn run_trial<G, R>(
        &self,
        trial: usize,
        base: &BaseGraph,
        generator: &G,
        reference: &BaseSpectrum,
        plan: &TrialPlan,
        rng: &mut R,
    ) -> Result<TrialReport, CoverError>
    where
        G: PermutationGenerator + ?Sized,
        R: Rng + ?Sized,
    {
        let cover = build_cover(base, plan.degree, generator, plan.identity_shift, rng)?;
        let mut events = vec![CoverEvent::TrialStarted {
            trial,
            cover_size: cover.rows,
            cover_nnz: cover.nnz(),
            window: plan.window.min(cover.rows),
        }];
        let extraction = self.extract_logged(trial, &cover, reference, &plan.query(), &mut events)?;
        Ok(TrialReport {
            trial,
            eigenvalue: extraction.eigenvalue,
            window: extraction.window,
            queries: extraction.queries,
            events,
        })
    }

    /// Run `trials` independent trials against one base graph.
    ///
    /// The base spectrum is computed once; each trial then builds its own
    /// cover and starts from the same initial window.
    ///
    /// # Errors
    ///
    /// The first error of any trial aborts the run.
    #[allow(clippy::too_many_arguments)]
    #[instrument(skip(self, base, generator, rng), fields(base_size = base.size()))]
    pub fn run_trials<G, R>(
        &self,
        base: &BaseGraph,
        degree: usize,
        generator: &G,
        trials: usize,
        trivial_eigenvalue: f64,
        policy: SignPolicy,
        rng: &mut R,
    ) -> Result<Vec<TrialReport>, CoverError>
    where
        G: PermutationGenerator + ?Sized,
        R: Rng + ?Sized,
    {
        validate_cover_degree(degree, base.size())?;
        let plan = TrialPlan::new(
            degree,
            trivial_eigenvalue,
            policy,
            self.config.window_for(trials),
        )?;
        let reference = self.estimate_base(base, policy)?;

        let reports = (0..trials)
            .map(|trial| self.run_trial(trial, base, generator, &reference, &plan, rng))
            .collect::<Result<Vec<_>, _>>()?;
        info!(trials, "extraction run complete");
        Ok(reports)
    }

    /// One new extremal eigenvalue per trial, in trial order.
    ///
    /// # Errors
    ///
    /// As [`run_trials`](Self::run_trials).
    #[allow(clippy::too_many_arguments)]
    pub fn generate_new_extremal_eigs<G, R>(
        &self,
        base: &BaseGraph,
        degree: usize,
        generator: &G,
        trials: usize,
        trivial_eigenvalue: f64,
        policy: SignPolicy,
        rng: &mut R,
    ) -> Result<Vec<f64>, CoverError>
    where
        G: PermutationGenerator + ?Sized,
        R: Rng + ?Sized,
    {
        let reports =
            self.run_trials(base, degree, generator, trials, trivial_eigenvalue, policy, rng)?;
        Ok(reports.into_iter().map(|r| r.eigenvalue).collect())
    }

    // -----------------------------------------------------------------------
    // Loop-graph and representation experiments
    // -----------------------------------------------------------------------

    /// One loop-graph trial: draw random `deg`-regular graphs on `size`
    /// vertices until the two-value window holds something other than
    /// `deg`, and report the survivor of largest magnitude.
    ///
    /// # Errors
    ///
    /// [`CoverError::RedrawsExhausted`] after `max_redraws` covers, plus
    /// cover construction and eigensolver errors.
    pub fn run_loop_trial<R: Rng + ?Sized>(
        &self,
        trial: usize,
        size: usize,
        deg: usize,
        policy: SignPolicy,
        simple: bool,
        rng: &mut R,
    ) -> Result<TrialReport, CoverError> {
        self.config.validate()?;
        if deg < 2 {
            return Err(ValidationError::ParameterOutOfRange {
                name: "deg".into(),
                value: deg.to_string(),
                expected: "even value >= 2".into(),
            }
            .into());
        }
        let reference = BaseSpectrum::exact(vec![deg as f64]);
        let shift = policy.identity_shift(deg as f64);
        let tol = self.config.inherited_tolerance;
        let start = Instant::now();
        let mut events = Vec::new();

        for attempt in 1..=self.config.max_redraws {
            let cover = if simple {
                random_simple_regular_graph(deg, size, shift, rng)?
            } else {
                random_regular_graph(deg, size, shift, rng)?
            };
            let k = 2.min(cover.rows);
            events.push(CoverEvent::TrialStarted {
                trial,
                cover_size: cover.rows,
                cover_nnz: cover.nnz(),
                window: k,
            });

            let shifted = self.solver.extremal_eigenvalues(&cover, k, policy.direction())?;
            if let (Some(eigenvalue), _) = select_new(&shifted, shift, &reference, tol) {
                events.push(CoverEvent::NewEigenvalueCertified {
                    trial,
                    eigenvalue,
                    window: k,
                    queries: attempt,
                    elapsed: start.elapsed(),
                });
                return Ok(TrialReport {
                    trial,
                    eigenvalue,
                    window: k,
                    queries: attempt,
                    events,
                });
            }
            debug!(trial, attempt, "only trivial eigenvalues in window, redrawing");
            events.push(CoverEvent::CoverRedrawn { trial, attempt });
        }

        Err(CoverError::RedrawsExhausted {
            trial,
            attempts: self.config.max_redraws,
        })
    }

    /// Second eigenvalues of random `deg`-regular graphs on `size`
    /// vertices, one per trial.
    ///
    /// `simple = false` lifts the loop graph with derangements (no loops,
    /// multi-edges possible); `simple = true` uses mutually avoiding
    /// derangements (simple graphs).
    ///
    /// # Errors
    ///
    /// As [`run_loop_trial`](Self::run_loop_trial).
    #[instrument(skip(self, rng))]
    pub fn generate_loop_extremal_eigs<R: Rng + ?Sized>(
        &self,
        size: usize,
        deg: usize,
        trials: usize,
        policy: SignPolicy,
        simple: bool,
        rng: &mut R,
    ) -> Result<Vec<f64>, CoverError> {
        let eigs = (0..trials)
            .map(|trial| {
                self.run_loop_trial(trial, size, deg, policy, simple, rng)
                    .map(|r| r.eigenvalue)
            })
            .collect::<Result<Vec<_>, _>>()?;
        info!(trials, "loop extraction run complete");
        Ok(eigs)
    }

    /// Extreme eigenvalues of representation covers.
    ///
    /// Each trial draws a fresh random simple `deg`-regular base on `size`
    /// vertices, replaces its edges with blocks from `generator` and
    /// reports the single extreme eigenvalue in the policy's direction
    /// (shift removed). Nothing is filtered: a representation without a
    /// trivial component contributes no base eigenvalues.
    ///
    /// # Errors
    ///
    /// Graph generation, cover construction and eigensolver errors.
    #[instrument(skip(self, generator, rng), fields(generator = generator.name()))]
    pub fn generate_matrix_rep_eigs<M, R>(
        &self,
        size: usize,
        deg: usize,
        trials: usize,
        generator: &M,
        policy: SignPolicy,
        rng: &mut R,
    ) -> Result<Vec<f64>, CoverError>
    where
        M: MatrixGenerator + ?Sized,
        R: Rng + ?Sized,
    {
        let shift = policy.identity_shift(deg as f64);
        let mut output = Vec::with_capacity(trials);
        for trial in 0..trials {
            let base = BaseGraph::from_csr(random_simple_regular_graph(deg, size, 0.0, rng)?)?;
            let cover = build_matrix_cover(&base, generator, shift, rng)?;
            let extreme = self
                .solver
                .extremal_eigenvalues(&cover, 1, policy.direction())?;
            let eigenvalue = extreme[0] - shift;
            debug!(trial, eigenvalue, "representation eigenvalue");
            output.push(eigenvalue);
        }
        info!(trials, "representation run complete");
        Ok(output)
    }
}
