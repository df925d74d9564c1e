//! Chunked fan-out of independent trials.
//!
//! [`BatchRunner`] splits a run of `trials` trials into chunks, gives every
//! chunk its own seeded [`StdRng`], and runs the chunks sequentially or, with
//! the `parallel` feature, on a rayon pool of `workers` threads.
//!
//! # Chunking
//!
//! | Trials | Chunks |
//! |--------|--------|
//! | `> 10 * workers` | `10 * workers` chunks of `trials / (10 * workers)`, then one remainder chunk |
//! | otherwise | one trial per chunk |
//!
//! # Seeding
//!
//! Chunk `c` is seeded with `seed + c * 1000003` when a base seed is
//! configured. Without one the base seed is drawn once per run from the
//! process id and the wall clock, so concurrent processes do not repeat
//! each other's draws.
//!
//! Output is in trial order regardless of completion order, and the first
//! failing trial aborts the whole run. The eigensolvers are
//! single-threaded, so a pool of `workers` threads uses `workers` cores.

use std::ops::Range;
use std::time::{SystemTime, UNIX_EPOCH};

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::eigensolver::{AutoEigensolver, ExtremalEigensolver};
use crate::error::{CoverError, ValidationError};
use crate::extractor::{ExtremalEigenExtractor, TrialPlan, TrialReport};
use crate::graph::BaseGraph;
use crate::permutation::PermutationGenerator;
use crate::types::SignPolicy;
use crate::validation::validate_cover_degree;

/// Seed stride between consecutive chunks.
const CHUNK_SEED_STRIDE: u64 = 1_000_003;

// ---------------------------------------------------------------------------
// BatchConfig
// ---------------------------------------------------------------------------

/// Fan-out settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Worker threads (and the unit of the chunking rule).
    ///
    /// Default: available parallelism, or `1` if unknown.
    pub workers: usize,

    /// Base seed. `None` derives one from the process id and wall clock.
    ///
    /// Default: `None`.
    pub seed: Option<u64>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            workers: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            seed: None,
        }
    }
}

/// Chunk lengths for `trials` trials over `workers` workers.
///
/// Empty chunks are omitted.
pub fn chunk_sizes(trials: usize, workers: usize) -> Vec<usize> {
    let batches = workers.max(1).saturating_mul(10);
    if trials > batches {
        let size = trials / batches;
        let remaining = trials - batches * size;
        let mut sizes = vec![size; batches];
        if remaining > 0 {
            sizes.push(remaining);
        }
        sizes
    } else {
        vec![1; trials]
    }
}

fn entropy_seed() -> u64 {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_default();
    (u64::from(std::process::id()) << 32) ^ nanos
}

// ---------------------------------------------------------------------------
// BatchRunner
// ---------------------------------------------------------------------------

/// Runs many independent trials of an [`ExtremalEigenExtractor`].
#[derive(Debug, Clone, Default)]
pub struct BatchRunner<S = AutoEigensolver> {
    /// Fan-out settings.
    pub config: BatchConfig,
    /// Extractor every trial runs through.
    pub extractor: ExtremalEigenExtractor<S>,
}

impl<S: ExtremalEigensolver> BatchRunner<S> {
    /// Create a runner.
    pub fn new(config: BatchConfig, extractor: ExtremalEigenExtractor<S>) -> Self {
        Self { config, extractor }
    }

    /// Execute `job` on every chunk and concatenate the outputs in chunk
    /// order. `job` receives the chunk index, the trial range and the
    /// chunk's RNG.
    fn execute<T, F>(&self, trials: usize, job: F) -> Result<Vec<T>, CoverError>
    where
        T: Send,
        F: Fn(usize, Range<usize>, &mut StdRng) -> Result<Vec<T>, CoverError> + Sync,
    {
        if self.config.workers == 0 {
            return Err(ValidationError::ParameterOutOfRange {
                name: "workers".into(),
                value: "0".into(),
                expected: ">= 1".into(),
            }
            .into());
        }
        let base_seed = self.config.seed.unwrap_or_else(entropy_seed);

        let mut chunks = Vec::new();
        let mut start = 0usize;
        for len in chunk_sizes(trials, self.config.workers) {
            chunks.push(start..start + len);
            start += len;
        }
        debug!(chunks = chunks.len(), base_seed, "dispatching trial chunks");

        let run_chunk = |(idx, range): (usize, Range<usize>)| {
            let seed = base_seed.wrapping_add(idx as u64 * CHUNK_SEED_STRIDE);
            let mut rng = StdRng::seed_from_u64(seed);
            job(idx, range, &mut rng)
        };

        #[cfg(feature = "parallel")]
        let outputs: Vec<Vec<T>> = {
            use rayon::prelude::*;

            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.config.workers)
                .build()
                .map_err(|e| CoverError::BackendError(e.to_string()))?;
            pool.install(|| {
                chunks
                    .into_par_iter()
                    .enumerate()
                    .map(run_chunk)
                    .collect::<Result<Vec<_>, _>>()
            })?
        };

        #[cfg(not(feature = "parallel"))]
        let outputs: Vec<Vec<T>> = chunks
            .into_iter()
            .enumerate()
            .map(run_chunk)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(outputs.into_iter().flatten().collect())
    }

    /// Cover trials against one base graph, fanned out over chunks.
    ///
    /// The base spectrum is computed once and shared. Each chunk resolves
    /// its own [`TrialPlan`], so the automatic initial window follows the
    /// chunk length.
    ///
    /// # Errors
    ///
    /// The first error of any trial, including
    /// [`CoverError::CertificationFailed`], aborts the run.
    #[instrument(skip(self, base, generator), fields(base_size = base.size()))]
    pub fn run<G>(
        &self,
        base: &BaseGraph,
        degree: usize,
        generator: &G,
        trials: usize,
        trivial_eigenvalue: f64,
        policy: SignPolicy,
    ) -> Result<Vec<TrialReport>, CoverError>
    where
        G: PermutationGenerator + Sync + ?Sized,
    {
        validate_cover_degree(degree, base.size())?;
        // Fail on bad parameters before the base spectrum is computed.
        TrialPlan::new(degree, trivial_eigenvalue, policy, 1)?;
        let reference = self.extractor.estimate_base(base, policy)?;
        let extractor = &self.extractor;

        let reports = self.execute(trials, |_, range, rng| {
            let window = extractor.config.window_for(range.len());
            let plan = TrialPlan::new(degree, trivial_eigenvalue, policy, window)?;
            range
                .map(|trial| extractor.run_trial(trial, base, generator, &reference, &plan, rng))
                .collect()
        })?;
        info!(trials = reports.len(), "batch complete");
        Ok(reports)
    }

    /// [`run`](Self::run), keeping only the eigenvalues.
    ///
    /// # Errors
    ///
    /// As [`run`](Self::run).
    pub fn generate_new_extremal_eigs<G>(
        &self,
        base: &BaseGraph,
        degree: usize,
        generator: &G,
        trials: usize,
        trivial_eigenvalue: f64,
        policy: SignPolicy,
    ) -> Result<Vec<f64>, CoverError>
    where
        G: PermutationGenerator + Sync + ?Sized,
    {
        let reports = self.run(base, degree, generator, trials, trivial_eigenvalue, policy)?;
        Ok(reports.into_iter().map(|r| r.eigenvalue).collect())
    }

    /// Loop-graph trials fanned out over chunks.
    ///
    /// # Errors
    ///
    /// The first error of any trial aborts the run.
    #[instrument(skip(self))]
    pub fn run_loop(
        &self,
        size: usize,
        deg: usize,
        trials: usize,
        policy: SignPolicy,
        simple: bool,
    ) -> Result<Vec<TrialReport>, CoverError> {
        let extractor = &self.extractor;
        let reports = self.execute(trials, |_, range, rng| {
            range
                .map(|trial| extractor.run_loop_trial(trial, size, deg, policy, simple, rng))
                .collect()
        })?;
        info!(trials = reports.len(), "loop batch complete");
        Ok(reports)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eigensolver::DenseEigensolver;
    use crate::extractor::ExtractorConfig;
    use crate::permutation::Derangement;
    use crate::spectrum::SpectrumConfig;

    fn runner(seed: Option<u64>, workers: usize) -> BatchRunner<DenseEigensolver> {
        BatchRunner::new(
            BatchConfig { workers, seed },
            ExtremalEigenExtractor::new(
                ExtractorConfig::default(),
                SpectrumConfig::default(),
                DenseEigensolver,
            ),
        )
    }

    #[test]
    fn chunking_matches_batch_rule() {
        assert_eq!(chunk_sizes(5, 2), vec![1; 5]);
        assert_eq!(chunk_sizes(20, 2), vec![1; 20]);
        let sizes = chunk_sizes(47, 2);
        assert_eq!(sizes.len(), 21);
        assert_eq!(&sizes[..20], &[2; 20]);
        assert_eq!(sizes[20], 7);
        assert_eq!(chunk_sizes(40, 2), vec![2; 20]);
        assert!(chunk_sizes(0, 4).is_empty());
    }

    #[test]
    fn seeded_runs_are_reproducible_and_ordered() {
        let base = BaseGraph::complete(4).unwrap();
        let a = runner(Some(99), 2)
            .run(&base, 4, &Derangement, 6, 3.0, SignPolicy::MaxPositive)
            .unwrap();
        let b = runner(Some(99), 2)
            .run(&base, 4, &Derangement, 6, 3.0, SignPolicy::MaxPositive)
            .unwrap();
        let eigs = |reports: &[TrialReport]| -> Vec<f64> {
            reports.iter().map(|r| r.eigenvalue).collect()
        };
        assert_eq!(eigs(&a), eigs(&b));
        let trials: Vec<usize> = a.iter().map(|r| r.trial).collect();
        assert_eq!(trials, (0..6).collect::<Vec<_>>());
    }

    #[test]
    fn first_error_aborts() {
        let base = BaseGraph::complete(4).unwrap();
        // Derangements of size 1 do not exist.
        assert!(matches!(
            runner(Some(1), 2).run(&base, 1, &Derangement, 3, 3.0, SignPolicy::MaxPositive),
            Err(CoverError::DerangementImpossible { n: 1 })
        ));
    }

    #[test]
    fn zero_workers_rejected() {
        assert!(runner(Some(1), 0)
            .run_loop(10, 4, 2, SignPolicy::MaxPositive, false)
            .is_err());
    }

    #[test]
    fn loop_batch_returns_one_report_per_trial() {
        let reports = runner(Some(5), 1)
            .run_loop(30, 4, 12, SignPolicy::MaxNegative, true)
            .unwrap();
        assert_eq!(reports.len(), 12);
        assert!(reports.iter().all(|r| r.eigenvalue < 0.0));
    }
}
