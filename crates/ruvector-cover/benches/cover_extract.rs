//! Benchmarks for eigenvalue extraction.
//!
//! Compares the dense and Lanczos engines on cover-sized matrices and
//! measures a full extraction trial end to end, including cover assembly,
//! the eigensolver query and filtering.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;

use ruvector_cover::cover::random_simple_regular_graph;
use ruvector_cover::eigensolver::{DenseEigensolver, ExtremalEigensolver};
use ruvector_cover::extractor::{ExtremalEigenExtractor, TrialPlan};
use ruvector_cover::graph::BaseGraph;
use ruvector_cover::lanczos::LanczosEigensolver;
use ruvector_cover::permutation::UniformPermutation;
use ruvector_cover::types::{Direction, SignPolicy};

// ---------------------------------------------------------------------------
// Benchmark: dense vs Lanczos
// ---------------------------------------------------------------------------

fn engines(c: &mut Criterion) {
    let mut group = c.benchmark_group("extremal_engines");
    group.warm_up_time(Duration::from_secs(2));

    let lanczos = LanczosEigensolver::default();
    for &n in &[200, 400, 800] {
        let mut rng = StdRng::seed_from_u64(42);
        let matrix = random_simple_regular_graph(4, n, 2.0, &mut rng).expect("graph");

        group.sample_size(if n >= 800 { 10 } else { 30 });
        group.throughput(Throughput::Elements(matrix.nnz() as u64));

        group.bench_with_input(BenchmarkId::new("dense", n), &n, |b, _| {
            b.iter(|| {
                DenseEigensolver
                    .extremal_eigenvalues(criterion::black_box(&matrix), 4, Direction::LargestAlgebraic)
                    .expect("dense")
            });
        });
        group.bench_with_input(BenchmarkId::new("lanczos", n), &n, |b, _| {
            b.iter(|| {
                lanczos
                    .extremal_eigenvalues(criterion::black_box(&matrix), 4, Direction::LargestAlgebraic)
                    .expect("lanczos")
            });
        });
    }
    group.finish();
}

// ---------------------------------------------------------------------------
// Benchmark: one extraction trial
// ---------------------------------------------------------------------------

fn extraction_trial(c: &mut Criterion) {
    let mut group = c.benchmark_group("extraction_trial");
    group.warm_up_time(Duration::from_secs(2));
    group.sample_size(20);

    let extractor: ExtremalEigenExtractor = ExtremalEigenExtractor::default();
    let k4 = BaseGraph::complete(4).expect("K4");

    for &degree in &[100, 500, 2500] {
        let plan = TrialPlan::new(degree, 3.0, SignPolicy::MaxPositive, 4).expect("plan");
        let reference = extractor
            .estimate_base(&k4, SignPolicy::MaxPositive)
            .expect("base spectrum");

        group.throughput(Throughput::Elements((4 * degree) as u64));
        group.bench_with_input(BenchmarkId::new("k4_cover", degree), &degree, |b, _| {
            let mut rng = StdRng::seed_from_u64(9);
            b.iter(|| {
                extractor
                    .run_trial(0, &k4, &UniformPermutation, &reference, &plan, &mut rng)
                    .expect("trial")
            });
        });
    }
    group.finish();
}

criterion_group!(extract, engines, extraction_trial);
criterion_main!(extract);
