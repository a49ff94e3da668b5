//! Benchmarks for model fitting, cross-validated grid search and correlation
//!
//! Run with: cargo bench --bench training_benchmark

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use faer::Mat;
use rand::prelude::*;
use rand::SeedableRng;

use lungrisk::pipeline::{correlation_matrix, GridSearch, LogisticRegression, DEFAULT_C_GRID};

/// Synthetic binary problem: the label depends on the first three features
/// plus noise, the rest are uninformative.
fn generate_problem(n_rows: usize, n_features: usize, seed: u64) -> (Mat<f64>, Vec<u8>) {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    let x = Mat::from_fn(n_rows, n_features, |_, _| rng.gen::<f64>() * 2.0 - 1.0);

    let y = (0..n_rows)
        .map(|i| {
            let signal: f64 = (0..n_features.min(3)).map(|j| x[(i, j)]).sum();
            let noise = rng.gen::<f64>() - 0.5;
            u8::from(signal + noise > 0.0)
        })
        .collect();
    (x, y)
}

/// Newton fit cost as the row count grows
fn benchmark_fit_by_rows(c: &mut Criterion) {
    let mut group = c.benchmark_group("fit_by_rows");
    group.sample_size(30);

    let n_features = 10;
    for n_rows in [500, 2_000, 10_000, 50_000] {
        let (x, y) = generate_problem(n_rows, n_features, 42);
        let estimator = LogisticRegression::new(1.0);

        group.throughput(Throughput::Elements(n_rows as u64));
        group.bench_with_input(BenchmarkId::new("newton", n_rows), &(&x, &y), |b, (x, y)| {
            b.iter(|| {
                let _ = estimator.fit(black_box(x), black_box(y));
            });
        });
    }

    group.finish();
}

/// Newton fit cost as the feature count grows
fn benchmark_fit_by_features(c: &mut Criterion) {
    let mut group = c.benchmark_group("fit_by_features");
    group.sample_size(20);

    let n_rows = 5_000;
    for n_features in [5, 20, 50, 100] {
        let (x, y) = generate_problem(n_rows, n_features, 42);
        let estimator = LogisticRegression::new(1.0);

        group.bench_with_input(
            BenchmarkId::new("newton", n_features),
            &(&x, &y),
            |b, (x, y)| {
                b.iter(|| {
                    let _ = estimator.fit(black_box(x), black_box(y));
                });
            },
        );
    }

    group.finish();
}

/// Full grid search over the default C values with 5 folds
fn benchmark_grid_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("grid_search");
    group.sample_size(10);

    for n_rows in [300, 3_000] {
        let (x, y) = generate_problem(n_rows, 8, 7);
        let search = GridSearch::new(DEFAULT_C_GRID.to_vec()).with_folds(5);

        group.throughput(Throughput::Elements(search.total_fits() as u64));
        group.bench_with_input(BenchmarkId::new("default_grid", n_rows), &(&x, &y), |b, (x, y)| {
            b.iter(|| {
                let _ = search.fit(black_box(x), black_box(y));
            });
        });
    }

    group.finish();
}

fn benchmark_correlation(c: &mut Criterion) {
    let mut group = c.benchmark_group("correlation_matrix");
    group.sample_size(20);

    let n_rows = 10_000;
    for n_features in [10, 50, 200] {
        let (x, _) = generate_problem(n_rows, n_features, 42);
        let names: Vec<String> = (0..n_features).map(|j| format!("feature_{}", j)).collect();

        group.bench_with_input(
            BenchmarkId::new("gram", n_features),
            &(&names, &x),
            |b, (names, x)| {
                b.iter(|| {
                    let _ = correlation_matrix(black_box(names), black_box(x));
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_fit_by_rows,
    benchmark_fit_by_features,
    benchmark_grid_search,
    benchmark_correlation,
);
criterion_main!(benches);
