/*!
 * Strategy Benchmarks
 *
 * Compare batch throughput of the execution strategies on a fixed
 * deterministic workload
 */

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use fenwick_par::{Generator, Operation, Strategy};

const DOMAIN: usize = 1 << 18;
const BATCH: usize = 1 << 13;
const WORKERS: usize = 4;

fn workload(query_permille: u32) -> Vec<Operation> {
    Generator::new(DOMAIN, query_permille, 15618).batch(BATCH)
}

fn bench_update_only_batches(c: &mut Criterion) {
    let mut group = c.benchmark_group("update_only");
    let batch = workload(0);

    for strategy in Strategy::ALL {
        group.bench_with_input(
            BenchmarkId::from_parameter(strategy),
            &batch,
            |b, batch| {
                let mut exec = strategy.build(DOMAIN, WORKERS, BATCH).unwrap();
                b.iter(|| black_box(exec.execute(batch)));
            },
        );
    }

    group.finish();
}

fn bench_mixed_batches(c: &mut Criterion) {
    let mut group = c.benchmark_group("mixed_10pct_queries");
    let batch = workload(100);

    for strategy in Strategy::ALL.into_iter().filter(|s| s.exact_queries()) {
        group.bench_with_input(
            BenchmarkId::from_parameter(strategy),
            &batch,
            |b, batch| {
                let mut exec = strategy.build(DOMAIN, WORKERS, BATCH).unwrap();
                b.iter(|| black_box(exec.execute(batch)));
            },
        );
    }

    group.finish();
}

fn bench_query_percentage_axis(c: &mut Criterion) {
    let mut group = c.benchmark_group("lazy_by_query_permille");

    for permille in [0u32, 10, 100, 500] {
        let batch = workload(permille);
        group.bench_with_input(
            BenchmarkId::from_parameter(permille),
            &batch,
            |b, batch| {
                let mut exec = Strategy::Lazy.build(DOMAIN, WORKERS, BATCH).unwrap();
                b.iter(|| black_box(exec.execute(batch)));
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_update_only_batches,
    bench_mixed_batches,
    bench_query_percentage_axis
);

criterion_main!(benches);
