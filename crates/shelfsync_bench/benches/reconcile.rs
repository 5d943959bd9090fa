//! Merge benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use shelfsync_bench::{diverged_copy, generate_records};
use shelfsync_sync_engine::{merge, merge_with_report};

/// Benchmark merging two diverged copies of one collection.
fn bench_merge(c: &mut Criterion) {
    let mut group = c.benchmark_group("merge");

    for count in [10, 100, 1000, 5000].iter() {
        let local = generate_records(*count, 64);
        let remote = diverged_copy(&local);
        group.bench_with_input(
            BenchmarkId::from_parameter(count),
            &(local, remote),
            |b, (local, remote)| {
                b.iter(|| black_box(merge(black_box(local), black_box(remote))));
            },
        );
    }

    group.finish();
}

/// Benchmark the counting variant used by inbound applies.
fn bench_merge_with_report(c: &mut Criterion) {
    let local = generate_records(1000, 64);
    let remote = diverged_copy(&local);

    c.bench_function("merge_with_report/1000", |b| {
        b.iter(|| black_box(merge_with_report(black_box(&local), black_box(&remote))));
    });
}

criterion_group!(benches, bench_merge, bench_merge_with_report);

criterion_main!(benches);
