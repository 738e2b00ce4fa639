//! # Collection Benchmarks
//!
//! Cost of the decide → mutate → notify path, with and without subscribers,
//! and of the equivalence index on the unique variant.
//!
//! Run with: `cargo bench --package concordia`

// Benchmarks don't need docs
#![allow(missing_docs)]

use std::sync::Arc;
use std::thread;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use concordia::{SynchronizedHashSet, SynchronizedSequence, UniqueSynchronizedSequence};

/// Benchmark: append with nobody listening versus one handler.
fn bench_add(c: &mut Criterion) {
    let mut group = c.benchmark_group("add");

    for count in [1_000_u32, 10_000] {
        group.bench_with_input(BenchmarkId::new("silent", count), &count, |b, &count| {
            b.iter(|| {
                let seq = SynchronizedSequence::new();
                for i in 0..count {
                    seq.add(i).unwrap();
                }
                black_box(seq.len().unwrap())
            });
        });

        group.bench_with_input(BenchmarkId::new("observed", count), &count, |b, &count| {
            b.iter(|| {
                let seq = SynchronizedSequence::new();
                let _sub = seq.subscribe(|change| {
                    black_box(change);
                })
                .unwrap();
                for i in 0..count {
                    seq.add(i).unwrap();
                }
                black_box(seq.len().unwrap())
            });
        });
    }

    group.finish();
}

/// Benchmark: duplicate rejection on the unique sequence.
fn bench_unique_add(c: &mut Criterion) {
    let seq = UniqueSynchronizedSequence::from_source(0..10_000_u32);

    c.bench_function("unique_add_duplicate", |b| {
        b.iter(|| black_box(seq.add(black_box(5_000)).unwrap()));
    });

    c.bench_function("unique_contains", |b| {
        b.iter(|| black_box(seq.contains(&black_box(9_999)).unwrap()));
    });
}

/// Benchmark: snapshot copies while a writer is active.
fn bench_contended_snapshot(c: &mut Criterion) {
    c.bench_function("snapshot_with_writer", |b| {
        let seq = Arc::new(SynchronizedSequence::from_source(0..1_000_u32));
        b.iter(|| {
            let writer = {
                let seq = Arc::clone(&seq);
                thread::spawn(move || {
                    for (index, value) in (0..100_u32).enumerate() {
                        seq.set(index, value).unwrap();
                    }
                })
            };
            for _ in 0..10 {
                black_box(seq.snapshot().unwrap().count());
            }
            writer.join().unwrap();
        });
    });
}

/// Benchmark: bulk set algebra.
fn bench_set_union(c: &mut Criterion) {
    c.bench_function("set_union_10k", |b| {
        b.iter(|| {
            let set = SynchronizedHashSet::from_source(0..5_000_u32);
            black_box(set.union_with(2_500..12_500).unwrap())
        });
    });
}

criterion_group!(
    benches,
    bench_add,
    bench_unique_add,
    bench_contended_snapshot,
    bench_set_union,
);
criterion_main!(benches);
