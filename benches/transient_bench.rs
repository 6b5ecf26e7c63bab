//! Benchmark for the transient builders.
//!
//! Compares batch construction through a transient against repeated
//! persistent edits and the standard library equivalents.

use champ_collections::persistent::{
    PersistentHashMap, PersistentHashSet, PersistentVector, TransientHashMap, TransientHashSet,
    TransientVector,
};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::collections::{HashMap, HashSet};
use std::hint::black_box;

// =============================================================================
// TransientVector Benchmarks
// =============================================================================

fn benchmark_transient_vector_push_back(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("transient_vector_push_back");

    for size in [1_000, 10_000, 100_000] {
        group.bench_with_input(
            BenchmarkId::new("TransientVector", size),
            &size,
            |bencher, &size| {
                bencher.iter(|| {
                    let mut transient = TransientVector::new();
                    for index in 0..size {
                        transient.push_back(black_box(index));
                    }
                    black_box(transient.persistent())
                });
            },
        );

        group.bench_with_input(
            BenchmarkId::new("PersistentVector", size),
            &size,
            |bencher, &size| {
                bencher.iter(|| {
                    let mut vector = PersistentVector::new();
                    for index in 0..size {
                        vector = vector.push_back(black_box(index));
                    }
                    black_box(vector)
                });
            },
        );
    }

    group.finish();
}

fn benchmark_transient_vector_set(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("transient_vector_set");

    for size in [1_000, 10_000] {
        let vector: PersistentVector<i32> = (0..size).collect();

        group.bench_with_input(
            BenchmarkId::new("TransientVector", size),
            &size,
            |bencher, &size| {
                bencher.iter(|| {
                    let mut transient = vector.clone().transient();
                    for index in 0..size as usize {
                        transient.set(black_box(index), -1);
                    }
                    black_box(transient.persistent())
                });
            },
        );

        group.bench_with_input(
            BenchmarkId::new("PersistentVector", size),
            &size,
            |bencher, &size| {
                bencher.iter(|| {
                    let mut current = vector.clone();
                    for index in 0..size as usize {
                        if let Some(updated) = current.update(black_box(index), -1) {
                            current = updated;
                        }
                    }
                    black_box(current)
                });
            },
        );
    }

    group.finish();
}

// =============================================================================
// TransientHashMap Benchmarks
// =============================================================================

fn benchmark_transient_hashmap_insert(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("transient_hashmap_insert");

    for size in [1_000, 10_000, 100_000] {
        group.bench_with_input(
            BenchmarkId::new("TransientHashMap", size),
            &size,
            |bencher, &size| {
                bencher.iter(|| {
                    let mut transient = TransientHashMap::new();
                    for index in 0..size {
                        transient.insert(black_box(index), index);
                    }
                    black_box(transient.persistent())
                });
            },
        );

        group.bench_with_input(
            BenchmarkId::new("PersistentHashMap", size),
            &size,
            |bencher, &size| {
                bencher.iter(|| {
                    let mut map = PersistentHashMap::new();
                    for index in 0..size {
                        map = map.insert(black_box(index), index);
                    }
                    black_box(map)
                });
            },
        );

        group.bench_with_input(BenchmarkId::new("HashMap", size), &size, |bencher, &size| {
            bencher.iter(|| {
                let mut map = HashMap::new();
                for index in 0..size {
                    map.insert(black_box(index), index);
                }
                black_box(map)
            });
        });
    }

    group.finish();
}

// =============================================================================
// TransientHashSet Benchmarks
// =============================================================================

fn benchmark_transient_hashset_insert(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("transient_hashset_insert");

    for size in [1_000, 10_000] {
        group.bench_with_input(
            BenchmarkId::new("TransientHashSet", size),
            &size,
            |bencher, &size| {
                bencher.iter(|| {
                    let mut transient = TransientHashSet::new();
                    for index in 0..size {
                        transient.insert(black_box(index));
                    }
                    black_box(transient.persistent())
                });
            },
        );

        group.bench_with_input(
            BenchmarkId::new("PersistentHashSet", size),
            &size,
            |bencher, &size| {
                bencher.iter(|| {
                    let mut set = PersistentHashSet::new();
                    for index in 0..size {
                        set = set.insert(black_box(index));
                    }
                    black_box(set)
                });
            },
        );

        group.bench_with_input(BenchmarkId::new("HashSet", size), &size, |bencher, &size| {
            bencher.iter(|| {
                let mut set = HashSet::new();
                for index in 0..size {
                    set.insert(black_box(index));
                }
                black_box(set)
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_transient_vector_push_back,
    benchmark_transient_vector_set,
    benchmark_transient_hashmap_insert,
    benchmark_transient_hashset_insert
);
criterion_main!(benches);
