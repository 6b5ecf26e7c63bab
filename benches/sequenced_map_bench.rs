//! Benchmark for SequencedHashMap.
//!
//! Measures the cost of keeping insertion order on top of the hash trie,
//! against the unordered PersistentHashMap.

use champ_collections::persistent::{PersistentHashMap, SequencedHashMap, TransientSequencedHashMap};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;

// =============================================================================
// insert Benchmark
// =============================================================================

fn benchmark_insert_last(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("sequenced_insert_last");

    for size in [1_000, 10_000] {
        group.bench_with_input(
            BenchmarkId::new("SequencedHashMap", size),
            &size,
            |bencher, &size| {
                bencher.iter(|| {
                    let mut map = SequencedHashMap::new();
                    for index in 0..size {
                        map = map.insert_last(black_box(index), index);
                    }
                    black_box(map)
                });
            },
        );

        group.bench_with_input(
            BenchmarkId::new("TransientSequencedHashMap", size),
            &size,
            |bencher, &size| {
                bencher.iter(|| {
                    let mut transient = TransientSequencedHashMap::new();
                    for index in 0..size {
                        transient.insert_last(black_box(index), index);
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
    }

    group.finish();
}

// =============================================================================
// move-to-front Benchmark (LRU style access)
// =============================================================================

fn benchmark_move_to_front(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("sequenced_move_to_front");

    for size in [1_000, 10_000] {
        let map: SequencedHashMap<u32, u32> = (0..size).map(|index| (index, index)).collect();

        group.bench_with_input(BenchmarkId::new("insert_first", size), &size, |bencher, &size| {
            bencher.iter(|| {
                let mut current = map.clone();
                for key in (0..size).step_by(13) {
                    current = current.insert_first(black_box(key), key);
                }
                black_box(current)
            });
        });
    }

    group.finish();
}

// =============================================================================
// removal Benchmark
// =============================================================================

fn benchmark_pop_first(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("sequenced_pop_first");

    for size in [1_000, 10_000] {
        let map: SequencedHashMap<u32, u32> = (0..size).map(|index| (index, index)).collect();

        group.bench_with_input(BenchmarkId::new("SequencedHashMap", size), &map, |bencher, map| {
            bencher.iter(|| {
                let mut current = map.clone();
                while let Some((rest, key, _)) = current.pop_first() {
                    black_box(key);
                    current = rest;
                }
                black_box(current)
            });
        });
    }

    group.finish();
}

// =============================================================================
// iteration Benchmark
// =============================================================================

fn benchmark_iteration(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("sequenced_iteration");

    for size in [1_000, 100_000] {
        let map: SequencedHashMap<u64, u64> = (0..size).map(|index| (index, index)).collect();

        group.bench_with_input(BenchmarkId::new("forward", size), &map, |bencher, map| {
            bencher.iter(|| black_box(map.values().sum::<u64>()));
        });

        group.bench_with_input(BenchmarkId::new("reverse", size), &map, |bencher, map| {
            bencher.iter(|| black_box(map.values().rev().sum::<u64>()));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_insert_last,
    benchmark_move_to_front,
    benchmark_pop_first,
    benchmark_iteration
);
criterion_main!(benches);
