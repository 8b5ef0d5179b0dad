// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! Core B+-tree operation benchmarks.
//!
//! Measures performance of:
//! - put() - Point insertion
//! - get() - Point lookup
//! - remove() - Point deletion
//! - get_range() - Range scan
//! - bulk_load() - Bottom-up construction from presorted input
//!
//! ## Performance Targets
//! - get: O(log n) tree descent + binary search per level
//! - put/remove: O(log n), occasional split/merge
//! - get_range: O(log n + k)
//! - bulk_load: O(n)

use bptree::btree::BPlusTree;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

const MAX_KEYS: u16 = 32;

fn build_tree(count: i64) -> BPlusTree<i64, i64> {
    let mut tree = BPlusTree::new(MAX_KEYS, false).unwrap();
    for k in 0..count {
        tree.put(k, k * 2).unwrap();
    }
    tree
}

/// Benchmark get().
///
/// Target: O(log n) per call.
fn bench_get(c: &mut Criterion) {
    let mut group = c.benchmark_group("get");

    for size in [100, 1_000, 10_000, 100_000].iter() {
        let tree = build_tree(*size);
        group.throughput(Throughput::Elements(1));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| {
                black_box(tree.get(&(*size / 2)));
            });
        });
    }

    group.finish();
}

/// Benchmark put() into a tree of growing size.
///
/// Target: O(log n) amortised, occasional split.
fn bench_put(c: &mut Criterion) {
    let mut group = c.benchmark_group("put");

    for size in [100, 1_000, 10_000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            b.iter_batched(
                || build_tree(size),
                |mut tree| {
                    tree.put(size, size * 2).unwrap();
                    black_box(tree);
                },
                criterion::BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

/// Benchmark remove(), exercising the borrow/merge rebalancer.
///
/// Target: O(log n) amortised.
fn bench_remove(c: &mut Criterion) {
    let mut group = c.benchmark_group("remove");
    group.sample_size(30);

    for size in [100, 1_000, 10_000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            b.iter_batched(
                || build_tree(size),
                |mut tree| {
                    tree.remove(&(size / 2)).unwrap();
                    black_box(tree);
                },
                criterion::BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

/// Benchmark get_range() over an ascending window.
///
/// Target: O(log n + k).
fn bench_range_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("range_scan");

    for size in [1_000, 10_000, 100_000].iter() {
        let tree = build_tree(*size);
        let window = size / 10;
        group.throughput(Throughput::Elements(window as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, size| {
            b.iter(|| {
                black_box(tree.get_range(&(size / 2), &(size / 2 + window)));
            });
        });
    }

    group.finish();
}

/// Benchmark bulk_load() from presorted input.
///
/// Target: O(n).
fn bench_bulk_load(c: &mut Criterion) {
    let mut group = c.benchmark_group("bulk_load");
    group.sample_size(20);

    for size in [1_000, 10_000, 100_000].iter() {
        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            b.iter_batched(
                || (0..size).map(|k| (k, k * 2)).collect::<Vec<_>>(),
                |pairs| {
                    let mut tree: BPlusTree<i64, i64> = BPlusTree::new(MAX_KEYS, false).unwrap();
                    tree.bulk_load(pairs).unwrap();
                    black_box(tree);
                },
                criterion::BatchSize::LargeInput,
            );
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_get,
    bench_put,
    bench_remove,
    bench_range_scan,
    bench_bulk_load
);
criterion_main!(benches);
