//! Heap operation benchmarks across index backends
//!
//! ## Running
//!
//! ```bash
//! cargo bench --bench heap_ops
//!
//! # Only the open-addressing backend
//! cargo bench --bench heap_ops -- 'open/'
//! ```
//!
//! `std_binary_heap` is a baseline without an index (and so without update).

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_indexed_heap::{ChainedIndex, HeapConfig, IndexedHeap, OpenIndex, SlotIndex};
use rustc_hash::FxHashMap;
use std::cmp::Reverse;
use std::collections::BinaryHeap;

const SIZES: [usize; 3] = [1 << 10, 1 << 14, 1 << 18];

fn random_priorities(n: usize, seed: u64) -> Vec<u64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n).map(|_| rng.gen()).collect()
}

fn push_pop_all<I: SlotIndex<u32>>(priorities: &[u64]) -> u64 {
    let mut heap: IndexedHeap<u64, u32, I> = IndexedHeap::new();
    for (element, &priority) in priorities.iter().enumerate() {
        heap.push(priority, element as u32).unwrap();
    }
    let mut checksum = 0u64;
    while let Some((priority, _)) = heap.pop() {
        checksum = checksum.wrapping_add(priority);
    }
    checksum
}

/// Fills the heap, then decreases every key once to half its value.
fn decrease_all<I: SlotIndex<u32>>(priorities: &[u64]) -> usize {
    let config = HeapConfig::new().with_min_capacity(priorities.len());
    let mut heap: IndexedHeap<u64, u32, I> = IndexedHeap::with_config(config).unwrap();
    for (element, &priority) in priorities.iter().enumerate() {
        heap.push(priority, element as u32).unwrap();
    }
    for (element, &priority) in priorities.iter().enumerate() {
        heap.update(priority / 2, &(element as u32));
    }
    heap.len()
}

fn search_all<I: SlotIndex<u32>>(heap: &IndexedHeap<u64, u32, I>, n: usize) -> u64 {
    (0..n as u32)
        .filter_map(|element| heap.search(&element))
        .fold(0u64, |acc, &p| acc.wrapping_add(p))
}

fn benchmark_push_pop(c: &mut Criterion) {
    let mut group = c.benchmark_group("push_pop");
    group.sample_size(20);

    for n in SIZES {
        let priorities = random_priorities(n, 1);
        group.throughput(Throughput::Elements(n as u64));

        group.bench_with_input(BenchmarkId::new("chained", n), &priorities, |b, ps| {
            b.iter(|| black_box(push_pop_all::<ChainedIndex<u32>>(ps)))
        });
        group.bench_with_input(BenchmarkId::new("open", n), &priorities, |b, ps| {
            b.iter(|| black_box(push_pop_all::<OpenIndex<u32>>(ps)))
        });
        group.bench_with_input(BenchmarkId::new("fx_hashmap", n), &priorities, |b, ps| {
            b.iter(|| black_box(push_pop_all::<FxHashMap<u32, usize>>(ps)))
        });
        group.bench_with_input(
            BenchmarkId::new("std_binary_heap", n),
            &priorities,
            |b, ps| {
                b.iter(|| {
                    let mut heap: BinaryHeap<Reverse<(u64, u32)>> = ps
                        .iter()
                        .enumerate()
                        .map(|(e, &p)| Reverse((p, e as u32)))
                        .collect();
                    let mut checksum = 0u64;
                    while let Some(Reverse((p, _))) = heap.pop() {
                        checksum = checksum.wrapping_add(p);
                    }
                    black_box(checksum)
                })
            },
        );
    }

    group.finish();
}

fn benchmark_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("decrease_all");
    group.sample_size(20);

    for n in SIZES {
        let priorities = random_priorities(n, 2);
        group.throughput(Throughput::Elements(n as u64));

        group.bench_with_input(BenchmarkId::new("chained", n), &priorities, |b, ps| {
            b.iter(|| black_box(decrease_all::<ChainedIndex<u32>>(ps)))
        });
        group.bench_with_input(BenchmarkId::new("open", n), &priorities, |b, ps| {
            b.iter(|| black_box(decrease_all::<OpenIndex<u32>>(ps)))
        });
        group.bench_with_input(BenchmarkId::new("fx_hashmap", n), &priorities, |b, ps| {
            b.iter(|| black_box(decrease_all::<FxHashMap<u32, usize>>(ps)))
        });
    }

    group.finish();
}

fn benchmark_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("search");

    for n in SIZES {
        let priorities = random_priorities(n, 3);
        group.throughput(Throughput::Elements(n as u64));

        let mut chained: IndexedHeap<u64, u32, ChainedIndex<u32>> = IndexedHeap::new();
        let mut open: IndexedHeap<u64, u32, OpenIndex<u32>> = IndexedHeap::new();
        for (element, &priority) in priorities.iter().enumerate() {
            chained.push(priority, element as u32).unwrap();
            open.push(priority, element as u32).unwrap();
        }

        group.bench_with_input(BenchmarkId::new("chained", n), &n, |b, &n| {
            b.iter(|| black_box(search_all(&chained, n)))
        });
        group.bench_with_input(BenchmarkId::new("open", n), &n, |b, &n| {
            b.iter(|| black_box(search_all(&open, n)))
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_push_pop, benchmark_update, benchmark_search);
criterion_main!(benches);
