//! Stress tests that push the heap and its index backends under load
//!
//! These tests perform large numbers of operations in various patterns
//! to catch growth, rehash and sift edge cases.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_indexed_heap::{ChainedIndex, HeapConfig, IndexedHeap, OpenIndex, SlotIndex};
use rustc_hash::FxHashMap;

/// Insert a lot, pop everything
fn test_massive_operations<I: SlotIndex<u32>>() {
    let mut heap: IndexedHeap<u32, u32, I> = IndexedHeap::new();
    for i in (0..20_000u32).rev() {
        heap.push(i, i).unwrap();
    }
    assert_eq!(heap.len(), 20_000);

    for i in 0..20_000u32 {
        assert_eq!(heap.pop(), Some((i, i)));
    }
    assert!(heap.is_empty());
}

/// Every element gets decreased once, then popped in the new order
fn test_many_decreases<I: SlotIndex<u32>>() {
    let mut heap: IndexedHeap<i64, u32, I> = IndexedHeap::new();
    for i in 0..5_000u32 {
        heap.push(1_000_000 + i64::from(i), i).unwrap();
    }
    for i in 0..5_000u32 {
        assert!(heap.update(i64::from(i), &i).is_some());
    }
    for i in 0..5_000u32 {
        assert_eq!(heap.pop(), Some((i64::from(i), i)));
    }
}

/// Push two, pop one, for a while
fn test_alternating_ops<I: SlotIndex<u32>>() {
    let mut heap: IndexedHeap<u32, u32, I> = IndexedHeap::new();
    let mut last = 0;
    for i in 0..2_000u32 {
        heap.push(i * 2, i).unwrap();
        heap.push(i * 2 + 1, i + 100_000).unwrap();
        let (priority, _) = heap.pop().unwrap();
        assert!(priority >= last);
        last = priority;
    }
    assert_eq!(heap.len(), 2_000);
    while let Some((priority, _)) = heap.pop() {
        assert!(priority >= last);
        last = priority;
    }
}

/// Random churn: pushes, pops, updates and removes over a bounded key space
fn test_random_churn<I: SlotIndex<u32>>(seed: u64) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut heap: IndexedHeap<i32, u32, I> = IndexedHeap::new();
    let mut live: FxHashMap<u32, i32> = FxHashMap::default();

    for _ in 0..50_000 {
        let element = rng.gen_range(0..2_048u32);
        let priority = rng.gen_range(-100_000..100_000);
        match rng.gen_range(0..10) {
            0..=3 => {
                if let Some(previous) = heap.push_or_update(priority, element).unwrap() {
                    assert_eq!(live.get(&element), Some(&previous));
                }
                live.insert(element, priority);
            }
            4..=5 => {
                if let Some((priority, element)) = heap.pop() {
                    assert_eq!(Some(&priority), live.values().min());
                    assert_eq!(live.remove(&element), Some(priority));
                }
            }
            6..=8 => {
                let previous = heap.update(priority, &element);
                assert_eq!(previous, live.get(&element).copied());
                if previous.is_some() {
                    live.insert(element, priority);
                }
            }
            _ => {
                let removed = heap.remove(&element).map(|(p, _)| p);
                assert_eq!(removed, live.remove(&element));
            }
        }
    }

    assert_eq!(heap.len(), live.len());
    for (element, priority) in &live {
        assert_eq!(heap.search(element), Some(priority));
    }
    let mut expected: Vec<i32> = live.values().copied().collect();
    expected.sort_unstable();
    let drained: Vec<i32> = heap.into_sorted_vec().into_iter().map(|(p, _)| p).collect();
    assert_eq!(drained, expected);
}

/// Fill to the maximum, drain, refill; capacity never shrinks or overshoots
fn test_fill_to_max_repeatedly<I: SlotIndex<u32>>() {
    let max = 3_000;
    let config = HeapConfig::new().with_max_capacity(max);
    let mut heap: IndexedHeap<u32, u32, I> = IndexedHeap::with_config(config).unwrap();
    for round in 0..3u32 {
        for i in 0..max as u32 {
            heap.push(i.wrapping_mul(2_654_435_761) ^ round, i).unwrap();
        }
        assert!(heap.push(0, u32::MAX).is_err());
        assert_eq!(heap.capacity(), max);

        let mut last = 0;
        while let Some((priority, _)) = heap.pop() {
            assert!(priority >= last);
            last = priority;
        }
        assert_eq!(heap.capacity(), max);
    }
}

/// Elements whose hashes collide heavily in low bits
fn test_strided_keys<I: SlotIndex<u64>>() {
    let mut heap: IndexedHeap<u64, u64, I> = IndexedHeap::new();
    for i in 0..4_096u64 {
        heap.push(4_096 - i, i << 32).unwrap();
    }
    for i in (0..4_096u64).step_by(2) {
        assert_eq!(heap.remove(&(i << 32)), Some((4_096 - i, i << 32)));
    }
    for i in (1..4_096u64).step_by(2) {
        assert_eq!(heap.search(&(i << 32)), Some(&(4_096 - i)));
    }
    assert_eq!(heap.len(), 2_048);
}

macro_rules! stress_tests {
    ($module:ident, $index:ident) => {
        mod $module {
            use super::*;

            #[test]
            fn massive_operations() {
                test_massive_operations::<$index<u32>>();
            }

            #[test]
            fn many_decreases() {
                test_many_decreases::<$index<u32>>();
            }

            #[test]
            fn alternating_ops() {
                test_alternating_ops::<$index<u32>>();
            }

            #[test]
            fn random_churn() {
                for seed in [1, 42, 0xDEAD_BEEF] {
                    test_random_churn::<$index<u32>>(seed);
                }
            }

            #[test]
            fn fill_to_max_repeatedly() {
                test_fill_to_max_repeatedly::<$index<u32>>();
            }

            #[test]
            fn strided_keys() {
                test_strided_keys::<$index<u64>>();
            }
        }
    };
}

type FxSlotMap<K> = FxHashMap<K, usize>;

stress_tests!(chained, ChainedIndex);
stress_tests!(open, OpenIndex);
stress_tests!(hashmap, FxSlotMap);
