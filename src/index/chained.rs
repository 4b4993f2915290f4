//! Separate-chaining index with a prime bucket count
//!
//! Buckets are chosen by the division method (`hash % buckets`) over a table
//! of primes roughly doubling in size. Each bucket is a short inline chain;
//! with the default load factor of 1 most chains hold zero or one entry and
//! never touch the allocator.

use super::{LoadFactor, SlotIndex};
use crate::traits::HeapError;
use rustc_hash::FxBuildHasher;
use smallvec::SmallVec;
use std::fmt;
use std::hash::{BuildHasher, Hash};

/// Primes close to successive powers of two, spaced for doubling growth
const PRIMES: [u64; 30] = [
    11,
    23,
    53,
    97,
    193,
    389,
    769,
    1543,
    3079,
    6151,
    12289,
    24593,
    49157,
    98317,
    196613,
    393241,
    786433,
    1572869,
    3145739,
    6291469,
    12582917,
    25165843,
    50331653,
    100663319,
    201326611,
    402653189,
    805306457,
    1610612741,
    3221225473,
    4294967291,
];

type Chain<K> = SmallVec<[(K, usize); 2]>;

/// Chaining hash index keyed by element identity
pub struct ChainedIndex<K, S = FxBuildHasher> {
    buckets: Vec<Chain<K>>,
    len: usize,
    /// Entry count that triggers the next growth
    max_len: usize,
    load_factor: LoadFactor,
    hasher: S,
}

impl<K, S> ChainedIndex<K, S>
where
    K: Hash + Eq + Clone,
    S: BuildHasher,
{
    /// Creates an index with an explicit hasher.
    pub fn with_capacity_and_hasher(
        capacity: usize,
        load_factor: LoadFactor,
        hasher: S,
    ) -> Result<Self, HeapError> {
        load_factor.validate()?;
        let bucket_count = bucket_count_for(capacity, &load_factor);
        Ok(ChainedIndex {
            buckets: empty_buckets(bucket_count),
            len: 0,
            max_len: load_factor.threshold(bucket_count),
            load_factor,
            hasher,
        })
    }

    /// Number of buckets currently allocated
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    #[inline]
    fn bucket_of(&self, key: &K) -> usize {
        (self.hasher.hash_one(key) % self.buckets.len() as u64) as usize
    }

    fn grow(&mut self) {
        let bucket_count = next_bucket_count(self.buckets.len());
        let old = std::mem::replace(&mut self.buckets, empty_buckets(bucket_count));
        for (key, slot) in old.into_iter().flatten() {
            let b = self.bucket_of(&key);
            self.buckets[b].push((key, slot));
        }
        self.max_len = self.load_factor.threshold(bucket_count);
        tracing::debug!(buckets = bucket_count, len = self.len, "grew chained index");
    }
}

impl<K, S> SlotIndex<K> for ChainedIndex<K, S>
where
    K: Hash + Eq + Clone,
    S: BuildHasher + Default,
{
    const DEFAULT_LOAD_FACTOR: LoadFactor = LoadFactor::new(1, 0);

    fn with_capacity(capacity: usize, load_factor: Option<LoadFactor>) -> Result<Self, HeapError> {
        Self::with_capacity_and_hasher(
            capacity,
            load_factor.unwrap_or(Self::DEFAULT_LOAD_FACTOR),
            S::default(),
        )
    }

    fn insert(&mut self, key: &K, slot: usize) {
        let b = self.bucket_of(key);
        if let Some(entry) = self.buckets[b].iter_mut().find(|(k, _)| k == key) {
            entry.1 = slot;
            return;
        }
        self.buckets[b].push((key.clone(), slot));
        self.len += 1;
        if self.len > self.max_len {
            self.grow();
        }
    }

    fn get(&self, key: &K) -> Option<usize> {
        self.buckets[self.bucket_of(key)]
            .iter()
            .find(|(k, _)| k == key)
            .map(|&(_, slot)| slot)
    }

    fn remove(&mut self, key: &K) -> Option<usize> {
        let b = self.bucket_of(key);
        let chain = &mut self.buckets[b];
        let pos = chain.iter().position(|(k, _)| k == key)?;
        let (_, slot) = chain.swap_remove(pos);
        self.len -= 1;
        Some(slot)
    }

    fn len(&self) -> usize {
        self.len
    }

    fn clear(&mut self) {
        for chain in &mut self.buckets {
            chain.clear();
        }
        self.len = 0;
    }
}

impl<K: fmt::Debug, S> fmt::Debug for ChainedIndex<K, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainedIndex")
            .field("len", &self.len)
            .field("buckets", &self.buckets.len())
            .field("load_factor", &self.load_factor)
            .finish()
    }
}

fn empty_buckets<K>(count: usize) -> Vec<Chain<K>> {
    let mut buckets = Vec::with_capacity(count);
    buckets.resize_with(count, SmallVec::new);
    buckets
}

/// Smallest tabled prime (or doubled fallback) whose threshold covers `entries`.
fn bucket_count_for(entries: usize, load_factor: &LoadFactor) -> usize {
    let wanted = load_factor.buckets_for(entries.max(1));
    let mut count = PRIMES[0] as usize;
    while count < wanted {
        count = next_bucket_count(count);
    }
    count
}

fn next_bucket_count(current: usize) -> usize {
    PRIMES
        .iter()
        .map(|&p| p as u128)
        .find(|&p| p > current as u128 && p <= usize::MAX as u128)
        .map(|p| p as usize)
        .unwrap_or_else(|| current.saturating_mul(2) | 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_is_upsert() {
        let mut index: ChainedIndex<u64> = SlotIndex::with_capacity(4, None).unwrap();
        index.insert(&7, 0);
        index.insert(&7, 5);
        assert_eq!(index.len(), 1);
        assert_eq!(index.get(&7), Some(5));
        assert_eq!(index.get(&8), None);
    }

    #[test]
    fn test_remove() {
        let mut index: ChainedIndex<String> = SlotIndex::with_capacity(4, None).unwrap();
        index.insert(&"x".to_string(), 1);
        index.insert(&"y".to_string(), 2);
        assert_eq!(index.remove(&"x".to_string()), Some(1));
        assert_eq!(index.remove(&"x".to_string()), None);
        assert_eq!(index.get(&"y".to_string()), Some(2));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_grows_through_primes() {
        let mut index: ChainedIndex<u32> = SlotIndex::with_capacity(1, None).unwrap();
        assert_eq!(index.bucket_count(), 11);
        for i in 0..1000 {
            index.insert(&i, i as usize);
        }
        assert!(index.bucket_count() >= 1000);
        assert!(PRIMES.contains(&(index.bucket_count() as u64)));
        for i in 0..1000 {
            assert_eq!(index.get(&i), Some(i as usize));
        }
    }

    #[test]
    fn test_load_factor_sizes_buckets() {
        // alpha = 1/4: 100 entries need at least 400 buckets
        let index: ChainedIndex<u32> =
            SlotIndex::with_capacity(100, Some(LoadFactor::new(1, 2))).unwrap();
        assert_eq!(index.bucket_count(), 769);

        let result: Result<ChainedIndex<u32>, _> =
            SlotIndex::with_capacity(100, Some(LoadFactor::new(0, 2)));
        assert!(result.is_err());
    }

    #[test]
    fn test_clear() {
        let mut index: ChainedIndex<u8> = SlotIndex::with_capacity(8, None).unwrap();
        for i in 0..8u8 {
            index.insert(&i, usize::from(i));
        }
        index.clear();
        assert!(index.is_empty());
        assert_eq!(index.get(&3), None);
    }

    #[test]
    fn test_next_bucket_count_past_table() {
        assert_eq!(next_bucket_count(11), 23);
        if usize::BITS == 64 {
            assert_eq!(next_bucket_count(4294967291) as u64, 8589934583u64);
        }
    }
}
