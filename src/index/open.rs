//! Open-addressing index with a power-of-two table
//!
//! The home bucket comes from the multiplication method (the top bits of
//! `hash * A` for an odd constant `A`). Collisions are resolved by double
//! hashing with an odd step, which visits every bucket of a power-of-two
//! table before repeating. Removed entries leave tombstones; tombstones count
//! toward the load factor and are swept out by the next rehash.
//!
//! The load factor must be below one so that every probe sequence reaches an
//! empty bucket.

use super::{LoadFactor, SlotIndex};
use crate::traits::HeapError;
use rustc_hash::FxBuildHasher;
use std::fmt;
use std::hash::{BuildHasher, Hash};

const MIN_LOG2_BUCKETS: u32 = 3;

/// Odd multipliers for the home bucket and the probe step
const HOME_MUL: u64 = 0x9E37_79B9_7F4A_7C15;
const STEP_MUL: u64 = 0xC2B2_AE3D_27D4_EB4F;

#[derive(Clone)]
enum Bucket<K> {
    Empty,
    Tombstone,
    Occupied(K, usize),
}

enum Probe {
    Found(usize),
    Vacant(usize),
}

/// Open-addressing hash index keyed by element identity
pub struct OpenIndex<K, S = FxBuildHasher> {
    buckets: Vec<Bucket<K>>,
    log2_buckets: u32,
    len: usize,
    tombstones: usize,
    /// Occupied plus tombstoned buckets allowed before a rehash
    max_used: usize,
    load_factor: LoadFactor,
    hasher: S,
}

impl<K, S> OpenIndex<K, S>
where
    K: Hash + Eq + Clone,
    S: BuildHasher,
{
    /// Creates an index with an explicit hasher.
    ///
    /// # Errors
    ///
    /// `InvalidLoadFactor` unless `0 < load_factor < 1`.
    pub fn with_capacity_and_hasher(
        capacity: usize,
        load_factor: LoadFactor,
        hasher: S,
    ) -> Result<Self, HeapError> {
        load_factor.validate_below_one()?;
        let log2_buckets = log2_buckets_for(capacity, &load_factor);
        Ok(OpenIndex {
            buckets: empty_buckets(log2_buckets),
            log2_buckets,
            len: 0,
            tombstones: 0,
            max_used: load_factor.threshold(1 << log2_buckets),
            load_factor,
            hasher,
        })
    }

    /// Number of buckets currently allocated
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    fn probe(&self, key: &K) -> Probe {
        let hash = self.hasher.hash_one(key);
        let shift = u64::BITS - self.log2_buckets;
        let mask = self.buckets.len() - 1;
        let mut pos = (hash.wrapping_mul(HOME_MUL) >> shift) as usize;
        let step = (hash.wrapping_mul(STEP_MUL) >> shift) as usize | 1;

        let mut first_tombstone = None;
        for _ in 0..self.buckets.len() {
            match &self.buckets[pos] {
                Bucket::Occupied(k, _) if k == key => return Probe::Found(pos),
                Bucket::Occupied(..) => {}
                Bucket::Tombstone => {
                    first_tombstone.get_or_insert(pos);
                }
                Bucket::Empty => return Probe::Vacant(first_tombstone.unwrap_or(pos)),
            }
            pos = (pos + step) & mask;
        }
        // Unreachable while max_used < bucket count, kept total for safety.
        Probe::Vacant(first_tombstone.unwrap_or(pos))
    }

    /// Rebuilds the table so that `len + extra` entries fit with room to spare.
    fn rehash(&mut self, extra: usize) {
        let wanted = self.len.saturating_add(extra).saturating_mul(2);
        let log2_buckets = log2_buckets_for(wanted, &self.load_factor);
        let old = std::mem::replace(&mut self.buckets, empty_buckets(log2_buckets));
        self.log2_buckets = log2_buckets;
        self.max_used = self.load_factor.threshold(1 << log2_buckets);
        self.tombstones = 0;
        for bucket in old {
            if let Bucket::Occupied(key, slot) = bucket {
                if let Probe::Vacant(pos) = self.probe(&key) {
                    self.buckets[pos] = Bucket::Occupied(key, slot);
                }
            }
        }
        tracing::debug!(buckets = self.buckets.len(), len = self.len, "rehashed open index");
    }
}

impl<K, S> SlotIndex<K> for OpenIndex<K, S>
where
    K: Hash + Eq + Clone,
    S: BuildHasher + Default,
{
    const DEFAULT_LOAD_FACTOR: LoadFactor = LoadFactor::new(13107, 15);

    fn with_capacity(capacity: usize, load_factor: Option<LoadFactor>) -> Result<Self, HeapError> {
        Self::with_capacity_and_hasher(
            capacity,
            load_factor.unwrap_or(Self::DEFAULT_LOAD_FACTOR),
            S::default(),
        )
    }

    fn insert(&mut self, key: &K, slot: usize) {
        let pos = match self.probe(key) {
            Probe::Found(pos) => {
                if let Bucket::Occupied(_, existing) = &mut self.buckets[pos] {
                    *existing = slot;
                }
                return;
            }
            Probe::Vacant(_) if self.len + self.tombstones + 1 > self.max_used => {
                self.rehash(1);
                match self.probe(key) {
                    Probe::Vacant(pos) | Probe::Found(pos) => pos,
                }
            }
            Probe::Vacant(pos) => pos,
        };
        if matches!(self.buckets[pos], Bucket::Tombstone) {
            self.tombstones -= 1;
        }
        self.buckets[pos] = Bucket::Occupied(key.clone(), slot);
        self.len += 1;
    }

    fn get(&self, key: &K) -> Option<usize> {
        match self.probe(key) {
            Probe::Found(pos) => match &self.buckets[pos] {
                Bucket::Occupied(_, slot) => Some(*slot),
                _ => None,
            },
            Probe::Vacant(_) => None,
        }
    }

    fn remove(&mut self, key: &K) -> Option<usize> {
        let Probe::Found(pos) = self.probe(key) else {
            return None;
        };
        match std::mem::replace(&mut self.buckets[pos], Bucket::Tombstone) {
            Bucket::Occupied(_, slot) => {
                self.len -= 1;
                self.tombstones += 1;
                Some(slot)
            }
            other => {
                self.buckets[pos] = other;
                None
            }
        }
    }

    fn len(&self) -> usize {
        self.len
    }

    fn clear(&mut self) {
        self.buckets.fill(Bucket::Empty);
        self.len = 0;
        self.tombstones = 0;
    }
}

impl<K: fmt::Debug, S> fmt::Debug for OpenIndex<K, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenIndex")
            .field("len", &self.len)
            .field("tombstones", &self.tombstones)
            .field("buckets", &self.buckets.len())
            .field("load_factor", &self.load_factor)
            .finish()
    }
}

fn empty_buckets<K>(log2_buckets: u32) -> Vec<Bucket<K>> {
    let count = 1usize << log2_buckets;
    let mut buckets = Vec::with_capacity(count);
    buckets.resize_with(count, || Bucket::Empty);
    buckets
}

/// Smallest power-of-two exponent whose threshold covers `entries`.
fn log2_buckets_for(entries: usize, load_factor: &LoadFactor) -> u32 {
    let wanted = load_factor.buckets_for(entries.max(1));
    let log2 = wanted
        .checked_next_power_of_two()
        .map_or(usize::BITS - 1, |n| n.trailing_zeros());
    log2.max(MIN_LOG2_BUCKETS)
}
