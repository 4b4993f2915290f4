//! Pluggable element-to-slot hash indexes
//!
//! The heap keeps one [`SlotIndex`] mapping every live element to the slot
//! that currently holds it. Any relocation inside the heap is followed by an
//! upsert into the index, so lookups never need to scan the pair buffer.
//!
//! Three backends are provided:
//!
//! | Backend         | Collision resolution                   | Default load factor |
//! |-----------------|----------------------------------------|---------------------|
//! | [`ChainedIndex`] | separate chaining, division method     | 1                   |
//! | [`OpenIndex`]    | open addressing, multiplication method | 13107 / 2^15 (0.4)  |
//! | `HashMap`        | whatever `std` does                    | ignored             |
//!
//! Load factors are expressed as `numerator / 2^log2_denominator` so that
//! capacity planning stays in integer arithmetic.

use crate::traits::HeapError;
use std::collections::HashMap;
use std::hash::{BuildHasher, Hash};

pub mod chained;
pub mod open;

pub use chained::ChainedIndex;
pub use open::OpenIndex;

/// Upper bound on the ratio of entries to buckets, `numerator / 2^log2_denominator`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LoadFactor {
    pub numerator: usize,
    pub log2_denominator: u32,
}

impl LoadFactor {
    pub const fn new(numerator: usize, log2_denominator: u32) -> Self {
        LoadFactor {
            numerator,
            log2_denominator,
        }
    }

    fn invalid(&self) -> HeapError {
        HeapError::InvalidLoadFactor {
            numerator: self.numerator,
            log2_denominator: self.log2_denominator,
        }
    }

    /// Rejects a zero numerator or a denominator shift wider than `usize`.
    pub fn validate(&self) -> Result<(), HeapError> {
        if self.numerator == 0 || self.log2_denominator >= usize::BITS {
            return Err(self.invalid());
        }
        Ok(())
    }

    /// Like [`validate`](Self::validate), and additionally requires a factor below one.
    pub fn validate_below_one(&self) -> Result<(), HeapError> {
        self.validate()?;
        if (self.numerator as u128) >= (1u128 << self.log2_denominator) {
            return Err(self.invalid());
        }
        Ok(())
    }

    /// Most entries `buckets` buckets may hold under this factor.
    pub fn threshold(&self, buckets: usize) -> usize {
        let entries = (buckets as u128 * self.numerator as u128) >> self.log2_denominator;
        entries.min(usize::MAX as u128) as usize
    }

    /// Fewest buckets that hold `entries` entries under this factor.
    pub fn buckets_for(&self, entries: usize) -> usize {
        let scaled = (entries as u128) << self.log2_denominator;
        let buckets = scaled.div_ceil(self.numerator as u128);
        buckets.clamp(1, usize::MAX as u128) as usize
    }
}

/// Hash index from element identity to heap slot
///
/// The contract mirrors what the heap needs and nothing more. `insert` has
/// upsert semantics and is called after every relocation, so it should avoid
/// cloning the key when an entry already exists.
pub trait SlotIndex<K>: Sized {
    /// Load factor used when the heap configuration leaves it unset
    const DEFAULT_LOAD_FACTOR: LoadFactor;

    /// Creates an index sized for `capacity` entries.
    ///
    /// # Errors
    ///
    /// `InvalidLoadFactor` if the backend cannot operate under `load_factor`.
    fn with_capacity(capacity: usize, load_factor: Option<LoadFactor>) -> Result<Self, HeapError>;

    /// Maps `key` to `slot`, overwriting any previous mapping.
    fn insert(&mut self, key: &K, slot: usize);

    /// Slot currently mapped to `key`
    fn get(&self, key: &K) -> Option<usize>;

    /// Removes the mapping for `key`, returning its slot.
    fn remove(&mut self, key: &K) -> Option<usize>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes every mapping.
    fn clear(&mut self);

    /// Checks that the index can honour `alignment` for its stored slot values.
    ///
    /// This is a capability check, not a relayout. The provided backends keep
    /// slots as typed `usize` values, already aligned to `align_of::<usize>()`,
    /// so they accept powers of two up to that and reject anything larger
    /// without touching their buckets. A backend with its own raw storage may
    /// override this to actually realign.
    fn align(&mut self, alignment: usize) -> Result<(), HeapError> {
        if alignment.is_power_of_two() && alignment <= std::mem::align_of::<usize>() {
            Ok(())
        } else {
            Err(HeapError::InvalidAlignment { alignment })
        }
    }
}

impl<K, S> SlotIndex<K> for HashMap<K, usize, S>
where
    K: Hash + Eq + Clone,
    S: BuildHasher + Default,
{
    /// Roughly what `std` targets; informational, it has no effect on the table.
    const DEFAULT_LOAD_FACTOR: LoadFactor = LoadFactor::new(7, 3);

    /// Sizes the table for `capacity` entries.
    ///
    /// A given load factor is validated and otherwise ignored; `std` manages
    /// its own growth and has no load-factor knob.
    fn with_capacity(capacity: usize, load_factor: Option<LoadFactor>) -> Result<Self, HeapError> {
        if let Some(load_factor) = load_factor {
            load_factor.validate()?;
        }
        Ok(HashMap::with_capacity_and_hasher(capacity, S::default()))
    }

    fn insert(&mut self, key: &K, slot: usize) {
        match self.get_mut(key) {
            Some(existing) => *existing = slot,
            None => {
                HashMap::insert(self, key.clone(), slot);
            }
        }
    }

    fn get(&self, key: &K) -> Option<usize> {
        HashMap::get(self, key).copied()
    }

    fn remove(&mut self, key: &K) -> Option<usize> {
        HashMap::remove(self, key)
    }

    fn len(&self) -> usize {
        HashMap::len(self)
    }

    fn clear(&mut self) {
        HashMap::clear(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustc_hash::FxHashMap;

    #[test]
    fn test_load_factor_arithmetic() {
        let alpha = LoadFactor::new(13107, 15);
        assert_eq!(alpha.threshold(1 << 15), 13107);
        assert_eq!(alpha.threshold(8), 3);
        assert!(alpha.threshold(alpha.buckets_for(1000)) >= 1000);

        let one = LoadFactor::new(1, 0);
        assert_eq!(one.threshold(97), 97);
        assert_eq!(one.buckets_for(97), 97);
        assert_eq!(one.buckets_for(0), 1);
    }

    #[test]
    fn test_load_factor_validation() {
        assert!(LoadFactor::new(1, 0).validate().is_ok());
        assert!(LoadFactor::new(0, 3).validate().is_err());
        assert!(LoadFactor::new(1, usize::BITS).validate().is_err());
        assert!(LoadFactor::new(1, 0).validate_below_one().is_err());
        assert!(LoadFactor::new(3, 2).validate_below_one().is_ok());
    }

    fn accepts_own_default<I: SlotIndex<u32>>() {
        assert!(I::DEFAULT_LOAD_FACTOR.validate().is_ok());
        assert!(I::with_capacity(0, Some(I::DEFAULT_LOAD_FACTOR)).is_ok());
        assert!(I::with_capacity(0, None).is_ok());
    }

    #[test]
    fn test_backends_accept_their_default_load_factor() {
        accepts_own_default::<ChainedIndex<u32>>();
        accepts_own_default::<OpenIndex<u32>>();
        accepts_own_default::<FxHashMap<u32, usize>>();
    }

    #[test]
    fn test_hashmap_backend() {
        let mut index: FxHashMap<&str, usize> =
            SlotIndex::with_capacity(4, None).unwrap();
        SlotIndex::insert(&mut index, &"a", 0);
        SlotIndex::insert(&mut index, &"a", 3);
        assert_eq!(SlotIndex::get(&index, &"a"), Some(3));
        assert_eq!(SlotIndex::len(&index), 1);
        assert_eq!(SlotIndex::remove(&mut index, &"a"), Some(3));
        assert_eq!(SlotIndex::get(&index, &"a"), None);
        assert!(SlotIndex::align(&mut index, 1).is_ok());
        assert!(SlotIndex::align(&mut index, 4096).is_err());
    }
}
