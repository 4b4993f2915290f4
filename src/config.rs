//! Construction-time configuration for [`IndexedHeap`](crate::heap::IndexedHeap)
//!
//! Everything here is fixed at construction, except the alignment, which can
//! be changed later through `IndexedHeap::align`.
//!
//! # Example
//!
//! ```rust
//! use rust_indexed_heap::{HeapConfig, IndexedHeap, LoadFactor, OpenIndex};
//!
//! let config = HeapConfig::new()
//!     .with_min_capacity(64)
//!     .with_max_capacity(1 << 20)
//!     .with_load_factor(LoadFactor::new(1, 1));
//!
//! let mut heap: IndexedHeap<u32, usize, OpenIndex<usize>> =
//!     IndexedHeap::with_config(config).unwrap();
//! heap.push(3, 7).unwrap();
//! assert_eq!(heap.search(&7), Some(&3));
//! ```

use crate::index::LoadFactor;
use crate::layout::Alignment;
use crate::traits::HeapError;

/// Sizing, load-factor and alignment parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct HeapConfig {
    /// Slots allocated up front; zero defers allocation to the first push
    pub min_capacity: usize,
    /// Hard cap on live pairs; pushing past it is a fatal error
    pub max_capacity: usize,
    /// Index load factor, or `None` for the index's own default (ignored by `HashMap`)
    pub load_factor: Option<LoadFactor>,
    /// Pair buffer alignment overrides
    pub alignment: Alignment,
}

impl Default for HeapConfig {
    fn default() -> Self {
        HeapConfig {
            min_capacity: 0,
            max_capacity: usize::MAX,
            load_factor: None,
            alignment: Alignment::NATURAL,
        }
    }
}

impl HeapConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_min_capacity(mut self, min_capacity: usize) -> Self {
        self.min_capacity = min_capacity;
        self
    }

    pub fn with_max_capacity(mut self, max_capacity: usize) -> Self {
        self.max_capacity = max_capacity;
        self
    }

    /// Overrides the index load factor.
    ///
    /// [`ChainedIndex`](crate::index::ChainedIndex) and
    /// [`OpenIndex`](crate::index::OpenIndex) size and grow their tables by
    /// it. The `HashMap` backend only validates it, since `std` controls its
    /// own load factor.
    pub fn with_load_factor(mut self, load_factor: LoadFactor) -> Self {
        self.load_factor = Some(load_factor);
        self
    }

    pub fn with_alignment(mut self, alignment: Alignment) -> Self {
        self.alignment = alignment;
        self
    }

    /// Checks the parameters that do not depend on the pair types.
    ///
    /// Alignment overrides are checked against the concrete types when the
    /// heap is built.
    pub fn validate(&self) -> Result<(), HeapError> {
        if self.max_capacity == 0 || self.min_capacity > self.max_capacity {
            return Err(HeapError::InvalidCapacity {
                min: self.min_capacity,
                max: self.max_capacity,
            });
        }
        if let Some(load_factor) = &self.load_factor {
            load_factor.validate()?;
        }
        Ok(())
    }
}
