//! Binary min-heap with an in-heap hash index
//!
//! [`IndexedHeap`] stores `(priority, element)` pairs in a [`PairStorage`]
//! arranged as an implicit binary tree, and keeps a [`SlotIndex`] from every
//! live element to the slot that holds it. That makes membership tests and
//! priority lookups O(1) expected, and lets [`update`](IndexedHeap::update)
//! change the priority of an arbitrary element in O(log n), which is what
//! Prim's and Dijkstra's algorithms need from their frontier.
//!
//! # Invariants
//!
//! After every public call returns:
//!
//! - for every slot `i > 0`, `priority(parent(i)) <= priority(i)` under the comparator
//! - the index maps each live element to exactly the slot holding it, and nothing else
//! - `len <= capacity <= max_capacity`
//!
//! Elements must be unique while they are in the heap. Use
//! [`contains`](IndexedHeap::contains) or [`push_or_update`](IndexedHeap::push_or_update)
//! when that is not already guaranteed by the caller.
//!
//! # Time Complexity
//!
//! | Operation        | Complexity          |
//! |------------------|---------------------|
//! | `push`           | O(log n) expected*  |
//! | `pop`            | O(log n) expected   |
//! | `update`         | O(log n) expected   |
//! | `remove`         | O(log n) expected   |
//! | `search`/`contains` | O(1) expected    |
//! | `peek`           | O(1)                |
//!
//! *Amortized over storage and index growth.
//!
//! # Example
//!
//! ```rust
//! use rust_indexed_heap::IndexedHeap;
//!
//! let mut heap: IndexedHeap<u32, &str> = IndexedHeap::new();
//! heap.push(4, "a").unwrap();
//! heap.push(3, "b").unwrap();
//! heap.push(2, "c").unwrap();
//! heap.push(1, "d").unwrap();
//!
//! assert_eq!(heap.update(5, &"d"), Some(1));
//! assert_eq!(heap.search(&"d"), Some(&5));
//!
//! assert_eq!(heap.pop(), Some((2, "c")));
//! assert_eq!(heap.pop(), Some((3, "b")));
//! assert_eq!(heap.pop(), Some((4, "a")));
//! assert_eq!(heap.pop(), Some((5, "d")));
//! assert_eq!(heap.pop(), None);
//! ```

use crate::config::HeapConfig;
use crate::index::{ChainedIndex, SlotIndex};
use crate::layout::Alignment;
use crate::storage::{Hole, PairStorage};
use crate::traits::{Compare, HeapError, NaturalOrder};
use std::cmp::Ordering;
use std::hash::Hash;

/// A binary min-heap of `(priority, element)` pairs with element lookup
///
/// # Type Parameters
/// - `P`: priority type, ordered by `C`
/// - `E`: element type; its `Hash + Eq` identity must be unique among live elements
/// - `I`: hash index backend, see [`crate::index`]
/// - `C`: priority comparator, [`NaturalOrder`] unless given
#[derive(Debug)]
pub struct IndexedHeap<P, E, I = ChainedIndex<E>, C = NaturalOrder> {
    storage: PairStorage<P, E>,
    index: I,
    cmp: C,
}

impl<P, E, I, C> IndexedHeap<P, E, I, C>
where
    E: Hash + Eq + Clone,
    I: SlotIndex<E>,
    C: Compare<P>,
{
    /// Creates an empty heap that allocates on first push.
    ///
    /// # Panics
    ///
    /// Panics if the index backend rejects its own default load factor.
    pub fn new() -> Self
    where
        C: Default,
    {
        Self::with_comparator(C::default())
    }

    /// Creates an empty heap ordered by `cmp`.
    ///
    /// # Panics
    ///
    /// Panics if the index backend rejects its own default load factor. Use
    /// [`with_config_and_comparator`](Self::with_config_and_comparator) to get
    /// that as an error instead.
    pub fn with_comparator(cmp: C) -> Self {
        Self::with_config_and_comparator(HeapConfig::default(), cmp)
            .expect("default heap configuration is valid and allocates nothing")
    }

    /// Creates a heap from `config`.
    pub fn with_config(config: HeapConfig) -> Result<Self, HeapError>
    where
        C: Default,
    {
        Self::with_config_and_comparator(config, C::default())
    }

    /// Creates a heap from `config` ordered by `cmp`.
    ///
    /// # Errors
    ///
    /// Any invalid capacity, load factor or alignment in `config`, or
    /// `AllocationFailed` if the initial buffer cannot be allocated.
    pub fn with_config_and_comparator(config: HeapConfig, cmp: C) -> Result<Self, HeapError> {
        config.validate()?;
        let storage =
            PairStorage::with_capacity(config.min_capacity, config.max_capacity, &config.alignment)?;
        let mut index = I::with_capacity(config.min_capacity, config.load_factor)?;
        if let Some(alignment) = config.alignment.index {
            index.align(alignment)?;
        }
        Ok(IndexedHeap {
            storage,
            index,
            cmp,
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    /// Slots currently allocated
    #[inline]
    pub fn capacity(&self) -> usize {
        self.storage.capacity()
    }

    /// Most pairs the heap will ever hold
    #[inline]
    pub fn max_capacity(&self) -> usize {
        self.storage.max_capacity()
    }

    /// Pushes an element that is not in the heap.
    ///
    /// Pushing an element that is already present breaks the index; check
    /// with [`contains`](Self::contains) first if unsure.
    ///
    /// # Errors
    ///
    /// `CapacityExceeded` when the heap already holds `max_capacity` pairs,
    /// `AllocationFailed` if growth fails. The heap is unchanged in both cases.
    pub fn push(&mut self, priority: P, element: E) -> Result<(), HeapError> {
        debug_assert!(
            self.index.get(&element).is_none(),
            "element pushed while already in the heap"
        );
        let slot = self.storage.push(priority, element)?;
        self.sift_up(slot);
        Ok(())
    }

    /// Priority of `element`, or `None` if it is not in the heap
    pub fn search(&self, element: &E) -> Option<&P> {
        let slot = self.index.get(element)?;
        self.storage.get(slot).map(|(priority, _)| priority)
    }

    #[inline]
    pub fn contains(&self, element: &E) -> bool {
        self.index.get(element).is_some()
    }

    /// Replaces the priority of `element` and restores heap order.
    ///
    /// Returns the previous priority, or `None` (dropping `priority` and
    /// leaving the heap untouched) if `element` is not in the heap.
    pub fn update(&mut self, priority: P, element: &E) -> Option<P> {
        let slot = self.index.get(element)?;
        let previous = self.storage.set_priority(slot, priority);
        let slot = self.sift_up(slot);
        self.sift_down(slot);
        Some(previous)
    }

    /// Updates `element` if present, pushes it otherwise.
    ///
    /// Returns the previous priority when an update took place.
    pub fn push_or_update(&mut self, priority: P, element: E) -> Result<Option<P>, HeapError> {
        if self.contains(&element) {
            Ok(self.update(priority, &element))
        } else {
            self.push(priority, element).map(|()| None)
        }
    }

    /// Minimum pair without removing it
    #[inline]
    pub fn peek(&self) -> Option<(&P, &E)> {
        self.storage.get(0)
    }

    /// Removes and returns a pair with minimal priority.
    ///
    /// `None` signals an empty heap.
    pub fn pop(&mut self) -> Option<(P, E)> {
        let (priority, element) = self.storage.pop()?;
        if self.storage.is_empty() {
            self.index.remove(&element);
            return Some((priority, element));
        }
        let root = self.storage.replace(0, priority, element);
        self.index.remove(&root.1);
        self.sift_down(0);
        Some(root)
    }

    /// Removes `element` wherever it is in the heap.
    pub fn remove(&mut self, element: &E) -> Option<(P, E)> {
        let slot = self.index.remove(element)?;
        let (priority, last) = self.storage.pop()?;
        if slot == self.storage.len() {
            return Some((priority, last));
        }
        let removed = self.storage.replace(slot, priority, last);
        let slot = self.sift_up(slot);
        self.sift_down(slot);
        Some(removed)
    }

    /// Slot currently holding `element`
    #[inline]
    pub fn slot_of(&self, element: &E) -> Option<usize> {
        self.index.get(element)
    }

    /// Pair in slot `slot`
    #[inline]
    pub fn get(&self, slot: usize) -> Option<(&P, &E)> {
        self.storage.get(slot)
    }

    /// Pairs in slot (not priority) order
    pub fn iter(&self) -> impl Iterator<Item = (&P, &E)> + '_ {
        self.storage.iter()
    }

    /// Drops every pair, keeping the allocated capacity.
    pub fn clear(&mut self) {
        self.storage.clear();
        self.index.clear();
    }

    /// Re-lays out the pair buffer under new alignment overrides.
    ///
    /// `alignment.index` is only checked against the index backend, see
    /// [`SlotIndex::align`]. Slot numbers do not change, so the index stays valid.
    pub fn align(&mut self, alignment: Alignment) -> Result<(), HeapError> {
        if let Some(index_alignment) = alignment.index {
            self.index.align(index_alignment)?;
        }
        self.storage.realign(&alignment)
    }

    /// Pops every pair, returning them in non-decreasing priority order.
    pub fn into_sorted_vec(mut self) -> Vec<(P, E)> {
        let mut sorted = Vec::with_capacity(self.len());
        while let Some(pair) = self.pop() {
            sorted.push(pair);
        }
        sorted
    }

    /// Moves the pair at `pos` towards the root while its parent compares
    /// strictly greater. Returns the final slot.
    fn sift_up(&mut self, pos: usize) -> usize {
        let mut sift = Sift {
            // SAFETY: callers pass an occupied slot
            hole: unsafe { Hole::new(&mut self.storage, pos) },
            index: &mut self.index,
        };
        while sift.hole.pos() > 0 {
            let parent = (sift.hole.pos() - 1) / 2;
            // SAFETY: parent < pos < len
            let parent_priority = unsafe { sift.hole.priority_at(parent) };
            if self.cmp.compare(parent_priority, sift.hole.priority()) != Ordering::Greater {
                break;
            }
            // SAFETY: as above
            unsafe { sift.relocate(parent) };
        }
        sift.hole.pos()
    }

    /// Moves the pair at `pos` towards the leaves while a child compares
    /// strictly smaller. Returns the final slot.
    ///
    /// The loop only runs while both children exist; a lone left child (the
    /// last slot when `len` is even) gets one extra check afterwards.
    fn sift_down(&mut self, pos: usize) -> usize {
        let mut sift = Sift {
            // SAFETY: callers pass an occupied slot
            hole: unsafe { Hole::new(&mut self.storage, pos) },
            index: &mut self.index,
        };
        let len = sift.hole.len();

        while 2 * sift.hole.pos() + 2 < len {
            let left = 2 * sift.hole.pos() + 1;
            let right = left + 1;
            // SAFETY: pos < left < right < len
            let (l, r) = unsafe { (sift.hole.priority_at(left), sift.hole.priority_at(right)) };
            let held = sift.hole.priority();
            let target = if self.cmp.compare(held, l) == Ordering::Greater
                && self.cmp.compare(l, r) != Ordering::Greater
            {
                left
            } else if self.cmp.compare(held, r) == Ordering::Greater {
                right
            } else {
                break;
            };
            // SAFETY: target is a child of pos, below len
            unsafe { sift.relocate(target) };
        }

        if 2 * sift.hole.pos() + 2 == len {
            let left = len - 1;
            // SAFETY: pos < left < len
            let l = unsafe { sift.hole.priority_at(left) };
            if self.cmp.compare(sift.hole.priority(), l) == Ordering::Greater {
                // SAFETY: as above
                unsafe { sift.relocate(left) };
            }
        }

        sift.hole.pos()
    }
}

/// A [`Hole`] that keeps the index in step with every half-swap
///
/// Dropping it registers the held element at the final vacancy, so the index
/// stays coherent with the pair buffer even when a comparator panics.
struct Sift<'a, P, E, I>
where
    E: Hash + Eq + Clone,
    I: SlotIndex<E>,
{
    hole: Hole<'a, P, E>,
    index: &'a mut I,
}

impl<P, E, I> Sift<'_, P, E, I>
where
    E: Hash + Eq + Clone,
    I: SlotIndex<E>,
{
    /// Half-swaps the pair at `slot` into the vacancy and re-registers it.
    ///
    /// # Safety
    /// `slot` must be below `len` and differ from the current vacancy.
    #[inline]
    unsafe fn relocate(&mut self, slot: usize) {
        let vacated = self.hole.pos();
        unsafe {
            self.hole.move_to(slot);
            self.index.insert(self.hole.element_at(vacated), vacated);
        }
    }
}

impl<P, E, I> Drop for Sift<'_, P, E, I>
where
    E: Hash + Eq + Clone,
    I: SlotIndex<E>,
{
    fn drop(&mut self) {
        self.index.insert(self.hole.element(), self.hole.pos());
    }
}

impl<P, E, I, C> Default for IndexedHeap<P, E, I, C>
where
    E: Hash + Eq + Clone,
    I: SlotIndex<E>,
    C: Compare<P> + Default,
{
    fn default() -> Self {
        Self::new()
    }
}
