//! Indexed Binary Heap for Rust
//!
//! This crate provides a binary min-heap of `(priority, element)` pairs that
//! also answers "is this element queued, and at what priority?" in O(1)
//! expected time and updates an element's priority in O(log n). That is the
//! frontier structure used by Prim's minimum spanning tree and Dijkstra's
//! shortest paths, where vertices are repeatedly looked up and relaxed.
//!
//! # Components
//!
//! - [`IndexedHeap`]: the heap engine (push, pop, search, update, remove)
//! - [`PairStorage`]: packed, alignment-aware buffer of pairs addressed by slot
//! - [`SlotIndex`]: pluggable element-to-slot hash index, with
//!   [`ChainedIndex`] (separate chaining) and [`OpenIndex`] (open addressing)
//!   backends plus an implementation for `std::collections::HashMap`
//! - [`HeapConfig`]: capacities, index load factor and alignment overrides
//!
//! # Example
//!
//! ```rust
//! use rust_indexed_heap::{IndexedHeap, OpenIndex};
//!
//! // Frontier of a graph search: vertex -> tentative distance
//! let mut frontier: IndexedHeap<u64, usize, OpenIndex<usize>> = IndexedHeap::new();
//! frontier.push(10, 1).unwrap();
//! frontier.push(7, 2).unwrap();
//!
//! // A shorter edge to vertex 1 was found
//! if frontier.search(&1).is_some_and(|&d| d > 3) {
//!     frontier.update(3, &1);
//! }
//!
//! assert_eq!(frontier.pop(), Some((3, 1)));
//! assert_eq!(frontier.pop(), Some((7, 2)));
//! assert_eq!(frontier.pop(), None);
//! ```
//!
//! # Concurrency
//!
//! A heap is a single-owner structure with no internal locking. Comparators
//! and element destructors must not call back into the heap that runs them.

pub mod config;
pub mod heap;
pub mod index;
pub mod layout;
pub mod storage;
pub mod traits;

pub use config::HeapConfig;
pub use heap::IndexedHeap;
pub use index::{ChainedIndex, LoadFactor, OpenIndex, SlotIndex};
pub use layout::{Alignment, PairLayout};
pub use storage::PairStorage;
pub use traits::{Compare, FloatOrder, HeapError, NaturalOrder};
