//! Packed pair storage
//!
//! A single growable allocation holding `(priority, element)` pairs at a fixed
//! stride computed by [`PairLayout`]. Slot `i` starts at `i * pair_size`; its
//! element sits `elt_offset` bytes further in. The buffer is obtained directly
//! from `std::alloc` so that alignment overrides can pad the stride beyond what
//! a `Vec<(P, E)>` would use.
//!
//! Capacity doubles on demand up to a hard maximum. Reaching the maximum is a
//! [`HeapError::CapacityExceeded`], reported before anything is mutated.
//!
//! References returned by the accessors borrow the storage, so none can be
//! held across a push (which may move the whole buffer).

use crate::layout::{Alignment, PairLayout};
use crate::traits::HeapError;
use std::alloc::{self, Layout};
use std::fmt;
use std::marker::PhantomData;
use std::mem::ManuallyDrop;
use std::ptr::{self, NonNull};

/// Slot count allocated by the first growth of a lazily created storage
pub const INITIAL_CAPACITY: usize = 4;

/// Contiguous, alignment-respecting storage for priority/element pairs
pub struct PairStorage<P, E> {
    buf: NonNull<u8>,
    layout: PairLayout,
    len: usize,
    capacity: usize,
    /// Maximum requested by the caller, before clamping to the layout
    requested_max: usize,
    max_capacity: usize,
    _marker: PhantomData<(P, E)>,
}

// SAFETY: the storage owns its pairs exactly like a `Vec<(P, E)>` would.
unsafe impl<P: Send, E: Send> Send for PairStorage<P, E> {}
unsafe impl<P: Sync, E: Sync> Sync for PairStorage<P, E> {}

impl<P, E> PairStorage<P, E> {
    /// Creates storage for at least `min_capacity` pairs that will never hold
    /// more than `max_capacity`.
    ///
    /// A `min_capacity` of zero allocates nothing until the first push.
    pub fn with_capacity(
        min_capacity: usize,
        max_capacity: usize,
        alignment: &Alignment,
    ) -> Result<Self, HeapError> {
        let layout = PairLayout::new::<P, E>(alignment)?;
        let max = max_capacity.min(layout.max_slots());
        if max == 0 || min_capacity > max {
            return Err(HeapError::InvalidCapacity {
                min: min_capacity,
                max: max_capacity,
            });
        }

        let buf = allocate(&layout, min_capacity)?;
        Ok(PairStorage {
            buf,
            layout,
            len: 0,
            capacity: min_capacity,
            requested_max: max_capacity,
            max_capacity: max,
            _marker: PhantomData,
        })
    }

    /// Number of live pairs
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of slots currently allocated
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Hard upper bound on the slot count
    #[inline]
    pub fn max_capacity(&self) -> usize {
        self.max_capacity
    }

    #[inline]
    pub fn layout(&self) -> &PairLayout {
        &self.layout
    }

    #[inline]
    fn priority_ptr(&self, i: usize) -> *mut P {
        // `pair_size * capacity` fits in isize, so the offset cannot wrap for i <= capacity.
        self.buf.as_ptr().wrapping_add(i * self.layout.pair_size).cast()
    }

    #[inline]
    fn element_ptr(&self, i: usize) -> *mut E {
        self.buf
            .as_ptr()
            .wrapping_add(i * self.layout.pair_size + self.layout.elt_offset)
            .cast()
    }

    /// Priority at slot `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= len`.
    #[inline]
    pub fn priority(&self, i: usize) -> &P {
        assert!(i < self.len, "slot {i} out of bounds (len {})", self.len);
        // SAFETY: slots below len are initialized
        unsafe { &*self.priority_ptr(i) }
    }

    /// Element at slot `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= len`.
    #[inline]
    pub fn element(&self, i: usize) -> &E {
        assert!(i < self.len, "slot {i} out of bounds (len {})", self.len);
        // SAFETY: slots below len are initialized
        unsafe { &*self.element_ptr(i) }
    }

    /// Pair at slot `i`, or `None` past the end
    #[inline]
    pub fn get(&self, i: usize) -> Option<(&P, &E)> {
        if i < self.len {
            Some((self.priority(i), self.element(i)))
        } else {
            None
        }
    }

    /// Pairs in slot order
    pub fn iter(&self) -> impl Iterator<Item = (&P, &E)> + '_ {
        (0..self.len).map(move |i| (self.priority(i), self.element(i)))
    }

    /// Appends a pair, growing first if full, and returns its slot.
    pub fn push(&mut self, priority: P, element: E) -> Result<usize, HeapError> {
        if self.len == self.capacity {
            self.grow()?;
        }
        let slot = self.len;
        // SAFETY: slot < capacity and is uninitialized
        unsafe {
            ptr::write(self.priority_ptr(slot), priority);
            ptr::write(self.element_ptr(slot), element);
        }
        self.len += 1;
        Ok(slot)
    }

    /// Removes the pair in the last slot.
    pub fn pop(&mut self) -> Option<(P, E)> {
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        // SAFETY: the slot was initialized and is now outside len
        unsafe {
            Some((
                ptr::read(self.priority_ptr(self.len)),
                ptr::read(self.element_ptr(self.len)),
            ))
        }
    }

    /// Overwrites slot `i`, returning the previous pair.
    ///
    /// # Panics
    ///
    /// Panics if `i >= len`.
    pub fn replace(&mut self, i: usize, priority: P, element: E) -> (P, E) {
        assert!(i < self.len, "slot {i} out of bounds (len {})", self.len);
        // SAFETY: slot i is initialized
        unsafe {
            (
                ptr::replace(self.priority_ptr(i), priority),
                ptr::replace(self.element_ptr(i), element),
            )
        }
    }

    /// Overwrites the priority in slot `i`, returning the previous one.
    ///
    /// # Panics
    ///
    /// Panics if `i >= len`.
    pub fn set_priority(&mut self, i: usize, priority: P) -> P {
        assert!(i < self.len, "slot {i} out of bounds (len {})", self.len);
        // SAFETY: slot i is initialized
        unsafe { ptr::replace(self.priority_ptr(i), priority) }
    }

    /// Drops every live pair in slot order, keeping the allocation.
    pub fn clear(&mut self) {
        let len = std::mem::replace(&mut self.len, 0);
        for i in 0..len {
            // SAFETY: slots below the old len were initialized; len is already
            // zero so a panicking destructor leaks the rest instead of double dropping
            unsafe {
                ptr::drop_in_place(self.priority_ptr(i));
                ptr::drop_in_place(self.element_ptr(i));
            }
        }
    }

    /// Doubles the capacity, capping at `max_capacity`.
    fn grow(&mut self) -> Result<(), HeapError> {
        if self.capacity == self.max_capacity {
            tracing::warn!(max = self.max_capacity, "pair storage is at its maximum capacity");
            return Err(HeapError::CapacityExceeded {
                max: self.max_capacity,
            });
        }
        let new_capacity = if self.capacity == 0 {
            INITIAL_CAPACITY.min(self.max_capacity)
        } else if self.max_capacity - self.capacity < self.capacity {
            self.max_capacity
        } else {
            self.capacity * 2
        };

        let old = buffer_layout(&self.layout, self.capacity)?;
        let new = buffer_layout(&self.layout, new_capacity)?;
        self.buf = if old.size() == 0 {
            allocate(&self.layout, new_capacity)?
        } else if new.size() == 0 {
            self.buf
        } else {
            // SAFETY: buf was allocated with `old`, new size is non-zero and
            // below isize::MAX, alignment is unchanged
            let ptr = unsafe { alloc::realloc(self.buf.as_ptr(), old, new.size()) };
            NonNull::new(ptr).ok_or_else(|| allocation_failed(new.size()))?
        };

        tracing::debug!(
            from = self.capacity,
            to = new_capacity,
            pair_size = self.layout.pair_size,
            "grew pair storage"
        );
        self.capacity = new_capacity;
        Ok(())
    }

    /// Rebuilds the buffer under a new alignment, moving every live pair.
    ///
    /// On error the storage is left untouched.
    pub fn realign(&mut self, alignment: &Alignment) -> Result<(), HeapError> {
        let layout = PairLayout::new::<P, E>(alignment)?;
        if layout == self.layout {
            return Ok(());
        }
        let max = self.requested_max.min(layout.max_slots());
        if self.capacity > max {
            return Err(HeapError::LayoutOverflow);
        }

        let buf = allocate(&layout, self.capacity)?;
        for i in 0..self.len {
            // SAFETY: source slots are initialized, destination slots lie in a
            // distinct allocation of the same capacity
            unsafe {
                let dst = buf.as_ptr().add(i * layout.pair_size);
                ptr::copy_nonoverlapping(self.priority_ptr(i), dst.cast::<P>(), 1);
                ptr::copy_nonoverlapping(
                    self.element_ptr(i),
                    dst.add(layout.elt_offset).cast::<E>(),
                    1,
                );
            }
        }
        // SAFETY: the pairs were moved out bitwise above
        unsafe { deallocate(self.buf, &self.layout, self.capacity) };

        tracing::debug!(
            pair_size = layout.pair_size,
            elt_offset = layout.elt_offset,
            pair_align = layout.pair_align,
            "realigned pair storage"
        );
        self.buf = buf;
        self.layout = layout;
        self.max_capacity = max;
        Ok(())
    }
}

impl<P, E> Drop for PairStorage<P, E> {
    fn drop(&mut self) {
        self.clear();
        // SAFETY: buf was allocated for `capacity` slots under `layout`
        unsafe { deallocate(self.buf, &self.layout, self.capacity) };
    }
}

impl<P: fmt::Debug, E: fmt::Debug> fmt::Debug for PairStorage<P, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PairStorage")
            .field("layout", &self.layout)
            .field("capacity", &self.capacity)
            .field("max_capacity", &self.max_capacity)
            .field("pairs", &self.iter().collect::<Vec<_>>())
            .finish()
    }
}

fn buffer_layout(layout: &PairLayout, slots: usize) -> Result<Layout, HeapError> {
    let bytes = slots
        .checked_mul(layout.pair_size)
        .ok_or(HeapError::LayoutOverflow)?;
    Layout::from_size_align(bytes, layout.pair_align).map_err(|_| HeapError::LayoutOverflow)
}

fn allocate(layout: &PairLayout, slots: usize) -> Result<NonNull<u8>, HeapError> {
    let buffer = buffer_layout(layout, slots)?;
    if buffer.size() == 0 {
        // Zero-sized buffers are never dereferenced for more than zero bytes,
        // but the pointer must still be aligned.
        return Ok(NonNull::new(ptr::null_mut::<u8>().wrapping_add(buffer.align()))
            .unwrap_or(NonNull::dangling()));
    }
    // SAFETY: size is non-zero
    let ptr = unsafe { alloc::alloc(buffer) };
    NonNull::new(ptr).ok_or_else(|| allocation_failed(buffer.size()))
}

fn allocation_failed(bytes: usize) -> HeapError {
    tracing::error!(bytes, "pair storage allocation failed");
    HeapError::AllocationFailed { bytes }
}

/// # Safety
/// `buf` must come from `allocate(layout, slots)` (or a matching growth) and
/// hold no live values.
unsafe fn deallocate(buf: NonNull<u8>, layout: &PairLayout, slots: usize) {
    if let Ok(buffer) = buffer_layout(layout, slots) {
        if buffer.size() != 0 {
            unsafe { alloc::dealloc(buf.as_ptr(), buffer) };
        }
    }
}

/// A slot whose pair has been moved out into a scratch value
///
/// Sift operations hold the pair being repositioned here and shift other pairs
/// into the vacant slot one at a time (half-swaps). Dropping the hole writes
/// the scratch pair into wherever the vacancy ended up, which also keeps the
/// buffer fully initialized if a comparator panics mid-sift. Keeping an index
/// in step with the moves is the caller's job.
pub(crate) struct Hole<'a, P, E> {
    storage: &'a mut PairStorage<P, E>,
    pair: ManuallyDrop<(P, E)>,
    pos: usize,
}

impl<'a, P, E> Hole<'a, P, E> {
    /// # Safety
    /// `pos` must be below `storage.len()`.
    #[inline]
    pub(crate) unsafe fn new(storage: &'a mut PairStorage<P, E>, pos: usize) -> Self {
        debug_assert!(pos < storage.len);
        let pair = unsafe {
            (
                ptr::read(storage.priority_ptr(pos)),
                ptr::read(storage.element_ptr(pos)),
            )
        };
        Hole {
            storage,
            pair: ManuallyDrop::new(pair),
            pos,
        }
    }

    #[inline]
    pub(crate) fn pos(&self) -> usize {
        self.pos
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.storage.len
    }

    /// Priority of the held pair
    #[inline]
    pub(crate) fn priority(&self) -> &P {
        &self.pair.0
    }

    /// Element of the held pair
    #[inline]
    pub(crate) fn element(&self) -> &E {
        &self.pair.1
    }

    /// # Safety
    /// `index` must be below `len` and differ from `pos`.
    #[inline]
    pub(crate) unsafe fn priority_at(&self, index: usize) -> &P {
        debug_assert!(index != self.pos && index < self.storage.len);
        unsafe { &*self.storage.priority_ptr(index) }
    }

    /// # Safety
    /// `index` must be below `len` and differ from `pos`.
    #[inline]
    pub(crate) unsafe fn element_at(&self, index: usize) -> &E {
        debug_assert!(index != self.pos && index < self.storage.len);
        unsafe { &*self.storage.element_ptr(index) }
    }

    /// Copies the pair at `index` into the vacancy and moves the vacancy to `index`.
    ///
    /// # Safety
    /// `index` must be below `len` and differ from `pos`.
    #[inline]
    pub(crate) unsafe fn move_to(&mut self, index: usize) {
        debug_assert!(index != self.pos && index < self.storage.len);
        unsafe {
            ptr::copy_nonoverlapping(
                self.storage.priority_ptr(index),
                self.storage.priority_ptr(self.pos),
                1,
            );
            ptr::copy_nonoverlapping(
                self.storage.element_ptr(index),
                self.storage.element_ptr(self.pos),
                1,
            );
        }
        self.pos = index;
    }
}

impl<P, E> Drop for Hole<'_, P, E> {
    #[inline]
    fn drop(&mut self) {
        // SAFETY: pos is the vacant slot; the held pair is written exactly once
        unsafe {
            let (priority, element) = ManuallyDrop::take(&mut self.pair);
            ptr::write(self.storage.priority_ptr(self.pos), priority);
            ptr::write(self.storage.element_ptr(self.pos), element);
        }
    }
}
