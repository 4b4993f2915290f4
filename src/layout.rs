//! Stride and offset computation for packed priority/element pairs
//!
//! A pair occupies `pair_size` bytes: the priority at offset 0, the element at
//! `elt_offset`. Both numbers depend only on the two sizes and the effective
//! alignments, so the layout is computed once at construction and again when
//! the heap is realigned.
//!
//! ```text
//! |<------------------ pair_size ------------------>|
//! | priority (P) | pad | element (E)          | pad |
//! 0              ^     elt_offset                   ^
//! ```

use crate::traits::HeapError;
use std::mem::{align_of, size_of};

/// Alignment overrides for the packed pair buffer
///
/// `None` keeps the natural alignment of the corresponding type. An override
/// must be a power of two no smaller than the natural alignment, since the
/// buffer is read through typed references.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Alignment {
    /// Alignment of the priority, which also sits at the start of each pair
    pub priority: Option<usize>,
    /// Alignment of the element within a pair
    pub element: Option<usize>,
    /// Minimum alignment of the pair stride
    pub pair: Option<usize>,
    /// Slot alignment the hash index is checked against, see [`SlotIndex::align`](crate::index::SlotIndex::align)
    pub index: Option<usize>,
}

impl Alignment {
    /// Natural alignment everywhere
    pub const NATURAL: Alignment = Alignment {
        priority: None,
        element: None,
        pair: None,
        index: None,
    };

    pub fn with_priority(mut self, alignment: usize) -> Self {
        self.priority = Some(alignment);
        self
    }

    pub fn with_element(mut self, alignment: usize) -> Self {
        self.element = Some(alignment);
        self
    }

    pub fn with_pair(mut self, alignment: usize) -> Self {
        self.pair = Some(alignment);
        self
    }

    pub fn with_index(mut self, alignment: usize) -> Self {
        self.index = Some(alignment);
        self
    }
}

/// Computed layout of one pair slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairLayout {
    /// Byte offset of the element within a pair, `>= size_of::<P>()`
    pub elt_offset: usize,
    /// Stride between consecutive pairs, `>= elt_offset + size_of::<E>()`
    pub pair_size: usize,
    /// Alignment of the buffer and of every pair start
    pub pair_align: usize,
}

impl PairLayout {
    /// Computes the layout for priority type `P` and element type `E`.
    ///
    /// # Errors
    ///
    /// `InvalidAlignment` for a bad override, `LayoutOverflow` if the stride
    /// does not fit in `isize::MAX`.
    pub fn new<P, E>(alignment: &Alignment) -> Result<Self, HeapError> {
        let pty_align = resolve(alignment.priority, align_of::<P>())?;
        let elt_align = resolve(alignment.element, align_of::<E>())?;
        let pair_align = resolve(alignment.pair, 1)?.max(pty_align).max(elt_align);

        let elt_offset = round_up(size_of::<P>(), elt_align)?;
        let end = elt_offset
            .checked_add(size_of::<E>())
            .ok_or(HeapError::LayoutOverflow)?;
        let pair_size = round_up(end, pair_align)?;
        if pair_size > isize::MAX as usize {
            return Err(HeapError::LayoutOverflow);
        }

        Ok(PairLayout {
            elt_offset,
            pair_size,
            pair_align,
        })
    }

    /// Largest slot count whose buffer stays within `isize::MAX` bytes
    ///
    /// Zero-sized pairs are capped at `isize::MAX` slots as well, which keeps
    /// child index arithmetic (`2 * i + 2`) from overflowing.
    pub fn max_slots(&self) -> usize {
        if self.pair_size == 0 {
            isize::MAX as usize
        } else {
            isize::MAX as usize / self.pair_size
        }
    }
}

fn resolve(requested: Option<usize>, natural: usize) -> Result<usize, HeapError> {
    match requested {
        None => Ok(natural),
        Some(alignment) if alignment.is_power_of_two() && alignment >= natural => Ok(alignment),
        Some(alignment) => Err(HeapError::InvalidAlignment { alignment }),
    }
}

/// Rounds `n` up to a multiple of the power of two `align`.
fn round_up(n: usize, align: usize) -> Result<usize, HeapError> {
    n.checked_add(align - 1)
        .map(|v| v & !(align - 1))
        .ok_or(HeapError::LayoutOverflow)
}
