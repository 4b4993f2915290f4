//! Shared error type and priority comparators
//!
//! The heap never compares priorities with `<` directly; it goes through a
//! [`Compare`] strategy so callers can order priorities that are not `Ord`
//! (floating point edge weights being the usual case) or order by a
//! projection of the priority.

use std::cmp::Ordering;
use thiserror::Error;

/// Error type for heap, storage and index operations
///
/// Capacity, allocation and layout failures are configuration or environment
/// errors. Retrying the same call cannot succeed, see [`HeapError::is_fatal`].
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum HeapError {
    /// A push found the heap full at its configured maximum capacity
    #[error("tried to exceed the maximum heap capacity of {max} pairs")]
    CapacityExceeded { max: usize },

    /// The global allocator could not provide the requested block
    #[error("allocation of {bytes} bytes failed")]
    AllocationFailed { bytes: usize },

    /// A size or offset computation does not fit in `isize::MAX` bytes
    #[error("pair buffer size overflows the addressable range")]
    LayoutOverflow,

    /// An alignment override is not a power of two or is below the natural alignment
    #[error("invalid alignment {alignment}")]
    InvalidAlignment { alignment: usize },

    /// A load factor that the selected index cannot operate under
    #[error("invalid load factor {numerator}/2^{log2_denominator}")]
    InvalidLoadFactor {
        numerator: usize,
        log2_denominator: u32,
    },

    /// Minimum capacity above the maximum, or a zero maximum
    #[error("invalid capacity bounds: min {min}, max {max}")]
    InvalidCapacity { min: usize, max: usize },
}

impl HeapError {
    /// Returns true for errors that signal a capacity-planning or environment
    /// failure rather than bad construction parameters.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            HeapError::CapacityExceeded { .. }
                | HeapError::AllocationFailed { .. }
                | HeapError::LayoutOverflow
        )
    }
}

/// Priority comparison strategy
///
/// `compare(a, b)` returns `Less` when `a` should leave the heap before `b`.
/// Implementations must be a total order and must not call back into the
/// heap that owns them.
pub trait Compare<P> {
    fn compare(&self, a: &P, b: &P) -> Ordering;
}

/// Orders priorities by their `Ord` implementation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NaturalOrder;

impl<P: Ord> Compare<P> for NaturalOrder {
    #[inline]
    fn compare(&self, a: &P, b: &P) -> Ordering {
        a.cmp(b)
    }
}

/// Orders `f32`/`f64` priorities by IEEE 754 total order
///
/// Negative zero sorts before positive zero and NaNs sort to the ends, so a
/// NaN weight never corrupts the heap shape.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FloatOrder;

impl Compare<f64> for FloatOrder {
    #[inline]
    fn compare(&self, a: &f64, b: &f64) -> Ordering {
        a.total_cmp(b)
    }
}

impl Compare<f32> for FloatOrder {
    #[inline]
    fn compare(&self, a: &f32, b: &f32) -> Ordering {
        a.total_cmp(b)
    }
}

impl<P, F> Compare<P> for F
where
    F: Fn(&P, &P) -> Ordering,
{
    #[inline]
    fn compare(&self, a: &P, b: &P) -> Ordering {
        self(a, b)
    }
}
