//! `TrivialStorage`: the bitwise cell for `Copy` payloads.

use core::fmt;

use super::swap::StrongSwap;
use super::ValueStorage;
use crate::status::{Status, StatusBitfield};

#[derive(Clone, Copy)]
#[repr(C)]
union Slot<T: Copy> {
    empty: (),
    value: T,
}

/// A cell whose copy, move, drop and swap are all plain byte copies.
///
/// `value` is live whenever the status has the value bit; an empty slot is
/// never read.
#[derive(Clone, Copy)]
#[repr(C)]
pub struct TrivialStorage<T: Copy> {
    slot: Slot<T>,
    status: StatusBitfield,
}

impl<T: Copy> TrivialStorage<T> {
    /// A cell holding `value`.
    #[inline(always)]
    pub const fn new(value: T) -> Self {
        Self {
            slot: Slot { value },
            status: StatusBitfield::new(Status::HaveValue),
        }
    }

    /// An empty cell.
    #[inline(always)]
    pub const fn vacant() -> Self {
        Self {
            slot: Slot { empty: () },
            status: StatusBitfield::new(Status::None),
        }
    }

    /// Builds from a unit cell: always default-constructs the payload and
    /// copies `source`'s status verbatim.
    #[inline]
    pub fn from_void(source: &TrivialStorage<()>) -> Self
    where
        T: Default,
    {
        Self {
            slot: Slot { value: T::default() },
            status: source.status,
        }
    }
}

impl<T: Copy> ValueStorage for TrivialStorage<T> {
    type Value = T;

    const TRIVIAL: bool = true;

    #[inline]
    #[track_caller]
    fn from_parts(mut status: StatusBitfield, value: Option<T>) -> Self {
        status.set_have_value(value.is_some());
        let slot = match value {
            Some(value) => Slot { value },
            None => Slot { empty: () },
        };
        Self { slot, status }
    }

    #[inline]
    fn into_parts(self) -> (StatusBitfield, Option<T>) {
        (self.status, self.value().copied())
    }

    #[inline(always)]
    fn status(&self) -> &StatusBitfield {
        &self.status
    }

    #[inline(always)]
    unsafe fn status_mut(&mut self) -> &mut StatusBitfield {
        &mut self.status
    }

    #[inline]
    fn value(&self) -> Option<&T> {
        if self.status.has_value() {
            // SAFETY: the value bit is set, so `value` is the active field.
            Some(unsafe { &self.slot.value })
        } else {
            None
        }
    }

    #[inline]
    fn value_mut(&mut self) -> Option<&mut T> {
        if self.status.has_value() {
            // SAFETY: as in `value`.
            Some(unsafe { &mut self.slot.value })
        } else {
            None
        }
    }

    #[inline]
    fn take_value(&mut self) -> Option<T> {
        let value = self.value().copied()?;
        self.status.set_have_value(false).set_have_moved_from(true);
        Some(value)
    }

    #[inline(always)]
    fn assign_from(&mut self, other: Self) {
        *self = other;
    }

    #[inline]
    fn swap(&mut self, other: &mut Self) {
        let temp = *self;
        *self = *other;
        *other = temp;
    }
}

impl<T: Copy> StrongSwap for TrivialStorage<T> {
    #[inline(always)]
    fn strong_swap(&mut self, other: &mut Self) {
        ValueStorage::swap(self, other);
    }
}

impl<T: Copy> Default for TrivialStorage<T> {
    fn default() -> Self {
        Self::vacant()
    }
}

impl<T: Copy + PartialEq> PartialEq for TrivialStorage<T> {
    fn eq(&self, other: &Self) -> bool {
        self.status == other.status && self.value() == other.value()
    }
}

impl<T: Copy + fmt::Debug> fmt::Debug for TrivialStorage<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrivialStorage")
            .field("status", &self.status)
            .field("value", &self.value())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copy_is_bitwise_and_independent() {
        let a = TrivialStorage::new(42_u32);
        let mut b = a;
        *b.value_mut().unwrap() = 7;
        assert_eq!(a.value(), Some(&42));
        assert_eq!(b.value(), Some(&7));
    }

    #[test]
    fn swap_exchanges_status_and_value() {
        let mut a = TrivialStorage::new(1_i64);
        let mut b = TrivialStorage::<i64>::from_status(StatusBitfield::new(Status::HaveError));
        a.swap(&mut b);
        assert!(a.status().has_error());
        assert_eq!(a.value(), None);
        assert_eq!(b.value(), Some(&1));
    }

    #[test]
    fn from_void_default_constructs_and_copies_status() {
        let valued = TrivialStorage::new(());
        let cell = TrivialStorage::<u16>::from_void(&valued);
        assert_eq!(cell.value(), Some(&0));

        let mut errored = TrivialStorage::<()>::from_status(StatusBitfield::new(Status::HaveError));
        errored.set_spare_storage(9);
        let cell = TrivialStorage::<u16>::from_void(&errored);
        assert_eq!(cell.value(), None);
        assert_eq!(cell.status().status(), Status::HaveError);
        assert_eq!(cell.status().spare_storage(), 9);
    }

    #[test]
    fn take_marks_moved_from() {
        let mut cell = TrivialStorage::new('x');
        assert_eq!(cell.take_value(), Some('x'));
        assert_eq!(cell.take_value(), None);
        assert!(cell.status().was_moved_from());
        assert_eq!(cell.status().status(), Status::None);
    }
}
