//! `NontrivialStorage`: a cell that manages its payload's lifetime by hand.

use core::fmt;
use core::mem::{self, ManuallyDrop, MaybeUninit};

use super::raw;
use super::swap::{self, StrongSwap, TransferAssign};
use super::trivial::TrivialStorage;
use super::ValueStorage;
use crate::status::{Status, StatusBitfield};

/// A cell for payloads with drop glue or a non-bitwise `Clone`.
///
/// The value bit is cleared before any payload construction starts and set
/// only once it has finished, so an unwinding `clone` never leaves the tag
/// claiming a half-built payload.
pub struct NontrivialStorage<T> {
    value: MaybeUninit<T>,
    status: StatusBitfield,
}

impl<T> NontrivialStorage<T> {
    /// A cell holding `value`.
    #[inline(always)]
    pub const fn new(value: T) -> Self {
        Self {
            value: MaybeUninit::new(value),
            status: StatusBitfield::new(Status::HaveValue),
        }
    }

    /// An empty cell.
    #[inline(always)]
    pub const fn vacant() -> Self {
        Self {
            value: MaybeUninit::uninit(),
            status: StatusBitfield::new(Status::None),
        }
    }

    /// Builds from a unit cell: default-constructs the payload only when
    /// `source` is valued, and copies its status.
    pub fn from_void(source: &TrivialStorage<()>) -> Self
    where
        T: Default,
    {
        let mut status = *source.status();
        if !status.has_value() {
            return Self {
                value: MaybeUninit::uninit(),
                status,
            };
        }
        let valued = status;
        status.set_have_value(false);
        let mut cell = Self {
            value: MaybeUninit::uninit(),
            status,
        };
        raw::write(&mut cell.value, T::default());
        cell.status = valued;
        cell
    }

    /// Splits without clearing the value bit from the returned status.
    fn into_raw_parts(self) -> (StatusBitfield, Option<T>) {
        let this = ManuallyDrop::new(self);
        let status = this.status;
        let value = if status.has_value() {
            // SAFETY: the value bit is set, and `this` is never dropped, so
            // the payload is read out exactly once.
            Some(unsafe { raw::read(&this.value) })
        } else {
            None
        };
        (status, value)
    }
}

impl<T> ValueStorage for NontrivialStorage<T> {
    type Value = T;

    const TRIVIAL: bool = false;

    #[inline]
    #[track_caller]
    fn from_parts(mut status: StatusBitfield, value: Option<T>) -> Self {
        status.set_have_value(value.is_some());
        let value = match value {
            Some(value) => MaybeUninit::new(value),
            None => MaybeUninit::uninit(),
        };
        Self { value, status }
    }

    #[inline]
    fn into_parts(self) -> (StatusBitfield, Option<T>) {
        self.into_raw_parts()
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
            // SAFETY: the value bit is set.
            Some(unsafe { raw::assume_init_ref(&self.value) })
        } else {
            None
        }
    }

    #[inline]
    fn value_mut(&mut self) -> Option<&mut T> {
        if self.status.has_value() {
            // SAFETY: the value bit is set.
            Some(unsafe { raw::assume_init_mut(&mut self.value) })
        } else {
            None
        }
    }

    #[inline]
    fn take_value(&mut self) -> Option<T> {
        if !self.status.has_value() {
            return None;
        }
        self.status.set_have_value(false).set_have_moved_from(true);
        // SAFETY: the bit was set and is now cleared, so the slot is read once.
        Some(unsafe { raw::read(&self.value) })
    }

    fn assign_from(&mut self, other: Self) {
        let (status, value) = other.into_raw_parts();
        match (self.status.has_value(), value) {
            (true, Some(value)) => {
                // SAFETY: the value bit is set.
                *unsafe { raw::assume_init_mut(&mut self.value) } = value;
            }
            (true, None) => {
                self.status.set_have_value(false);
                // SAFETY: the payload was live and its bit is now cleared.
                unsafe { raw::drop_in_place(&mut self.value) };
            }
            (false, Some(value)) => raw::write(&mut self.value, value),
            (false, None) => {}
        }
        self.status = status;
    }

    fn swap(&mut self, other: &mut Self) {
        match (self.status.has_value(), other.status.has_value()) {
            (true, true) => mem::swap(&mut self.value, &mut other.value),
            // SAFETY (both arms): exactly one side is live; the live payload
            // is relocated into the vacant slot and the tags follow it.
            (true, false) => unsafe { raw::relocate(&mut self.value, &mut other.value) },
            (false, true) => unsafe { raw::relocate(&mut other.value, &mut self.value) },
            (false, false) => {}
        }
        mem::swap(&mut self.status, &mut other.status);
    }
}

impl<T: TransferAssign> StrongSwap for NontrivialStorage<T> {
    fn strong_swap(&mut self, other: &mut Self) {
        if !(self.status.has_value() && other.status.has_value()) {
            ValueStorage::swap(self, other);
            return;
        }
        // SAFETY: both value bits are set.
        let (a, b) = unsafe {
            (
                raw::assume_init_mut(&mut self.value),
                raw::assume_init_mut(&mut other.value),
            )
        };
        match swap::strong_swap(a, b) {
            Ok(()) => mem::swap(&mut self.status, &mut other.status),
            Err(failure) => {
                if !failure.restored() {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(
                        panic = ?failure.message(),
                        "strong swap could not be rolled back; both cells lost consistency"
                    );
                    self.status.set_have_lost_consistency(true);
                    other.status.set_have_lost_consistency(true);
                }
                failure.resume()
            }
        }
    }
}

impl<T> Drop for NontrivialStorage<T> {
    fn drop(&mut self) {
        if self.status.has_value() {
            self.status.set_have_value(false);
            // SAFETY: the payload was live; its bit is cleared first so a
            // panicking destructor cannot cause a second drop.
            unsafe { raw::drop_in_place(&mut self.value) };
        }
    }
}

impl<T: Clone> Clone for NontrivialStorage<T> {
    fn clone(&self) -> Self {
        let Some(value) = self.value() else {
            return Self {
                value: MaybeUninit::uninit(),
                status: self.status,
            };
        };
        let mut status = self.status;
        status.set_have_value(false);
        let mut cell = Self {
            value: MaybeUninit::uninit(),
            status,
        };
        raw::write(&mut cell.value, value.clone());
        cell.status = self.status;
        cell
    }

    fn clone_from(&mut self, source: &Self) {
        match (self.status.has_value(), source.value()) {
            (true, Some(value)) => {
                // SAFETY: the value bit is set.
                unsafe { raw::assume_init_mut(&mut self.value) }.clone_from(value);
            }
            (true, None) => {
                self.status.set_have_value(false);
                // SAFETY: the payload was live and its bit is now cleared.
                unsafe { raw::drop_in_place(&mut self.value) };
            }
            (false, Some(value)) => raw::write(&mut self.value, value.clone()),
            (false, None) => {}
        }
        self.status = source.status;
    }
}

impl<T> Default for NontrivialStorage<T> {
    fn default() -> Self {
        Self::vacant()
    }
}

impl<T: PartialEq> PartialEq for NontrivialStorage<T> {
    fn eq(&self, other: &Self) -> bool {
        self.status == other.status && self.value() == other.value()
    }
}

impl<T: fmt::Debug> fmt::Debug for NontrivialStorage<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NontrivialStorage")
            .field("status", &self.status)
            .field("value", &self.value())
            .finish()
    }
}
