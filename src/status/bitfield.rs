use serde::{Deserialize, Serialize};
use zerocopy::{AsBytes, FromBytes, FromZeroes};

use super::{Status, StatusFlag};
use crate::error::StatusError;

const MOVED_FROM: u16 = 1 << 5;

/// The full tag carried by every cell: the state, the orthogonal moved-from
/// flag and 16 bits of spare storage owned by hook code.
///
/// Layout note: exactly 4 bytes; `RawStatus` is its frozen packed form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(C)]
pub struct StatusBitfield {
    status: Status,
    moved_from: bool,
    spare_storage: u16,
}

/// The packed `u16 + u16` form of a [`StatusBitfield`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, AsBytes, FromBytes, FromZeroes)]
#[repr(C)]
pub struct RawStatus {
    /// State bits (0..=4) and the moved-from bit (5).
    pub bits: u16,
    /// Spare storage, passed through untouched.
    pub spare: u16,
}

impl StatusBitfield {
    /// Creates a bitfield in `status` with zeroed spare storage.
    #[inline(always)]
    pub const fn new(status: Status) -> Self {
        Self::with_spare_storage(status, 0)
    }

    /// Creates a bitfield in `status` carrying `spare`.
    #[inline(always)]
    pub const fn with_spare_storage(status: Status, spare: u16) -> Self {
        Self {
            status,
            moved_from: false,
            spare_storage: spare,
        }
    }

    /// The current state.
    #[inline(always)]
    pub const fn status(&self) -> Status {
        self.status
    }

    /// Returns `true` if a value is held.
    #[inline(always)]
    pub const fn has_value(&self) -> bool {
        self.status.has_value()
    }

    /// Returns `true` if an error is held.
    #[inline(always)]
    pub const fn has_error(&self) -> bool {
        self.status.has_error()
    }

    /// Returns `true` if an exception is held.
    #[inline(always)]
    pub const fn has_exception(&self) -> bool {
        self.status.has_exception()
    }

    /// Returns `true` if the held error is errno-convertible.
    #[inline(always)]
    pub const fn has_error_is_errno(&self) -> bool {
        self.status.has_error_is_errno()
    }

    /// Returns `true` if a strong swap left this side unreliable.
    #[inline(always)]
    pub const fn has_lost_consistency(&self) -> bool {
        self.status.has_lost_consistency()
    }

    /// Returns `true` if the value was taken out of the owning cell.
    #[inline(always)]
    pub const fn was_moved_from(&self) -> bool {
        self.moved_from
    }

    /// The spare storage. Never interpreted by this crate.
    #[inline(always)]
    pub const fn spare_storage(&self) -> u16 {
        self.spare_storage
    }

    /// Overwrites the spare storage.
    #[inline(always)]
    pub fn set_spare_storage(&mut self, spare: u16) -> &mut Self {
        self.spare_storage = spare;
        self
    }

    /// Sets `flag` to `on` through the transition table.
    ///
    /// # Panics
    /// Panics if no legal successor exists.
    #[inline]
    #[track_caller]
    pub fn set(&mut self, flag: StatusFlag, on: bool) -> &mut Self {
        self.status = self.status.set(flag, on);
        self
    }

    /// See [`Status::set_have_value`].
    ///
    /// # Panics
    /// Panics when setting a value while an error or exception is held.
    #[inline]
    #[track_caller]
    pub fn set_have_value(&mut self, on: bool) -> &mut Self {
        self.set(StatusFlag::Value, on)
    }

    /// See [`Status::set_have_error`].
    ///
    /// # Panics
    /// Panics when setting an error while a value is held.
    #[inline]
    #[track_caller]
    pub fn set_have_error(&mut self, on: bool) -> &mut Self {
        self.set(StatusFlag::Error, on)
    }

    /// See [`Status::set_have_exception`].
    ///
    /// # Panics
    /// Panics when setting an exception while a value is held.
    #[inline]
    #[track_caller]
    pub fn set_have_exception(&mut self, on: bool) -> &mut Self {
        self.set(StatusFlag::Exception, on)
    }

    /// See [`Status::set_have_error_is_errno`].
    ///
    /// # Panics
    /// Panics if no error is held.
    #[inline]
    #[track_caller]
    pub fn set_have_error_is_errno(&mut self, on: bool) -> &mut Self {
        self.set(StatusFlag::ErrorIsErrno, on)
    }

    /// See [`Status::set_have_lost_consistency`].
    ///
    /// # Panics
    /// Panics when raising the flag on an empty state.
    #[inline]
    #[track_caller]
    pub fn set_have_lost_consistency(&mut self, on: bool) -> &mut Self {
        self.set(StatusFlag::LostConsistency, on)
    }

    /// Sets or clears the moved-from flag. Any state may carry it.
    #[inline(always)]
    pub fn set_have_moved_from(&mut self, on: bool) -> &mut Self {
        self.moved_from = on;
        self
    }

    /// Packs into the frozen layout.
    #[inline]
    pub const fn to_raw(self) -> RawStatus {
        let moved = if self.moved_from { MOVED_FROM } else { 0 };
        RawStatus {
            bits: self.status.bits() as u16 | moved,
            spare: self.spare_storage,
        }
    }

    /// Unpacks the frozen layout.
    ///
    /// # Errors
    /// Returns [`StatusError::InvalidBits`] if the state bits are outside the
    /// closed set or any bit above the moved-from bit is set.
    pub fn try_from_raw(raw: RawStatus) -> Result<Self, StatusError> {
        if raw.bits & !(MOVED_FROM | 0x1f) != 0 {
            return Err(StatusError::InvalidBits(raw.bits));
        }
        #[allow(clippy::cast_possible_truncation)]
        let status = Status::from_bits((raw.bits & 0x1f) as u8).ok_or(StatusError::InvalidBits(raw.bits))?;
        Ok(Self {
            status,
            moved_from: raw.bits & MOVED_FROM != 0,
            spare_storage: raw.spare,
        })
    }
}

impl From<Status> for StatusBitfield {
    fn from(status: Status) -> Self {
        Self::new(status)
    }
}

impl TryFrom<RawStatus> for StatusBitfield {
    type Error = StatusError;

    fn try_from(raw: RawStatus) -> Result<Self, Self::Error> {
        Self::try_from_raw(raw)
    }
}
