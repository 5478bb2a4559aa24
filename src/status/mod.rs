//! Packed state tag for result and outcome containers.
//!
//! A [`Status`] is a closed set of legal combinations, not a free bag of bits.
//! Every setter is a transition over that set: for each `(state, flag, on)` the
//! table in [`Status::transition`] names exactly one successor, or `None` when
//! the request is a contract violation. The safe setters (`set_have_*`) trap on
//! the latter instead of producing an unnamed state.
//!
//! ## Frozen layout
//! Discriminants are the bit positions shared with the packed form
//! ([`RawStatus`]), and must not change:
//!
//! | bit | meaning                |
//! |-----|------------------------|
//! | 0   | value                  |
//! | 1   | error                  |
//! | 2   | exception              |
//! | 3   | lost consistency       |
//! | 4   | error is errno         |
//! | 5   | moved from (bitfield)  |

#[cfg(feature = "proptest")]
mod arbitrary;
mod bitfield;

pub use bitfield::{RawStatus, StatusBitfield};

use core::fmt;
use serde::{Deserialize, Serialize};

const VALUE: u8 = 1 << 0;
const ERROR: u8 = 1 << 1;
const EXCEPTION: u8 = 1 << 2;
const LOST_CONSISTENCY: u8 = 1 << 3;
const ERROR_IS_ERRNO: u8 = 1 << 4;

const PAYLOAD: u8 = VALUE | ERROR | EXCEPTION;

/// Which payloads a container holds, plus the auxiliary consistency flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum Status {
    /// Nothing is held.
    #[default]
    None = 0,
    /// A value is held.
    HaveValue = VALUE,
    /// An error is held.
    HaveError = ERROR,
    /// An exception is held.
    HaveException = EXCEPTION,
    /// Both an error and an exception are held.
    HaveErrorException = ERROR | EXCEPTION,
    /// A value is held; a strong swap failed to restore it.
    HaveValueLostConsistency = VALUE | LOST_CONSISTENCY,
    /// An error is held; a strong swap failed.
    HaveErrorLostConsistency = ERROR | LOST_CONSISTENCY,
    /// An exception is held; a strong swap failed.
    HaveExceptionLostConsistency = EXCEPTION | LOST_CONSISTENCY,
    /// An error and an exception are held; a strong swap failed.
    HaveErrorExceptionLostConsistency = ERROR | EXCEPTION | LOST_CONSISTENCY,
    /// An errno-convertible error is held.
    HaveErrorErrorIsErrno = ERROR | ERROR_IS_ERRNO,
    /// An errno-convertible error and an exception are held.
    HaveErrorExceptionErrorIsErrno = ERROR | EXCEPTION | ERROR_IS_ERRNO,
    /// An errno-convertible error is held; a strong swap failed.
    HaveErrorLostConsistencyErrorIsErrno = ERROR | LOST_CONSISTENCY | ERROR_IS_ERRNO,
    /// An errno-convertible error and an exception are held; a strong swap failed.
    HaveErrorExceptionLostConsistencyErrorIsErrno =
        ERROR | EXCEPTION | LOST_CONSISTENCY | ERROR_IS_ERRNO,
}

/// A single settable facet of a [`Status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusFlag {
    /// The value payload.
    Value,
    /// The error payload.
    Error,
    /// The exception payload.
    Exception,
    /// The held error can be reported as an `errno`.
    ErrorIsErrno,
    /// A strong swap could not be rolled back.
    LostConsistency,
}

impl StatusFlag {
    /// All flags, in bit order.
    pub const ALL: [StatusFlag; 5] = [
        StatusFlag::Value,
        StatusFlag::Error,
        StatusFlag::Exception,
        StatusFlag::ErrorIsErrno,
        StatusFlag::LostConsistency,
    ];

    const fn bit(self) -> u8 {
        match self {
            StatusFlag::Value => VALUE,
            StatusFlag::Error => ERROR,
            StatusFlag::Exception => EXCEPTION,
            StatusFlag::ErrorIsErrno => ERROR_IS_ERRNO,
            StatusFlag::LostConsistency => LOST_CONSISTENCY,
        }
    }
}

impl fmt::Display for StatusFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StatusFlag::Value => "value",
            StatusFlag::Error => "error",
            StatusFlag::Exception => "exception",
            StatusFlag::ErrorIsErrno => "error_is_errno",
            StatusFlag::LostConsistency => "lost_consistency",
        })
    }
}

impl Status {
    /// Every legal state, in discriminant order.
    pub const ALL: [Status; 13] = [
        Status::None,
        Status::HaveValue,
        Status::HaveError,
        Status::HaveException,
        Status::HaveErrorException,
        Status::HaveValueLostConsistency,
        Status::HaveErrorLostConsistency,
        Status::HaveExceptionLostConsistency,
        Status::HaveErrorExceptionLostConsistency,
        Status::HaveErrorErrorIsErrno,
        Status::HaveErrorExceptionErrorIsErrno,
        Status::HaveErrorLostConsistencyErrorIsErrno,
        Status::HaveErrorExceptionLostConsistencyErrorIsErrno,
    ];

    /// The frozen bit pattern of this state.
    #[inline(always)]
    pub const fn bits(self) -> u8 {
        self as u8
    }

    /// Decodes a bit pattern, rejecting combinations outside the closed set.
    pub const fn from_bits(bits: u8) -> Option<Status> {
        Some(match bits {
            0 => Status::None,
            VALUE => Status::HaveValue,
            ERROR => Status::HaveError,
            EXCEPTION => Status::HaveException,
            0b0_0110 => Status::HaveErrorException,
            0b0_1001 => Status::HaveValueLostConsistency,
            0b0_1010 => Status::HaveErrorLostConsistency,
            0b0_1100 => Status::HaveExceptionLostConsistency,
            0b0_1110 => Status::HaveErrorExceptionLostConsistency,
            0b1_0010 => Status::HaveErrorErrorIsErrno,
            0b1_0110 => Status::HaveErrorExceptionErrorIsErrno,
            0b1_1010 => Status::HaveErrorLostConsistencyErrorIsErrno,
            0b1_1110 => Status::HaveErrorExceptionLostConsistencyErrorIsErrno,
            _ => return None,
        })
    }

    /// Returns `true` if a value is held.
    #[inline(always)]
    pub const fn has_value(self) -> bool {
        matches!(self, Status::HaveValue | Status::HaveValueLostConsistency)
    }

    /// Returns `true` if an error is held.
    #[inline(always)]
    pub const fn has_error(self) -> bool {
        matches!(
            self,
            Status::HaveError
                | Status::HaveErrorException
                | Status::HaveErrorLostConsistency
                | Status::HaveErrorExceptionLostConsistency
                | Status::HaveErrorErrorIsErrno
                | Status::HaveErrorExceptionErrorIsErrno
                | Status::HaveErrorLostConsistencyErrorIsErrno
                | Status::HaveErrorExceptionLostConsistencyErrorIsErrno
        )
    }

    /// Returns `true` if an exception is held.
    #[inline(always)]
    pub const fn has_exception(self) -> bool {
        matches!(
            self,
            Status::HaveException
                | Status::HaveErrorException
                | Status::HaveExceptionLostConsistency
                | Status::HaveErrorExceptionLostConsistency
                | Status::HaveErrorExceptionErrorIsErrno
                | Status::HaveErrorExceptionLostConsistencyErrorIsErrno
        )
    }

    /// Returns `true` if the held error is errno-convertible.
    #[inline(always)]
    pub const fn has_error_is_errno(self) -> bool {
        matches!(
            self,
            Status::HaveErrorErrorIsErrno
                | Status::HaveErrorExceptionErrorIsErrno
                | Status::HaveErrorLostConsistencyErrorIsErrno
                | Status::HaveErrorExceptionLostConsistencyErrorIsErrno
        )
    }

    /// Returns `true` if a strong swap left this side unreliable.
    #[inline(always)]
    pub const fn has_lost_consistency(self) -> bool {
        matches!(
            self,
            Status::HaveValueLostConsistency
                | Status::HaveErrorLostConsistency
                | Status::HaveExceptionLostConsistency
                | Status::HaveErrorExceptionLostConsistency
                | Status::HaveErrorLostConsistencyErrorIsErrno
                | Status::HaveErrorExceptionLostConsistencyErrorIsErrno
        )
    }

    /// Returns `true` if `flag` is set in this state.
    #[inline]
    pub const fn has(self, flag: StatusFlag) -> bool {
        match flag {
            StatusFlag::Value => self.has_value(),
            StatusFlag::Error => self.has_error(),
            StatusFlag::Exception => self.has_exception(),
            StatusFlag::ErrorIsErrno => self.has_error_is_errno(),
            StatusFlag::LostConsistency => self.has_lost_consistency(),
        }
    }

    /// The transition table.
    ///
    /// Returns the successor of `self` after setting `flag` to `on`, or
    /// `None` when no legal successor exists:
    /// - a value cannot coexist with an error or an exception;
    /// - `ErrorIsErrno` can only be touched while an error is held;
    /// - `LostConsistency` cannot be raised on an empty state.
    ///
    /// Clearing an error also clears `ErrorIsErrno`, and a state left without
    /// any payload collapses to [`Status::None`].
    pub const fn transition(self, flag: StatusFlag, on: bool) -> Option<Status> {
        let bits = self.bits();
        let payload = bits & PAYLOAD;
        let next = match (flag, on) {
            (StatusFlag::Value, true) => {
                if payload & (ERROR | EXCEPTION) != 0 {
                    return None;
                }
                bits | VALUE
            }
            (StatusFlag::Error | StatusFlag::Exception, true) => {
                if payload & VALUE != 0 {
                    return None;
                }
                bits | flag.bit()
            }
            (StatusFlag::Error, false) => bits & !(ERROR | ERROR_IS_ERRNO),
            (StatusFlag::Value | StatusFlag::Exception, false) => bits & !flag.bit(),
            (StatusFlag::ErrorIsErrno, _) => {
                if payload & ERROR == 0 {
                    return None;
                }
                if on {
                    bits | ERROR_IS_ERRNO
                } else {
                    bits & !ERROR_IS_ERRNO
                }
            }
            (StatusFlag::LostConsistency, true) => {
                if payload == 0 {
                    return None;
                }
                bits | LOST_CONSISTENCY
            }
            (StatusFlag::LostConsistency, false) => bits & !LOST_CONSISTENCY,
        };
        let next = if next & PAYLOAD == 0 { 0 } else { next };
        Status::from_bits(next)
    }

    /// Applies [`transition`](Self::transition), trapping on a contract violation.
    ///
    /// # Panics
    /// Panics if no legal successor exists for `(self, flag, on)`.
    #[inline]
    #[track_caller]
    pub fn set(self, flag: StatusFlag, on: bool) -> Status {
        match self.transition(flag, on) {
            Some(next) => next,
            None => contract_violation(self, flag, on),
        }
    }

    /// Sets or clears the value flag.
    ///
    /// # Panics
    /// Panics when setting a value while an error or exception is held.
    #[inline]
    #[track_caller]
    pub fn set_have_value(self, on: bool) -> Status {
        self.set(StatusFlag::Value, on)
    }

    /// Sets or clears the error flag.
    ///
    /// # Panics
    /// Panics when setting an error while a value is held.
    #[inline]
    #[track_caller]
    pub fn set_have_error(self, on: bool) -> Status {
        self.set(StatusFlag::Error, on)
    }

    /// Sets or clears the exception flag.
    ///
    /// # Panics
    /// Panics when setting an exception while a value is held.
    #[inline]
    #[track_caller]
    pub fn set_have_exception(self, on: bool) -> Status {
        self.set(StatusFlag::Exception, on)
    }

    /// Sets or clears the errno-convertible flag.
    ///
    /// # Panics
    /// Panics if no error is held.
    #[inline]
    #[track_caller]
    pub fn set_have_error_is_errno(self, on: bool) -> Status {
        self.set(StatusFlag::ErrorIsErrno, on)
    }

    /// Sets or clears the lost-consistency flag.
    ///
    /// # Panics
    /// Panics when raising the flag on [`Status::None`].
    #[inline]
    #[track_caller]
    pub fn set_have_lost_consistency(self, on: bool) -> Status {
        self.set(StatusFlag::LostConsistency, on)
    }
}

#[cold]
#[inline(never)]
#[track_caller]
fn contract_violation(status: Status, flag: StatusFlag, on: bool) -> ! {
    panic!("illegal status transition: {status:?} cannot set {flag} to {on}")
}
