//! Recoverable errors raised by the status and accessor layers.
//!
//! Contract violations (illegal transitions, reading a value that is not
//! held through the `assume_*` accessors) are not reported here; they panic.

use core::fmt;

use crate::status::{Status, StatusFlag};

/// Decoding a packed status failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusError {
    /// The bit pattern does not name a legal state.
    InvalidBits(u16),
}

impl fmt::Display for StatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusError::InvalidBits(bits) => write!(f, "status bits {bits:#06x} do not name a legal state"),
        }
    }
}

impl std::error::Error for StatusError {}

/// A payload was requested from a container that does not hold it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessError {
    /// The payload that was asked for.
    pub wanted: StatusFlag,
    /// The state the container was in.
    pub found: Status,
}

impl AccessError {
    pub(crate) const fn new(wanted: StatusFlag, found: Status) -> Self {
        Self { wanted, found }
    }
}

impl fmt::Display for AccessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "no {} held (status {:?})", self.wanted, self.found)
    }
}

impl std::error::Error for AccessError {}

#[cold]
#[inline(never)]
#[track_caller]
pub(crate) fn missing_payload(wanted: StatusFlag, found: Status) -> ! {
    panic!("{}", AccessError::new(wanted, found))
}
