//! Value cells: zero or one payload gated by the status tag.
//!
//! The module tree is stratified the same way across cells:
//! - `raw` holds the audited `MaybeUninit` operations.
//! - `trivial` is the bitwise fast path for `Copy` payloads.
//! - `nontrivial` manages payload lifetimes by hand.
//! - `swap` implements the strong swap used when payload transfer can unwind.
//! - `select` maps a payload type to its cell at compile time.
//!
//! Capabilities follow the payload: a cell is `Copy` only on the trivial path,
//! `Clone` only when the payload is, and always movable (moves are relocations).

mod nontrivial;
pub(crate) mod raw;
mod select;
mod swap;
mod trivial;

pub use nontrivial::NontrivialStorage;
pub use select::{Payload, StorageFor};
pub use swap::{strong_swap, StrongSwap, SwapFailure, TransferAssign};
pub use trivial::TrivialStorage;

use crate::status::{Status, StatusBitfield};

/// The contract shared by both cell implementations.
///
/// The value bit of [`status`](ValueStorage::status) is set exactly when a
/// payload is alive in the cell. All other bits, including spare storage,
/// belong to the owning container.
pub trait ValueStorage: Sized {
    /// The payload type.
    type Value;

    /// `true` when copy, move and drop of the cell are bitwise.
    const TRIVIAL: bool;

    /// Builds a cell from a status and an optional payload.
    ///
    /// The value bit is forced to match `value.is_some()`; every other bit of
    /// `status` is kept.
    ///
    /// # Panics
    /// Panics if `value` is `Some` while `status` holds an error or exception.
    fn from_parts(status: StatusBitfield, value: Option<Self::Value>) -> Self;

    /// Splits the cell into its status and payload.
    fn into_parts(self) -> (StatusBitfield, Option<Self::Value>);

    /// The status tag.
    fn status(&self) -> &StatusBitfield;

    /// Mutable access to the status tag.
    ///
    /// # Safety
    /// The caller must not change the value bit, which is owned by the cell.
    unsafe fn status_mut(&mut self) -> &mut StatusBitfield;

    /// The payload, if alive.
    fn value(&self) -> Option<&Self::Value>;

    /// The payload, if alive.
    fn value_mut(&mut self) -> Option<&mut Self::Value>;

    /// Moves the payload out, leaving the cell valueless and marked moved-from.
    fn take_value(&mut self) -> Option<Self::Value>;

    /// Move assignment: releases or reuses the current payload, adopts
    /// `other`'s payload and copies `other`'s status.
    fn assign_from(&mut self, other: Self);

    /// Exchanges payloads and statuses.
    fn swap(&mut self, other: &mut Self);

    /// An empty cell in [`Status::None`].
    #[inline]
    fn empty() -> Self {
        Self::from_parts(StatusBitfield::default(), None)
    }

    /// A cell holding `value`.
    #[inline]
    fn from_value(value: Self::Value) -> Self {
        Self::from_parts(StatusBitfield::new(Status::HaveValue), Some(value))
    }

    /// A valueless cell carrying `status`.
    ///
    /// # Panics
    /// Panics if `status` claims a value.
    #[inline]
    #[track_caller]
    fn from_status(status: StatusBitfield) -> Self {
        assert!(!status.has_value(), "a status-only cell cannot claim a value");
        Self::from_parts(status, None)
    }

    /// Returns `true` if a payload is alive.
    #[inline(always)]
    fn has_value(&self) -> bool {
        self.status().has_value()
    }

    /// Overwrites the spare storage.
    #[inline]
    fn set_spare_storage(&mut self, spare: u16) {
        // SAFETY: spare storage is not the value bit.
        unsafe { self.status_mut() }.set_spare_storage(spare);
    }

    /// Converting construction from a cell of a related payload type.
    ///
    /// A valued source yields a valued cell with the converted payload;
    /// otherwise the result is valueless. Either way every other status bit
    /// and the spare storage are carried over unchanged.
    #[inline]
    fn convert_from<S>(source: S) -> Self
    where
        S: ValueStorage,
        Self::Value: From<S::Value>,
    {
        let (status, value) = source.into_parts();
        Self::from_parts(status, value.map(Into::into))
    }
}
