//! Construction and conversion hooks.
//!
//! Hooks are chosen by the container type itself: the last generic parameter
//! of [`BasicResult`] and [`BasicOutcome`] names a hook type, and every
//! constructor that is not a copy, a move or an in-place construction calls
//! into it. Two containers that differ only in their hook type are different
//! types, so each instantiation keeps the hooks it was declared with.
//!
//! Spare storage is the only channel between a hook and whatever side state
//! it keeps; the containers never read it.

use crate::outcome::BasicOutcome;
use crate::result::BasicResult;
use crate::status::StatusBitfield;
use crate::storage::Payload;

/// Hooks invoked by [`BasicResult`].
pub trait ResultHooks<T: Payload, E>: Sized {
    /// Runs after `result` is fully constructed by `success`, `failure`,
    /// `failure_errno`, `From<Result<T, E>>` or `convert_from`.
    ///
    /// A panic propagates to the caller of the constructor; `result` is then
    /// dropped like any other fully constructed value.
    #[inline(always)]
    fn on_construction(result: &mut BasicResult<T, E, Self>) {
        let _ = result;
    }
}

/// Hooks invoked by [`BasicOutcome`].
pub trait OutcomeHooks<T: Payload, E, X>: Sized {
    /// Runs after `outcome` is fully constructed from a value, error or
    /// exception.
    #[inline(always)]
    fn on_construction(outcome: &mut BasicOutcome<T, E, X, Self>) {
        let _ = outcome;
    }

    /// Runs after `outcome` was copy-constructed from `source`.
    ///
    /// May override the exception through
    /// [`override_outcome_exception`]; any other failure must be handled
    /// inside the hook.
    #[inline(always)]
    fn on_copy_conversion<U: Payload, F>(
        outcome: &mut BasicOutcome<T, E, X, Self>,
        source: &BasicResult<U, F, Self>,
    ) {
        let _ = (outcome, source);
    }

    /// Runs after `outcome` was move-constructed from a result whose status
    /// was `source`.
    #[inline(always)]
    fn on_move_conversion(outcome: &mut BasicOutcome<T, E, X, Self>, source: StatusBitfield) {
        let _ = (outcome, source);
    }
}

/// Hooks that do nothing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct NoHooks;

impl<T: Payload, E> ResultHooks<T, E> for NoHooks {}

impl<T: Payload, E, X> OutcomeHooks<T, E, X> for NoHooks {}

/// Containers that carry spare storage.
pub trait HasSpareStorage {
    /// The container's status tag.
    fn status(&self) -> &StatusBitfield;

    /// Overwrites the spare storage.
    fn set_spare_storage(&mut self, spare: u16);
}

/// Reads the spare storage of `container`.
#[inline]
pub fn spare_storage<C: HasSpareStorage + ?Sized>(container: &C) -> u16 {
    container.status().spare_storage()
}

/// Writes the spare storage of `container`.
#[inline]
pub fn set_spare_storage<C: HasSpareStorage + ?Sized>(container: &mut C, spare: u16) {
    container.set_spare_storage(spare);
}

/// Replaces (or installs) the exception of `outcome`.
///
/// # Panics
/// Panics if `outcome` holds a value.
#[inline]
#[track_caller]
pub fn override_outcome_exception<T: Payload, E, X, H>(outcome: &mut BasicOutcome<T, E, X, H>, exception: X) {
    outcome.override_exception(exception);
}
