//! `BasicOutcome`: a value, an error, an exception, or an error with an
//! exception.

use core::fmt;
use core::marker::PhantomData;
use core::mem::{self, ManuallyDrop, MaybeUninit};
use std::io;

use crate::error::{missing_payload, AccessError};
use crate::hooks::{HasSpareStorage, NoHooks, OutcomeHooks};
use crate::result::BasicResult;
use crate::status::{Status, StatusBitfield, StatusFlag};
use crate::storage::raw;
use crate::storage::{Payload, StorageFor, StrongSwap, ValueStorage};

/// The failure side of an outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure<E, X> {
    /// Only an error was held.
    Error(E),
    /// Only an exception was held.
    Exception(X),
    /// Both were held.
    ErrorException(E, X),
}

/// Holds nothing, a value, an error, an exception, or an error and an
/// exception together.
///
/// The exception type defaults to [`anyhow::Error`]. `H` names the
/// [`OutcomeHooks`] run on construction and on conversion from a
/// [`BasicResult`].
pub struct BasicOutcome<T: Payload, E, X = anyhow::Error, H = NoHooks> {
    storage: StorageFor<T>,
    error: MaybeUninit<E>,
    exception: MaybeUninit<X>,
    _hooks: PhantomData<fn() -> H>,
}

impl<T: Payload, E, X, H> BasicOutcome<T, E, X, H> {
    fn from_storage(storage: StorageFor<T>, error: Option<E>, exception: Option<X>) -> Self {
        debug_assert_eq!(storage.status().has_error(), error.is_some());
        debug_assert_eq!(storage.status().has_exception(), exception.is_some());
        Self {
            storage,
            error: error.map_or_else(MaybeUninit::uninit, MaybeUninit::new),
            exception: exception.map_or_else(MaybeUninit::uninit, MaybeUninit::new),
            _hooks: PhantomData,
        }
    }

    fn failed(status: Status, error: Option<E>, exception: Option<X>) -> Self {
        Self::from_storage(
            <StorageFor<T>>::from_status(StatusBitfield::new(status)),
            error,
            exception,
        )
    }

    /// Constructs a valued outcome without running hooks.
    #[inline]
    pub fn in_place_value(value: T) -> Self {
        Self::from_storage(<StorageFor<T>>::from_value(value), None, None)
    }

    /// Constructs an errored outcome without running hooks.
    #[inline]
    pub fn in_place_error(error: E) -> Self {
        Self::failed(Status::HaveError, Some(error), None)
    }

    /// Constructs an excepted outcome without running hooks.
    #[inline]
    pub fn in_place_exception(exception: X) -> Self {
        Self::failed(Status::HaveException, None, Some(exception))
    }

    /// Constructs an outcome holding both failures without running hooks.
    #[inline]
    pub fn in_place_error_exception(error: E, exception: X) -> Self {
        Self::failed(Status::HaveErrorException, Some(error), Some(exception))
    }

    /// An empty outcome in [`Status::None`].
    #[inline]
    pub fn empty() -> Self {
        Self::from_storage(<StorageFor<T>>::empty(), None, None)
    }

    /// An empty outcome carrying `status`'s moved-from flag and spare storage.
    ///
    /// # Panics
    /// Panics if `status` claims any payload, since none is supplied.
    #[track_caller]
    pub fn from_status(status: StatusBitfield) -> Self {
        assert_eq!(status.status(), Status::None, "a status-only outcome cannot claim a payload");
        Self::from_storage(<StorageFor<T>>::from_status(status), None, None)
    }

    /// The status tag.
    #[inline(always)]
    pub fn status(&self) -> &StatusBitfield {
        self.storage.status()
    }

    /// Returns `true` if a value is held.
    #[inline(always)]
    pub fn has_value(&self) -> bool {
        self.status().has_value()
    }

    /// Returns `true` if an error is held.
    #[inline(always)]
    pub fn has_error(&self) -> bool {
        self.status().has_error()
    }

    /// Returns `true` if an exception is held.
    #[inline(always)]
    pub fn has_exception(&self) -> bool {
        self.status().has_exception()
    }

    /// Returns `true` if an error or an exception is held.
    #[inline(always)]
    pub fn has_failure(&self) -> bool {
        self.has_error() || self.has_exception()
    }

    /// Returns `true` if a failed strong swap left this outcome unreliable.
    #[inline(always)]
    pub fn has_lost_consistency(&self) -> bool {
        self.status().has_lost_consistency()
    }

    /// Returns `true` if the held error is errno-convertible.
    #[inline(always)]
    pub fn has_error_is_errno(&self) -> bool {
        self.status().has_error_is_errno()
    }

    /// Returns `true` if the value was taken out with [`take_value`](Self::take_value).
    #[inline(always)]
    pub fn was_moved_from(&self) -> bool {
        self.status().was_moved_from()
    }

    /// The spare storage.
    #[inline(always)]
    pub fn spare_storage(&self) -> u16 {
        self.status().spare_storage()
    }

    /// The value, if held.
    #[inline]
    pub fn value(&self) -> Option<&T> {
        self.storage.value()
    }

    /// The value, if held.
    #[inline]
    pub fn value_mut(&mut self) -> Option<&mut T> {
        self.storage.value_mut()
    }

    /// The error, if held.
    #[inline]
    pub fn error(&self) -> Option<&E> {
        // SAFETY: the error bit gates the slot.
        self.has_error().then(|| unsafe { raw::assume_init_ref(&self.error) })
    }

    /// The exception, if held.
    #[inline]
    pub fn exception(&self) -> Option<&X> {
        // SAFETY: the exception bit gates the slot.
        self.has_exception().then(|| unsafe { raw::assume_init_ref(&self.exception) })
    }

    /// The error, if held.
    #[inline]
    pub fn error_mut(&mut self) -> Option<&mut E> {
        if self.has_error() {
            // SAFETY: the error bit is set.
            Some(unsafe { raw::assume_init_mut(&mut self.error) })
        } else {
            None
        }
    }

    /// The exception, if held.
    #[inline]
    pub fn exception_mut(&mut self) -> Option<&mut X> {
        if self.has_exception() {
            // SAFETY: the exception bit is set.
            Some(unsafe { raw::assume_init_mut(&mut self.exception) })
        } else {
            None
        }
    }

    /// The value.
    ///
    /// # Panics
    /// Panics if no value is held.
    #[inline]
    #[track_caller]
    pub fn assume_value(&self) -> &T {
        match self.value() {
            Some(value) => value,
            None => missing_payload(StatusFlag::Value, self.status().status()),
        }
    }

    /// The error.
    ///
    /// # Panics
    /// Panics if no error is held.
    #[inline]
    #[track_caller]
    pub fn assume_error(&self) -> &E {
        match self.error() {
            Some(error) => error,
            None => missing_payload(StatusFlag::Error, self.status().status()),
        }
    }

    /// The exception.
    ///
    /// # Panics
    /// Panics if no exception is held.
    #[inline]
    #[track_caller]
    pub fn assume_exception(&self) -> &X {
        match self.exception() {
            Some(exception) => exception,
            None => missing_payload(StatusFlag::Exception, self.status().status()),
        }
    }

    /// Moves the value out, leaving the outcome empty and marked moved-from.
    #[inline]
    pub fn take_value(&mut self) -> Option<T> {
        self.storage.take_value()
    }

    /// Replaces (or installs) the exception, keeping any error.
    ///
    /// The slot is written in full before the exception bit is raised.
    ///
    /// # Panics
    /// Panics if a value is held.
    #[track_caller]
    pub fn override_exception(&mut self, exception: X) {
        if self.has_exception() {
            // SAFETY: the exception bit is set.
            *unsafe { raw::assume_init_mut(&mut self.exception) } = exception;
            return;
        }
        let mut status = *self.status();
        status.set_have_exception(true);
        raw::write(&mut self.exception, exception);
        // SAFETY: `status` differs from the current one only in the
        // exception bit.
        unsafe { *self.storage.status_mut() = status };
    }

    fn into_storage(self) -> (StorageFor<T>, Option<E>, Option<X>) {
        let this = ManuallyDrop::new(self);
        // SAFETY: `this` is never dropped; each live slot is read once.
        unsafe {
            let storage = core::ptr::read(&this.storage);
            let status = *storage.status();
            let error = if status.has_error() { Some(raw::read(&this.error)) } else { None };
            let exception = if status.has_exception() {
                Some(raw::read(&this.exception))
            } else {
                None
            };
            (storage, error, exception)
        }
    }

    /// Borrows the payloads as a standard `Result`; `None` when empty.
    pub fn as_result(&self) -> Option<Result<&T, Failure<&E, &X>>> {
        match (self.value(), self.error(), self.exception()) {
            (Some(value), _, _) => Some(Ok(value)),
            (None, Some(error), Some(exception)) => Some(Err(Failure::ErrorException(error, exception))),
            (None, Some(error), None) => Some(Err(Failure::Error(error))),
            (None, None, Some(exception)) => Some(Err(Failure::Exception(exception))),
            (None, None, None) => None,
        }
    }

    /// Converts into a standard `Result`; `None` when empty.
    pub fn into_result(self) -> Option<Result<T, Failure<E, X>>> {
        let (storage, error, exception) = self.into_storage();
        match (storage.into_parts().1, error, exception) {
            (Some(value), _, _) => Some(Ok(value)),
            (None, Some(error), Some(exception)) => Some(Err(Failure::ErrorException(error, exception))),
            (None, Some(error), None) => Some(Err(Failure::Error(error))),
            (None, None, Some(exception)) => Some(Err(Failure::Exception(exception))),
            (None, None, None) => None,
        }
    }

    /// Exchanges contents with `other`. Cannot fail.
    pub fn swap(&mut self, other: &mut Self) {
        self.storage.swap(&mut other.storage);
        mem::swap(&mut self.error, &mut other.error);
        mem::swap(&mut self.exception, &mut other.exception);
    }

    /// Exchanges contents with the strong guarantee of [`StrongSwap`].
    pub fn strong_swap(&mut self, other: &mut Self)
    where
        StorageFor<T>: StrongSwap,
    {
        self.storage.strong_swap(&mut other.storage);
        mem::swap(&mut self.error, &mut other.error);
        mem::swap(&mut self.exception, &mut other.exception);
    }

    fn release_failures(&mut self) {
        // SAFETY (both blocks): only failure bits are cleared, each before
        // its slot is dropped.
        if self.has_exception() {
            unsafe {
                self.storage.status_mut().set_have_exception(false);
                raw::drop_in_place(&mut self.exception);
            }
        }
        if self.has_error() {
            unsafe {
                self.storage.status_mut().set_have_error(false);
                raw::drop_in_place(&mut self.error);
            }
        }
    }
}

impl<T: Payload, E, X, H: OutcomeHooks<T, E, X>> BasicOutcome<T, E, X, H> {
    fn hooked(mut self) -> Self {
        H::on_construction(&mut self);
        self
    }

    /// Constructs a valued outcome and runs the construction hook.
    #[inline]
    pub fn success(value: T) -> Self {
        Self::in_place_value(value).hooked()
    }

    /// Constructs an errored outcome and runs the construction hook.
    #[inline]
    pub fn failure(error: E) -> Self {
        Self::in_place_error(error).hooked()
    }

    /// Constructs an errored outcome marked errno-convertible and runs the
    /// construction hook.
    #[inline]
    pub fn failure_errno(error: E) -> Self {
        let mut outcome = Self::in_place_error(error);
        // SAFETY: touches only the errno flag.
        unsafe { outcome.storage.status_mut() }.set_have_error_is_errno(true);
        outcome.hooked()
    }

    /// Constructs an excepted outcome and runs the construction hook.
    #[inline]
    pub fn from_exception(exception: X) -> Self {
        Self::in_place_exception(exception).hooked()
    }

    /// Constructs an outcome holding both failures and runs the construction hook.
    #[inline]
    pub fn from_error_exception(error: E, exception: X) -> Self {
        Self::in_place_error_exception(error, exception).hooked()
    }

    /// Move conversion from a result; runs the move-conversion hook.
    ///
    /// Status bits, including spare storage, are carried over from `source`.
    pub fn from_result<U: Payload, F>(source: BasicResult<U, F, H>) -> Self
    where
        T: From<U>,
        E: From<F>,
    {
        let status = *source.status();
        let (storage, error) = source.into_storage();
        let mut outcome = Self::from_storage(<StorageFor<T>>::convert_from(storage), error.map(E::from), None);
        H::on_move_conversion(&mut outcome, status);
        outcome
    }

    /// Copy conversion from a result; runs the copy-conversion hook with the
    /// untouched source.
    pub fn from_result_ref<U, F>(source: &BasicResult<U, F, H>) -> Self
    where
        U: Payload + Clone,
        F: Clone,
        T: From<U>,
        E: From<F>,
    {
        let value = source.value().cloned().map(T::from);
        let error = source.error().cloned().map(E::from);
        let storage = <StorageFor<T>>::from_parts(*source.status(), value);
        let mut outcome = Self::from_storage(storage, error, None);
        H::on_copy_conversion(&mut outcome, source);
        outcome
    }

    /// Explicit conversion from an outcome of related types.
    ///
    /// Status bits, including spare storage, are carried over; this type's
    /// construction hook runs on the converted outcome.
    pub fn convert_from<U: Payload, F, Y, G>(source: BasicOutcome<U, F, Y, G>) -> Self
    where
        T: From<U>,
        E: From<F>,
        X: From<Y>,
    {
        let (storage, error, exception) = source.into_storage();
        Self::from_storage(
            <StorageFor<T>>::convert_from(storage),
            error.map(E::from),
            exception.map(X::from),
        )
        .hooked()
    }
}

impl<T: Payload, X, H: OutcomeHooks<T, io::Error, X>> BasicOutcome<T, io::Error, X, H> {
    /// Constructs from an I/O error, marking it errno-convertible when it
    /// carries an OS error code.
    pub fn from_io_error(error: io::Error) -> Self {
        if error.raw_os_error().is_some() {
            Self::failure_errno(error)
        } else {
            Self::failure(error)
        }
    }
}

impl<T: Payload, E, H> BasicOutcome<T, E, anyhow::Error, H>
where
    E: std::error::Error + Send + Sync + 'static,
{
    /// The value, or the failure as an [`anyhow::Error`].
    ///
    /// An exception takes precedence over an error; an empty outcome reports
    /// an [`AccessError`].
    ///
    /// # Errors
    /// Returns the held exception, else the held error, else an [`AccessError`].
    pub fn into_value(self) -> anyhow::Result<T> {
        let status = self.status().status();
        match self.into_result() {
            Some(Ok(value)) => Ok(value),
            Some(Err(Failure::Exception(exception) | Failure::ErrorException(_, exception))) => Err(exception),
            Some(Err(Failure::Error(error))) => Err(anyhow::Error::new(error)),
            None => Err(anyhow::Error::new(AccessError::new(StatusFlag::Value, status))),
        }
    }
}

impl<T: Payload, E, X, H: OutcomeHooks<T, E, X>> From<Result<T, E>> for BasicOutcome<T, E, X, H> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Self::success(value),
            Err(error) => Self::failure(error),
        }
    }
}

impl<T: Payload, E, X, H> Drop for BasicOutcome<T, E, X, H> {
    fn drop(&mut self) {
        self.release_failures();
    }
}

impl<T: Payload, E: Clone, X: Clone, H> Clone for BasicOutcome<T, E, X, H>
where
    StorageFor<T>: Clone,
{
    fn clone(&self) -> Self {
        let error = self.error().cloned();
        let exception = self.exception().cloned();
        Self::from_storage(self.storage.clone(), error, exception)
    }

    fn clone_from(&mut self, source: &Self) {
        let error = source.error().cloned();
        let exception = source.exception().cloned();
        self.release_failures();
        // Slots are filled while their bits are still clear; copying the
        // source status raises them.
        if let Some(error) = error {
            raw::write(&mut self.error, error);
        }
        if let Some(exception) = exception {
            raw::write(&mut self.exception, exception);
        }
        self.storage.clone_from(&source.storage);
    }
}

impl<T: Payload + PartialEq, E: PartialEq, X: PartialEq, H> PartialEq for BasicOutcome<T, E, X, H> {
    fn eq(&self, other: &Self) -> bool {
        self.value() == other.value() && self.error() == other.error() && self.exception() == other.exception()
    }
}

impl<T: Payload + fmt::Debug, E: fmt::Debug, X: fmt::Debug, H> fmt::Debug for BasicOutcome<T, E, X, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicOutcome")
            .field("status", self.status())
            .field("value", &self.value())
            .field("error", &self.error())
            .field("exception", &self.exception())
            .finish()
    }
}

impl<T: Payload, E, X, H> HasSpareStorage for BasicOutcome<T, E, X, H> {
    fn status(&self) -> &StatusBitfield {
        self.storage.status()
    }

    fn set_spare_storage(&mut self, spare: u16) {
        self.storage.set_spare_storage(spare);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    type Out<T> = BasicOutcome<T, io::Error>;

    #[test]
    fn exception_slot_is_independent_of_error() {
        let mut o = Out::<u32>::failure(io::Error::new(io::ErrorKind::NotFound, "gone"));
        assert_eq!(o.status().status(), Status::HaveError);
        o.override_exception(anyhow::anyhow!("first"));
        assert_eq!(o.status().status(), Status::HaveErrorException);
        o.override_exception(anyhow::anyhow!("second"));
        assert_eq!(o.assume_exception().to_string(), "second");
        assert_eq!(o.assume_error().kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn into_value_prefers_exception() {
        let o = Out::<u32>::from_error_exception(io::Error::new(io::ErrorKind::Other, "err"), anyhow::anyhow!("exc"));
        assert_eq!(o.into_value().unwrap_err().to_string(), "exc");
        let o = Out::<u32>::failure(io::Error::new(io::ErrorKind::Other, "err"));
        assert_eq!(o.into_value().unwrap_err().to_string(), "err");
        assert_eq!(Out::<u32>::success(5).into_value().unwrap(), 5);
        let empty = Out::<u32>::empty().into_value().unwrap_err();
        assert!(empty.downcast_ref::<AccessError>().is_some());
    }

    #[test]
    #[should_panic(expected = "illegal status transition")]
    fn exception_override_on_value_traps() {
        let mut o = Out::<u32>::success(1);
        o.override_exception(anyhow::anyhow!("nope"));
    }

    #[test]
    fn clone_from_replaces_every_slot() {
        type Plain = BasicOutcome<String, String, String>;
        let source = Plain::from_error_exception("e".into(), "x".into());
        let mut target = Plain::success("v".into());
        target.clone_from(&source);
        assert_eq!(target, source);
        assert_eq!(target.status().status(), Status::HaveErrorException);
        target.clone_from(&Plain::success("v".into()));
        assert_eq!(target.value().map(String::as_str), Some("v"));
        assert!(!target.has_failure());
    }
}
