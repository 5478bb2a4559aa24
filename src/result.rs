//! `BasicResult`: a value or an error, with a packed status tag.

use core::fmt;
use core::marker::PhantomData;
use core::mem::{self, ManuallyDrop, MaybeUninit};
use std::io;

use crate::error::missing_payload;
use crate::hooks::{HasSpareStorage, NoHooks, ResultHooks};
use crate::status::{Status, StatusBitfield, StatusFlag};
use crate::storage::raw;
use crate::storage::{Payload, StorageFor, StrongSwap, ValueStorage};

/// Holds nothing, a value of type `T`, or an error of type `E`.
///
/// The value lives in the cell selected by [`Payload`]; the error lives in
/// its own slot, alive exactly when the status has the error bit. `H` names
/// the [`ResultHooks`] run on construction.
pub struct BasicResult<T: Payload, E, H = NoHooks> {
    storage: StorageFor<T>,
    error: MaybeUninit<E>,
    _hooks: PhantomData<fn() -> H>,
}

impl<T: Payload, E, H> BasicResult<T, E, H> {
    pub(crate) fn from_storage(storage: StorageFor<T>, error: Option<E>) -> Self {
        debug_assert_eq!(storage.status().has_error(), error.is_some());
        Self {
            storage,
            error: match error {
                Some(error) => MaybeUninit::new(error),
                None => MaybeUninit::uninit(),
            },
            _hooks: PhantomData,
        }
    }

    pub(crate) fn into_storage(self) -> (StorageFor<T>, Option<E>) {
        let this = ManuallyDrop::new(self);
        // SAFETY: `this` is never dropped, so the cell and the live error are
        // each read out exactly once.
        unsafe {
            let storage = core::ptr::read(&this.storage);
            let error = if storage.status().has_error() {
                Some(raw::read(&this.error))
            } else {
                None
            };
            (storage, error)
        }
    }

    /// Constructs a valued result without running hooks.
    #[inline]
    pub fn in_place_value(value: T) -> Self {
        Self::from_storage(<StorageFor<T>>::from_value(value), None)
    }

    /// Constructs an errored result without running hooks.
    #[inline]
    pub fn in_place_error(error: E) -> Self {
        let storage = <StorageFor<T>>::from_status(StatusBitfield::new(Status::HaveError));
        Self::from_storage(storage, Some(error))
    }

    /// An empty result in [`Status::None`].
    #[inline]
    pub fn empty() -> Self {
        Self::from_storage(<StorageFor<T>>::empty(), None)
    }

    /// An empty result carrying `status`'s moved-from flag and spare storage.
    ///
    /// # Panics
    /// Panics if `status` claims any payload, since none is supplied.
    #[track_caller]
    pub fn from_status(status: StatusBitfield) -> Self {
        assert_eq!(status.status(), Status::None, "a status-only result cannot claim a payload");
        Self::from_storage(<StorageFor<T>>::from_status(status), None)
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

    /// Returns `true` if an error is held. Results carry no exception.
    #[inline(always)]
    pub fn has_failure(&self) -> bool {
        self.has_error()
    }

    /// Returns `true` if a failed strong swap left this result unreliable.
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
        if self.has_error() {
            // SAFETY: the error bit is set.
            Some(unsafe { raw::assume_init_ref(&self.error) })
        } else {
            None
        }
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

    /// Moves the value out, leaving the result empty and marked moved-from.
    #[inline]
    pub fn take_value(&mut self) -> Option<T> {
        self.storage.take_value()
    }

    /// Borrows the payload as a standard `Result`; `None` when empty.
    pub fn as_result(&self) -> Option<Result<&T, &E>> {
        match (self.value(), self.error()) {
            (Some(value), _) => Some(Ok(value)),
            (None, Some(error)) => Some(Err(error)),
            (None, None) => None,
        }
    }

    /// Converts into a standard `Result`; `None` when empty.
    pub fn into_result(self) -> Option<Result<T, E>> {
        let (storage, error) = self.into_storage();
        match (storage.into_parts().1, error) {
            (Some(value), _) => Some(Ok(value)),
            (None, Some(error)) => Some(Err(error)),
            (None, None) => None,
        }
    }

    /// Exchanges contents with `other`. Cannot fail.
    pub fn swap(&mut self, other: &mut Self) {
        self.storage.swap(&mut other.storage);
        mem::swap(&mut self.error, &mut other.error);
    }

    /// Exchanges contents with the strong guarantee of [`StrongSwap`].
    pub fn strong_swap(&mut self, other: &mut Self)
    where
        StorageFor<T>: StrongSwap,
    {
        // Only live values go through fallible transfer; errors cannot be
        // live on a side whose value is, so they are exchanged afterwards.
        self.storage.strong_swap(&mut other.storage);
        mem::swap(&mut self.error, &mut other.error);
    }

    fn release_error(&mut self) {
        if self.has_error() {
            // SAFETY: clearing the error bit leaves the value bit alone; the
            // error is dropped once, after its bit is cleared.
            unsafe {
                self.storage.status_mut().set_have_error(false);
                raw::drop_in_place(&mut self.error);
            }
        }
    }
}

impl<T: Payload, E, H: ResultHooks<T, E>> BasicResult<T, E, H> {
    fn hooked(mut self) -> Self {
        H::on_construction(&mut self);
        self
    }

    /// Constructs a valued result and runs the construction hook.
    #[inline]
    pub fn success(value: T) -> Self {
        Self::in_place_value(value).hooked()
    }

    /// Constructs an errored result and runs the construction hook.
    #[inline]
    pub fn failure(error: E) -> Self {
        Self::in_place_error(error).hooked()
    }

    /// Constructs an errored result marked errno-convertible and runs the
    /// construction hook.
    #[inline]
    pub fn failure_errno(error: E) -> Self {
        let mut result = Self::in_place_error(error);
        // SAFETY: touches only the errno flag.
        unsafe { result.storage.status_mut() }.set_have_error_is_errno(true);
        result.hooked()
    }

    /// Explicit conversion from a result of related types.
    ///
    /// Status bits, including spare storage, are carried over; this type's
    /// construction hook runs on the converted result.
    pub fn convert_from<U: Payload, F, G>(source: BasicResult<U, F, G>) -> Self
    where
        T: From<U>,
        E: From<F>,
    {
        let (storage, error) = source.into_storage();
        Self::from_storage(<StorageFor<T>>::convert_from(storage), error.map(E::from)).hooked()
    }
}

impl<T: Payload, H: ResultHooks<T, io::Error>> BasicResult<T, io::Error, H> {
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

impl<T: Payload, E, H: ResultHooks<T, E>> From<Result<T, E>> for BasicResult<T, E, H> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Self::success(value),
            Err(error) => Self::failure(error),
        }
    }
}

impl<T: Payload, E, H> Drop for BasicResult<T, E, H> {
    fn drop(&mut self) {
        self.release_error();
    }
}

impl<T: Payload, E: Clone, H> Clone for BasicResult<T, E, H>
where
    StorageFor<T>: Clone,
{
    fn clone(&self) -> Self {
        let error = self.error().cloned();
        Self::from_storage(self.storage.clone(), error)
    }

    fn clone_from(&mut self, source: &Self) {
        match (self.has_error(), source.error()) {
            (true, Some(error)) => {
                // SAFETY: the error bit is set.
                unsafe { raw::assume_init_mut(&mut self.error) }.clone_from(error);
                self.storage.clone_from(&source.storage);
            }
            (true, None) => {
                self.release_error();
                self.storage.clone_from(&source.storage);
            }
            (false, Some(error)) => {
                // The slot is written before copying the status raises its bit.
                raw::write(&mut self.error, error.clone());
                self.storage.clone_from(&source.storage);
            }
            (false, None) => self.storage.clone_from(&source.storage),
        }
    }
}

impl<T: Payload + PartialEq, E: PartialEq, H> PartialEq for BasicResult<T, E, H> {
    fn eq(&self, other: &Self) -> bool {
        self.as_result() == other.as_result()
    }
}

impl<T: Payload + fmt::Debug, E: fmt::Debug, H> fmt::Debug for BasicResult<T, E, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicResult")
            .field("status", self.status())
            .field("value", &self.value())
            .field("error", &self.error())
            .finish()
    }
}

impl<T: Payload, E, H> HasSpareStorage for BasicResult<T, E, H> {
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

    type Res<T> = BasicResult<T, String>;

    #[test]
    fn empty_then_value_then_error() {
        let mut r = Res::<i32>::empty();
        assert_eq!(r.status().status(), Status::None);
        r = Res::success(42);
        assert_eq!(r.status().status(), Status::HaveValue);
        r = Res::failure("boom".to_owned());
        assert_eq!(r.status().status(), Status::HaveError);
        assert_eq!(r.error().map(String::as_str), Some("boom"));
    }

    #[test]
    fn clone_from_reuses_and_releases_error_slot() {
        let errored = Res::<String>::failure("e".to_owned());
        let valued = Res::<String>::success("v".to_owned());

        let mut r = Res::<String>::failure("old".to_owned());
        r.clone_from(&errored);
        assert_eq!(r, errored);
        r.clone_from(&valued);
        assert_eq!(r, valued);
        assert!(!r.has_error());
        r.clone_from(&errored);
        assert_eq!(r.error().map(String::as_str), Some("e"));
    }

    #[test]
    fn into_result_round_trips_payloads() {
        assert_eq!(Res::<u8>::success(3).into_result(), Some(Ok(3)));
        assert_eq!(Res::<u8>::failure("x".into()).into_result(), Some(Err("x".to_owned())));
        assert_eq!(Res::<u8>::empty().into_result(), None);
    }

    #[test]
    fn errno_flag_tracks_os_errors() {
        let os = BasicResult::<(), io::Error>::from_io_error(io::Error::from_raw_os_error(1));
        assert!(os.has_error_is_errno());
        let custom = BasicResult::<(), io::Error>::from_io_error(io::Error::new(io::ErrorKind::Other, "custom"));
        assert!(custom.has_error());
        assert!(!custom.has_error_is_errno());
    }

    #[test]
    #[should_panic(expected = "no value held")]
    fn assume_value_on_error_traps() {
        let r = Res::<u8>::failure("x".into());
        let _ = r.assume_value();
    }
}
