//! Strong swap for payloads whose transfer runs fallible user code.
//!
//! Plain Rust moves are relocations and cannot fail, so cells swap live
//! payloads with `mem::swap`. Some payloads instead define transfer in terms
//! of their own code (pooled buffers, handles that re-register on move,
//! instrumented types), which may unwind. [`TransferAssign`] describes such a
//! payload; [`strong_swap`] exchanges two of them and reports whether a
//! failure could be rolled back.

use core::any::Any;
use core::fmt;
use core::mem;
use std::panic::{self, AssertUnwindSafe};

/// Transfer of a payload's contents between live instances.
///
/// Both operations leave `source` valid but unspecified, in the manner of a
/// moved-from value that can still be assigned to and dropped.
pub trait TransferAssign: Sized {
    /// `true` if neither operation can unwind; [`strong_swap`] then does a
    /// plain swap with no recovery bookkeeping.
    const NOTHROW: bool = false;

    /// Constructs a new instance from `source`'s contents.
    fn transfer_new(source: &mut Self) -> Self;

    /// Replaces `self`'s contents with `source`'s.
    fn transfer_assign(&mut self, source: &mut Self);
}

/// A strong swap unwound partway through.
pub struct SwapFailure {
    panic: Box<dyn Any + Send + 'static>,
    restored: bool,
}

impl SwapFailure {
    /// `true` if both sides were put back to their original contents.
    ///
    /// When `false`, at least one side holds moved-from contents.
    pub fn restored(&self) -> bool {
        self.restored
    }

    /// The payload of the original panic.
    pub fn into_panic(self) -> Box<dyn Any + Send + 'static> {
        self.panic
    }

    /// Continues unwinding with the original panic.
    pub fn resume(self) -> ! {
        panic::resume_unwind(self.panic)
    }

    /// The panic message, when it was a string.
    pub fn message(&self) -> Option<&str> {
        self.panic
            .downcast_ref::<&'static str>()
            .copied()
            .or_else(|| self.panic.downcast_ref::<String>().map(String::as_str))
    }
}

impl fmt::Debug for SwapFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SwapFailure")
            .field("restored", &self.restored)
            .field("message", &self.message())
            .finish()
    }
}

/// Swaps `a` and `b` through their [`TransferAssign`] operations.
///
/// `a` is first transferred into a temporary. If `a = b` unwinds, `a` is put
/// back from the temporary; if `b = temp` unwinds, `b` is put back from `a`
/// and `a` from the temporary. A failure inside a rollback is discarded and
/// recorded as `restored == false`.
///
/// A panic from the initial `transfer_new` propagates untouched.
///
/// # Errors
/// Returns the original panic, with whether the rollback succeeded.
pub fn strong_swap<T: TransferAssign>(a: &mut T, b: &mut T) -> Result<(), SwapFailure> {
    if T::NOTHROW {
        mem::swap(a, b);
        return Ok(());
    }

    let mut temp = T::transfer_new(a);

    if let Err(panic) = panic::catch_unwind(AssertUnwindSafe(|| a.transfer_assign(b))) {
        let restored = panic::catch_unwind(AssertUnwindSafe(|| a.transfer_assign(&mut temp))).is_ok();
        return Err(SwapFailure { panic, restored });
    }

    // `b` now lives in `a`; finish by moving the temporary into `b`.
    if let Err(panic) = panic::catch_unwind(AssertUnwindSafe(|| b.transfer_assign(&mut temp))) {
        let restored = panic::catch_unwind(AssertUnwindSafe(|| {
            b.transfer_assign(a);
            a.transfer_assign(&mut temp);
        }))
        .is_ok();
        return Err(SwapFailure { panic, restored });
    }

    Ok(())
}

/// Cells that swap with the strong guarantee.
///
/// On success the cells are fully exchanged. On failure both sides are either
/// restored or marked lost-consistency, and the original panic resumes.
pub trait StrongSwap {
    /// Swaps `self` and `other` with the strong guarantee.
    fn strong_swap(&mut self, other: &mut Self);
}

macro_rules! transfer_by_take {
    ($($ty:ty),* $(,)?) => {
        $(
            impl TransferAssign for $ty {
                const NOTHROW: bool = true;

                #[inline(always)]
                fn transfer_new(source: &mut Self) -> Self {
                    mem::take(source)
                }

                #[inline(always)]
                fn transfer_assign(&mut self, source: &mut Self) {
                    *self = mem::take(source);
                }
            }
        )*
    };
}

transfer_by_take!(
    (), bool, char, u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, f32, f64, String,
);

impl<T> TransferAssign for Vec<T> {
    const NOTHROW: bool = true;

    #[inline(always)]
    fn transfer_new(source: &mut Self) -> Self {
        mem::take(source)
    }

    #[inline(always)]
    fn transfer_assign(&mut self, source: &mut Self) {
        *self = mem::take(source);
    }
}

impl<T> TransferAssign for Option<T> {
    const NOTHROW: bool = true;

    #[inline(always)]
    fn transfer_new(source: &mut Self) -> Self {
        source.take()
    }

    #[inline(always)]
    fn transfer_assign(&mut self, source: &mut Self) {
        *self = source.take();
    }
}
