//! Unsafe, centralized operations on `MaybeUninit<T>` payload slots.
//!
//! Managed cells and the error/exception slots of the containers keep their
//! payloads in `MaybeUninit<T>`. Liveness is tracked by a status bit that the
//! slot itself knows nothing about. These helpers are the single place to
//! audit:
//! - reads (`ptr::read`)
//! - writes (`ptr::write`)
//! - drops (`drop_in_place`)
//! - conversion to references (`assume_init_ref` / `assume_init_mut`)
//!
//! ## Core invariant
//! For all callers in this crate, a slot is initialized *exactly when* the
//! status bit that gates it is set. Callers clear the bit before a read or a
//! drop and set it only after a write has completed, so a panic in between
//! leaves the bit conservative (claiming nothing that is not alive).

use core::{mem::MaybeUninit, ptr};

/// Interprets an initialized slot as `&T`.
///
/// # Safety
/// - `slot` must be initialized.
#[inline(always)]
pub(crate) unsafe fn assume_init_ref<T>(slot: &MaybeUninit<T>) -> &T {
    // SAFETY: caller asserts `slot` is initialized.
    unsafe { slot.assume_init_ref() }
}

/// Interprets an initialized slot as `&mut T`.
///
/// # Safety
/// - `slot` must be initialized.
#[inline(always)]
pub(crate) unsafe fn assume_init_mut<T>(slot: &mut MaybeUninit<T>) -> &mut T {
    // SAFETY: caller asserts `slot` is initialized and exclusive.
    unsafe { slot.assume_init_mut() }
}

/// Bitwise-moves an initialized value out of a slot.
///
/// # Safety
/// - `slot` must be initialized.
/// - The slot must be treated as uninitialized afterwards.
#[inline(always)]
pub(crate) unsafe fn read<T>(slot: &MaybeUninit<T>) -> T {
    // SAFETY: caller asserts initialization + `ptr::read` contract.
    unsafe { ptr::read(slot.as_ptr()) }
}

/// Writes a value into a slot (overwriting the prior bytes).
///
/// The slot must not hold a live value; otherwise the old value leaks.
#[inline(always)]
pub(crate) fn write<T>(slot: &mut MaybeUninit<T>, value: T) {
    slot.write(value);
}

/// Drops an initialized value in place.
///
/// # Safety
/// - `slot` must be initialized.
/// - Must not be called more than once for the same logical value.
#[inline(always)]
pub(crate) unsafe fn drop_in_place<T>(slot: &mut MaybeUninit<T>) {
    // SAFETY: caller asserts initialization and drop uniqueness.
    unsafe { ptr::drop_in_place(slot.as_mut_ptr()) }
}

/// Relocates an initialized value from `src` into the uninitialized `dst`.
///
/// # Safety
/// - `src` must be initialized and `dst` must not hold a live value.
/// - `src` must be treated as uninitialized afterwards.
#[inline(always)]
pub(crate) unsafe fn relocate<T>(src: &mut MaybeUninit<T>, dst: &mut MaybeUninit<T>) {
    // SAFETY: caller asserts `src` is live and `dst` is vacant; they cannot
    // overlap because both are exclusive borrows.
    unsafe { ptr::copy_nonoverlapping(src.as_ptr(), dst.as_mut_ptr(), 1) }
}
