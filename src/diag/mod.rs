//! Extended error information kept beside results.
//!
//! A result carries only 16 bits of spare storage, so anything richer than
//! that lives in a per-thread [`SlotRing`] and the spare storage holds the
//! slot index. [`ExtendedErrorHooks`] wires this up: errored results capture
//! a backtrace on construction, and converting such a result into an outcome
//! turns the captured backtrace into the outcome's exception.
//!
//! ```
//! use std::io;
//! use upshot::diag::{ExtendedOutcome, ExtendedResult};
//!
//! let failed = ExtendedResult::<u32, io::Error>::failure(io::Error::new(io::ErrorKind::Other, "disk on fire"));
//! let outcome = ExtendedOutcome::<u32, io::Error>::from_result(failed);
//! assert!(outcome.assume_exception().to_string().starts_with("disk on fire ["));
//! ```

mod hooks;
mod ring;

use std::backtrace::Backtrace;
use std::cell::RefCell;

pub use hooks::{ExtendedErrorHooks, ExtendedOutcome, ExtendedResult};
pub use ring::SlotRing;

/// What is kept per errored result.
#[derive(Debug, Default)]
pub struct ExtendedErrorInfo {
    backtrace: Option<Backtrace>,
}

impl ExtendedErrorInfo {
    /// Replaces the slot's contents with a backtrace of the calling thread.
    pub fn capture(&mut self) {
        self.backtrace = Some(Backtrace::force_capture());
    }

    /// The captured backtrace, if any.
    pub fn backtrace(&self) -> Option<&Backtrace> {
        self.backtrace.as_ref()
    }

    /// Empties the slot.
    pub fn clear(&mut self) {
        self.backtrace = None;
    }
}

thread_local! {
    static THREAD_RING: RefCell<SlotRing<ExtendedErrorInfo>> = RefCell::new(SlotRing::new());
}

/// Runs `f` on the calling thread's ring.
///
/// Returns `None` without calling `f` if the ring is already borrowed further
/// up the stack or the thread is being torn down.
pub fn with_thread_ring<R>(f: impl FnOnce(&mut SlotRing<ExtendedErrorInfo>) -> R) -> Option<R> {
    THREAD_RING
        .try_with(|ring| ring.try_borrow_mut().ok().map(|mut ring| f(&mut ring)))
        .ok()
        .flatten()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_borrow_is_refused() {
        let inner = with_thread_ring(|_| with_thread_ring(|_| ()));
        assert_eq!(inner, Some(None));
    }

    #[test]
    fn rings_are_per_thread() {
        let here = with_thread_ring(|ring| {
            ring.next().1.capture();
            ring.current()
        });
        let there = std::thread::spawn(|| with_thread_ring(|ring| ring.current()))
            .join()
            .unwrap();
        assert_eq!(there, Some(0));
        assert!(here.is_some_and(|current| current >= 1));
    }
}
