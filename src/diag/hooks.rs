use core::fmt;
use std::panic::{self, AssertUnwindSafe};

use super::with_thread_ring;
use crate::hooks::{self, OutcomeHooks, ResultHooks};
use crate::outcome::BasicOutcome;
use crate::result::BasicResult;
use crate::status::StatusBitfield;
use crate::storage::Payload;

/// Hooks that record a backtrace for every errored result and surface it as
/// the exception of outcomes converted from such results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ExtendedErrorHooks;

/// A result whose errors carry a backtrace in the thread ring.
pub type ExtendedResult<T, E> = BasicResult<T, E, ExtendedErrorHooks>;

/// An outcome that picks up the backtrace of the result it converts from.
pub type ExtendedOutcome<T, E> = BasicOutcome<T, E, anyhow::Error, ExtendedErrorHooks>;

/// Spare storage `0` means no slot was claimed, so slot indices are stored
/// shifted up by one. Index `u16::MAX` has no encoding and is never recorded.
fn encode_slot(index: u16) -> Option<u16> {
    index.checked_add(1)
}

fn decode_slot(spare: u16) -> Option<u16> {
    spare.checked_sub(1)
}

impl<T: Payload, E> ResultHooks<T, E> for ExtendedErrorHooks {
    fn on_construction(result: &mut BasicResult<T, E, Self>) {
        if !result.has_error() {
            return;
        }
        let claimed = with_thread_ring(|ring| {
            let (index, slot) = ring.next();
            let spare = encode_slot(index);
            if spare.is_some() {
                slot.capture();
            } else {
                slot.clear();
            }
            spare
        })
        .flatten();
        match claimed {
            Some(spare) => {
                #[cfg(feature = "tracing")]
                tracing::trace!(slot = spare - 1, "captured extended error info");
                hooks::set_spare_storage(result, spare);
            }
            None => {
                #[cfg(feature = "tracing")]
                tracing::debug!("thread ring unavailable; skipping backtrace capture");
            }
        }
    }
}

fn poke_exception<T: Payload, E: fmt::Display>(outcome: &mut ExtendedOutcome<T, E>) {
    let Some(error) = outcome.error() else {
        return;
    };
    let Some(index) = decode_slot(hooks::spare_storage(&*outcome)) else {
        return;
    };
    let message = with_thread_ring(|ring| {
        let backtrace = ring.get(index)?.backtrace()?;
        Some(format!("{error} [{backtrace}]"))
    })
    .flatten();
    match message {
        Some(message) => hooks::override_outcome_exception(outcome, anyhow::Error::msg(message)),
        None => {
            #[cfg(feature = "tracing")]
            tracing::debug!(slot = index, "extended error info is stale or missing");
        }
    }
}

/// Runs [`poke_exception`], discarding any panic it raises. The outcome stays
/// as converted: the exception is only installed once the message is built.
fn poke_exception_quietly<T: Payload, E: fmt::Display>(outcome: &mut ExtendedOutcome<T, E>) {
    if let Err(_panic) = panic::catch_unwind(AssertUnwindSafe(|| poke_exception(outcome))) {
        #[cfg(feature = "tracing")]
        tracing::debug!("extended error hook panicked; outcome left without a synthesized exception");
    }
}

impl<T: Payload, E: fmt::Display> OutcomeHooks<T, E, anyhow::Error> for ExtendedErrorHooks {
    fn on_copy_conversion<U: Payload, F>(outcome: &mut ExtendedOutcome<T, E>, _source: &BasicResult<U, F, Self>) {
        poke_exception_quietly(outcome);
    }

    fn on_move_conversion(outcome: &mut ExtendedOutcome<T, E>, _source: StatusBitfield) {
        poke_exception_quietly(outcome);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Res = ExtendedResult<u32, String>;
    type Out = ExtendedOutcome<u32, String>;

    #[test]
    fn success_claims_no_slot() {
        let before = with_thread_ring(|ring| ring.current());
        let ok = Res::success(1);
        assert_eq!(ok.spare_storage(), 0);
        assert_eq!(with_thread_ring(|ring| ring.current()), before);
    }

    #[test]
    fn failure_records_its_slot_index() {
        let expected = with_thread_ring(|ring| ring.current()).unwrap();
        let failed = Res::failure("boom".into());
        assert_eq!(failed.spare_storage(), expected + 1);
        assert_eq!(decode_slot(failed.spare_storage()), Some(expected));
        assert!(with_thread_ring(|ring| ring.get(expected).and_then(|info| info.backtrace()).is_some()).unwrap());
    }

    #[test]
    fn conversion_synthesizes_exception() {
        let failed = Res::failure("boom".into());
        let copied = Out::from_result_ref(&failed);
        let message = copied.assume_exception().to_string();
        assert!(message.starts_with("boom ["));
        assert!(message.ends_with(']'));
        assert_eq!(copied.assume_error(), "boom");

        let moved = Out::from_result(failed);
        assert!(moved.has_exception());
    }

    #[test]
    fn stale_slot_leaves_outcome_untouched() {
        let failed = Res::failure("old".into());
        for _ in 0..16 {
            let _ = Res::failure("newer".into());
        }
        let outcome = Out::from_result(failed);
        assert!(outcome.has_error());
        assert!(!outcome.has_exception());
    }

    #[test]
    fn error_without_a_slot_never_borrows_another_backtrace() {
        let _first = Res::failure("first".into());
        let second = Res::in_place_error("second".into());
        assert_eq!(second.spare_storage(), 0);

        let outcome = Out::from_result(second);
        assert_eq!(outcome.assume_error(), "second");
        assert!(!outcome.has_exception());
    }

    #[test]
    fn unencodable_index_is_not_recorded() {
        assert_eq!(encode_slot(u16::MAX), None);
        assert_eq!(decode_slot(0), None);
        assert_eq!(decode_slot(encode_slot(0).unwrap()), Some(0));
    }

    #[derive(Clone)]
    struct Loud;

    impl fmt::Display for Loud {
        fn fmt(&self, _: &mut fmt::Formatter<'_>) -> fmt::Result {
            panic!("display exploded")
        }
    }

    #[test]
    fn panicking_display_leaves_conversion_intact() {
        let failed = ExtendedResult::<u32, Loud>::failure(Loud);
        let copied = ExtendedOutcome::<u32, Loud>::from_result_ref(&failed);
        assert!(copied.has_error());
        assert!(!copied.has_exception());

        let moved = ExtendedOutcome::<u32, Loud>::from_result(failed);
        assert!(moved.has_error());
        assert!(!moved.has_exception());
    }
}
