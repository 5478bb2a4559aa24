//! Strong swap of containers whose payload transfer can fail

use std::cell::Cell;
use std::panic::{self, AssertUnwindSafe};

use upshot::*;

thread_local! {
    static ASSIGNS: Cell<u32> = const { Cell::new(0) };
    static FAIL_MASK: Cell<u32> = const { Cell::new(0) };
    static LIVE: Cell<isize> = const { Cell::new(0) };
}

/// Counts live instances; fails the listed `transfer_assign` calls.
#[derive(Debug, PartialEq)]
struct Pooled(u32);

impl Pooled {
    fn new(n: u32) -> Self {
        LIVE.with(|c| c.set(c.get() + 1));
        Pooled(n)
    }
}

impl Drop for Pooled {
    fn drop(&mut self) {
        LIVE.with(|c| c.set(c.get() - 1));
    }
}

impl TransferAssign for Pooled {
    fn transfer_new(source: &mut Self) -> Self {
        Pooled::new(source.0)
    }

    fn transfer_assign(&mut self, source: &mut Self) {
        let n = ASSIGNS.with(|c| {
            c.set(c.get() + 1);
            c.get()
        });
        if FAIL_MASK.with(Cell::get) & (1_u32 << n) != 0 {
            panic!("pool exhausted at transfer {n}");
        }
        self.0 = source.0;
    }
}

upshot::managed_payload!(Pooled);

fn arm(fail_at: &[u32]) {
    ASSIGNS.with(|c| c.set(0));
    FAIL_MASK.with(|c| c.set(fail_at.iter().fold(0_u32, |mask, &n| mask | (1 << n))));
}

fn live() -> isize {
    LIVE.with(Cell::get)
}

type Res = BasicResult<Pooled, String>;

#[test]
fn test_strong_swap_success() {
    arm(&[]);
    let baseline = live();
    {
        let mut a = Res::success(Pooled::new(1));
        let mut b = Res::success(Pooled::new(2));
        a.strong_swap(&mut b);
        assert_eq!(a.value().map(|p| p.0), Some(2));
        assert_eq!(b.value().map(|p| p.0), Some(1));
        assert!(!a.has_lost_consistency() && !b.has_lost_consistency());
    }
    assert_eq!(live(), baseline);
}

#[test]
fn test_strong_swap_restored_failure_leaves_no_mark() {
    arm(&[2]);
    let baseline = live();
    {
        let mut a = Res::success(Pooled::new(1));
        let mut b = Res::success(Pooled::new(2));
        let caught = panic::catch_unwind(AssertUnwindSafe(|| a.strong_swap(&mut b)));
        assert!(caught.is_err());
        assert_eq!(a.value().map(|p| p.0), Some(1));
        assert_eq!(b.value().map(|p| p.0), Some(2));
        assert!(!a.has_lost_consistency());
        assert!(!b.has_lost_consistency());
    }
    assert_eq!(live(), baseline);
}

#[test]
fn test_strong_swap_unrecoverable_failure_marks_both() {
    arm(&[2, 3]);
    let baseline = live();
    {
        let mut a = Res::success(Pooled::new(1));
        let mut b = Res::success(Pooled::new(2));
        let caught = panic::catch_unwind(AssertUnwindSafe(|| a.strong_swap(&mut b)));
        let message = caught
            .unwrap_err()
            .downcast::<String>()
            .map(|message| *message)
            .unwrap_or_default();
        assert_eq!(message, "pool exhausted at transfer 2");

        assert!(a.has_lost_consistency());
        assert!(b.has_lost_consistency());
        assert_eq!(a.status().status(), Status::HaveValueLostConsistency);
        // Both sides still hold a live payload and remain droppable.
        assert!(a.has_value() && b.has_value());
    }
    assert_eq!(live(), baseline);
}

#[test]
fn test_strong_swap_with_errored_side_never_transfers() {
    arm(&[1, 2, 3, 4]);
    let mut a = Res::success(Pooled::new(5));
    let mut b = Res::failure("down".into());
    a.strong_swap(&mut b);
    assert_eq!(a.error().map(String::as_str), Some("down"));
    assert_eq!(b.value().map(|p| p.0), Some(5));
    assert!(!a.has_lost_consistency());
}

#[test]
fn test_trivial_strong_swap_is_plain() {
    let mut a = BasicResult::<u64, String>::success(1);
    let mut b = BasicResult::<u64, String>::failure("e".into());
    a.strong_swap(&mut b);
    assert!(a.has_error());
    assert_eq!(b.value(), Some(&1));
}
