//! Value cell behaviour through the public API

use std::cell::Cell;
use std::marker::PhantomData;

use upshot::*;

thread_local! {
    static LIVE: Cell<isize> = const { Cell::new(0) };
}

fn live() -> isize {
    LIVE.with(Cell::get)
}

#[derive(Debug, PartialEq)]
struct Counted(u32);

impl Counted {
    fn new(n: u32) -> Self {
        LIVE.with(|c| c.set(c.get() + 1));
        Counted(n)
    }
}

impl Clone for Counted {
    fn clone(&self) -> Self {
        Counted::new(self.0)
    }
}

impl Drop for Counted {
    fn drop(&mut self) {
        LIVE.with(|c| c.set(c.get() - 1));
    }
}

struct MoveOnly;

#[derive(Clone, Copy, Debug, PartialEq, Default)]
struct Point {
    x: i32,
    y: i32,
}

upshot::managed_payload!(Counted, MoveOnly);
upshot::trivial_payload!(Point);

// Inherent constants win over trait constants only when their bounds hold.
struct Caps<T>(PhantomData<T>);

trait Fallback {
    const CLONE: bool = false;
}

impl<T> Fallback for Caps<T> {}

impl<T: Clone> Caps<T> {
    const CLONE: bool = true;
}

fn assert_copy<T: Copy>() {}

#[test]
fn test_capabilities_follow_payload() {
    assert_copy::<StorageFor<u32>>();
    assert_copy::<StorageFor<Point>>();

    assert!(Caps::<StorageFor<Point>>::CLONE);
    assert!(Caps::<StorageFor<Counted>>::CLONE);
    assert!(!Caps::<StorageFor<MoveOnly>>::CLONE);
    assert!(!Caps::<BasicResult<MoveOnly, ()>>::CLONE);
    assert!(Caps::<BasicResult<Counted, String>>::CLONE);
}

#[test]
fn test_nontrivial_lifetimes_balance() {
    let baseline = live();
    {
        let mut a = NontrivialStorage::new(Counted::new(1));
        let mut b = NontrivialStorage::new(Counted::new(2));
        assert_eq!(live(), baseline + 2);

        ValueStorage::swap(&mut a, &mut b);
        assert_eq!(a.value().map(|p| p.0), Some(2));
        assert_eq!(b.value().map(|p| p.0), Some(1));

        let taken = a.take_value();
        assert!(a.status().was_moved_from());
        drop(taken);
        assert_eq!(live(), baseline + 1);

        // One side vacant: the payload relocates, nothing is built or dropped.
        ValueStorage::swap(&mut a, &mut b);
        assert_eq!(live(), baseline + 1);
        assert_eq!(a.value().map(|p| p.0), Some(1));
        assert!(!b.has_value());

        let copy = a.clone();
        assert_eq!(live(), baseline + 2);
        b.assign_from(copy);
        assert_eq!(live(), baseline + 2);
        a.assign_from(NontrivialStorage::from_status(StatusBitfield::new(Status::HaveError)));
        assert_eq!(live(), baseline + 1);
        assert!(a.status().has_error());
    }
    assert_eq!(live(), baseline);
}

#[test]
fn test_trivial_swap_is_bitwise() {
    let mut a = TrivialStorage::new(Point { x: 1, y: 2 });
    let mut b = TrivialStorage::<Point>::from_status(StatusBitfield::with_spare_storage(Status::HaveError, 77));
    ValueStorage::swap(&mut a, &mut b);
    assert_eq!(a.status().spare_storage(), 77);
    assert!(a.status().has_error());
    assert_eq!(b.value(), Some(&Point { x: 1, y: 2 }));
}

#[test]
fn test_converting_construction_keeps_status_bits() {
    let source = TrivialStorage::new(7_u8);
    let widened = NontrivialStorage::<Vec<u8>>::from_parts(*source.status(), source.value().map(|&b| vec![b]));
    assert_eq!(widened.value(), Some(&vec![7]));

    let wide = TrivialStorage::<u64>::convert_from(source);
    assert_eq!(wide.value(), Some(&7));

    let mut errored = TrivialStorage::<u8>::from_status(StatusBitfield::new(Status::HaveErrorErrorIsErrno));
    errored.set_spare_storage(0xbeef);
    let converted = TrivialStorage::<u64>::convert_from(errored);
    assert!(!converted.has_value());
    assert_eq!(converted.status().status(), Status::HaveErrorErrorIsErrno);
    assert_eq!(converted.status().spare_storage(), 0xbeef);
}

#[test]
fn test_from_void_differs_by_path() {
    let errored = TrivialStorage::<()>::from_status(StatusBitfield::new(Status::HaveError));
    let baseline = live();

    let trivial = TrivialStorage::<Point>::from_void(&errored);
    assert!(!trivial.has_value());

    let managed = NontrivialStorage::<Vec<Counted>>::from_void(&errored);
    assert!(!managed.has_value());

    let valued = NontrivialStorage::<Vec<Counted>>::from_void(&TrivialStorage::new(()));
    assert_eq!(valued.value().map(Vec::len), Some(0));
    assert_eq!(live(), baseline);
}

#[test]
#[should_panic(expected = "illegal status transition")]
fn test_value_with_error_status_traps() {
    let _ = TrivialStorage::from_parts(StatusBitfield::new(Status::HaveError), Some(1_u32));
}
