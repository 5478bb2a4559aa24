//! Compile-time choice of cell per payload type.
//!
//! Each payload names its cell once, through [`Payload::Storage`]. The cell
//! then exposes exactly the payload's capabilities through ordinary trait
//! bounds:
//!
//! | payload            | cell                    | `Copy` | `Clone`          |
//! |--------------------|-------------------------|--------|------------------|
//! | `Copy`             | [`TrivialStorage`]      | yes    | yes (bitwise)    |
//! | `Clone`, not `Copy`| [`NontrivialStorage`]   | no     | yes (synthesized)|
//! | move-only          | [`NontrivialStorage`]   | no     | no               |
//!
//! Moves are relocations in every row. Move assignment is bitwise on the
//! trivial path and goes through [`ValueStorage::assign_from`] otherwise.
//!
//! Custom payloads opt in with [`trivial_payload!`](crate::trivial_payload)
//! or [`managed_payload!`](crate::managed_payload).

use std::rc::Rc;
use std::sync::Arc;

use super::{NontrivialStorage, TrivialStorage, ValueStorage};

/// A type that can be held as the value of a result or outcome.
pub trait Payload: Sized {
    /// The cell that holds this payload.
    type Storage: ValueStorage<Value = Self>;

    /// `true` when this payload is held in the bitwise cell.
    const TRIVIAL: bool = <Self::Storage as ValueStorage>::TRIVIAL;
}

/// The cell selected for `T`.
pub type StorageFor<T> = <T as Payload>::Storage;

/// Declares payloads held in [`TrivialStorage`](crate::storage::TrivialStorage).
///
/// The types must be `Copy`.
#[macro_export]
macro_rules! trivial_payload {
    ($($ty:ty),* $(,)?) => {
        $(
            impl $crate::storage::Payload for $ty {
                type Storage = $crate::storage::TrivialStorage<$ty>;
            }
        )*
    };
}

/// Declares payloads held in [`NontrivialStorage`](crate::storage::NontrivialStorage).
#[macro_export]
macro_rules! managed_payload {
    ($($ty:ty),* $(,)?) => {
        $(
            impl $crate::storage::Payload for $ty {
                type Storage = $crate::storage::NontrivialStorage<$ty>;
            }
        )*
    };
}

trivial_payload!(
    (),
    bool,
    char,
    u8,
    u16,
    u32,
    u64,
    u128,
    usize,
    i8,
    i16,
    i32,
    i64,
    i128,
    isize,
    f32,
    f64,
    &'static str,
    core::time::Duration,
);

managed_payload!(String, std::io::Error, anyhow::Error, std::path::PathBuf);

impl<T: Copy, const N: usize> Payload for [T; N] {
    type Storage = TrivialStorage<[T; N]>;
}

impl<T> Payload for Vec<T> {
    type Storage = NontrivialStorage<Vec<T>>;
}

impl<T> Payload for Option<T> {
    type Storage = NontrivialStorage<Option<T>>;
}

impl<T: ?Sized> Payload for Box<T> {
    type Storage = NontrivialStorage<Box<T>>;
}

impl<T: ?Sized> Payload for Rc<T> {
    type Storage = NontrivialStorage<Rc<T>>;
}

impl<T: ?Sized> Payload for Arc<T> {
    type Storage = NontrivialStorage<Arc<T>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_follows_triviality() {
        assert!(<StorageFor<u32> as ValueStorage>::TRIVIAL);
        assert!(<StorageFor<[u8; 16]> as ValueStorage>::TRIVIAL);
        assert!(<StorageFor<()> as ValueStorage>::TRIVIAL);
        assert!(!<StorageFor<String> as ValueStorage>::TRIVIAL);
        assert!(!<StorageFor<Vec<u8>> as ValueStorage>::TRIVIAL);
        assert!(!<StorageFor<Box<dyn Fn()>> as ValueStorage>::TRIVIAL);
        assert!(<char as Payload>::TRIVIAL);
        assert!(!<std::io::Error as Payload>::TRIVIAL);
    }
}
