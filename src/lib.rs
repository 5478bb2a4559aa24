//! # `upshot` - Value-or-Error Containers with a Packed Status Tag
//!
//! Result and outcome types that report an operation's success or failure as
//! an ordinary value. Each container keeps its state in a four-byte status
//! tag and offers sixteen bits of spare storage for whatever side channel the
//! container's hooks want to keep.
//!
//! ## Key Features
//!
//! - **Packed status**: one closed enum of legal states, plus a moved-from flag
//!   and spare storage, with stable bit values for serialization.
//! - **Payload-driven cells**: `Copy` payloads live in a bitwise cell; payloads
//!   with drop glue get a hand-managed cell. `Clone` follows the payload.
//! - **Strong swap**: payloads whose transfer can unwind are swapped with
//!   rollback, and an unrecoverable failure marks both sides as having lost
//!   consistency before the panic continues.
//! - **Hooks**: construction and conversion hooks selected by a type
//!   parameter, with an extended-error example in [`diag`].
//!
//! ## Architecture
//!
//! The crate is stratified bottom-up:
//!
//! 1. [`status`]: the state tag and its transition table.
//! 2. [`storage`]: value cells and their selection per payload type.
//! 3. [`result`] and [`outcome`]: the containers, built on one value cell
//!    plus error and exception slots.
//! 4. [`hooks`] and [`diag`]: instrumentation layered on the containers.
//!
//! ## Example
//!
//! ```rust
//! use upshot::{BasicResult, Status};
//!
//! let mut r = BasicResult::<u32, String>::empty();
//! assert_eq!(r.status().status(), Status::None);
//!
//! r = BasicResult::success(42);
//! assert_eq!(r.value(), Some(&42));
//!
//! let mut failed = BasicResult::<u32, String>::failure("nope".into());
//! r.swap(&mut failed);
//! assert_eq!(r.error().map(String::as_str), Some("nope"));
//! assert_eq!(failed.value(), Some(&42));
//! ```

#![warn(missing_docs, clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod diag;
pub mod error;
pub mod hooks;
pub mod outcome;
pub mod result;
pub mod status;
pub mod storage;

pub use error::{AccessError, StatusError};
pub use hooks::{HasSpareStorage, NoHooks, OutcomeHooks, ResultHooks};
pub use outcome::{BasicOutcome, Failure};
pub use result::BasicResult;
pub use status::{RawStatus, Status, StatusBitfield, StatusFlag};
pub use storage::{NontrivialStorage, Payload, StorageFor, StrongSwap, TransferAssign, TrivialStorage, ValueStorage};

// Compile-time assertions for memory layout
const _: () = {
    use core::mem;

    // The status tag is frozen at four bytes in both forms.
    assert!(mem::size_of::<StatusBitfield>() == 4);
    assert!(mem::size_of::<RawStatus>() == 4);
    assert!(mem::size_of::<Status>() == 1);

    // A trivial cell is its payload plus the tag, nothing else.
    assert!(mem::size_of::<TrivialStorage<u32>>() == 8);
    assert!(mem::size_of::<TrivialStorage<()>>() == 4);

    // Results add only the error slot.
    assert!(mem::size_of::<BasicResult<u32, u32>>() == 12);
};
