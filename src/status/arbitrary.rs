//! `proptest` strategies for the state tag (feature `proptest`).

use proptest::prelude::*;
use proptest::sample::select;

use super::{Status, StatusBitfield, StatusFlag};

impl Arbitrary for Status {
    type Parameters = ();
    type Strategy = BoxedStrategy<Status>;

    fn arbitrary_with((): ()) -> Self::Strategy {
        select(Status::ALL.to_vec()).boxed()
    }
}

impl Arbitrary for StatusFlag {
    type Parameters = ();
    type Strategy = BoxedStrategy<StatusFlag>;

    fn arbitrary_with((): ()) -> Self::Strategy {
        select(StatusFlag::ALL.to_vec()).boxed()
    }
}

impl Arbitrary for StatusBitfield {
    type Parameters = ();
    type Strategy = BoxedStrategy<StatusBitfield>;

    fn arbitrary_with((): ()) -> Self::Strategy {
        (any::<Status>(), any::<bool>(), any::<u16>())
            .prop_map(|(status, moved_from, spare)| {
                let mut bits = StatusBitfield::with_spare_storage(status, spare);
                bits.set_have_moved_from(moved_from);
                bits
            })
            .boxed()
    }
}
