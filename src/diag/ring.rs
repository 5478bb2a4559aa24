//! A bounded ring of reusable slots addressed by a wrapping 16-bit index.

/// `N` slots written round-robin.
///
/// Every [`next`](SlotRing::next) hands out the oldest slot together with an
/// index that fits in spare storage. An index stays valid until `N` further
/// slots have been handed out; after that [`get`](SlotRing::get) reports it as
/// stale instead of returning a slot that now belongs to someone else.
#[derive(Debug, Clone)]
pub struct SlotRing<T, const N: usize = 16> {
    slots: [T; N],
    current: u16,
}

impl<T, const N: usize> SlotRing<T, N> {
    const CAPACITY_OK: () = assert!(
        N.is_power_of_two() && N <= 1 << 15,
        "ring capacity must be a power of two no larger than 32768"
    );

    /// A ring whose slots are all `T::default()`.
    pub fn new() -> Self
    where
        T: Default,
    {
        Self::from_fn(|_| T::default())
    }

    /// A ring whose slot `i` is `f(i)`.
    pub fn from_fn(f: impl FnMut(usize) -> T) -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::CAPACITY_OK;
        Self {
            slots: core::array::from_fn(f),
            current: 0,
        }
    }

    /// The number of slots.
    #[inline(always)]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// The write counter: the index the next call to [`next`](Self::next)
    /// will hand out.
    #[inline(always)]
    pub const fn current(&self) -> u16 {
        self.current
    }

    #[inline(always)]
    fn position(index: u16) -> usize {
        usize::from(index) % N
    }

    /// Claims the oldest slot, returning its index and the slot.
    pub fn next(&mut self) -> (u16, &mut T) {
        let index = self.current;
        self.current = self.current.wrapping_add(1);
        (index, &mut self.slots[Self::position(index)])
    }

    /// Returns `true` if `index` was handed out within the last `N` claims.
    #[inline]
    pub fn is_live(&self, index: u16) -> bool {
        let age = usize::from(self.current.wrapping_sub(index));
        (1..=N).contains(&age)
    }

    /// The slot for `index`, or `None` if it was never handed out or has
    /// since been reused.
    pub fn get(&self, index: u16) -> Option<&T> {
        self.is_live(index).then(|| &self.slots[Self::position(index)])
    }

    /// Mutable form of [`get`](Self::get).
    pub fn get_mut(&mut self, index: u16) -> Option<&mut T> {
        if self.is_live(index) {
            Some(&mut self.slots[Self::position(index)])
        } else {
            None
        }
    }
}

impl<T: Default, const N: usize> Default for SlotRing<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_ring_has_no_live_index() {
        let ring = SlotRing::<u8, 4>::new();
        for index in [0, 1, 3, u16::MAX] {
            assert!(ring.get(index).is_none());
        }
    }

    #[test]
    fn index_goes_stale_after_a_full_lap() {
        let mut ring = SlotRing::<u32, 4>::new();
        let (first, slot) = ring.next();
        *slot = 10;
        for n in 1..4 {
            *ring.next().1 = n;
        }
        assert_eq!(ring.get(first), Some(&10));
        *ring.next().1 = 99;
        assert_eq!(ring.get(first), None);
    }

    #[test]
    fn counter_wraps_without_losing_recent_slots() {
        let mut ring = SlotRing::<u16, 16>::new();
        for _ in 0..u16::MAX {
            ring.next();
        }
        let (last, slot) = ring.next();
        *slot = 7;
        assert_eq!(last, u16::MAX);
        assert_eq!(ring.current(), 0);
        assert_eq!(ring.get(last), Some(&7));
        let (wrapped, slot) = ring.next();
        *slot = 8;
        assert_eq!(wrapped, 0);
        assert_eq!(ring.get(wrapped), Some(&8));
        assert_eq!(ring.get(last), Some(&7));
    }

    #[test]
    fn future_index_is_rejected() {
        let mut ring = SlotRing::<u8, 8>::new();
        ring.next();
        assert!(ring.get(0).is_some());
        assert!(ring.get(1).is_none());
        assert!(ring.get(5).is_none());
    }
}
