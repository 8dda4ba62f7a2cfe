use crate::element::{self, Element};

// ANCHOR: CounterBank
/// Narrow per-bit-position counters for one 64-bit processing word
///
/// Counting in 8-bit counters keeps the bank in a handful of registers, but
/// they must be spilled into the caller's 64-bit counters before they wrap.
/// Callers declare how much they are about to add with `reserve()`, which
/// spills first if the remaining headroom cannot absorb it.
///
pub struct CounterBank {
    /// 8-bit counters, one per bit of the processing word
    counters: [u8; 64],

    /// Amount that can still be added to any single counter without overflow
    headroom: u8,
}
//
impl CounterBank {
    /// Set up an empty bank
    pub fn new() -> Self {
        Self {
            counters: [0; 64],
            headroom: u8::MAX,
        }
    }

    /// Make room for adding up to `amount` to every counter, spilling into
    /// `counts` if needed
    #[inline(always)]
    pub fn reserve<T: Element>(&mut self, amount: u8, counts: &mut [u64]) {
        if self.headroom < amount {
            self.flush::<T>(counts);
        }
        self.headroom -= amount;
    }

    /// Add `weight` to the counters of every bit set in `plane`
    #[inline(always)]
    pub fn add_plane(&mut self, plane: u64, weight: u8) {
        for (bit, counter) in self.counters.iter_mut().enumerate() {
            *counter += weight * (plane >> bit & 1) as u8;
        }
    }

    /// Add transposed 4-bit counts
    ///
    /// `views[k]` holds, in its nibble `j`, the count for bit position
    /// `4 * j + k`.
    ///
    #[inline(always)]
    pub fn add_nibbles(&mut self, views: [u64; 4]) {
        for base in (0..64).step_by(4) {
            for (offset, view) in views.iter().enumerate() {
                self.counters[base + offset] += (view >> base & 0xf) as u8;
            }
        }
    }

    /// Spill the counters into `counts` and start over
    #[inline]
    pub fn flush<T: Element>(&mut self, counts: &mut [u64]) {
        element::fold::<T>(counts, &self.counters);
        self.counters = [0; 64];
        self.headroom = u8::MAX;
    }
}
// ANCHOR_END: CounterBank

#[cfg(test)]
mod tests {
    use super::CounterBank;

    #[test]
    fn add_plane() {
        let mut bank = CounterBank::new();
        bank.add_plane(0b101 | 1 << 63, 16);
        let mut counts = [0u64; 64];
        bank.flush::<u64>(&mut counts);
        assert_eq!(counts[0], 16);
        assert_eq!(counts[1], 0);
        assert_eq!(counts[2], 16);
        assert_eq!(counts[63], 16);
        assert_eq!(counts.iter().sum::<u64>(), 48);
    }

    #[test]
    fn add_nibbles() {
        let mut bank = CounterBank::new();
        bank.add_nibbles([0x1, 0x2 << 4, 0xf << 60, 0x7]);
        let mut counts = [0u64; 64];
        bank.flush::<u64>(&mut counts);
        assert_eq!(counts[0], 1);
        assert_eq!(counts[5], 2);
        assert_eq!(counts[62], 15);
        assert_eq!(counts[3], 7);
        assert_eq!(counts.iter().sum::<u64>(), 25);
    }

    #[test]
    fn reserve_spills_before_overflow() {
        let mut bank = CounterBank::new();
        let mut counts = [0u64; 8];
        for _ in 0..100 {
            bank.reserve::<u8>(16, &mut counts);
            bank.add_plane(u64::MAX, 16);
        }
        bank.flush::<u8>(&mut counts);
        assert_eq!(counts, [100 * 16 * 8; 8]);
    }

    #[test]
    fn reserve_keeps_counts_until_needed() {
        let mut bank = CounterBank::new();
        let mut counts = [0u64; 16];
        for _ in 0..15 {
            bank.reserve::<u16>(16, &mut counts);
            bank.add_plane(1, 16);
        }
        assert_eq!(counts, [0; 16]);
        bank.reserve::<u16>(16, &mut counts);
        assert_eq!(counts[0], 15 * 16);
    }
}
