use crate::dispatch::Family;

// ANCHOR: Element
/// Unsigned integer type whose bits can be counted positionally
pub trait Element: num_traits::PrimInt + num_traits::Unsigned + bytemuck::Pod {
    /// Number of bit positions, and thus of output counters
    const WIDTH: usize = std::mem::size_of::<Self>() * 8;

    /// Array of `WIDTH` 64-bit counters
    type Counts: bytemuck::Pod + AsRef<[u64]> + AsMut<[u64]> + Eq + std::fmt::Debug;

    /// Run the entry point of `family` that matches this element width
    fn count_with(family: &dyn Family, counts: &mut Self::Counts, buf: &[Self]);
}

impl Element for u8 {
    type Counts = [u64; 8];

    #[inline]
    fn count_with(family: &dyn Family, counts: &mut Self::Counts, buf: &[Self]) {
        family.count8(counts, buf)
    }
}

impl Element for u16 {
    type Counts = [u64; 16];

    #[inline]
    fn count_with(family: &dyn Family, counts: &mut Self::Counts, buf: &[Self]) {
        family.count16(counts, buf)
    }
}

impl Element for u32 {
    type Counts = [u64; 32];

    #[inline]
    fn count_with(family: &dyn Family, counts: &mut Self::Counts, buf: &[Self]) {
        family.count32(counts, buf)
    }
}

impl Element for u64 {
    type Counts = [u64; 64];

    #[inline]
    fn count_with(family: &dyn Family, counts: &mut Self::Counts, buf: &[Self]) {
        family.count64(counts, buf)
    }
}
// ANCHOR_END: Element

// ANCHOR: fold
/// Fold the 64 per-bit counters of a 64-bit processing word into the
/// `T::WIDTH` counters of `T`
///
/// Bit `i` of a native-endian 64-bit word is bit `i % WIDTH` of one of the
/// `64 / WIDTH` elements packed into it, so same-position bits of all packed
/// elements land in the same output counter.
///
#[inline]
pub(crate) fn fold<T: Element>(counts: &mut [u64], bank: &[u8; 64]) {
    debug_assert_eq!(counts.len(), T::WIDTH);
    for (bit, &count) in bank.iter().enumerate() {
        counts[bit % T::WIDTH] += u64::from(count);
    }
}
// ANCHOR_END: fold
