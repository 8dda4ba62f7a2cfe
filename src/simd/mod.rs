#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
pub(crate) mod multiversion;

// ANCHOR: BitSlice
/// Bundle of independent 64-bit bit-slice lanes with SIMD semantics
///
/// Every bitwise operation acts on all `LANES * 64` bit lanes at once, which
/// is what lets a carry-save adder tree count many bit positions in parallel.
///
pub trait BitSlice: Copy + Sized + 'static {
    /// Number of 64-bit words per vector
    const LANES: usize = std::mem::size_of::<Self>() / std::mem::size_of::<u64>();

    /// Per-lane view of the vector, `[u64; LANES]`
    type Words: AsRef<[u64]>;

    /// Load a vector from the first `LANES` words of `words`
    fn load(words: &[u64]) -> Self;

    /// Load a vector whose first lane is `head`, followed by the first
    /// `LANES - 1` words of `words`
    fn load_with_head(head: u64, words: &[u64]) -> Self;

    /// Split the vector into its 64-bit lanes
    fn words(self) -> Self::Words;

    /// Bitwise AND
    fn and(self, other: Self) -> Self;

    /// Bitwise OR
    fn or(self, other: Self) -> Self;

    /// Bitwise XOR
    fn xor(self, other: Self) -> Self;

    /// Carry-save adder, i.e. a full adder in every bit lane
    ///
    /// Returns `(carry, sum)` such that `2 * carry + sum == a + b + c` in
    /// each bit lane.
    ///
    #[inline(always)]
    fn csa(a: Self, b: Self, c: Self) -> (Self, Self) {
        let sum_ab = a.xor(b);
        let carry_ab = a.and(b);
        (carry_ab.or(sum_ab.and(c)), sum_ab.xor(c))
    }
}
// ANCHOR_END: BitSlice

// ANCHOR: implBitSlice
impl BitSlice for u64 {
    type Words = [u64; 1];

    #[inline(always)]
    fn load(words: &[u64]) -> Self {
        words[0]
    }

    #[inline(always)]
    fn load_with_head(head: u64, _words: &[u64]) -> Self {
        head
    }

    #[inline(always)]
    fn words(self) -> Self::Words {
        [self]
    }

    #[inline(always)]
    fn and(self, other: Self) -> Self {
        self & other
    }

    #[inline(always)]
    fn or(self, other: Self) -> Self {
        self | other
    }

    #[inline(always)]
    fn xor(self, other: Self) -> Self {
        self ^ other
    }
}

#[cfg(target_feature = "sse2")]
impl BitSlice for safe_arch::m128i {
    // SSE vectors hold two 64-bit lanes
    type Words = [u64; 2];

    #[inline(always)]
    fn load(words: &[u64]) -> Self {
        Self::from([words[0], words[1]])
    }

    #[inline(always)]
    fn load_with_head(head: u64, words: &[u64]) -> Self {
        Self::from([head, words[0]])
    }

    #[inline(always)]
    fn words(self) -> Self::Words {
        self.into()
    }

    #[inline(always)]
    fn and(self, other: Self) -> Self {
        safe_arch::bitand_m128i(self, other)
    }

    #[inline(always)]
    fn or(self, other: Self) -> Self {
        safe_arch::bitor_m128i(self, other)
    }

    #[inline(always)]
    fn xor(self, other: Self) -> Self {
        safe_arch::bitxor_m128i(self, other)
    }
}
// ANCHOR_END: implBitSlice
