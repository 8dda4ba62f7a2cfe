//! AVX2 bit-slices, compiled on every x86 build and enabled at run time
//!
//! The network is instantiated inside a `#[target_feature(enable = "avx2")]`
//! function, so the compiler may use AVX2 there whatever the build baseline
//! is. That function must only run once the CPU has been checked for AVX2.

#[cfg(target_arch = "x86")]
use std::arch::x86::{__m256i, _mm256_and_si256, _mm256_or_si256, _mm256_xor_si256};
#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::{__m256i, _mm256_and_si256, _mm256_or_si256, _mm256_xor_si256};

use super::BitSlice;
use crate::{element::Element, network};

// ANCHOR: Avx2Lanes
/// Four 64-bit lanes in an AVX2 register
///
/// Only ever built by [`count`], which requires AVX2 from its caller, so the
/// intrinsics below never run on a CPU that lacks them.
///
#[derive(Clone, Copy)]
pub(crate) struct Avx2Lanes(__m256i);
//
impl BitSlice for Avx2Lanes {
    type Words = [u64; 4];

    #[inline(always)]
    fn load(words: &[u64]) -> Self {
        let words: [u64; 4] = [words[0], words[1], words[2], words[3]];
        Self(bytemuck::cast(words))
    }

    #[inline(always)]
    fn load_with_head(head: u64, words: &[u64]) -> Self {
        let words: [u64; 4] = [head, words[0], words[1], words[2]];
        Self(bytemuck::cast(words))
    }

    #[inline(always)]
    fn words(self) -> Self::Words {
        bytemuck::cast(self.0)
    }

    #[inline(always)]
    fn and(self, other: Self) -> Self {
        // SAFETY: AVX2 is present, see the type-level docs
        Self(unsafe { _mm256_and_si256(self.0, other.0) })
    }

    #[inline(always)]
    fn or(self, other: Self) -> Self {
        // SAFETY: AVX2 is present, see the type-level docs
        Self(unsafe { _mm256_or_si256(self.0, other.0) })
    }

    #[inline(always)]
    fn xor(self, other: Self) -> Self {
        // SAFETY: AVX2 is present, see the type-level docs
        Self(unsafe { _mm256_xor_si256(self.0, other.0) })
    }
}
// ANCHOR_END: Avx2Lanes

// ANCHOR: count
/// Run the adder network over AVX2 vectors
///
/// # Safety
///
/// The CPU must support AVX2, e.g. `is_x86_feature_detected!("avx2")` must
/// have returned true.
///
#[target_feature(enable = "avx2")]
pub(crate) unsafe fn count<T: Element>(counts: &mut [u64], buf: &[T]) {
    network::count::<T, Avx2Lanes>(counts, buf)
}
// ANCHOR_END: count
