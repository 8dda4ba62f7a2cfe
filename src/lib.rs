//! Positional population counts
//!
//! For a buffer of 8, 16, 32 or 64-bit unsigned integers, count how many
//! elements have each bit position set, and add the result to a caller-owned
//! array of 64-bit counters. Counters are never reset, so successive calls
//! accumulate.
//!
//! ```
//! let mut counts = [0u64; 8];
//! pospop::count8(&mut counts, &[1, 2, 3, 5, 6, 9]);
//! assert_eq!(counts, [4, 3, 2, 1, 0, 0, 0, 0]);
//! ```
//!
//! The bulk of the work is done by a carry-save adder network operating on
//! 64-bit bit-slices, in the widest flavor that the running CPU supports,
//! whatever the build targets. See the [`dispatch`] module for how that
//! flavor is chosen.
//!
//! The adder network, its counter bank and the vector lanes are internal.
//! Kernel families are only reachable as `&dyn Family`:
//!
//! ```compile_fail
//! let _ = pospop::network::count_words::<u8, u64>;
//! ```
//!
//! ```
//! use pospop::dispatch::{families, Family};
//!
//! let mut counts = [0u64; 16];
//! for family in families().iter().filter(|f| f.available()) {
//!     family.count16(&mut counts, &[0x8001; 100]);
//! }
//! let runs = families().iter().filter(|f| f.available()).count() as u64;
//! assert_eq!(counts[0], 100 * runs);
//! assert_eq!(counts[15], 100 * runs);
//! ```

mod bank;
pub mod dispatch;
pub mod element;
mod network;
pub mod scalar;
mod simd;
pub mod validate;

pub use element::Element;

// ANCHOR: entry_points
/// Add the per-bit counts of `buf` into `counts`, where `counts[0]` tracks
/// `0x01` and `counts[7]` tracks `0x80`
#[inline]
pub fn count8(counts: &mut [u64; 8], buf: &[u8]) {
    dispatch::selected().count8(counts, buf)
}

/// Add the per-bit counts of `buf` into `counts`, where `counts[0]` tracks
/// `0x0001` and `counts[15]` tracks `0x8000`
#[inline]
pub fn count16(counts: &mut [u64; 16], buf: &[u16]) {
    dispatch::selected().count16(counts, buf)
}

/// Add the per-bit counts of `buf` into `counts`, where `counts[0]` tracks
/// `0x0000_0001` and `counts[31]` tracks `0x8000_0000`
#[inline]
pub fn count32(counts: &mut [u64; 32], buf: &[u32]) {
    dispatch::selected().count32(counts, buf)
}

/// Add the per-bit counts of `buf` into `counts`, where `counts[0]` tracks
/// bit 0 and `counts[63]` tracks bit 63
#[inline]
pub fn count64(counts: &mut [u64; 64], buf: &[u64]) {
    dispatch::selected().count64(counts, buf)
}

/// Name of the kernel family behind the entry points
pub fn family() -> &'static str {
    dispatch::selected().name()
}
// ANCHOR_END: entry_points


#[cfg(test)]
mod tests {
    use quickcheck_macros::quickcheck;

    crate::test_family!(dispatched, crate::dispatch::selected());
    crate::test_family!(generic, &crate::dispatch::GENERIC);
    #[cfg(all(any(target_arch = "x86", target_arch = "x86_64"), target_feature = "sse2"))]
    crate::test_family!(sse2, &crate::dispatch::SSE2);
    #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
    crate::test_family!(avx2, &crate::dispatch::AVX2);

    /// Lengths around the block boundaries of every family
    const LENGTHS: &[usize] = &[
        0, 1, 7, 8, 9, 15, 16, 17, 31, 32, 33, 63, 64, 65, 119, 120, 121, 239, 240, 241, 479,
        480, 481, 959, 960, 961, 1023, 1024, 1025, 1984, 3968,
    ];

    #[test]
    fn all_families_all_lengths() {
        let words = (0..LENGTHS[LENGTHS.len() - 1] as u64 + 1)
            .map(|i| i.wrapping_mul(0xff51_afd7_ed55_8ccd) ^ i >> 3)
            .collect::<Vec<_>>();
        let bytes: &[u8] = bytemuck::cast_slice(&words);
        let halves: &[u16] = bytemuck::cast_slice(&words);
        let quarters: &[u32] = bytemuck::cast_slice(&words);
        for family in crate::dispatch::families() {
            if !family.available() {
                continue;
            }
            for &len in LENGTHS {
                crate::validate::check(*family, &bytes[1..len + 1]).unwrap();
                crate::validate::check(*family, &halves[1..len + 1]).unwrap();
                crate::validate::check(*family, &quarters[1..len + 1]).unwrap();
                crate::validate::check(*family, &words[..len]).unwrap();
            }
        }
    }

    #[test]
    fn zero_length_is_noop() {
        let mut counts8 = [3u64; 8];
        super::count8(&mut counts8, &[]);
        assert_eq!(counts8, [3; 8]);
        let mut counts16 = [3u64; 16];
        super::count16(&mut counts16, &[]);
        assert_eq!(counts16, [3; 16]);
        let mut counts32 = [3u64; 32];
        super::count32(&mut counts32, &[]);
        assert_eq!(counts32, [3; 32]);
        let mut counts64 = [3u64; 64];
        super::count64(&mut counts64, &[]);
        assert_eq!(counts64, [3; 64]);
    }

    #[test]
    fn family_is_available() {
        let name = super::family();
        let family = crate::dispatch::families()
            .iter()
            .find(|f| f.name() == name)
            .expect("bound family is one of the compiled ones");
        assert!(family.available());
    }

    #[quickcheck]
    fn additivity(first: Vec<u16>, second: Vec<u16>, repeat: u8) -> bool {
        let first = first.repeat(usize::from(repeat % 32) + 1);
        let mut split = [0u64; 16];
        super::count16(&mut split, &first);
        super::count16(&mut split, &second);
        let whole = [first, second].concat();
        let mut joined = [0u64; 16];
        super::count16(&mut joined, &whole);
        split == joined
    }

    #[quickcheck]
    fn linearity(element: u32, len: u16) -> bool {
        let len = usize::from(len % 4096);
        let buf = vec![element; len];
        let mut counts = [0u64; 32];
        super::count32(&mut counts, &buf);
        counts
            .iter()
            .enumerate()
            .all(|(bit, &count)| count == if element >> bit & 1 == 1 { len as u64 } else { 0 })
    }

    #[quickcheck]
    fn single_bit(len: u16, position: u32) -> bool {
        let len = usize::from(len % 2048) + 1;
        let mut bytes = vec![0u8; len];
        let bit = position as usize % (8 * len);
        bytes[bit / 8] = 1 << (bit % 8);
        let mut counts = [0u64; 8];
        super::count8(&mut counts, &bytes);
        let mut expected = [0u64; 8];
        expected[bit % 8] = 1;
        counts == expected
    }

    #[test]
    fn single_bit_wide() {
        let mut words = vec![0u64; 100];
        words[57] = 1 << 45;
        let mut counts = [0u64; 16];
        super::count16(&mut counts, bytemuck::cast_slice(&words));
        let mut expected = [0u64; 16];
        expected[45 % 16] = 1;
        assert_eq!(counts, expected);
    }
}
