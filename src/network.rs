//! Harley-Seal carry-save adder network
//!
//! The input is viewed as a stream of 64-bit words, grouped into vectors of
//! `BitSlice::LANES` words. A tree of carry-save adders reduces a block of
//! vectors to bit-planes of weight 1, 2, 4 and 8, so that bit `i` of the
//! planes spells out, in binary, how many words of the block have bit `i`
//! set. Each further chunk of 16 vectors is folded into these planes,
//! emitting a carry-out plane of weight 16 into the counter bank.

use crate::{bank::CounterBank, element::Element, scalar, simd::BitSlice};

/// Bytes per processing word
const WORD: usize = std::mem::size_of::<u64>();

/// Vectors in the first block, which starts without carried planes
pub const HEAD_BLOCK: usize = 15;

/// Vectors in each subsequent block
pub const CHUNK: usize = 16;

// ANCHOR: count
/// Count `buf` with the adder network, then finish the trailing elements
/// with the scalar fallback
///
/// Always inlined, so that a `target_feature` caller compiles the whole
/// network with its instruction set.
///
#[inline(always)]
pub fn count<T: Element, V: BitSlice>(counts: &mut [u64], buf: &[T]) {
    let size = std::mem::size_of::<T>();
    let rest = count_words::<T, V>(counts, bytemuck::cast_slice(buf));
    debug_assert_eq!(rest % size, 0, "remainder split an element");
    scalar::count(counts, &buf[buf.len() - rest / size..]);
}
// ANCHOR_END: count

// ANCHOR: count_words
/// Run the adder network over as many whole blocks of `bytes` as possible
///
/// The counts are added into `counts` through the width fold of `T`. Returns
/// the number of trailing bytes that were left alone.
///
#[inline(always)]
pub fn count_words<T: Element, V: BitSlice>(counts: &mut [u64], bytes: &[u8]) -> usize {
    let lanes = V::LANES;
    let (prefix, body, _) = bytemuck::pod_align_to::<u8, u64>(bytes);
    if prefix.len() >= WORD {
        return bytes.len();
    }
    let misalignment = (WORD - prefix.len()) % WORD;
    let available = usize::from(!prefix.is_empty()) + body.len();
    if available < HEAD_BLOCK * lanes {
        return bytes.len();
    }

    // A misaligned start becomes a first word whose leading bytes, which
    // precede the buffer, are zero
    let (first, words) = if prefix.is_empty() {
        (body[0], &body[1..])
    } else {
        let mut word = [0u8; WORD];
        word[misalignment..].copy_from_slice(prefix);
        (u64::from_ne_bytes(word), body)
    };

    // Process the head block
    let (head, words) = words.split_at(HEAD_BLOCK * lanes - 1);
    let x: [V; HEAD_BLOCK] = std::array::from_fn(|k| match k {
        0 => V::load_with_head(first, head),
        _ => V::load(&head[k * lanes - 1..]),
    });
    let (b0, a0) = V::csa(x[0], x[1], x[2]);
    let (b1, a1) = V::csa(x[3], x[4], x[5]);
    let (b2, a2) = V::csa(x[6], x[7], x[8]);
    let (b3, a3) = V::csa(x[9], x[10], x[11]);
    let (b4, a4) = V::csa(x[12], x[13], x[14]);

    let (b5, a5) = V::csa(a0, a1, a2);
    let (c0, b6) = V::csa(b0, b1, b2);
    let (b7, mut a) = V::csa(a3, a4, a5);
    let (c1, b8) = V::csa(b3, b4, b5);
    let (c2, mut b) = V::csa(b6, b7, b8);
    let (mut d, mut c) = V::csa(c0, c1, c2);

    // Process 16-vector chunks, carrying d:c:b:a over
    let mut bank = CounterBank::new();
    let chunk_load = (CHUNK * lanes) as u8;
    debug_assert_eq!(usize::from(chunk_load), CHUNK * lanes);
    let chunks = words.chunks_exact(CHUNK * lanes);
    let num_chunks = chunks.len();
    for chunk in chunks {
        let x: [V; CHUNK] = std::array::from_fn(|k| V::load(&chunk[k * lanes..]));

        let (b0, a0) = V::csa(a, x[0], x[1]);
        let (b1, a1) = V::csa(x[2], x[3], x[4]);
        let (b2, a2) = V::csa(x[5], x[6], x[7]);
        let (b3, a3) = V::csa(x[8], x[9], x[10]);
        let (b4, a4) = V::csa(x[11], x[12], x[13]);

        let (b5, a5) = V::csa(a0, a1, a2);
        let (c0, b6) = V::csa(b, b0, b1);
        let (b7, a6) = V::csa(a3, a4, x[14]);
        let (c1, b8) = V::csa(b2, b3, b4);

        let (b9, a_next) = V::csa(a5, a6, x[15]);
        let (c2, b10) = V::csa(b5, b7, b8);
        let (d0, c3) = V::csa(c, c0, c1);

        let (c4, b_next) = V::csa(b6, b9, b10);
        let (d1, c_next) = V::csa(c2, c3, c4);
        let (e, d_next) = V::csa(d, d0, d1);
        (a, b, c, d) = (a_next, b_next, c_next, d_next);

        bank.reserve::<T>(chunk_load, counts);
        for &plane in e.words().as_ref() {
            bank.add_plane(plane, 16);
        }
    }

    // Fold the leftover d:c:b:a planes, at most 15 per lane
    bank.reserve::<T>((15 * lanes) as u8, counts);
    let planes = (a.words(), b.words(), c.words(), d.words());
    for (((&a, &b), &c), &d) in planes
        .0
        .as_ref()
        .iter()
        .zip(planes.1.as_ref())
        .zip(planes.2.as_ref())
        .zip(planes.3.as_ref())
    {
        bank.add_nibbles(transpose(a, b, c, d));
    }
    bank.flush::<T>(counts);

    let processed = (HEAD_BLOCK + CHUNK * num_chunks) * lanes * WORD;
    misalignment + bytes.len() - processed
}
// ANCHOR_END: count_words

// ANCHOR: transpose
/// Interleave four bit-planes into per-lane 4-bit counts
///
/// Nibble `j` of the `k`-th output is `d:c:b:a` of bit lane `4 * j + k`.
///
#[inline(always)]
fn transpose(a: u64, b: u64, c: u64, d: u64) -> [u64; 4] {
    const EVEN_BITS: u64 = 0x5555_5555_5555_5555;
    const ODD_BITS: u64 = 0xaaaa_aaaa_aaaa_aaaa;
    const LOW_PAIRS: u64 = 0x3333_3333_3333_3333;
    const HIGH_PAIRS: u64 = 0xcccc_cccc_cccc_cccc;

    let ba0 = a & EVEN_BITS | b << 1 & ODD_BITS;
    let ba1 = a >> 1 & EVEN_BITS | b & ODD_BITS;
    let dc0 = c & EVEN_BITS | d << 1 & ODD_BITS;
    let dc1 = c >> 1 & EVEN_BITS | d & ODD_BITS;

    let dcba0 = ba0 & LOW_PAIRS | dc0 << 2 & HIGH_PAIRS;
    let dcba1 = ba0 >> 2 & LOW_PAIRS | dc0 & HIGH_PAIRS;
    let dcba2 = ba1 & LOW_PAIRS | dc1 << 2 & HIGH_PAIRS;
    let dcba3 = ba1 >> 2 & LOW_PAIRS | dc1 & HIGH_PAIRS;

    [dcba0, dcba2, dcba1, dcba3]
}
// ANCHOR_END: transpose
