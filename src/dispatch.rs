//! Runtime selection of the kernel family
//!
//! Families are listed in priority order, most specialized first. The first
//! one whose CPU features are present gets bound to all four entry points on
//! first use, and stays bound for the rest of the process.
//!
//! Accelerated families are compiled on every build of their architecture,
//! whatever instruction set the build itself targets, and their features are
//! checked on the running CPU. A default x86_64 build thus still runs AVX2
//! kernels on a CPU that has AVX2.

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
use crate::simd::multiversion;
use crate::{network, scalar, simd::BitSlice};
use std::{marker::PhantomData, sync::OnceLock};

/// Environment variable that forces a family by name, read once on first use
pub const FAMILY_ENV: &str = "POSPOP_FAMILY";

// ANCHOR: Family
/// Complete set of positional population count kernels for one instruction
/// set tier
///
/// Every method adds the number of elements of `buf` with bit `b` set into
/// `counts[b]`, without resetting `counts`.
///
pub trait Family: Sync {
    /// Short name of the family, e.g. "avx2"
    fn name(&self) -> &'static str;

    /// Truth that the host CPU can run this family
    fn available(&self) -> bool;

    /// Count the bits of bytes
    fn count8(&self, counts: &mut [u64; 8], buf: &[u8]);

    /// Count the bits of 16-bit integers
    fn count16(&self, counts: &mut [u64; 16], buf: &[u16]);

    /// Count the bits of 32-bit integers
    fn count32(&self, counts: &mut [u64; 32], buf: &[u32]);

    /// Count the bits of 64-bit integers
    fn count64(&self, counts: &mut [u64; 64], buf: &[u64]);
}
// ANCHOR_END: Family

// ANCHOR: BitSliced
/// Family running the adder network over bit-slice vectors of type `V`,
/// for vector types that the build baseline already supports
pub(crate) struct BitSliced<V> {
    /// Family name
    name: &'static str,

    /// CPU feature check
    detect: fn() -> bool,

    /// Bit-slice vector type
    lanes: PhantomData<fn() -> V>,
}
//
impl<V> BitSliced<V> {
    /// Set up a family
    const fn new(name: &'static str, detect: fn() -> bool) -> Self {
        Self {
            name,
            detect,
            lanes: PhantomData,
        }
    }
}
//
impl<V: BitSlice> Family for BitSliced<V> {
    fn name(&self) -> &'static str {
        self.name
    }

    fn available(&self) -> bool {
        (self.detect)()
    }

    fn count8(&self, counts: &mut [u64; 8], buf: &[u8]) {
        network::count::<u8, V>(counts, buf)
    }

    fn count16(&self, counts: &mut [u64; 16], buf: &[u16]) {
        network::count::<u16, V>(counts, buf)
    }

    fn count32(&self, counts: &mut [u64; 32], buf: &[u32]) {
        network::count::<u32, V>(counts, buf)
    }

    fn count64(&self, counts: &mut [u64; 64], buf: &[u64]) {
        network::count::<u64, V>(counts, buf)
    }
}
// ANCHOR_END: BitSliced

/// The scalar fallback, exposed as a family so it can be compared and
/// benchmarked like the others. It is never selected by the dispatcher.
pub struct Scalar;
//
impl Family for Scalar {
    fn name(&self) -> &'static str {
        "scalar"
    }

    fn available(&self) -> bool {
        true
    }

    fn count8(&self, counts: &mut [u64; 8], buf: &[u8]) {
        scalar::count(counts, buf)
    }

    fn count16(&self, counts: &mut [u64; 16], buf: &[u16]) {
        scalar::count(counts, buf)
    }

    fn count32(&self, counts: &mut [u64; 32], buf: &[u32]) {
        scalar::count(counts, buf)
    }

    fn count64(&self, counts: &mut [u64; 64], buf: &[u64]) {
        scalar::count(counts, buf)
    }
}

// ANCHOR: Avx2
/// AVX2 family, four 64-bit lanes per vector
///
/// The kernels are compiled with AVX2 enabled and only entered once the CPU
/// has been found to support it. On other CPUs, the generic family does the
/// work instead.
///
#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
pub(crate) struct Avx2;
//
#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
impl Family for Avx2 {
    fn name(&self) -> &'static str {
        "avx2"
    }

    fn available(&self) -> bool {
        is_x86_feature_detected!("avx2")
    }

    fn count8(&self, counts: &mut [u64; 8], buf: &[u8]) {
        if self.available() {
            // SAFETY: AVX2 support was just checked
            unsafe { multiversion::count(counts, buf) }
        } else {
            GENERIC.count8(counts, buf)
        }
    }

    fn count16(&self, counts: &mut [u64; 16], buf: &[u16]) {
        if self.available() {
            // SAFETY: AVX2 support was just checked
            unsafe { multiversion::count(counts, buf) }
        } else {
            GENERIC.count16(counts, buf)
        }
    }

    fn count32(&self, counts: &mut [u64; 32], buf: &[u32]) {
        if self.available() {
            // SAFETY: AVX2 support was just checked
            unsafe { multiversion::count(counts, buf) }
        } else {
            GENERIC.count32(counts, buf)
        }
    }

    fn count64(&self, counts: &mut [u64; 64], buf: &[u64]) {
        if self.available() {
            // SAFETY: AVX2 support was just checked
            unsafe { multiversion::count(counts, buf) }
        } else {
            GENERIC.count64(counts, buf)
        }
    }
}
// ANCHOR_END: Avx2

// ANCHOR: registry
/// Portable family, available everywhere
pub(crate) static GENERIC: BitSliced<u64> = BitSliced::new("generic", || true);

/// SSE2 family, two 64-bit lanes per vector
///
/// SSE2 is part of the x86_64 baseline, so this is compiled on every x86_64
/// build and on 32-bit x86 targets from i686 on.
///
#[cfg(all(any(target_arch = "x86", target_arch = "x86_64"), target_feature = "sse2"))]
pub(crate) static SSE2: BitSliced<safe_arch::m128i> =
    BitSliced::new("sse2", || is_x86_feature_detected!("sse2"));

/// AVX2 family
#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
pub(crate) static AVX2: Avx2 = Avx2;

/// Families compiled into this build, most specialized first
static FAMILIES: &[&dyn Family] = &[
    #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
    &AVX2,
    #[cfg(all(any(target_arch = "x86", target_arch = "x86_64"), target_feature = "sse2"))]
    &SSE2,
    &GENERIC,
];

/// List the families compiled into this build, in priority order
///
/// The last one is always the portable generic family.
///
pub fn families() -> &'static [&'static dyn Family] {
    FAMILIES
}
// ANCHOR_END: registry

// ANCHOR: selected
/// Family bound to the public entry points, once resolved
static SELECTED: OnceLock<&'static dyn Family> = OnceLock::new();

/// Family that services the public entry points
///
/// The first call inspects the CPU and binds a family; every later call,
/// including concurrent ones, gets that same family. Calling this early
/// moves the detection cost out of the first count.
///
pub fn selected() -> &'static dyn Family {
    *SELECTED.get_or_init(|| {
        let family = resolve(std::env::var(FAMILY_ENV).ok().as_deref());
        log::debug!("positional popcount bound to the {} family", family.name());
        family
    })
}

/// Family bound to the public entry points, if resolution already happened
pub fn resolved() -> Option<&'static dyn Family> {
    SELECTED.get().copied()
}

/// Pick the family to bind, honoring a requested family name if possible
fn resolve(requested: Option<&str>) -> &'static dyn Family {
    if let Some(name) = requested {
        match families().iter().find(|family| family.name() == name) {
            Some(family) if family.available() => return *family,
            Some(_) => log::warn!("{FAMILY_ENV}={name} is not supported by this CPU, ignoring it"),
            None => log::warn!("{FAMILY_ENV}={name} is not a known family, ignoring it"),
        }
    }
    families()
        .iter()
        .copied()
        .find(|family| family.available())
        .unwrap_or(&GENERIC)
}
// ANCHOR_END: selected
