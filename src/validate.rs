//! Checking kernel families against the scalar fallback

use crate::{dispatch::Family, element::Element, scalar};
use std::fmt;

// ANCHOR: Mismatch
/// Error reported when a family disagrees with the scalar fallback
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Mismatch {
    /// Name of the offending family
    pub family: &'static str,

    /// Element width in bits
    pub width: usize,

    /// Start address of the buffer that was counted
    pub address: usize,

    /// Number of elements in the buffer
    pub len: usize,

    /// Counts computed by the scalar fallback
    pub expected: Vec<u64>,

    /// Counts computed by the family
    pub actual: Vec<u64>,
}
//
impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} count{}: wrong counts for {} elements at {:#x}",
            self.family, self.width, self.len, self.address
        )?;
        for (bit, (expected, actual)) in self.expected.iter().zip(&self.actual).enumerate() {
            if expected != actual {
                write!(f, ", bit {bit}: {actual} instead of {expected}")?;
            }
        }
        Ok(())
    }
}
//
impl std::error::Error for Mismatch {}
// ANCHOR_END: Mismatch

// ANCHOR: check
/// Count `buf` with `family` and with the scalar fallback, and compare
///
/// Both start from the same nonzero counts so that a family which resets
/// its accumulators is caught too.
///
pub fn check<T: Element>(family: &dyn Family, buf: &[T]) -> Result<(), Mismatch> {
    let mut expected: T::Counts = bytemuck::Zeroable::zeroed();
    for (bit, count) in expected.as_mut().iter_mut().enumerate() {
        *count = bit as u64 + 1;
    }
    let mut actual = expected;
    scalar::count(expected.as_mut(), buf);
    T::count_with(family, &mut actual, buf);
    if actual == expected {
        Ok(())
    } else {
        Err(Mismatch {
            family: family.name(),
            width: T::WIDTH,
            address: buf.as_ptr() as usize,
            len: buf.len(),
            expected: expected.as_ref().to_vec(),
            actual: actual.as_ref().to_vec(),
        })
    }
}
// ANCHOR_END: check

// ANCHOR: minimize
/// Shrink a test case on which `family` fails
///
/// Clears every set bit that the failure does not depend on, then drops
/// trailing elements for as long as the case keeps failing. The case is
/// modified in place and the failing prefix is returned, or `None` if the
/// case passes to begin with.
///
pub fn minimize<'case, T: Element>(
    family: &dyn Family,
    mut case: &'case mut [T],
) -> Option<&'case mut [T]> {
    if check(family, case).is_ok() {
        return None;
    }

    for i in (0..case.len()).rev() {
        for bit in (0..T::WIDTH).rev() {
            let mask = T::one() << bit;
            if case[i] & mask == T::zero() {
                continue;
            }
            case[i] = case[i] & !mask;
            if check(family, case).is_ok() {
                case[i] = case[i] | mask;
            }
        }
    }

    while !case.is_empty() && check(family, &case[..case.len() - 1]).is_err() {
        let len = case.len() - 1;
        case = &mut std::mem::take(&mut case)[..len];
    }
    Some(case)
}
// ANCHOR_END: minimize
