use crate::element::Element;

// ANCHOR: scalar
/// Count set bits one element and one bit position at a time
///
/// This is the reference against which every kernel family is checked, and
/// what kernels use for the elements that do not fill a whole block.
///
pub fn count<T: Element>(counts: &mut [u64], buf: &[T]) {
    debug_assert_eq!(counts.len(), T::WIDTH);
    for &element in buf {
        for (bit, count) in counts.iter_mut().enumerate() {
            *count += u64::from((element >> bit) & T::one() == T::one());
        }
    }
}
// ANCHOR_END: scalar
