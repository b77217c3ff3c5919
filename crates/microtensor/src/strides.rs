//! Stride computation utilities.
//!
//! Uses row-major (C) order: the last axis is contiguous.

/// Compute row-major strides from shape.
///
/// For shape [d0, d1, d2], returns strides [d1*d2, d2, 1]. Each stride is the
/// product of the dimensions strictly to the right of its axis.
///
/// # Examples
///
/// ```
/// use microtensor::strides::compute_strides;
///
/// assert_eq!(compute_strides(&[3, 4, 5]), vec![20, 5, 1]);
/// assert_eq!(compute_strides(&[2, 3]), vec![3, 1]);
/// assert_eq!(compute_strides(&[5]), vec![1]);
/// assert_eq!(compute_strides(&[]), Vec::<usize>::new());
/// ```
pub fn compute_strides(shape: &[usize]) -> Vec<usize> {
    let mut strides = vec![0; shape.len()];
    let mut stride = 1;

    for (axis, &dim) in shape.iter().enumerate().rev() {
        strides[axis] = stride;
        stride *= dim;
    }

    strides
}

/// Convert cartesian indices to a linear offset.
///
/// Does not validate the indices; callers check arity and bounds first.
#[inline]
pub fn cartesian_to_linear(indices: &[usize], strides: &[usize]) -> usize {
    indices
        .iter()
        .zip(strides.iter())
        .map(|(&idx, &stride)| idx * stride)
        .sum()
}

/// Convert a linear offset back to cartesian indices.
///
/// Divide-and-mod cascade over the strides, most significant axis first.
pub fn linear_to_cartesian(mut linear: usize, strides: &[usize]) -> Vec<usize> {
    let mut indices = Vec::with_capacity(strides.len());

    for &stride in strides {
        indices.push(linear / stride);
        linear %= stride;
    }

    indices
}
