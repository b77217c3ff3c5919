//! Tensor slicing along one axis.

use crate::autodiff::Value;
use crate::error::{Result, TensorError};
use crate::strides::cartesian_to_linear;
use crate::tensor::Tensor;
use tracing::trace;

/// Start/end/step selection along a single axis.
///
/// Works like a Python slice: negative `start`/`end` count from the end of
/// the axis, both are clamped into the axis, and `end` is exclusive.
///
/// # Example
///
/// ```
/// use microtensor::Slice;
///
/// let last_three = Slice::new().start(-3);
/// let evens = Slice::new().step(2);
/// let reversed = Slice::new().step(-1);
/// assert_eq!(last_three.indices(10).unwrap(), vec![7, 8, 9]);
/// assert_eq!(evens.indices(5).unwrap(), vec![0, 2, 4]);
/// assert_eq!(reversed.indices(3).unwrap(), vec![2, 1, 0]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slice {
    pub start: Option<isize>,
    pub end: Option<isize>,
    pub step: isize,
}

impl Default for Slice {
    fn default() -> Self {
        Self {
            start: None,
            end: None,
            step: 1,
        }
    }
}

impl Slice {
    /// The full axis, step 1.
    pub fn new() -> Self {
        Self::default()
    }

    /// `start..end` with step 1.
    pub fn range(start: isize, end: isize) -> Self {
        Self::new().start(start).end(end)
    }

    pub fn start(mut self, start: isize) -> Self {
        self.start = Some(start);
        self
    }

    pub fn end(mut self, end: isize) -> Self {
        self.end = Some(end);
        self
    }

    pub fn step(mut self, step: isize) -> Self {
        self.step = step;
        self
    }

    /// The indices selected on an axis of length `len`, in output order.
    ///
    /// With a negative step the walk runs downward; an omitted `start` then
    /// begins at the last index and an omitted `end` runs through index 0.
    ///
    /// # Errors
    ///
    /// Returns `TensorError::ZeroSliceStep` if `step == 0`.
    pub fn indices(&self, len: usize) -> Result<Vec<usize>> {
        if self.step == 0 {
            return Err(TensorError::ZeroSliceStep);
        }

        let len = len as isize;
        let clamp = |bound: isize| {
            if bound < 0 {
                (len + bound).max(0)
            } else {
                bound.min(len)
            }
        };

        let mut indices = Vec::new();
        if self.step > 0 {
            let end = self.end.map_or(len, clamp);
            let mut i = self.start.map_or(0, clamp);
            while i < end {
                indices.push(i as usize);
                match i.checked_add(self.step) {
                    Some(next) => i = next,
                    None => break,
                }
            }
        } else {
            // Stop strictly before `end`; -1 lets the walk include index 0.
            let end = self.end.map_or(-1, clamp);
            let mut i = self.start.map_or(len - 1, |s| clamp(s).min(len - 1));
            while i > end {
                indices.push(i as usize);
                match i.checked_add(self.step) {
                    Some(next) => i = next,
                    None => break,
                }
            }
        }
        Ok(indices)
    }
}

/// Select indices along one axis, keeping every other axis whole.
///
/// The result has the same rank with `shape[axis]` replaced by the number of
/// selected indices. The result shares its nodes with `tensor`, so gradients
/// reaching the slice reach the source.
///
/// # Errors
///
/// Returns error if:
/// - `axis` is not in `[0, ndim)`
/// - `spec.step` is zero
///
/// # Example
///
/// ```
/// use microtensor::{Slice, Tensor};
///
/// let t = Tensor::from_fn(&[4, 3], |c| (c[0] * 3 + c[1]) as f64).unwrap();
/// let rows = t.slice(0, Slice::range(1, 3)).unwrap();
/// assert_eq!(rows.shape(), &[2, 3]);
/// assert_eq!(rows.values(), vec![3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
/// ```
pub fn slice(tensor: &Tensor, axis: usize, spec: Slice) -> Result<Tensor> {
    let ndim = tensor.ndim();
    if axis >= ndim {
        return Err(TensorError::AxisOutOfRange { axis, ndim });
    }

    let selected = spec.indices(tensor.shape()[axis])?;
    let mut new_shape = tensor.shape().to_vec();
    new_shape[axis] = selected.len();
    trace!(?spec, axis, from = ?tensor.shape(), to = ?new_shape, "slice");

    // Walk destination coordinates in row-major order, substituting the
    // selected source index on the sliced axis.
    let total: usize = new_shape.iter().product();
    let mut storage: Vec<Value> = Vec::with_capacity(total);
    let mut dst = vec![0usize; ndim];
    let mut src = vec![0usize; ndim];
    for _ in 0..total {
        src.copy_from_slice(&dst);
        src[axis] = selected[dst[axis]];
        storage.push(tensor.data()[cartesian_to_linear(&src, tensor.strides())]);

        for d in (0..ndim).rev() {
            dst[d] += 1;
            if dst[d] < new_shape[d] {
                break;
            }
            dst[d] = 0;
        }
    }

    Ok(Tensor::from_parts(new_shape, storage))
}
