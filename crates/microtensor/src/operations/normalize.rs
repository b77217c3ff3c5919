//! Last-axis normalization.

use crate::autodiff::Value;
use crate::error::{Result, TensorError};
use crate::tensor::Tensor;
use tracing::trace;

/// Divide every element by the sum of its last-axis row.
///
/// A row is the group of elements sharing every coordinate but the last; a
/// rank-1 tensor is a single row. Row sums are built from the elements with
/// differentiable additions, so gradients flow through the normalization.
/// Turns count tables into row-stochastic probability tables.
///
/// A row summing to zero yields non-finite values.
///
/// # Errors
///
/// Returns `TensorError::ZeroRank` for a tensor with no axes.
///
/// # Example
///
/// ```
/// use microtensor::Tensor;
///
/// let counts = Tensor::from_vec(vec![2.0, 2.0, 1.0, 3.0], &[2, 2]).unwrap();
/// let probs = counts.normalize().unwrap();
/// assert_eq!(probs.values(), vec![0.5, 0.5, 0.25, 0.75]);
/// ```
pub fn normalize(tensor: &Tensor) -> Result<Tensor> {
    let ndim = tensor.ndim();
    if ndim == 0 {
        return Err(TensorError::ZeroRank);
    }

    let row_len = tensor.shape()[ndim - 1];
    let num_rows = if row_len == 0 {
        0
    } else {
        tensor.len() / row_len
    };
    trace!(shape = ?tensor.shape(), num_rows, "normalize");

    // Row-major storage: the element at `offset` belongs to row `offset / row_len`.
    let mut row_sums: Vec<Value> = Vec::with_capacity(num_rows);
    for row in tensor.data().chunks(row_len.max(1)) {
        let total = row
            .iter()
            .fold(Value::new(0.0), |acc, &element| acc + element);
        row_sums.push(total);
    }

    let mut offset = 0;
    Ok(tensor.map(|element, _| {
        let total = row_sums[offset / row_len];
        offset += 1;
        element / total
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autodiff::clear_graph;
    use approx::assert_relative_eq;

    #[test]
    fn test_normalize_rows() {
        clear_graph();
        let t = Tensor::from_vec(vec![2.0, 2.0, 1.0, 3.0], &[2, 2]).unwrap();
        let n = t.normalize().unwrap();
        assert_eq!(n.shape(), &[2, 2]);
        assert_eq!(n.row(&[0]).unwrap().values(), vec![0.5, 0.5]);
        assert_eq!(n.row(&[1]).unwrap().values(), vec![0.25, 0.75]);
        assert_eq!(n.at(&[1, 1]).unwrap().value(), 0.75);
    }

    #[test]
    fn test_normalize_rank_one_is_one_group() {
        clear_graph();
        let t = Tensor::from_vec(vec![1.0, 1.0, 2.0], &[3]).unwrap();
        let n = normalize(&t).unwrap();
        assert_eq!(n.values(), vec![0.25, 0.25, 0.5]);
    }

    #[test]
    fn test_normalize_groups_sum_to_one() {
        clear_graph();
        let t = Tensor::from_fn(&[3, 2, 5], |c| (1 + c[0] * 7 + c[1] * 3 + c[2]) as f64).unwrap();
        let n = t.normalize().unwrap();
        for i in 0..3 {
            for j in 0..2 {
                let total: f64 = n.vrow(&[i, j]).unwrap().iter().map(Value::value).sum();
                assert_relative_eq!(total, 1.0, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_normalize_leaves_source_untouched() {
        clear_graph();
        let t = Tensor::from_vec(vec![1.0, 3.0], &[1, 2]).unwrap();
        let n = t.normalize().unwrap();
        assert_eq!(t.values(), vec![1.0, 3.0]);
        assert_ne!(n.data()[0], t.data()[0]);
    }

    #[test]
    fn test_normalize_is_differentiable() {
        // p0 = a / (a + b); dp0/da = b / (a+b)^2, dp0/db = -a / (a+b)^2
        clear_graph();
        let t = Tensor::from_vec(vec![1.0, 3.0], &[2]).unwrap();
        let n = t.normalize().unwrap();
        n.at(&[0]).unwrap().backward();
        let grads = t.grads();
        assert_relative_eq!(grads[0], 3.0 / 16.0, epsilon = 1e-12);
        assert_relative_eq!(grads[1], -1.0 / 16.0, epsilon = 1e-12);
    }

    #[test]
    fn test_normalize_zero_length_rows() {
        clear_graph();
        let t = Tensor::zeros(&[2, 0]).unwrap();
        let n = t.normalize().unwrap();
        assert_eq!(n.shape(), &[2, 0]);
    }
}
