//! Matrix product of rank-2 tensors.

use crate::autodiff::Value;
use crate::error::{Result, TensorError};
use crate::tensor::Tensor;
use tracing::trace;

/// Compute `a @ b` for an `[m, k]` and a `[k, n]` tensor.
///
/// Plain triple loop; every output cell is a graph node built from the
/// operands with scalar multiplications and additions, so gradients flow back
/// into both inputs.
///
/// # Errors
///
/// Returns error if:
/// - Either operand is not rank 2
/// - The inner dimensions differ
///
/// # Example
///
/// ```
/// use microtensor::{Tensor, matmul};
///
/// let a = Tensor::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]).unwrap();
/// let b = Tensor::from_vec(vec![7.0, 8.0, 9.0, 10.0, 11.0, 12.0], &[3, 2]).unwrap();
/// let c = matmul(&a, &b).unwrap();
/// assert_eq!(c.shape(), &[2, 2]);
/// assert_eq!(c.values(), vec![58.0, 64.0, 139.0, 154.0]);
/// ```
pub fn matmul(a: &Tensor, b: &Tensor) -> Result<Tensor> {
    for operand in [a, b] {
        if operand.ndim() != 2 {
            return Err(TensorError::RankMismatch {
                expected: 2,
                actual: operand.ndim(),
            });
        }
    }

    let (m, k1) = (a.shape()[0], a.shape()[1]);
    let (k2, n) = (b.shape()[0], b.shape()[1]);
    if k1 != k2 {
        return Err(TensorError::MatmulShapeMismatch { m, k1, k2, n });
    }
    trace!(m, k = k1, n, "matmul");

    let lhs = a.data();
    let rhs = b.data();
    let mut storage: Vec<Value> = Vec::with_capacity(m * n);
    for i in 0..m {
        for j in 0..n {
            let cell = (0..k1)
                .map(|k| lhs[i * k1 + k] * rhs[k * n + j])
                .sum::<Value>();
            storage.push(cell);
        }
    }

    Ok(Tensor::from_parts(vec![m, n], storage))
}
