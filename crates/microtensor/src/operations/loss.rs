//! Softmax, losses and target encoding.

use super::normalize::normalize;
use crate::autodiff::Value;
use crate::error::{Result, TensorError};
use crate::tensor::Tensor;

/// Exponentiate every element, then normalize along the last axis.
///
/// Not shifted by the row maximum, so very large logits overflow.
///
/// # Example
///
/// ```
/// use microtensor::{Tensor, softmax};
///
/// let logits = Tensor::from_vec(vec![0.0, 0.0, 2f64.ln(), 0.0], &[2, 2]).unwrap();
/// let probs = softmax(&logits).unwrap();
/// assert_eq!(probs.row(&[0]).unwrap().values(), vec![0.5, 0.5]);
/// ```
pub fn softmax(logits: &Tensor) -> Result<Tensor> {
    normalize(&logits.map(|x, _| x.exp()))
}

/// Mean negative log-likelihood of integer class targets.
///
/// `logits` has shape `[n, classes]`; row `i` is scored against class
/// `targets[i]`. Computes `-mean(log(softmax(logits)[i, targets[i]]))`,
/// differentiable back into `logits`.
///
/// # Errors
///
/// Returns error if:
/// - `logits` is not rank 2
/// - `targets.len()` differs from the number of rows
/// - `logits` has no rows
/// - A target is not a valid class index
pub fn cross_entropy(logits: &Tensor, targets: &[usize]) -> Result<Value> {
    if logits.ndim() != 2 {
        return Err(TensorError::RankMismatch {
            expected: 2,
            actual: logits.ndim(),
        });
    }
    let rows = logits.shape()[0];
    if targets.len() != rows {
        return Err(TensorError::ShapeMismatch {
            expected: rows,
            actual: targets.len(),
        });
    }
    if rows == 0 {
        return Err(TensorError::EmptyBatch);
    }

    let probs = softmax(logits)?;
    let mut log_likelihood = Vec::with_capacity(rows);
    for (i, &target) in targets.iter().enumerate() {
        log_likelihood.push(probs.at(&[i, target])?.log());
    }
    let total: Value = log_likelihood.into_iter().sum();
    Ok(-(total / rows as f64))
}

/// Sum of squared differences over paired predictions and targets.
///
/// Pairs beyond the shorter slice are ignored.
pub fn mse_loss(predictions: &[Value], targets: &[Value]) -> Value {
    predictions
        .iter()
        .zip(targets)
        .map(|(&prediction, &target)| (target - prediction).pow(2.0))
        .sum()
}

/// One row per index with a single `1.0` in that index's column.
///
/// # Errors
///
/// Returns `TensorError::IndexOutOfBounds` if an index is not below
/// `num_classes`.
///
/// # Example
///
/// ```
/// use microtensor::one_hot;
///
/// let t = one_hot(&[2, 0], 3).unwrap();
/// assert_eq!(t.shape(), &[2, 3]);
/// assert_eq!(t.values(), vec![0.0, 0.0, 1.0, 1.0, 0.0, 0.0]);
/// ```
pub fn one_hot(indices: &[usize], num_classes: usize) -> Result<Tensor> {
    if let Some(&index) = indices.iter().find(|&&i| i >= num_classes) {
        return Err(TensorError::IndexOutOfBounds {
            axis: 1,
            index,
            dim_size: num_classes,
        });
    }
    Tensor::from_fn(&[indices.len(), num_classes], |c| {
        if indices[c[0]] == c[1] { 1.0 } else { 0.0 }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autodiff::clear_graph;
    use approx::assert_relative_eq;

    #[test]
    fn test_softmax_rows_sum_to_one() {
        clear_graph();
        let logits = Tensor::from_vec(vec![1.0, 2.0, 3.0, -1.0, 0.0, 4.0], &[2, 3]).unwrap();
        let probs = softmax(&logits).unwrap();
        for i in 0..2 {
            let total: f64 = probs.row(&[i]).unwrap().values().iter().sum();
            assert_relative_eq!(total, 1.0, epsilon = 1e-12);
        }
        let denom = 1f64.exp() + 2f64.exp() + 3f64.exp();
        assert_relative_eq!(
            probs.at(&[0, 2]).unwrap().value(),
            3f64.exp() / denom,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_cross_entropy_uniform_logits() {
        clear_graph();
        let logits = Tensor::zeros(&[2, 4]).unwrap();
        let loss = cross_entropy(&logits, &[1, 3]).unwrap();
        assert_relative_eq!(loss.value(), 4f64.ln(), epsilon = 1e-12);
    }

    #[test]
    fn test_cross_entropy_gradient_is_softmax_minus_one_hot() {
        clear_graph();
        let logits = Tensor::from_vec(vec![0.5, -1.0, 2.0, 1.0, 1.0, 0.0], &[2, 3]).unwrap();
        let targets = [2, 0];
        let loss = cross_entropy(&logits, &targets).unwrap();
        loss.backward();

        let probs: Vec<f64> = {
            let p = softmax(&logits).unwrap();
            p.values()
        };
        let grads = logits.grads();
        for i in 0..2 {
            for j in 0..3 {
                let indicator = if targets[i] == j { 1.0 } else { 0.0 };
                let expected = (probs[i * 3 + j] - indicator) / 2.0;
                assert_relative_eq!(grads[i * 3 + j], expected, epsilon = 1e-10);
            }
        }
    }

    #[test]
    fn test_cross_entropy_errors() {
        clear_graph();
        let logits = Tensor::zeros(&[2, 3]).unwrap();
        assert_eq!(
            cross_entropy(&logits, &[0]).unwrap_err(),
            TensorError::ShapeMismatch {
                expected: 2,
                actual: 1
            }
        );
        assert!(matches!(
            cross_entropy(&logits, &[0, 3]).unwrap_err(),
            TensorError::IndexOutOfBounds { axis: 1, index: 3, .. }
        ));
        let flat = Tensor::zeros(&[3]).unwrap();
        assert!(cross_entropy(&flat, &[0, 1, 2]).is_err());
        let empty = Tensor::zeros(&[0, 3]).unwrap();
        assert_eq!(
            cross_entropy(&empty, &[]).unwrap_err(),
            TensorError::EmptyBatch
        );
    }

    #[test]
    fn test_mse_loss() {
        clear_graph();
        let predictions = [Value::new(1.0), Value::new(2.0)];
        let targets = [Value::new(1.5), Value::new(0.0)];
        let loss = mse_loss(&predictions, &targets);
        assert_relative_eq!(loss.value(), 0.25 + 4.0, epsilon = 1e-12);

        loss.backward();
        // d/dp (t - p)^2 = -2 (t - p)
        assert_relative_eq!(predictions[0].grad(), -1.0, epsilon = 1e-12);
        assert_relative_eq!(predictions[1].grad(), 4.0, epsilon = 1e-12);
    }

    #[test]
    fn test_one_hot() {
        clear_graph();
        let t = one_hot(&[1, 0, 2], 3).unwrap();
        assert_eq!(t.shape(), &[3, 3]);
        assert_eq!(t.row(&[0]).unwrap().values(), vec![0.0, 1.0, 0.0]);
        assert_eq!(t.row(&[2]).unwrap().values(), vec![0.0, 0.0, 1.0]);
        assert!(one_hot(&[3], 3).is_err());
    }
}
