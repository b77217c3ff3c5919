//! Error types for microtensor.

use thiserror::Error;

/// Errors that can occur in tensor operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TensorError {
    /// A tensor was requested with no dimensions.
    #[error("a tensor must have at least one dimension")]
    EmptyShape,

    /// Shape mismatch between data length and expected size.
    #[error("shape mismatch: expected {expected} elements, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    /// Index out of bounds.
    #[error("index {index} is out of bounds for axis {axis} with size {dim_size}")]
    IndexOutOfBounds {
        axis: usize,
        index: usize,
        dim_size: usize,
    },

    /// Flat offset past the end of storage.
    #[error("offset {offset} is out of bounds for tensor with {len} elements")]
    OffsetOutOfBounds { offset: usize, len: usize },

    /// Wrong number of indices provided.
    #[error("wrong number of indices: expected {expected}, got {actual}")]
    WrongNumberOfIndices { expected: usize, actual: usize },

    /// Operation requires specific tensor rank.
    #[error("expected tensor of rank {expected}, got rank {actual}")]
    RankMismatch { expected: usize, actual: usize },

    /// Matrix product with mismatched inner dimensions.
    #[error("matmul shape mismatch: [{m}x{k1}] @ [{k2}x{n}], inner dimensions must match")]
    MatmulShapeMismatch {
        m: usize,
        k1: usize,
        k2: usize,
        n: usize,
    },

    /// Axis argument outside `[0, ndim)`.
    #[error("axis {axis} is out of range for tensor with {ndim} dimensions")]
    AxisOutOfRange { axis: usize, ndim: usize },

    /// Mean over a batch with no rows.
    #[error("cannot average a loss over an empty batch")]
    EmptyBatch,

    /// Reduction over a tensor without axes.
    #[error("cannot normalize a tensor with zero dimensions")]
    ZeroRank,

    /// Slice specification with a step of zero.
    #[error("slice step cannot be zero")]
    ZeroSliceStep,
}

/// Convenience result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, TensorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_offender() {
        let err = TensorError::IndexOutOfBounds {
            axis: 1,
            index: 5,
            dim_size: 3,
        };
        assert_eq!(
            err.to_string(),
            "index 5 is out of bounds for axis 1 with size 3"
        );

        let err = TensorError::MatmulShapeMismatch {
            m: 2,
            k1: 3,
            k2: 2,
            n: 2,
        };
        assert!(err.to_string().contains("[2x3] @ [2x2]"));
    }
}
