//! microtensor - scalar autodiff and an n-dimensional tensor built on it
//!
//! Every tensor element is a node in a reverse-mode automatic
//! differentiation graph, so anything computed from tensor elements can be
//! differentiated back to them.
//!
//! # Architecture
//!
//! ```text
//! autodiff    → Value handles over a thread-local graph, backward()
//!     ▲
//! tensor      → shape + row-major strides + Vec<Value>
//!     ▲
//! operations  → slice, normalize, matmul, softmax, losses
//! ```
//!
//! # Example
//!
//! ```
//! use microtensor::{Slice, Tensor, clear_graph};
//!
//! clear_graph();
//! let t = Tensor::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]).unwrap();
//! assert_eq!(t.at(&[1, 2]).unwrap().value(), 6.0);
//!
//! // The last two columns of every row
//! let cols = t.slice(1, Slice::new().start(-2)).unwrap();
//! assert_eq!(cols.values(), vec![2.0, 3.0, 5.0, 6.0]);
//!
//! // Gradients flow back through the slice
//! cols.sum().backward();
//! assert_eq!(t.grads(), vec![0.0, 1.0, 1.0, 0.0, 1.0, 1.0]);
//! ```

pub mod autodiff;
pub mod error;
pub mod operations;
#[cfg(feature = "random")]
pub mod random;
pub mod strides;
pub mod tensor;

pub use autodiff::{Value, backward, clear_graph, zero_grad_all};
pub use error::{Result, TensorError};
pub use operations::{Slice, cross_entropy, matmul, mse_loss, normalize, one_hot, slice, softmax};
pub use tensor::{Element, Fill, GradsDisplay, Tensor};
