//! Tensor operations.
//!
//! Every operation takes tensors by reference and returns a new tensor:
//!
//! ```text
//! slice      → shares nodes with the source (a view of selected elements)
//! normalize  → new nodes, one division per element
//! matmul     → new nodes, one sum of products per output cell
//! softmax    → exp, then normalize
//! ```
//!
//! Because results are built from graph nodes, gradients flow back through
//! any chain of these operations to the tensors they started from.

mod loss;
mod matmul;
mod normalize;
mod slice;

pub use loss::{cross_entropy, mse_loss, one_hot, softmax};
pub use matmul::matmul;
pub use normalize::normalize;
pub use slice::{Slice, slice};
