//! Scalar reverse-mode automatic differentiation.
//!
//! Every arithmetic operation on a [`Value`] appends a node to a thread-local
//! computation graph recording its inputs and an [`Op`] tag. [`backward`]
//! walks that graph from a root and accumulates gradients into every node the
//! root depends on.
//!
//! # Architecture
//!
//! ```text
//! Value (Copy handle)  ──indexes──►  ComputationGraph (thread_local)
//!                                           │
//!                                           ▼
//!                              Vec<Node { value, grad, op, parents }>
//!                                           │
//!                              backward(): toposort + Op::local_gradients
//! ```
//!
//! # Example
//!
//! ```
//! use microtensor::autodiff::{Value, clear_graph};
//!
//! clear_graph();
//! let a = Value::new(2.0);
//! let b = Value::new(-3.0);
//! let c = a * b;
//! c.backward();
//! assert_eq!(a.grad(), -3.0);
//! assert_eq!(b.grad(), 2.0);
//! ```
//!
//! # Design Notes
//!
//! - Thread-local graph, so `Value` is neither `Send` nor `Sync`
//! - Gradients accumulate across passes until explicitly zeroed
//! - The graph only grows; call [`clear_graph`] between training iterations

mod backward;
mod graph;
mod value;

pub use backward::backward;
pub use graph::{ComputationGraph, Node, NodeId, Op, clear_graph, with_graph, zero_grad_all};
pub use value::Value;
