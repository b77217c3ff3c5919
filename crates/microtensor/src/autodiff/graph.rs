//! Computation graph for reverse-mode automatic differentiation.
//!
//! Nodes live in an append-only arena and refer to their inputs by
//! [`NodeId`]. A node can only be created from nodes that already exist, so
//! every parent index is strictly smaller than the index of its child and the
//! graph is acyclic by construction.

use smallvec::SmallVec;
use std::cell::RefCell;
use std::fmt::Debug;
use tracing::debug;

/// Unique identifier for a node in the computation graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Get the internal index.
    pub fn index(&self) -> usize {
        self.0
    }

    /// Create a NodeId for testing purposes.
    #[cfg(test)]
    pub(crate) fn new_for_test(index: usize) -> Self {
        Self(index)
    }
}

/// The operation that produced a node.
///
/// Replaces a per-node backward closure: the backward pass looks up the
/// local derivative of each variant in [`Op::local_gradients`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Op {
    /// Input or constant; no parents.
    Leaf,
    /// `a + b`
    Add,
    /// `a * b`
    Mul,
    /// `a ^ exponent`, exponent is a plain constant.
    Pow(f64),
    /// `tanh(a)`
    Tanh,
    /// `e ^ a`
    Exp,
    /// `ln(a)`
    Log,
}

impl Op {
    /// Short diagnostic tag for the operation.
    pub fn name(&self) -> &'static str {
        match self {
            Op::Leaf => "",
            Op::Add => "+",
            Op::Mul => "*",
            Op::Pow(_) => "^",
            Op::Tanh => "tanh",
            Op::Exp => "exp",
            Op::Log => "log",
        }
    }

    /// Partial derivative of the output with respect to each input.
    ///
    /// `inputs` holds the parents' values in operand order and `output` is
    /// the value of the node itself. The result has one entry per input.
    pub fn local_gradients(&self, inputs: &[f64], output: f64) -> SmallVec<[f64; 2]> {
        match (*self, inputs) {
            (Op::Add, [_, _]) => SmallVec::from_buf([1.0, 1.0]),
            (Op::Mul, [a, b]) => SmallVec::from_buf([*b, *a]),
            (Op::Pow(exponent), [a]) => {
                smallvec::smallvec![exponent * a.powf(exponent - 1.0)]
            }
            (Op::Tanh, [_]) => smallvec::smallvec![1.0 - output * output],
            (Op::Exp, [_]) => smallvec::smallvec![output],
            (Op::Log, [a]) => smallvec::smallvec![1.0 / a],
            _ => SmallVec::new(),
        }
    }
}

/// A node in the computation graph.
#[derive(Debug, Clone)]
pub struct Node {
    value: f64,
    grad: f64,
    op: Op,
    /// Operands in order. The same id may appear twice (`a + a`).
    parents: SmallVec<[NodeId; 2]>,
    label: String,
}

impl Node {
    /// Current scalar value.
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Accumulated gradient.
    pub fn grad(&self) -> f64 {
        self.grad
    }

    /// Operation that produced this node.
    pub fn op(&self) -> Op {
        self.op
    }

    /// Input node ids, in operand order.
    pub fn parents(&self) -> &[NodeId] {
        &self.parents
    }

    /// Diagnostic label, empty unless set.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Check whether this node is a leaf.
    pub fn is_leaf(&self) -> bool {
        self.parents.is_empty()
    }
}

/// Thread-local computation graph.
///
/// Stores every scalar node created on the current thread.
pub struct ComputationGraph {
    nodes: Vec<Node>,
}

impl ComputationGraph {
    /// Create a new empty computation graph.
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    /// Create a leaf node.
    pub fn create_leaf(&mut self, value: f64) -> NodeId {
        self.push(value, Op::Leaf, SmallVec::new())
    }

    /// Create a computed node from existing parents.
    ///
    /// # Panics
    ///
    /// Panics if a parent id does not belong to this graph.
    pub fn create_node(&mut self, value: f64, op: Op, parents: &[NodeId]) -> NodeId {
        for parent in parents {
            assert!(
                parent.index() < self.nodes.len(),
                "parent {parent:?} is not part of the computation graph"
            );
        }
        self.push(value, op, SmallVec::from_slice(parents))
    }

    fn push(&mut self, value: f64, op: Op, parents: SmallVec<[NodeId; 2]>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            value,
            grad: 0.0,
            op,
            parents,
            label: String::new(),
        });
        id
    }

    /// Get node by ID.
    pub fn get_node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    /// Get node by ID.
    ///
    /// # Panics
    ///
    /// Panics on a stale id, i.e. one created before [`clear_graph`].
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    pub fn set_value(&mut self, id: NodeId, value: f64) {
        self.node_mut(id).value = value;
    }

    pub fn set_grad(&mut self, id: NodeId, grad: f64) {
        self.node_mut(id).grad = grad;
    }

    /// Add `delta` to the node's gradient.
    pub fn accumulate_grad(&mut self, id: NodeId, delta: f64) {
        self.node_mut(id).grad += delta;
    }

    pub fn set_label(&mut self, id: NodeId, label: String) {
        self.node_mut(id).label = label;
    }

    /// Reset every gradient in the graph to zero.
    pub fn zero_grad(&mut self) {
        for node in &mut self.nodes {
            node.grad = 0.0;
        }
    }

    /// Get all nodes.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Drop every node. Outstanding handles become invalid.
    pub fn clear(&mut self) {
        self.nodes.clear();
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if graph is empty.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl Default for ComputationGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for ComputationGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComputationGraph")
            .field("num_nodes", &self.nodes.len())
            .finish()
    }
}

thread_local! {
    static GRAPH: RefCell<ComputationGraph> = RefCell::new(ComputationGraph::new());
}

/// Access the thread-local computation graph.
///
/// The closure must not call back into `with_graph`; every `Value` accessor
/// does, so pass plain ids and numbers across the boundary.
///
/// # Example
///
/// ```
/// use microtensor::autodiff::with_graph;
///
/// let count = with_graph(|graph| {
///     graph.create_leaf(1.0);
///     graph.len()
/// });
/// assert!(count >= 1);
/// ```
pub fn with_graph<R>(f: impl FnOnce(&mut ComputationGraph) -> R) -> R {
    GRAPH.with(|g| f(&mut g.borrow_mut()))
}

/// Clear the thread-local computation graph.
///
/// Every `Value` created on this thread before the call is invalidated.
pub fn clear_graph() {
    let dropped = with_graph(|g| {
        let len = g.len();
        g.clear();
        len
    });
    debug!(dropped, "cleared computation graph");
}

/// Zero the gradient of every node on this thread.
pub fn zero_grad_all() {
    with_graph(|g| g.zero_grad());
}
