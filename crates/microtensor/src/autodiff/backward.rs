//! Backward pass execution for reverse-mode automatic differentiation.

use super::graph::{ComputationGraph, NodeId, with_graph};
use super::value::Value;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use smallvec::SmallVec;
use std::collections::HashMap;
use tracing::{debug, trace_span};

/// Execute a backward pass from `root`.
///
/// Seeds `root.grad = 1.0`, then applies every reachable node's local
/// gradient rule exactly once, children before parents. Contributions are
/// added to the existing gradients; nothing is zeroed first, so a second call
/// accumulates on top of the first. Use [`Value::zero_grad`] or
/// [`zero_grad_all`](super::zero_grad_all) between independent passes.
///
/// # Example
///
/// ```
/// use microtensor::Value;
///
/// let x = Value::new(2.0);
/// let y = x.pow(3.0);
/// y.backward();
/// assert_eq!(y.value(), 8.0);
/// assert_eq!(x.grad(), 12.0);
/// ```
pub fn backward(root: Value) {
    let root_id = root.id();
    with_graph(|graph| {
        let _span = trace_span!("backward", root = root_id.index()).entered();

        let order = topological_order(graph, root_id);
        debug!(
            root = root_id.index(),
            nodes = order.len(),
            "running backward pass"
        );

        graph.set_grad(root_id, 1.0);
        for &id in order.iter().rev() {
            propagate(graph, id);
        }
    });
}

/// Apply the local gradient rule of one node to its parents.
fn propagate(graph: &mut ComputationGraph, id: NodeId) {
    let node = graph.node(id);
    if node.is_leaf() {
        return;
    }

    let grad = node.grad();
    let op = node.op();
    let output = node.value();
    let parents: SmallVec<[NodeId; 2]> = SmallVec::from_slice(node.parents());
    let inputs: SmallVec<[f64; 2]> = parents.iter().map(|&p| graph.node(p).value()).collect();

    for (&parent, local) in parents.iter().zip(op.local_gradients(&inputs, output)) {
        graph.accumulate_grad(parent, local * grad);
    }
}

/// Nodes reachable from `root`, ordered so that every node comes after all
/// of its parents.
fn topological_order(graph: &ComputationGraph, root: NodeId) -> Vec<NodeId> {
    let mut dag: DiGraph<NodeId, ()> = DiGraph::new();
    let mut node_to_idx: HashMap<NodeId, NodeIndex> = HashMap::new();
    let mut stack = vec![root];
    node_to_idx.insert(root, dag.add_node(root));

    while let Some(id) = stack.pop() {
        let child_idx = node_to_idx[&id];
        for &parent in graph.node(id).parents() {
            let parent_idx = *node_to_idx.entry(parent).or_insert_with(|| {
                stack.push(parent);
                dag.add_node(parent)
            });
            // Edge from input to output (forward direction)
            dag.add_edge(parent_idx, child_idx, ());
        }
    }

    match toposort(&dag, None) {
        Ok(order) => order.into_iter().map(|idx| dag[idx]).collect(),
        Err(cycle) => unreachable!(
            "computation graph has a cycle through node {:?}",
            dag[cycle.node_id()]
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autodiff::{clear_graph, zero_grad_all};
    use approx::assert_relative_eq;

    #[test]
    fn test_backward_multiply() {
        clear_graph();
        let a = Value::new(2.0);
        let b = Value::new(-3.0);
        let c = a * b;
        c.backward();

        assert_eq!(c.grad(), 1.0);
        assert_eq!(a.grad(), b.value());
        assert_eq!(b.grad(), a.value());
    }

    #[test]
    fn test_backward_fan_out_accumulates() {
        clear_graph();
        let a = Value::new(3.0);
        let b = a + a;
        b.backward();
        assert_eq!(a.grad(), 2.0);
    }

    #[test]
    fn test_backward_pow() {
        clear_graph();
        let x = Value::new(2.0);
        let y = x.pow(3.0);
        y.backward();
        assert_eq!(y.value(), 8.0);
        assert_eq!(x.grad(), 12.0);
    }

    #[test]
    fn test_backward_exp_reaches_input() {
        clear_graph();
        let x = Value::new(0.5);
        let y = x.exp();
        y.backward();
        assert_relative_eq!(x.grad(), 0.5f64.exp(), epsilon = 1e-12);
        assert_eq!(y.grad(), 1.0);
    }

    #[test]
    fn test_backward_tanh() {
        clear_graph();
        let x = Value::new(0.8814);
        let y = x.tanh();
        y.backward();
        let t = 0.8814f64.tanh();
        assert_relative_eq!(x.grad(), 1.0 - t * t, epsilon = 1e-12);
    }

    #[test]
    fn test_backward_divide_and_subtract() {
        clear_graph();
        let a = Value::new(6.0);
        let b = Value::new(3.0);
        let q = a / b;
        q.backward();
        assert_relative_eq!(a.grad(), 1.0 / 3.0, epsilon = 1e-12);
        assert_relative_eq!(b.grad(), -6.0 / 9.0, epsilon = 1e-12);

        zero_grad_all();
        let d = a - b;
        d.backward();
        assert_eq!(a.grad(), 1.0);
        assert_eq!(b.grad(), -1.0);
    }

    #[test]
    fn test_backward_diamond_dag() {
        // f(x) = (x*x) * (x*x), the square is shared
        clear_graph();
        let x = Value::new(2.0);
        let sq = x * x;
        let f = sq * sq;
        f.backward();
        assert_eq!(f.value(), 16.0);
        assert_eq!(x.grad(), 32.0); // 4x^3
        assert_eq!(sq.grad(), 8.0); // 2 * sq
    }

    #[test]
    fn test_backward_neuron() {
        // o = tanh(x1*w1 + x2*w2 + b)
        clear_graph();
        let x1 = Value::labeled(2.0, "x1");
        let x2 = Value::labeled(0.0, "x2");
        let w1 = Value::labeled(-3.0, "w1");
        let w2 = Value::labeled(1.0, "w2");
        let b = Value::labeled(6.881_373_587_019_543, "b");
        let n = x1 * w1 + x2 * w2 + b;
        let o = n.tanh();
        o.backward();

        assert_relative_eq!(o.value(), 0.7071, epsilon = 1e-4);
        assert_relative_eq!(n.grad(), 0.5, epsilon = 1e-4);
        assert_relative_eq!(x1.grad(), -1.5, epsilon = 1e-4);
        assert_relative_eq!(w1.grad(), 1.0, epsilon = 1e-4);
        assert_relative_eq!(x2.grad(), 0.5, epsilon = 1e-4);
        assert_relative_eq!(w2.grad(), 0.0, epsilon = 1e-4);
    }

    #[test]
    fn test_second_backward_accumulates() {
        clear_graph();
        let a = Value::new(2.0);
        let b = Value::new(5.0);
        let c = a * b;
        c.backward();
        c.backward();
        assert_eq!(a.grad(), 10.0);
        assert_eq!(b.grad(), 4.0);
        // The root is re-seeded, not accumulated
        assert_eq!(c.grad(), 1.0);
    }

    #[test]
    fn test_backward_ignores_unreachable_nodes() {
        clear_graph();
        let a = Value::new(1.0);
        let unrelated = Value::new(4.0);
        let _other = unrelated * a;
        let y = a * 3.0;
        y.backward();
        assert_eq!(a.grad(), 3.0);
        assert_eq!(unrelated.grad(), 0.0);
    }

    #[test]
    fn test_topological_order_parents_first() {
        clear_graph();
        let a = Value::new(1.0);
        let b = Value::new(2.0);
        let c = a * b;
        let d = c + a;
        let order = with_graph(|g| topological_order(g, d.id()));
        assert_eq!(order.len(), 4);
        let pos = |v: Value| order.iter().position(|&id| id == v.id()).unwrap();
        assert!(pos(a) < pos(c));
        assert!(pos(b) < pos(c));
        assert!(pos(c) < pos(d));
    }
}
