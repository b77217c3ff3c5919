//! Value - differentiable scalar handle.

use super::backward::backward;
use super::graph::{NodeId, Op, with_graph};
use std::fmt;
use std::iter::Sum;
use std::marker::PhantomData;
use std::ops::{Add, Div, Mul, Neg, Sub};

/// A handle to one scalar node of the thread-local computation graph.
///
/// `Value` is `Copy`; copies refer to the same node, so using one value in
/// several expressions fans out in the graph. Equality is node identity, not
/// numeric equality.
///
/// # Example
///
/// ```
/// use microtensor::Value;
///
/// let a = Value::new(2.0);
/// let b = Value::new(-3.0);
/// let c = a * b + a;
/// c.backward();
///
/// assert_eq!(c.value(), -4.0);
/// assert_eq!(a.grad(), -2.0); // b + 1
/// assert_eq!(b.grad(), 2.0);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Value {
    id: NodeId,
    // Handles index a thread-local arena.
    _not_send: PhantomData<*const ()>,
}

impl Value {
    /// Create a leaf node.
    pub fn new(value: f64) -> Self {
        Self::from_id(with_graph(|g| g.create_leaf(value)))
    }

    /// Create a labeled leaf node.
    pub fn labeled(value: f64, label: impl Into<String>) -> Self {
        Self::new(value).with_label(label)
    }

    pub(crate) fn from_id(id: NodeId) -> Self {
        Self {
            id,
            _not_send: PhantomData,
        }
    }

    fn unary(self, value: f64, op: Op) -> Self {
        Self::from_id(with_graph(|g| g.create_node(value, op, &[self.id])))
    }

    fn binary(self, other: Value, value: f64, op: Op) -> Self {
        Self::from_id(with_graph(|g| g.create_node(value, op, &[self.id, other.id])))
    }

    /// Set the diagnostic label and return the same handle.
    pub fn with_label(self, label: impl Into<String>) -> Self {
        let label = label.into();
        with_graph(|g| g.set_label(self.id, label));
        self
    }

    /// Node id in the computation graph.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Current scalar value.
    pub fn value(&self) -> f64 {
        with_graph(|g| g.node(self.id).value())
    }

    /// Accumulated gradient.
    pub fn grad(&self) -> f64 {
        with_graph(|g| g.node(self.id).grad())
    }

    /// Overwrite the scalar value. Dependent nodes are not recomputed.
    pub fn set_value(&self, value: f64) {
        with_graph(|g| g.set_value(self.id, value));
    }

    /// Overwrite the accumulated gradient.
    pub fn set_grad(&self, grad: f64) {
        with_graph(|g| g.set_grad(self.id, grad));
    }

    /// Reset the gradient to zero.
    pub fn zero_grad(&self) {
        self.set_grad(0.0);
    }

    /// Operation that produced this node.
    pub fn op(&self) -> Op {
        with_graph(|g| g.node(self.id).op())
    }

    /// Direct inputs of this node, in operand order.
    pub fn parents(&self) -> Vec<Value> {
        with_graph(|g| {
            g.node(self.id)
                .parents()
                .iter()
                .map(|&id| Value::from_id(id))
                .collect()
        })
    }

    /// Diagnostic label; empty when none was set.
    pub fn label(&self) -> String {
        with_graph(|g| g.node(self.id).label().to_string())
    }

    /// Raise to a constant power. No gradient flows into the exponent.
    pub fn pow(self, exponent: f64) -> Value {
        self.unary(self.value().powf(exponent), Op::Pow(exponent))
    }

    /// Hyperbolic tangent.
    pub fn tanh(self) -> Value {
        self.unary(self.value().tanh(), Op::Tanh)
    }

    /// Natural exponential.
    pub fn exp(self) -> Value {
        self.unary(self.value().exp(), Op::Exp)
    }

    /// Natural logarithm. Non-positive inputs give `-inf`/`NaN`.
    pub fn log(self) -> Value {
        self.unary(self.value().ln(), Op::Log)
    }

    /// Backpropagate from this node. See [`backward`](super::backward).
    pub fn backward(self) {
        backward(self);
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (value, grad, op) = with_graph(|g| {
            let node = g.node(self.id);
            (node.value(), node.grad(), node.op())
        });
        f.debug_struct("Value")
            .field("id", &self.id.index())
            .field("value", &value)
            .field("grad", &grad)
            .field("op", &op)
            .finish()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (label, value, grad) = with_graph(|g| {
            let node = g.node(self.id);
            (node.label().to_string(), node.value(), node.grad())
        });
        if label.is_empty() {
            write!(f, "Value(data={value}, grad={grad})")
        } else {
            write!(f, "{label}: Value(data={value}, grad={grad})")
        }
    }
}

impl Add for Value {
    type Output = Value;

    fn add(self, rhs: Value) -> Value {
        let value = self.value() + rhs.value();
        self.binary(rhs, value, Op::Add)
    }
}

impl Mul for Value {
    type Output = Value;

    fn mul(self, rhs: Value) -> Value {
        let value = self.value() * rhs.value();
        self.binary(rhs, value, Op::Mul)
    }
}

// neg, sub and div are compositions of the primitives above.

impl Neg for Value {
    type Output = Value;

    fn neg(self) -> Value {
        self * Value::new(-1.0)
    }
}

impl Sub for Value {
    type Output = Value;

    fn sub(self, rhs: Value) -> Value {
        self + (-rhs)
    }
}

impl Div for Value {
    type Output = Value;

    /// Not guarded against a zero divisor: follows `powf(-1.0)`.
    fn div(self, rhs: Value) -> Value {
        self * rhs.pow(-1.0)
    }
}

macro_rules! impl_scalar_ops {
    ($($trait:ident :: $method:ident),*) => {
        $(
            impl $trait<f64> for Value {
                type Output = Value;

                fn $method(self, rhs: f64) -> Value {
                    $trait::$method(self, Value::new(rhs))
                }
            }

            impl $trait<Value> for f64 {
                type Output = Value;

                fn $method(self, rhs: Value) -> Value {
                    $trait::$method(Value::new(self), rhs)
                }
            }
        )*
    };
}

impl_scalar_ops!(Add::add, Sub::sub, Mul::mul, Div::div);

impl Sum for Value {
    /// Differentiable sum, starting from a `0.0` leaf.
    fn sum<I: Iterator<Item = Value>>(iter: I) -> Value {
        iter.fold(Value::new(0.0), |acc, v| acc + v)
    }
}
