//! N-dimensional tensor of differentiable scalars.
//!
//! Storage is a flat row-major `Vec<Value>`; the last axis is contiguous, so
//! every last-axis row is a contiguous run of storage.

use crate::autodiff::Value;
use crate::error::{Result, TensorError};
use crate::operations::{self, Slice};
use crate::strides::{cartesian_to_linear, compute_strides, linear_to_cartesian};
use std::fmt;

/// One element supplied to or produced by a tensor operation.
///
/// A number becomes a fresh leaf node; a node is stored as is.
#[derive(Debug, Clone, Copy)]
pub enum Element {
    Number(f64),
    Node(Value),
}

impl Element {
    /// Resolve into a graph node, creating a leaf for a plain number.
    pub fn into_value(self) -> Value {
        match self {
            Element::Number(x) => Value::new(x),
            Element::Node(v) => v,
        }
    }
}

impl From<f64> for Element {
    fn from(x: f64) -> Self {
        Element::Number(x)
    }
}

impl From<Value> for Element {
    fn from(v: Value) -> Self {
        Element::Node(v)
    }
}

/// How to populate a new tensor.
pub enum Fill<'a> {
    /// Every element is a new leaf holding this number.
    Constant(f64),
    /// Every element is a new leaf holding the node's current value.
    NodeCopy(Value),
    /// Called once per element, in storage order, with its coordinates.
    Generator(Box<dyn FnMut(&[usize]) -> Element + 'a>),
}

impl From<f64> for Fill<'_> {
    fn from(x: f64) -> Self {
        Fill::Constant(x)
    }
}

impl From<Value> for Fill<'_> {
    fn from(v: Value) -> Self {
        Fill::NodeCopy(v)
    }
}

impl fmt::Debug for Fill<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fill::Constant(x) => f.debug_tuple("Constant").field(x).finish(),
            Fill::NodeCopy(v) => f.debug_tuple("NodeCopy").field(v).finish(),
            Fill::Generator(_) => f.write_str("Generator(..)"),
        }
    }
}

/// A fixed-shape, stride-addressed container of [`Value`]s.
///
/// Cloning a tensor copies the handles, so the clone shares nodes with the
/// original.
#[derive(Debug, Clone)]
pub struct Tensor {
    shape: Vec<usize>,
    strides: Vec<usize>,
    storage: Vec<Value>,
}

impl Tensor {
    /// Create a tensor and populate every element from `fill`.
    ///
    /// # Errors
    ///
    /// Returns `TensorError::EmptyShape` if `shape` is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use microtensor::{Element, Fill, Tensor};
    ///
    /// let t = Tensor::new(&[2, 3], 1.0).unwrap();
    /// assert_eq!(t.values(), vec![1.0; 6]);
    ///
    /// let counter = Fill::Generator(Box::new(|c: &[usize]| Element::Number((c[0] * 2 + c[1]) as f64)));
    /// let t = Tensor::new(&[2, 2], counter).unwrap();
    /// assert_eq!(t.values(), vec![0.0, 1.0, 2.0, 3.0]);
    /// ```
    pub fn new<'a>(shape: &[usize], fill: impl Into<Fill<'a>>) -> Result<Self> {
        if shape.is_empty() {
            return Err(TensorError::EmptyShape);
        }

        let strides = compute_strides(shape);
        let len: usize = shape.iter().product();
        let storage = match fill.into() {
            Fill::Constant(x) => (0..len).map(|_| Value::new(x)).collect(),
            Fill::NodeCopy(node) => {
                let x = node.value();
                (0..len).map(|_| Value::new(x)).collect()
            }
            Fill::Generator(mut generate) => (0..len)
                .map(|offset| generate(&linear_to_cartesian(offset, &strides)).into_value())
                .collect(),
        };

        Ok(Self {
            shape: shape.to_vec(),
            strides,
            storage,
        })
    }

    /// Create a tensor of zero-valued leaves.
    pub fn zeros(shape: &[usize]) -> Result<Self> {
        Self::new(shape, Fill::Constant(0.0))
    }

    /// Create a tensor of leaves holding `value`.
    pub fn full(shape: &[usize], value: f64) -> Result<Self> {
        Self::new(shape, Fill::Constant(value))
    }

    /// Create a tensor from a per-coordinate function.
    ///
    /// # Example
    ///
    /// ```
    /// use microtensor::Tensor;
    ///
    /// let t = Tensor::from_fn(&[2, 3], |c| (c[0] * 10 + c[1]) as f64).unwrap();
    /// assert_eq!(t.at(&[1, 2]).unwrap().value(), 12.0);
    /// ```
    pub fn from_fn<F, E>(shape: &[usize], mut f: F) -> Result<Self>
    where
        F: FnMut(&[usize]) -> E,
        E: Into<Element>,
    {
        Self::new(
            shape,
            Fill::Generator(Box::new(move |coords: &[usize]| -> Element { f(coords).into() })),
        )
    }

    /// Create a tensor of leaves from row-major data.
    ///
    /// # Errors
    ///
    /// Returns `TensorError::ShapeMismatch` if data length doesn't match shape.
    ///
    /// # Example
    ///
    /// ```
    /// use microtensor::Tensor;
    ///
    /// let t = Tensor::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]).unwrap();
    /// assert_eq!(t.at(&[0, 2]).unwrap().value(), 3.0);
    /// assert_eq!(t.at(&[1, 0]).unwrap().value(), 4.0);
    /// ```
    pub fn from_vec(data: Vec<f64>, shape: &[usize]) -> Result<Self> {
        Self::from_values(data.into_iter().map(Value::new).collect(), shape)
    }

    /// Create a tensor over existing nodes (row-major). The nodes are shared.
    pub fn from_values(values: Vec<Value>, shape: &[usize]) -> Result<Self> {
        if shape.is_empty() {
            return Err(TensorError::EmptyShape);
        }
        let expected: usize = shape.iter().product();
        if values.len() != expected {
            return Err(TensorError::ShapeMismatch {
                expected,
                actual: values.len(),
            });
        }
        Ok(Self::from_parts(shape.to_vec(), values))
    }

    /// Assemble a tensor whose storage is already known to fit `shape`.
    pub(crate) fn from_parts(shape: Vec<usize>, storage: Vec<Value>) -> Self {
        debug_assert_eq!(storage.len(), shape.iter().product::<usize>());
        let strides = compute_strides(&shape);
        Self {
            shape,
            strides,
            storage,
        }
    }

    /// Get the shape of the tensor.
    #[inline]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Get the rank (number of dimensions).
    #[inline]
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Get total number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    /// Check if tensor has zero elements (a zero-length axis).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    /// Get strides.
    #[inline]
    pub fn strides(&self) -> &[usize] {
        &self.strides
    }

    /// Get the nodes in storage order.
    #[inline]
    pub fn data(&self) -> &[Value] {
        &self.storage
    }

    /// Flat storage offset of a coordinate tuple.
    ///
    /// # Errors
    ///
    /// Returns `WrongNumberOfIndices` or `IndexOutOfBounds`.
    pub fn flatten(&self, indices: &[usize]) -> Result<usize> {
        if indices.len() != self.ndim() {
            return Err(TensorError::WrongNumberOfIndices {
                expected: self.ndim(),
                actual: indices.len(),
            });
        }
        for (axis, (&index, &dim_size)) in indices.iter().zip(self.shape.iter()).enumerate() {
            if index >= dim_size {
                return Err(TensorError::IndexOutOfBounds {
                    axis,
                    index,
                    dim_size,
                });
            }
        }
        Ok(cartesian_to_linear(indices, &self.strides))
    }

    /// Coordinate tuple of a flat storage offset.
    pub fn unflatten(&self, offset: usize) -> Result<Vec<usize>> {
        if offset >= self.len() {
            return Err(TensorError::OffsetOutOfBounds {
                offset,
                len: self.len(),
            });
        }
        Ok(linear_to_cartesian(offset, &self.strides))
    }

    /// Get the node at the given coordinates.
    pub fn at(&self, indices: &[usize]) -> Result<Value> {
        let offset = self.flatten(indices)?;
        Ok(self.storage[offset])
    }

    /// Replace the element at the given coordinates.
    ///
    /// A number becomes a new leaf; a node is stored by reference.
    pub fn set(&mut self, indices: &[usize], element: impl Into<Element>) -> Result<()> {
        let offset = self.flatten(indices)?;
        let element: Element = element.into();
        self.storage[offset] = element.into_value();
        Ok(())
    }

    /// The last-axis row selected by `prefix` (all coordinates but the last).
    ///
    /// Returns the nodes themselves, not copies.
    ///
    /// # Errors
    ///
    /// Returns `WrongNumberOfIndices` unless `prefix.len() == ndim - 1`, or
    /// `IndexOutOfBounds` for an out-of-range prefix component.
    pub fn vrow(&self, prefix: &[usize]) -> Result<&[Value]> {
        let last = self.ndim() - 1;
        if prefix.len() != last {
            return Err(TensorError::WrongNumberOfIndices {
                expected: last,
                actual: prefix.len(),
            });
        }
        let row_len = self.shape[last];
        let mut indices = prefix.to_vec();
        indices.push(0);
        if row_len == 0 {
            // `flatten` would reject the trailing 0; still validate the prefix.
            for (axis, (&index, &dim_size)) in prefix.iter().zip(self.shape.iter()).enumerate() {
                if index >= dim_size {
                    return Err(TensorError::IndexOutOfBounds {
                        axis,
                        index,
                        dim_size,
                    });
                }
            }
            return Ok(&self.storage[0..0]);
        }
        let start = self.flatten(&indices)?;
        Ok(&self.storage[start..start + row_len])
    }

    /// Rank-1 tensor over the row selected by `prefix`, sharing its nodes.
    ///
    /// # Example
    ///
    /// ```
    /// use microtensor::Tensor;
    ///
    /// let t = Tensor::from_vec(vec![1.0, 2.0, 3.0, 4.0], &[2, 2]).unwrap();
    /// let r = t.row(&[1]).unwrap();
    /// assert_eq!(r.shape(), &[2]);
    /// assert_eq!(r.values(), vec![3.0, 4.0]);
    /// ```
    pub fn row(&self, prefix: &[usize]) -> Result<Tensor> {
        let values = self.vrow(prefix)?.to_vec();
        let len = values.len();
        Ok(Self::from_parts(vec![len], values))
    }

    /// Apply `f` to every element and collect the results into a new tensor.
    ///
    /// `f` receives each node with its coordinates, in storage order.
    pub fn map<F, E>(&self, mut f: F) -> Tensor
    where
        F: FnMut(Value, &[usize]) -> E,
        E: Into<Element>,
    {
        let storage = self
            .storage
            .iter()
            .enumerate()
            .map(|(offset, &node)| {
                let coords = linear_to_cartesian(offset, &self.strides);
                let element: Element = f(node, &coords).into();
                element.into_value()
            })
            .collect();
        Self::from_parts(self.shape.clone(), storage)
    }

    /// Overwrite every element in place.
    ///
    /// The existing nodes are kept; a returned number replaces the node's
    /// value, a returned node has its value and gradient copied over.
    pub fn for_each<F, E>(&mut self, mut f: F)
    where
        F: FnMut(Value, &[usize]) -> E,
        E: Into<Element>,
    {
        for (offset, &node) in self.storage.iter().enumerate() {
            let coords = linear_to_cartesian(offset, &self.strides);
            let element: Element = f(node, &coords).into();
            match element {
                Element::Number(x) => node.set_value(x),
                Element::Node(source) => {
                    node.set_value(source.value());
                    node.set_grad(source.grad());
                }
            }
        }
    }

    /// Differentiable sum of every element.
    pub fn sum(&self) -> Value {
        self.storage.iter().copied().sum()
    }

    /// Per-row normalization along the last axis. See [`operations::normalize`].
    pub fn normalize(&self) -> Result<Tensor> {
        operations::normalize(self)
    }

    /// Select indices along one axis. See [`operations::slice`].
    pub fn slice(&self, axis: usize, spec: Slice) -> Result<Tensor> {
        operations::slice(self, axis, spec)
    }

    /// Zero the gradient of every element.
    pub fn zero_grad(&self) {
        for node in &self.storage {
            node.zero_grad();
        }
    }

    /// Run a backward pass from every element, in storage order.
    ///
    /// Each pass re-seeds its own element; contributions accumulate.
    pub fn backward(&self) {
        for node in &self.storage {
            node.backward();
        }
    }

    /// Current values in storage order.
    pub fn values(&self) -> Vec<f64> {
        self.storage.iter().map(Value::value).collect()
    }

    /// Current gradients in storage order.
    pub fn grads(&self) -> Vec<f64> {
        self.storage.iter().map(Value::grad).collect()
    }

    /// Display adaptor printing gradients in the same layout as `Display`.
    ///
    /// # Example
    ///
    /// ```
    /// use microtensor::Tensor;
    ///
    /// let t = Tensor::from_vec(vec![1.0, 2.0], &[2]).unwrap();
    /// t.sum().backward();
    /// assert_eq!(t.display_grads().to_string(), "[1, 1]");
    /// ```
    pub fn display_grads(&self) -> GradsDisplay<'_> {
        GradsDisplay { tensor: self }
    }
}

/// Gradient view of a [`Tensor`], returned by [`Tensor::display_grads`].
pub struct GradsDisplay<'a> {
    tensor: &'a Tensor,
}

impl fmt::Display for GradsDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_nested(f, &self.tensor.grads(), &self.tensor.shape, 0)
    }
}

impl fmt::Display for Tensor {
    /// Nested brackets, one last-axis row per line.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_nested(f, &self.values(), &self.shape, 0)
    }
}

fn write_nested(
    f: &mut fmt::Formatter<'_>,
    values: &[f64],
    shape: &[usize],
    depth: usize,
) -> fmt::Result {
    if shape.len() == 1 {
        let row: Vec<String> = values.iter().map(|v| v.to_string()).collect();
        return write!(f, "[{}]", row.join(", "));
    }
    let chunk = values.len() / shape[0].max(1);
    f.write_str("[")?;
    for i in 0..shape[0] {
        if i > 0 {
            write!(f, ",\n{}", " ".repeat(depth + 1))?;
        }
        write_nested(f, &values[i * chunk..(i + 1) * chunk], &shape[1..], depth + 1)?;
    }
    f.write_str("]")
}
