//! `Value`: an array annotated with differentiation state.

use std::cell::{Ref, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use crate::array::Array;
use crate::autodiff::node::NodeRef;
use crate::dtype::DType;
use crate::error::{GradError, Result};
use crate::operations::add_assign;

/// An array that may participate in reverse- and forward-mode differentiation.
///
/// `Value` is a cheap handle: cloning it shares the same underlying array and
/// annotations. Operations read the array; only the graph builder and the
/// gradient accumulation step write the annotations.
///
/// Invariants:
/// - `grad_node` is `None` iff the value is a leaf or does not require grad.
/// - A value in dual mode always has a tangent with its own shape.
///
/// # Example
///
/// ```
/// use ndgrad::Array;
/// use ndgrad::autodiff::Value;
///
/// let x = Value::leaf(Array::from_vec(vec![1.0, 2.0], &[2]).unwrap()).unwrap();
/// assert!(x.requires_grad());
/// assert!(x.is_leaf());
/// assert!(x.grad().is_none());
/// ```
#[derive(Clone)]
pub struct Value(Rc<ValueInner>);

struct ValueInner {
    data: RefCell<Array>,
    meta: RefCell<Annotations>,
}

struct Annotations {
    requires_grad: bool,
    grad: Option<Value>,
    grad_node: Option<NodeRef>,
    is_leaf: bool,
    tangent: Option<Value>,
    in_dual_mode: bool,
}

/// Non-owning reference to a [`Value`].
#[derive(Clone)]
pub(crate) struct WeakValue(Weak<ValueInner>);

impl WeakValue {
    pub(crate) fn upgrade(&self) -> Option<Value> {
        self.0.upgrade().map(Value)
    }
}

impl Value {
    /// Create a leaf value.
    ///
    /// # Errors
    ///
    /// Returns [`GradError::NotGradCapable`] if `requires_grad` is set on a
    /// non-float element type.
    pub fn new(data: Array, requires_grad: bool) -> Result<Self> {
        check_grad_capable(data.dtype(), requires_grad)?;
        Ok(Self::from_parts(data, requires_grad))
    }

    /// Create a leaf value that requires gradients.
    pub fn leaf(data: Array) -> Result<Self> {
        Self::new(data, true)
    }

    /// Create a leaf value that does not require gradients.
    pub fn constant(data: Array) -> Self {
        Self::from_parts(data, false)
    }

    /// Create a 0-dimensional `f64` constant.
    pub fn scalar(value: f64) -> Self {
        Self::constant(Array::scalar(value))
    }

    /// Create an `f64` leaf from column-major data.
    pub fn from_vec(data: Vec<f64>, shape: &[usize], requires_grad: bool) -> Result<Self> {
        Self::new(Array::from_vec(data, shape)?, requires_grad)
    }

    fn from_parts(data: Array, requires_grad: bool) -> Self {
        Value(Rc::new(ValueInner {
            data: RefCell::new(data),
            meta: RefCell::new(Annotations {
                requires_grad,
                grad: None,
                grad_node: None,
                is_leaf: true,
                tangent: None,
                in_dual_mode: false,
            }),
        }))
    }

    /// Borrow the underlying array.
    pub fn data(&self) -> Ref<'_, Array> {
        self.0.data.borrow()
    }

    /// Clone the underlying array.
    pub fn to_array(&self) -> Array {
        self.0.data.borrow().clone()
    }

    /// Replace the underlying array, e.g. for a parameter update.
    ///
    /// The recorded graph is not revisited; values saved by earlier operations
    /// observe the new data.
    ///
    /// # Errors
    ///
    /// Returns error if the shape or element type differs.
    pub fn set_data(&self, data: Array) -> Result<()> {
        let mut current = self.0.data.borrow_mut();
        if current.shape() != data.shape() {
            return Err(GradError::ReshapeMismatch {
                from: current.shape().to_vec(),
                to: data.shape().to_vec(),
            });
        }
        if current.dtype() != data.dtype() {
            return Err(GradError::InvalidOperation(format!(
                "cannot replace {} data with {}",
                current.dtype(),
                data.dtype()
            )));
        }
        *current = data;
        Ok(())
    }

    /// Shape of the underlying array.
    pub fn shape(&self) -> Vec<usize> {
        self.0.data.borrow().shape().to_vec()
    }

    /// Number of dimensions.
    pub fn ndim(&self) -> usize {
        self.0.data.borrow().ndim()
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.0.data.borrow().len()
    }

    /// Whether the value holds no elements.
    pub fn is_empty(&self) -> bool {
        self.0.data.borrow().is_empty()
    }

    /// Element type.
    pub fn dtype(&self) -> DType {
        self.0.data.borrow().dtype()
    }

    /// The single element of a one-element value.
    pub fn item(&self) -> Result<f64> {
        self.0.data.borrow().item()
    }

    /// Whether gradients flow into (or through) this value.
    pub fn requires_grad(&self) -> bool {
        self.0.meta.borrow().requires_grad
    }

    /// Whether this value was not produced by a recorded operation.
    pub fn is_leaf(&self) -> bool {
        self.0.meta.borrow().is_leaf
    }

    /// Accumulated gradient, if any backward pass reached this leaf.
    pub fn grad(&self) -> Option<Value> {
        self.0.meta.borrow().grad.clone()
    }

    /// Graph node that produced this value.
    pub fn grad_node(&self) -> Option<NodeRef> {
        self.0.meta.borrow().grad_node.clone()
    }

    /// Forward-mode tangent.
    pub fn tangent(&self) -> Option<Value> {
        self.0.meta.borrow().tangent.clone()
    }

    /// Whether this value carries a tangent.
    pub fn is_dual(&self) -> bool {
        self.0.meta.borrow().in_dual_mode
    }

    /// Turn gradient tracking on or off for a leaf.
    ///
    /// # Errors
    ///
    /// Returns error on a non-leaf value or on a non-float element type.
    pub fn set_requires_grad(&self, requires_grad: bool) -> Result<()> {
        if !self.is_leaf() {
            return Err(GradError::InvalidOperation(
                "requires_grad can only be changed on leaf values".into(),
            ));
        }
        check_grad_capable(self.dtype(), requires_grad)?;
        self.0.meta.borrow_mut().requires_grad = requires_grad;
        Ok(())
    }

    /// Drop the accumulated gradient.
    pub fn zero_grad(&self) {
        self.0.meta.borrow_mut().grad = None;
    }

    /// A new leaf with a copy of the data that is cut off from any graph.
    pub fn detach(&self) -> Value {
        Value::constant(self.to_array())
    }

    /// A new leaf with a copy of the data and the same `requires_grad`.
    pub fn copy(&self) -> Value {
        Self::from_parts(self.to_array(), self.requires_grad())
    }

    /// Whether two handles refer to the same value.
    pub fn ptr_eq(a: &Value, b: &Value) -> bool {
        Rc::ptr_eq(&a.0, &b.0)
    }

    pub(crate) fn downgrade(&self) -> WeakValue {
        WeakValue(Rc::downgrade(&self.0))
    }

    /// Record `node` as this value's producer.
    pub(crate) fn attach_node(&self, node: NodeRef) {
        let mut meta = self.0.meta.borrow_mut();
        meta.requires_grad = true;
        meta.grad_node = Some(node);
        meta.is_leaf = false;
    }

    /// Put this value in dual mode. The caller has checked the shape.
    pub(crate) fn attach_tangent(&self, tangent: Array) {
        let mut meta = self.0.meta.borrow_mut();
        meta.tangent = Some(Value::constant(tangent));
        meta.in_dual_mode = true;
    }

    /// Tangent array, if in dual mode.
    pub(crate) fn tangent_array(&self) -> Option<Array> {
        self.0
            .meta
            .borrow()
            .tangent
            .as_ref()
            .map(Value::to_array)
    }

    /// Add an already-reduced gradient into the accumulator, creating it as
    /// zeros on first use.
    pub(crate) fn add_to_grad(&self, grad: &Array) -> Result<()> {
        let mut meta = self.0.meta.borrow_mut();
        let acc = meta
            .grad
            .get_or_insert_with(|| Value::constant(self.0.data.borrow().zeros_like()));
        let mut acc_data = acc.0.data.borrow_mut();
        add_assign(&mut acc_data, grad)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let meta = self.0.meta.borrow();
        f.debug_struct("Value")
            .field("data", &*self.0.data.borrow())
            .field("requires_grad", &meta.requires_grad)
            .field("is_leaf", &meta.is_leaf)
            .field(
                "grad_node",
                &meta.grad_node.as_ref().map(|node| node.name()),
            )
            .field("has_grad", &meta.grad.is_some())
            .field("in_dual_mode", &meta.in_dual_mode)
            .finish()
    }
}

fn check_grad_capable(dtype: DType, requires_grad: bool) -> Result<()> {
    if requires_grad && !dtype.is_grad_capable() {
        return Err(GradError::NotGradCapable { dtype });
    }
    Ok(())
}
