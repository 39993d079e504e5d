//! Operation protocol: [`Function`] and its per-invocation [`Context`].

use std::fmt::Debug;

use smallvec::SmallVec;

use crate::array::Array;
use crate::autodiff::value::Value;
use crate::error::{GradError, Result};

/// Saved inputs of one operation invocation.
///
/// The saved values are the operation's differentiable inputs, in input
/// order; the graph builder derives the node's next-node list from them.
/// Auxiliary state (shapes, axes, the forward output) lives in the
/// [`Function`] struct itself, which the node owns alongside the context.
#[derive(Debug, Default)]
pub struct Context {
    saved: SmallVec<[Value; 2]>,
}

impl Context {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Save values needed by `backward` / `forward_tangent`.
    ///
    /// Must be called with every differentiable input, in input order.
    pub fn save(&mut self, values: &[&Value]) {
        self.saved.extend(values.iter().map(|v| (*v).clone()));
    }

    /// Saved values, in the order they were saved.
    pub fn saved(&self) -> &[Value] {
        &self.saved
    }

    /// Saved value at `index`.
    ///
    /// # Errors
    ///
    /// Returns error if fewer values were saved.
    pub fn saved_value(&self, index: usize) -> Result<&Value> {
        self.saved.get(index).ok_or_else(|| {
            GradError::InvalidOperation(format!(
                "context holds {} saved values, requested index {index}",
                self.saved.len()
            ))
        })
    }
}

/// A differentiable operation.
///
/// Implementors are plain structs whose fields are the auxiliary state the
/// derivative rules need. [`apply_function`](crate::autodiff::apply_function)
/// drives the protocol: `forward` runs once, then the struct and its
/// [`Context`] move into the graph node that later calls `backward`.
pub trait Function: Debug + 'static {
    /// Operation name, used in errors and traces.
    fn name(&self) -> &'static str;

    /// Number of inputs the operation takes.
    fn arity(&self) -> usize;

    /// Compute the output and save whatever the derivative rules need.
    fn forward(&mut self, ctx: &mut Context, inputs: &[&Value]) -> Result<Array>;

    /// Vector-Jacobian product: one gradient per saved input, in input order.
    ///
    /// Gradients may have the broadcast output shape; they are reduced onto
    /// each input's shape by the traversal.
    fn backward(&self, ctx: &Context, grad: &Array) -> Result<Vec<Array>>;

    /// Jacobian-vector product given one tangent per saved input.
    ///
    /// Called for every operation while forward mode is on. Operations
    /// without a tangent rule keep the default, which fails with
    /// [`GradError::ForwardModeUnsupported`].
    fn forward_tangent(&self, ctx: &Context, tangents: &[Array]) -> Result<Array> {
        let _ = (ctx, tangents);
        Err(GradError::ForwardModeUnsupported { op: self.name() })
    }
}
