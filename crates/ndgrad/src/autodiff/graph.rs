//! Graph attachment: the glue every operation calls after its forward pass.

use std::rc::Rc;

use smallvec::SmallVec;
use tracing::trace;

use crate::autodiff::context::{Context, Function};
use crate::autodiff::dual::promoted_tangent;
use crate::autodiff::mode::GradMode;
use crate::autodiff::node::{AccumulateGrad, FunctionNode, Node, NodeRef};
use crate::autodiff::value::Value;
use crate::error::{GradError, Result};

/// Run a differentiable operation.
///
/// This is the single entry point through which operations reach the graph:
/// validate the inputs, run `forward`, attach the result with
/// [`pass_to_graph`], return it.
///
/// # Errors
///
/// Returns error if the input count is wrong, if `forward` fails, or if
/// forward mode needs a tangent rule the operation lacks.
///
/// # Example
///
/// ```
/// use ndgrad::Array;
/// use ndgrad::autodiff::ops::Mul;
/// use ndgrad::autodiff::{Value, apply_function};
///
/// let a = Value::leaf(Array::full(&[2], 3.0)).unwrap();
/// let b = Value::constant(Array::full(&[2], 4.0));
/// let c = apply_function(Mul, &[&a, &b]).unwrap();
/// assert_eq!(c.data().data(), &[12.0, 12.0]);
/// assert!(c.grad_node().is_some());
/// ```
pub fn apply_function<F: Function>(mut function: F, inputs: &[&Value]) -> Result<Value> {
    if inputs.len() != function.arity() {
        return Err(GradError::InvalidOperation(format!(
            "{} expects {} inputs, got {}",
            function.name(),
            function.arity(),
            inputs.len()
        )));
    }

    let mut ctx = Context::new();
    let data = function.forward(&mut ctx, inputs)?;
    if ctx.saved().len() != inputs.len() {
        return Err(GradError::InvalidOperation(format!(
            "{} saved {} of its {} inputs",
            function.name(),
            ctx.saved().len(),
            inputs.len()
        )));
    }

    let output = Value::constant(data);
    pass_to_graph(ctx, Box::new(function), &output)?;
    Ok(output)
}

/// Attach `output` to the graph under the current thread's [`GradMode`].
pub fn pass_to_graph(ctx: Context, function: Box<dyn Function>, output: &Value) -> Result<()> {
    pass_to_graph_with(GradMode::current(), ctx, function, output)
}

/// Attach `output` to the graph under an explicit mode.
///
/// - Forward mode, when enabled: every input contributes its tangent (an
///   implicit zero if it has none), the operation's tangent rule produces
///   the output tangent, and the output enters dual mode. An operation
///   without a tangent rule fails here.
/// - Reverse mode, when enabled and some input requires grad: a node owning
///   `ctx` and `function` becomes the output's `grad_node`, and the output
///   becomes a non-leaf that requires grad.
///
/// The two branches are independent; an output may get both.
pub fn pass_to_graph_with(
    mode: GradMode,
    ctx: Context,
    function: Box<dyn Function>,
    output: &Value,
) -> Result<()> {
    if mode.forward {
        let tangents: Vec<_> = ctx.saved().iter().map(promoted_tangent).collect();
        let tangent = function.forward_tangent(&ctx, &tangents)?;
        let shape = output.shape();
        if tangent.shape() != shape.as_slice() {
            return Err(GradError::TangentShape {
                primal: shape,
                tangent: tangent.shape().to_vec(),
            });
        }
        trace!(op = function.name(), "propagated tangent");
        output.attach_tangent(tangent);
    }

    if mode.reverse && ctx.saved().iter().any(Value::requires_grad) {
        let next: SmallVec<[Option<NodeRef>; 2]> = ctx.saved().iter().map(next_node).collect();
        trace!(op = function.name(), arity = next.len(), "attached node");
        let node = Rc::new(Node::Function(FunctionNode::new(ctx, function, next)));
        output.attach_node(node);
    }

    Ok(())
}

/// Where gradients for `input` go next.
fn next_node(input: &Value) -> Option<NodeRef> {
    if !input.requires_grad() {
        None
    } else if input.is_leaf() {
        Some(Rc::new(Node::AccumulateGrad(AccumulateGrad::new(input))))
    } else {
        input.grad_node()
    }
}
