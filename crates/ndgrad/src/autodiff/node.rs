//! Reverse-mode graph vertices.
//!
//! ```text
//!  output Value ──grad_node──► Node::Function ──next──► Node::Function ──► ...
//!                                  │                         │
//!                                  └──next──► Node::AccumulateGrad ──weak──► leaf Value
//! ```
//!
//! Edges point from outputs toward inputs only, so `Rc` ownership never
//! forms cycles. Traversal is depth-first and does not deduplicate: a node
//! reached along two edges is applied twice, once with each edge's gradient.
//! The contributions add up correctly, but graphs with deeply repeated
//! sharing cost time exponential in the number of shared levels.

use std::fmt;
use std::rc::Rc;

use smallvec::SmallVec;
use tracing::trace;

use crate::array::Array;
use crate::autodiff::context::{Context, Function};
use crate::autodiff::value::{Value, WeakValue};
use crate::error::{GradError, Result};
use crate::operations::sum_to_shape;

/// Shared handle to a graph node.
pub type NodeRef = Rc<Node>;

/// A vertex of the reverse-mode graph.
#[derive(Debug)]
pub enum Node {
    /// Applies an operation's local chain rule and fans out to its inputs.
    Function(FunctionNode),
    /// Sums incoming gradients into one leaf's accumulator.
    AccumulateGrad(AccumulateGrad),
}

impl Node {
    /// Propagate `grad` through this node and everything reachable from it.
    ///
    /// # Errors
    ///
    /// Fails on the first inconsistent gradient. Leaves visited before the
    /// failure keep the contributions they already received.
    pub fn apply(&self, grad: Array) -> Result<()> {
        match self {
            Node::Function(node) => node.apply(grad),
            Node::AccumulateGrad(acc) => acc.apply(grad),
        }
    }

    /// Operation name, or `"AccumulateGrad"`.
    pub fn name(&self) -> &'static str {
        match self {
            Node::Function(node) => node.function.name(),
            Node::AccumulateGrad(_) => "AccumulateGrad",
        }
    }

    /// Next nodes, one per input (`None` for inputs without gradients).
    pub fn next_nodes(&self) -> &[Option<NodeRef>] {
        match self {
            Node::Function(node) => &node.next,
            Node::AccumulateGrad(_) => &[],
        }
    }
}

/// Node for one recorded operation invocation.
pub struct FunctionNode {
    context: Context,
    function: Box<dyn Function>,
    next: SmallVec<[Option<NodeRef>; 2]>,
}

impl FunctionNode {
    pub(crate) fn new(
        context: Context,
        function: Box<dyn Function>,
        next: SmallVec<[Option<NodeRef>; 2]>,
    ) -> Self {
        Self {
            context,
            function,
            next,
        }
    }

    /// Saved inputs of the recorded invocation.
    pub fn context(&self) -> &Context {
        &self.context
    }

    fn apply(&self, grad: Array) -> Result<()> {
        let op = self.function.name();
        let grads = {
            let _span = tracing::trace_span!("backward", op).entered();
            self.function.backward(&self.context, &grad)?
        };
        trace!(op, inputs = grads.len(), "applied local chain rule");

        if grads.len() != self.next.len() {
            return Err(GradError::GradientArity {
                op,
                expected: self.next.len(),
                actual: grads.len(),
            });
        }

        for ((next, grad), input) in self.next.iter().zip(grads).zip(self.context.saved()) {
            let Some(next) = next else { continue };
            match &**next {
                // Intermediate values get their broadcast undone here, leaves
                // undo it themselves on accumulation
                Node::Function(_) => {
                    let target = input.shape();
                    let grad = if grad.shape() == target.as_slice() {
                        grad
                    } else {
                        sum_to_shape(&grad, &target)?
                    };
                    next.apply(grad)?;
                }
                Node::AccumulateGrad(_) => next.apply(grad)?,
            }
        }
        Ok(())
    }
}

impl fmt::Debug for FunctionNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionNode")
            .field("function", &self.function)
            .field(
                "next",
                &self
                    .next
                    .iter()
                    .map(|n| n.as_ref().map(|n| n.name()))
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Terminal node bound to one leaf value.
///
/// The leaf is held weakly so the node is only a back-reference and never
/// owns it. While the node is reached through its parent, that parent's
/// [`Context`] keeps the leaf alive. A handle retained on its own (cloned
/// out of [`Node::next_nodes`]) can outlive the leaf, and applying it then
/// discards the gradient.
pub struct AccumulateGrad {
    leaf: WeakValue,
}

impl AccumulateGrad {
    pub(crate) fn new(leaf: &Value) -> Self {
        Self {
            leaf: leaf.downgrade(),
        }
    }

    /// The bound leaf, if it is still alive.
    pub fn leaf(&self) -> Option<Value> {
        self.leaf.upgrade()
    }

    fn apply(&self, grad: Array) -> Result<()> {
        let Some(leaf) = self.leaf.upgrade() else {
            trace!("leaf no longer alive; gradient discarded");
            return Ok(());
        };
        let target = leaf.shape();
        trace!(leaf = ?target, grad = ?grad.shape(), "accumulating gradient");
        if grad.shape() == target.as_slice() {
            leaf.add_to_grad(&grad)
        } else {
            leaf.add_to_grad(&sum_to_shape(&grad, &target)?)
        }
    }
}

impl fmt::Debug for AccumulateGrad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccumulateGrad")
            .field("leaf_shape", &self.leaf().map(|v| v.shape()))
            .finish()
    }
}
