//! Automatic differentiation engine.
//!
//! Operations on [`Value`]s record a reverse-mode graph and/or propagate
//! forward-mode tangents, depending on the thread's [`GradMode`].
//!
//! # Architecture
//!
//! ```text
//! ops::add / ops::mul / ...             (Function structs)
//!        │
//!        ▼
//! apply_function ── forward ──► Array
//!        │
//!        ▼
//! pass_to_graph ──reverse──► Node::Function ──next──► Node / AccumulateGrad
//!        │
//!        └──forward──► output tangent (Value in dual mode)
//!
//! backward(root) ──► root.grad_node().apply(seed) ──► ... ──► leaf.grad
//! ```
//!
//! # Example
//!
//! ```
//! use ndgrad::Array;
//! use ndgrad::autodiff::{Value, backward};
//!
//! // y = sum(a * b) with b broadcast over the rows of a
//! let a = Value::leaf(Array::ones(&[4, 3])).unwrap();
//! let b = Value::leaf(Array::from_vec(vec![1.0, 2.0, 3.0], &[3]).unwrap()).unwrap();
//! let y = a.mul(&b).unwrap().sum_all().unwrap();
//! backward(&y, None).unwrap();
//!
//! // b was used once per row of a
//! assert_eq!(b.grad().unwrap().to_array().data(), &[4.0, 4.0, 4.0]);
//! ```
//!
//! # Design Notes
//!
//! - Single-threaded: values and nodes are `Rc`-shared, mode flags are
//!   thread-local.
//! - Nodes are not deduplicated during traversal; see [`node`] docs.
//! - Gradients accumulate across backward calls until [`Value::zero_grad`].

mod backward;
mod context;
mod dual;
mod gradcheck;
mod graph;
mod mode;
pub mod node;
pub mod ops;
mod value;

pub use backward::backward;
pub use context::{Context, Function};
pub use dual::jvp;
pub use gradcheck::{GradCheckReport, check_gradient, numerical_gradient};
pub use graph::{apply_function, pass_to_graph, pass_to_graph_with};
pub use mode::{
    FORWARD_AD_ENABLED_ENV, GRAD_ENABLED_ENV, GradMode, ModeGuard, enable_grad,
    is_forward_ad_enabled, is_grad_enabled, no_forward_ad, no_grad, set_forward_ad_enabled,
    set_grad_enabled, set_mode,
};
pub use node::{AccumulateGrad, FunctionNode, Node, NodeRef};
pub use value::Value;
