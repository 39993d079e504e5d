//! Error types for ndgrad.

use crate::dtype::DType;
use thiserror::Error;

/// Errors that can occur in array operations and differentiation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GradError {
    /// Shape mismatch between data length and expected size.
    #[error("shape mismatch: expected {expected} elements, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    /// Two shapes cannot be broadcast against each other.
    #[error("shapes {lhs:?} and {rhs:?} cannot be broadcast together")]
    BroadcastMismatch { lhs: Vec<usize>, rhs: Vec<usize> },

    /// Index out of bounds.
    #[error("index out of bounds: index {index} is out of range for dimension {dim_size}")]
    IndexOutOfBounds { index: usize, dim_size: usize },

    /// Wrong number of indices provided.
    #[error("wrong number of indices: expected {expected}, got {actual}")]
    WrongNumberOfIndices { expected: usize, actual: usize },

    /// Axis out of range.
    #[error("axis {axis} is out of range for array with {ndim} dimensions")]
    InvalidAxis { axis: usize, ndim: usize },

    /// Invalid permutation.
    #[error("invalid permutation {perm:?} for array with {ndim} dimensions")]
    InvalidPermutation { perm: Vec<usize>, ndim: usize },

    /// Reshape to a shape with a different number of elements.
    #[error("cannot reshape array of shape {from:?} into shape {to:?}")]
    ReshapeMismatch { from: Vec<usize>, to: Vec<usize> },

    /// Squeezing an axis whose extent is not 1.
    #[error("cannot squeeze axis {axis} of extent {extent}")]
    NotSqueezable { axis: usize, extent: usize },

    /// Operation requires specific array rank.
    #[error("expected array of rank {expected}, got rank {actual}")]
    RankMismatch { expected: usize, actual: usize },

    /// Inner dimensions of a matrix product disagree.
    #[error("matmul dimension mismatch: {lhs:?} x {rhs:?}")]
    MatmulMismatch { lhs: Vec<usize>, rhs: Vec<usize> },

    /// Gradient tracking requested on an element type that cannot carry one.
    #[error("element type {dtype} cannot require gradients")]
    NotGradCapable { dtype: DType },

    /// Forward-mode differentiation through an operation without a tangent rule.
    #[error("operation {op} does not support forward-mode differentiation")]
    ForwardModeUnsupported { op: &'static str },

    /// A backward rule returned the wrong number of gradients.
    #[error("{op} backward returned {actual} gradients for {expected} inputs")]
    GradientArity {
        op: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A gradient whose shape is not explained by broadcasting the target.
    #[error("gradient of shape {grad:?} cannot be reduced to shape {target:?}")]
    GradientShape {
        target: Vec<usize>,
        grad: Vec<usize>,
    },

    /// Tangent shape differs from its primal.
    #[error("tangent shape {tangent:?} must match primal shape {primal:?}")]
    TangentShape {
        primal: Vec<usize>,
        tangent: Vec<usize>,
    },

    /// Seed gradient shape differs from the root value.
    #[error("seed gradient shape {seed:?} must match root shape {root:?}")]
    SeedShape { root: Vec<usize>, seed: Vec<usize> },

    /// Scalar extraction from a multi-element array.
    #[error("expected a single-element array, got shape {shape:?}")]
    NotScalar { shape: Vec<usize> },

    /// Operation that is not valid for the given value state.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),
}

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, GradError>;
