//! Numeric kernels on [`Array`](crate::Array).
//!
//! These are plain array functions with no knowledge of gradient tracking.
//! The differentiable operations in [`autodiff::ops`](crate::autodiff::ops)
//! call them for both their forward results and their derivative rules.

mod elementwise;
mod matmul;
mod permutedims;
mod reduce;

pub use elementwise::{add_assign, expand_to, map, scale, zip_broadcast};
pub use matmul::{matmul, transpose_matrix};
pub use permutedims::{inverse_permutation, permutedims};
pub use reduce::{sum_axes, sum_to_shape};
