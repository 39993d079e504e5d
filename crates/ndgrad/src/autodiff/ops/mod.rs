//! Differentiable operations.
//!
//! Each operation is a [`Function`](crate::autodiff::Function) struct whose
//! fields hold the auxiliary state its derivative rules need. The free
//! functions and the matching [`Value`] methods run them through
//! [`apply_function`].
//!
//! | op | backward | forward tangent |
//! |----|----------|-----------------|
//! | `add(a, b)` | `(g, g)` | `ta + tb` |
//! | `sub(a, b)` | `(g, -g)` | `ta - tb` |
//! | `mul(a, b)` | `(g b, g a)` | `ta b + a tb` |
//! | `div(a, b)` | `(g / b, -g a / b^2)` | `ta / b - a tb / b^2` |
//! | `pow(a, b)` | `(g b a^(b-1), g a^b ln a)` | `ta b a^(b-1) + tb a^b ln a` |
//! | `neg(a)` | `-g` | `-ta` |
//! | `sin(a)` / `cos(a)` | `g cos a` / `-g sin a` | `ta cos a` / `-ta sin a` |
//! | `identity(a)` | `g` | `ta` |
//! | `to_dtype(a, dtype)` | `g` in `a`'s type | `ta` in `dtype` |
//! | `sum(a, axes)` | `g` expanded back to `a` | `sum(ta, axes)` |
//! | `reshape`, `permute`, `squeeze`, `unsqueeze` | inverse layout change | same layout change |
//! | `matmul(a, b)` | `(g b^T, a^T g)` | `ta b + a tb` |

mod arithmetic;
mod layout;
mod matmul;
mod reduce;
mod unary;

pub use arithmetic::{Add, Div, Mul, Neg, Pow, Sub};
pub use layout::{Permute, Reshape, Squeeze, Unsqueeze};
pub use matmul::Matmul;
pub use reduce::Sum;
pub use unary::{Cast, Cos, Identity, Sin};

use crate::autodiff::graph::apply_function;
use crate::autodiff::value::Value;
use crate::dtype::DType;
use crate::error::Result;

/// Element-wise `a + b` with broadcasting.
pub fn add(a: &Value, b: &Value) -> Result<Value> {
    apply_function(Add, &[a, b])
}

/// Element-wise `a - b` with broadcasting.
pub fn sub(a: &Value, b: &Value) -> Result<Value> {
    apply_function(Sub, &[a, b])
}

/// Element-wise `a * b` with broadcasting.
pub fn mul(a: &Value, b: &Value) -> Result<Value> {
    apply_function(Mul, &[a, b])
}

/// Element-wise `a / b` with broadcasting.
pub fn div(a: &Value, b: &Value) -> Result<Value> {
    apply_function(Div, &[a, b])
}

/// Element-wise `a ^ b` with broadcasting. Reverse mode only.
pub fn pow(a: &Value, b: &Value) -> Result<Value> {
    apply_function(Pow::default(), &[a, b])
}

/// Element-wise negation.
pub fn neg(a: &Value) -> Result<Value> {
    apply_function(Neg, &[a])
}

/// Element-wise sine.
pub fn sin(a: &Value) -> Result<Value> {
    apply_function(Sin, &[a])
}

/// Element-wise cosine.
pub fn cos(a: &Value) -> Result<Value> {
    apply_function(Cos, &[a])
}

/// Recorded copy of `a`.
pub fn identity(a: &Value) -> Result<Value> {
    apply_function(Identity, &[a])
}

/// Sum over `axes`, or over everything when `None`.
pub fn sum(a: &Value, axes: Option<&[usize]>, keepdims: bool) -> Result<Value> {
    apply_function(Sum::new(axes, keepdims), &[a])
}

/// Same data, new shape.
pub fn reshape(a: &Value, shape: &[usize]) -> Result<Value> {
    apply_function(Reshape::new(shape), &[a])
}

/// Reorder axes; `perm[i]` is the source axis of result axis `i`.
pub fn permute(a: &Value, perm: &[usize]) -> Result<Value> {
    apply_function(Permute::new(perm), &[a])
}

/// Swap two axes.
pub fn transpose(a: &Value, dim0: usize, dim1: usize) -> Result<Value> {
    apply_function(Permute::swap(a.ndim(), dim0, dim1)?, &[a])
}

/// Swap the last two axes.
pub fn transpose_last(a: &Value) -> Result<Value> {
    apply_function(Permute::swap_last(a.ndim())?, &[a])
}

/// Remove an axis of extent 1.
pub fn squeeze(a: &Value, axis: usize) -> Result<Value> {
    apply_function(Squeeze::new(axis), &[a])
}

/// Remove every axis of extent 1.
pub fn squeeze_all(a: &Value) -> Result<Value> {
    apply_function(Squeeze::all(), &[a])
}

/// Insert an axis of extent 1 at `axis`.
pub fn unsqueeze(a: &Value, axis: usize) -> Result<Value> {
    apply_function(Unsqueeze::new(axis), &[a])
}

/// Convert to another element type.
///
/// Between float types the result stays in the graph. Converting to an
/// integer or bool type yields an untracked constant.
pub fn to_dtype(a: &Value, dtype: DType) -> Result<Value> {
    if !dtype.is_grad_capable() {
        return Ok(Value::constant(a.data().to_dtype(dtype)));
    }
    apply_function(Cast::new(dtype), &[a])
}

/// Matrix product of two 2-D values.
pub fn matmul(a: &Value, b: &Value) -> Result<Value> {
    apply_function(Matmul, &[a, b])
}

impl Value {
    /// See [`add`].
    pub fn add(&self, other: &Value) -> Result<Value> {
        add(self, other)
    }

    /// See [`sub`].
    pub fn sub(&self, other: &Value) -> Result<Value> {
        sub(self, other)
    }

    /// See [`mul`].
    pub fn mul(&self, other: &Value) -> Result<Value> {
        mul(self, other)
    }

    /// See [`div`].
    pub fn div(&self, other: &Value) -> Result<Value> {
        div(self, other)
    }

    /// See [`pow`].
    pub fn pow(&self, exponent: &Value) -> Result<Value> {
        pow(self, exponent)
    }

    /// See [`neg`].
    pub fn neg(&self) -> Result<Value> {
        neg(self)
    }

    /// See [`sin`].
    pub fn sin(&self) -> Result<Value> {
        sin(self)
    }

    /// See [`cos`].
    pub fn cos(&self) -> Result<Value> {
        cos(self)
    }

    /// See [`identity`].
    pub fn identity(&self) -> Result<Value> {
        identity(self)
    }

    /// See [`sum`].
    pub fn sum(&self, axes: Option<&[usize]>, keepdims: bool) -> Result<Value> {
        sum(self, axes, keepdims)
    }

    /// Sum of all elements as a 0-d value.
    pub fn sum_all(&self) -> Result<Value> {
        sum(self, None, false)
    }

    /// See [`reshape`].
    pub fn reshape(&self, shape: &[usize]) -> Result<Value> {
        reshape(self, shape)
    }

    /// See [`permute`].
    pub fn permute(&self, perm: &[usize]) -> Result<Value> {
        permute(self, perm)
    }

    /// See [`transpose`].
    pub fn transpose(&self, dim0: usize, dim1: usize) -> Result<Value> {
        transpose(self, dim0, dim1)
    }

    /// See [`transpose_last`].
    pub fn transpose_last(&self) -> Result<Value> {
        transpose_last(self)
    }

    /// See [`to_dtype`].
    pub fn to_dtype(&self, dtype: DType) -> Result<Value> {
        to_dtype(self, dtype)
    }

    /// Convert to `f32`.
    pub fn float(&self) -> Result<Value> {
        to_dtype(self, DType::F32)
    }

    /// Convert to `f64`.
    pub fn double(&self) -> Result<Value> {
        to_dtype(self, DType::F64)
    }

    /// See [`squeeze`].
    pub fn squeeze(&self, axis: usize) -> Result<Value> {
        squeeze(self, axis)
    }

    /// See [`squeeze_all`].
    pub fn squeeze_all(&self) -> Result<Value> {
        squeeze_all(self)
    }

    /// See [`unsqueeze`].
    pub fn unsqueeze(&self, axis: usize) -> Result<Value> {
        unsqueeze(self, axis)
    }

    /// See [`matmul`].
    pub fn matmul(&self, other: &Value) -> Result<Value> {
        matmul(self, other)
    }
}

/// `a` as a floating-point array, converting integer and bool data to `f64`.
fn float_array(a: &crate::Array) -> crate::Array {
    if a.dtype().is_float() {
        a.clone()
    } else {
        a.to_dtype(DType::F64)
    }
}
