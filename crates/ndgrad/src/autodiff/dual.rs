//! Forward-mode helpers.
//!
//! Forward-mode AD carries a tangent alongside a value and pushes it through
//! every operation with a Jacobian-vector product:
//!   - primal: f(x)
//!   - tangent: J_f(x) * v
//!
//! Inputs that are not in dual mode take part with an implicit zero tangent.
//! That promotion never mutates the input; [`Value::dual_copy`] is the
//! explicit, non-mutating way to get a dual-mode version of a value.
//!
//! # Example
//!
//! ```
//! use ndgrad::Array;
//! use ndgrad::autodiff::{Value, jvp};
//!
//! let x = Value::constant(Array::from_vec(vec![1.0, 2.0], &[2]).unwrap());
//! let (y, ty) = jvp(|v| v[0].mul(&v[0]), &[x], &[Array::ones(&[2])]).unwrap();
//! assert_eq!(y.data().data(), &[1.0, 4.0]);
//! // d(x^2) = 2x dx
//! assert_eq!(ty.data(), &[2.0, 4.0]);
//! ```

use crate::array::Array;
use crate::autodiff::mode::set_forward_ad_enabled;
use crate::autodiff::value::Value;
use crate::error::{GradError, Result};

impl Value {
    /// Seed a tangent on this value, putting it in dual mode.
    ///
    /// # Errors
    ///
    /// Returns error if the tangent shape differs from the value's shape or
    /// the element type cannot carry derivatives.
    pub fn make_dual(&self, tangent: Array) -> Result<()> {
        let dtype = self.dtype();
        if !dtype.is_grad_capable() {
            return Err(GradError::NotGradCapable { dtype });
        }
        let shape = self.shape();
        if tangent.shape() != shape.as_slice() {
            return Err(GradError::TangentShape {
                primal: shape,
                tangent: tangent.shape().to_vec(),
            });
        }
        self.attach_tangent(tangent.to_dtype(dtype));
        Ok(())
    }

    /// A detached copy of this value in dual mode.
    ///
    /// The copy carries this value's tangent, or zeros if it has none. The
    /// original is left untouched.
    pub fn dual_copy(&self) -> Value {
        let copy = self.detach();
        copy.attach_tangent(promoted_tangent(self));
        copy
    }
}

/// Tangent of `value`, or zeros of its shape if it is not in dual mode.
pub(crate) fn promoted_tangent(value: &Value) -> Array {
    value
        .tangent_array()
        .unwrap_or_else(|| value.data().zeros_like())
}

/// Evaluate `f` at `primals` and its directional derivative along `tangents`.
///
/// The primals are detached and seeded with the tangents, then `f` runs with
/// forward mode enabled. Returns the output and its tangent (zeros if the
/// output does not depend on any input).
///
/// # Errors
///
/// Returns error if the counts or shapes disagree, or if `f` fails.
pub fn jvp<F>(f: F, primals: &[Value], tangents: &[Array]) -> Result<(Value, Array)>
where
    F: FnOnce(&[Value]) -> Result<Value>,
{
    if primals.len() != tangents.len() {
        return Err(GradError::InvalidOperation(format!(
            "jvp got {} primals but {} tangents",
            primals.len(),
            tangents.len()
        )));
    }
    let inputs = primals
        .iter()
        .zip(tangents)
        .map(|(primal, tangent)| {
            let input = primal.detach();
            input.make_dual(tangent.clone())?;
            Ok(input)
        })
        .collect::<Result<Vec<_>>>()?;

    let _guard = set_forward_ad_enabled(true);
    let output = f(&inputs)?;
    let tangent = promoted_tangent(&output);
    Ok((output, tangent))
}
