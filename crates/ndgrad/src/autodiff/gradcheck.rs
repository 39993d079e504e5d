//! Finite-difference gradient checking.
//!
//! Compares the reverse-mode gradient of a function against a central
//! difference estimate, the standard sanity check for new derivative rules.

use crate::array::Array;
use crate::autodiff::mode::GradMode;
use crate::autodiff::value::Value;
use crate::error::Result;

/// Outcome of [`check_gradient`].
#[derive(Debug, Clone)]
pub struct GradCheckReport {
    /// Gradient from the backward pass.
    pub analytic: Array,
    /// Central-difference estimate.
    pub numerical: Array,
    /// Largest element-wise absolute difference.
    pub max_abs_error: f64,
    /// Whether `max_abs_error` is within the requested tolerance.
    pub passed: bool,
}

/// Central-difference gradient of `sum(f(x))` at `point`.
///
/// `f` is evaluated with both differentiation modes off.
pub fn numerical_gradient<F>(f: F, point: &Array, eps: f64) -> Result<Array>
where
    F: Fn(&Value) -> Result<Value>,
{
    let eval = |x: Array| -> Result<f64> {
        let y = f(&Value::constant(x))?;
        let total = y.data().data().iter().sum();
        Ok(total)
    };

    GradMode::DISABLED.scoped(|| {
        let mut grad = point.zeros_like();
        for i in 0..point.len() {
            let mut plus = point.clone();
            plus.data_mut()[i] += eps;
            let mut minus = point.clone();
            minus.data_mut()[i] -= eps;
            grad.data_mut()[i] = (eval(plus)? - eval(minus)?) / (2.0 * eps);
        }
        Ok(grad)
    })
}

/// Check the reverse-mode gradient of `sum(f(x))` at `point`.
///
/// # Example
///
/// ```
/// use ndgrad::Array;
/// use ndgrad::autodiff::check_gradient;
///
/// let x = Array::from_vec(vec![0.1, 0.7, -1.3], &[3]).unwrap();
/// let report = check_gradient(|v| v.mul(&v.sin()?), &x, 1e-6, 1e-6).unwrap();
/// assert!(report.passed, "max error {}", report.max_abs_error);
/// ```
pub fn check_gradient<F>(f: F, point: &Array, eps: f64, tol: f64) -> Result<GradCheckReport>
where
    F: Fn(&Value) -> Result<Value>,
{
    let analytic = GradMode {
        reverse: true,
        forward: false,
    }
    .scoped(|| -> Result<Array> {
        let x = Value::leaf(point.clone())?;
        f(&x)?.sum_all()?.backward()?;
        Ok(x.grad().map_or_else(|| point.zeros_like(), |g| g.to_array()))
    })?;

    let numerical = numerical_gradient(&f, point, eps)?;
    let max_abs_error = analytic
        .data()
        .iter()
        .zip(numerical.data())
        .map(|(a, n)| (a - n).abs())
        .fold(0.0, f64::max);

    Ok(GradCheckReport {
        analytic,
        numerical,
        max_abs_error,
        passed: max_abs_error <= tol,
    })
}
