//! Broadcasting element-wise arithmetic.

use crate::array::Array;
use crate::autodiff::context::{Context, Function};
use crate::autodiff::value::Value;
use crate::error::{GradError, Result};
use crate::operations::{scale, zip_broadcast};

use super::float_array;

/// `a + b`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Add;

impl Function for Add {
    fn name(&self) -> &'static str {
        "Add"
    }

    fn arity(&self) -> usize {
        2
    }

    fn forward(&mut self, ctx: &mut Context, inputs: &[&Value]) -> Result<Array> {
        let out = zip_broadcast(&inputs[0].data(), &inputs[1].data(), |x, y| x + y)?;
        ctx.save(inputs);
        Ok(out)
    }

    fn backward(&self, _ctx: &Context, grad: &Array) -> Result<Vec<Array>> {
        Ok(vec![grad.clone(), grad.clone()])
    }

    fn forward_tangent(&self, _ctx: &Context, tangents: &[Array]) -> Result<Array> {
        zip_broadcast(&tangents[0], &tangents[1], |x, y| x + y)
    }
}

/// `a - b`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sub;

impl Function for Sub {
    fn name(&self) -> &'static str {
        "Sub"
    }

    fn arity(&self) -> usize {
        2
    }

    fn forward(&mut self, ctx: &mut Context, inputs: &[&Value]) -> Result<Array> {
        let out = zip_broadcast(&inputs[0].data(), &inputs[1].data(), |x, y| x - y)?;
        ctx.save(inputs);
        Ok(out)
    }

    fn backward(&self, _ctx: &Context, grad: &Array) -> Result<Vec<Array>> {
        Ok(vec![grad.clone(), scale(grad, -1.0)])
    }

    fn forward_tangent(&self, _ctx: &Context, tangents: &[Array]) -> Result<Array> {
        zip_broadcast(&tangents[0], &tangents[1], |x, y| x - y)
    }
}

/// `a * b`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Mul;

impl Function for Mul {
    fn name(&self) -> &'static str {
        "Mul"
    }

    fn arity(&self) -> usize {
        2
    }

    fn forward(&mut self, ctx: &mut Context, inputs: &[&Value]) -> Result<Array> {
        let out = zip_broadcast(&inputs[0].data(), &inputs[1].data(), |x, y| x * y)?;
        ctx.save(inputs);
        Ok(out)
    }

    fn backward(&self, ctx: &Context, grad: &Array) -> Result<Vec<Array>> {
        let a = ctx.saved_value(0)?.data();
        let b = ctx.saved_value(1)?.data();
        Ok(vec![
            zip_broadcast(grad, &b, |g, y| g * y)?,
            zip_broadcast(grad, &a, |g, x| g * x)?,
        ])
    }

    fn forward_tangent(&self, ctx: &Context, tangents: &[Array]) -> Result<Array> {
        let a = ctx.saved_value(0)?.data();
        let b = ctx.saved_value(1)?.data();
        // Product rule: ta * b + a * tb
        let left = zip_broadcast(&tangents[0], &b, |t, y| t * y)?;
        let right = zip_broadcast(&a, &tangents[1], |x, t| x * t)?;
        zip_broadcast(&left, &right, |l, r| l + r)
    }
}

/// `a / b`, always producing floats.
#[derive(Debug, Clone, Copy, Default)]
pub struct Div;

impl Function for Div {
    fn name(&self) -> &'static str {
        "Div"
    }

    fn arity(&self) -> usize {
        2
    }

    fn forward(&mut self, ctx: &mut Context, inputs: &[&Value]) -> Result<Array> {
        let a = float_array(&inputs[0].data());
        let b = float_array(&inputs[1].data());
        let out = zip_broadcast(&a, &b, |x, y| x / y)?;
        ctx.save(inputs);
        Ok(out)
    }

    fn backward(&self, ctx: &Context, grad: &Array) -> Result<Vec<Array>> {
        let a = ctx.saved_value(0)?.data();
        let b = ctx.saved_value(1)?.data();
        let grad_a = zip_broadcast(grad, &b, |g, y| g / y)?;
        let ga = zip_broadcast(grad, &a, |g, x| g * x)?;
        let grad_b = zip_broadcast(&ga, &b, |gx, y| -gx / (y * y))?;
        Ok(vec![grad_a, grad_b])
    }

    fn forward_tangent(&self, ctx: &Context, tangents: &[Array]) -> Result<Array> {
        let a = ctx.saved_value(0)?.data();
        let b = ctx.saved_value(1)?.data();
        // Quotient rule: ta / b - a * tb / b^2
        let left = zip_broadcast(&tangents[0], &b, |t, y| t / y)?;
        let atb = zip_broadcast(&a, &tangents[1], |x, t| x * t)?;
        let right = zip_broadcast(&atb, &b, |xt, y| xt / (y * y))?;
        zip_broadcast(&left, &right, |l, r| l - r)
    }
}

/// `a ^ b`, always producing floats.
#[derive(Debug, Clone, Default)]
pub struct Pow {
    output: Option<Array>,
}

impl Function for Pow {
    fn name(&self) -> &'static str {
        "Pow"
    }

    fn arity(&self) -> usize {
        2
    }

    fn forward(&mut self, ctx: &mut Context, inputs: &[&Value]) -> Result<Array> {
        let a = float_array(&inputs[0].data());
        let b = float_array(&inputs[1].data());
        let out = zip_broadcast(&a, &b, f64::powf)?;
        ctx.save(inputs);
        self.output = Some(out.clone());
        Ok(out)
    }

    fn backward(&self, ctx: &Context, grad: &Array) -> Result<Vec<Array>> {
        let out = self
            .output
            .as_ref()
            .ok_or_else(|| GradError::InvalidOperation("Pow backward before forward".into()))?;
        let a = ctx.saved_value(0)?.data();
        let b = ctx.saved_value(1)?.data();

        let local_a = zip_broadcast(&a, &b, |x, y| y * x.powf(y - 1.0))?;
        let grad_a = zip_broadcast(grad, &local_a, |g, l| g * l)?;
        let local_b = zip_broadcast(out, &a, |o, x| o * x.ln())?;
        let grad_b = zip_broadcast(grad, &local_b, |g, l| g * l)?;
        Ok(vec![grad_a, grad_b])
    }

    fn forward_tangent(&self, ctx: &Context, tangents: &[Array]) -> Result<Array> {
        let out = self
            .output
            .as_ref()
            .ok_or_else(|| GradError::InvalidOperation("Pow tangent before forward".into()))?;
        let a = float_array(&ctx.saved_value(0)?.data());
        let b = float_array(&ctx.saved_value(1)?.data());

        // ta * b * a^(b-1) + tb * out * ln(a); a zero tangent contributes
        // nothing even where the local derivative is not finite
        let local_a = zip_broadcast(&a, &b, |x, y| y * x.powf(y - 1.0))?;
        let left = zip_broadcast(&tangents[0], &local_a, scaled)?;
        let local_b = zip_broadcast(out, &a, |o, x| o * x.ln())?;
        let right = zip_broadcast(&tangents[1], &local_b, scaled)?;
        zip_broadcast(&left, &right, |l, r| l + r)
    }
}

fn scaled(t: f64, local: f64) -> f64 {
    if t == 0.0 { 0.0 } else { t * local }
}

/// `-a`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Neg;

impl Function for Neg {
    fn name(&self) -> &'static str {
        "Neg"
    }

    fn arity(&self) -> usize {
        1
    }

    fn forward(&mut self, ctx: &mut Context, inputs: &[&Value]) -> Result<Array> {
        let out = scale(&inputs[0].data(), -1.0);
        ctx.save(inputs);
        Ok(out)
    }

    fn backward(&self, _ctx: &Context, grad: &Array) -> Result<Vec<Array>> {
        Ok(vec![scale(grad, -1.0)])
    }

    fn forward_tangent(&self, _ctx: &Context, tangents: &[Array]) -> Result<Array> {
        Ok(scale(&tangents[0], -1.0))
    }
}
