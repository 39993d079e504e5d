//! Element-wise unary functions.

use crate::array::Array;
use crate::autodiff::context::{Context, Function};
use crate::autodiff::value::Value;
use crate::dtype::DType;
use crate::error::Result;
use crate::operations::{map, zip_broadcast};

use super::float_array;

/// `sin(a)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sin;

impl Function for Sin {
    fn name(&self) -> &'static str {
        "Sin"
    }

    fn arity(&self) -> usize {
        1
    }

    fn forward(&mut self, ctx: &mut Context, inputs: &[&Value]) -> Result<Array> {
        let out = map(&float_array(&inputs[0].data()), f64::sin);
        ctx.save(inputs);
        Ok(out)
    }

    fn backward(&self, ctx: &Context, grad: &Array) -> Result<Vec<Array>> {
        let a = ctx.saved_value(0)?.data();
        Ok(vec![zip_broadcast(grad, &a, |g, x| g * x.cos())?])
    }

    fn forward_tangent(&self, ctx: &Context, tangents: &[Array]) -> Result<Array> {
        let a = ctx.saved_value(0)?.data();
        zip_broadcast(&tangents[0], &a, |t, x| t * x.cos())
    }
}

/// `cos(a)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Cos;

impl Function for Cos {
    fn name(&self) -> &'static str {
        "Cos"
    }

    fn arity(&self) -> usize {
        1
    }

    fn forward(&mut self, ctx: &mut Context, inputs: &[&Value]) -> Result<Array> {
        let out = map(&float_array(&inputs[0].data()), f64::cos);
        ctx.save(inputs);
        Ok(out)
    }

    fn backward(&self, ctx: &Context, grad: &Array) -> Result<Vec<Array>> {
        let a = ctx.saved_value(0)?.data();
        Ok(vec![zip_broadcast(grad, &a, |g, x| -g * x.sin())?])
    }

    fn forward_tangent(&self, ctx: &Context, tangents: &[Array]) -> Result<Array> {
        let a = ctx.saved_value(0)?.data();
        zip_broadcast(&tangents[0], &a, |t, x| -t * x.sin())
    }
}

/// Recorded copy: a new value with the same data that gradients pass
/// through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl Function for Identity {
    fn name(&self) -> &'static str {
        "Identity"
    }

    fn arity(&self) -> usize {
        1
    }

    fn forward(&mut self, ctx: &mut Context, inputs: &[&Value]) -> Result<Array> {
        let out = inputs[0].to_array();
        ctx.save(inputs);
        Ok(out)
    }

    fn backward(&self, _ctx: &Context, grad: &Array) -> Result<Vec<Array>> {
        Ok(vec![grad.clone()])
    }

    fn forward_tangent(&self, _ctx: &Context, tangents: &[Array]) -> Result<Array> {
        Ok(tangents[0].clone())
    }
}

/// Element-type conversion between float types.
///
/// Gradients are converted back to the input's type, tangents to the output's.
#[derive(Debug, Clone, Default)]
pub struct Cast {
    dtype: DType,
    input_dtype: DType,
}

impl Cast {
    pub fn new(dtype: DType) -> Self {
        Self {
            dtype,
            input_dtype: dtype,
        }
    }
}

impl Function for Cast {
    fn name(&self) -> &'static str {
        "Cast"
    }

    fn arity(&self) -> usize {
        1
    }

    fn forward(&mut self, ctx: &mut Context, inputs: &[&Value]) -> Result<Array> {
        self.input_dtype = inputs[0].dtype();
        let out = inputs[0].data().to_dtype(self.dtype);
        ctx.save(inputs);
        Ok(out)
    }

    fn backward(&self, _ctx: &Context, grad: &Array) -> Result<Vec<Array>> {
        Ok(vec![grad.to_dtype(self.input_dtype)])
    }

    fn forward_tangent(&self, _ctx: &Context, tangents: &[Array]) -> Result<Array> {
        Ok(tangents[0].to_dtype(self.dtype))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autodiff::mode::{GradMode, set_mode};
    use approx::assert_relative_eq;

    #[test]
    fn test_sin_cos_gradients() {
        let _mode = set_mode(GradMode::ENABLED);
        let points = vec![0.0, 0.5, 1.0, -2.0];
        let x = Value::from_vec(points.clone(), &[4], true).unwrap();
        let y = x.sin().unwrap().add(&x.cos().unwrap()).unwrap();
        y.sum_all().unwrap().backward().unwrap();
        let g = x.grad().unwrap().to_array();
        for (i, &p) in points.iter().enumerate() {
            assert_relative_eq!(g.data()[i], p.cos() - p.sin(), epsilon = 1e-12);
        }
    }

    #[test]
    fn test_sin_cos_tangents() {
        let _mode = set_mode(GradMode::ENABLED);
        let x = Value::scalar(0.3);
        x.make_dual(Array::scalar(2.0)).unwrap();
        let s = x.sin().unwrap();
        let c = x.cos().unwrap();
        assert_relative_eq!(
            s.tangent().unwrap().item().unwrap(),
            2.0 * 0.3f64.cos(),
            epsilon = 1e-12
        );
        assert_relative_eq!(
            c.tangent().unwrap().item().unwrap(),
            -2.0 * 0.3f64.sin(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_identity_is_a_new_node() {
        let _mode = set_mode(GradMode::ENABLED);
        let x = Value::leaf(Array::ones(&[2])).unwrap();
        let y = x.identity().unwrap();
        assert!(!Value::ptr_eq(&x, &y));
        assert!(!y.is_leaf());
        y.backward().unwrap();
        assert_eq!(x.grad().unwrap().to_array().data(), &[1.0, 1.0]);
    }

    #[test]
    fn test_cast_keeps_graph_between_floats() {
        let _mode = set_mode(GradMode::ENABLED);
        let x = Value::from_vec(vec![1.5, -2.25], &[2], true).unwrap();
        let y = x.float().unwrap();
        assert_eq!(y.dtype(), DType::F32);
        assert!(y.grad_node().is_some());
        assert_eq!(y.tangent().unwrap().dtype(), DType::F32);

        y.mul(&Value::scalar(2.0)).unwrap().sum_all().unwrap().backward().unwrap();
        let g = x.grad().unwrap();
        assert_eq!(g.dtype(), DType::F64);
        assert_eq!(g.to_array().data(), &[2.0, 2.0]);
    }

    #[test]
    fn test_cast_to_integer_is_untracked() {
        let _mode = set_mode(GradMode::ENABLED);
        let x = Value::from_vec(vec![1.7, -2.2], &[2], true).unwrap();
        let y = x.to_dtype(DType::I32).unwrap();
        assert_eq!(y.dtype(), DType::I32);
        assert!(!y.requires_grad());
        assert!(y.grad_node().is_none());
        assert_eq!(y.data().data(), &[1.0, -2.0]);

        let back = y.double().unwrap();
        assert_eq!(back.dtype(), DType::F64);
        assert!(!back.requires_grad());
    }
}
