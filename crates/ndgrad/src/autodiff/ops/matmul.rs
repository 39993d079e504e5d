//! Matrix product.

use crate::array::Array;
use crate::autodiff::context::{Context, Function};
use crate::autodiff::value::Value;
use crate::error::Result;
use crate::operations::{matmul, transpose_matrix, zip_broadcast};

/// `a · b` for 2-D `a` and `b`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Matmul;

impl Function for Matmul {
    fn name(&self) -> &'static str {
        "Matmul"
    }

    fn arity(&self) -> usize {
        2
    }

    fn forward(&mut self, ctx: &mut Context, inputs: &[&Value]) -> Result<Array> {
        let out = matmul(&inputs[0].data(), &inputs[1].data())?;
        ctx.save(inputs);
        Ok(out)
    }

    fn backward(&self, ctx: &Context, grad: &Array) -> Result<Vec<Array>> {
        let a = ctx.saved_value(0)?.data();
        let b = ctx.saved_value(1)?.data();
        let grad_a = matmul(grad, &transpose_matrix(&b)?)?;
        let grad_b = matmul(&transpose_matrix(&a)?, grad)?;
        Ok(vec![grad_a, grad_b])
    }

    fn forward_tangent(&self, ctx: &Context, tangents: &[Array]) -> Result<Array> {
        let a = ctx.saved_value(0)?.data();
        let b = ctx.saved_value(1)?.data();
        let left = matmul(&tangents[0], &b)?;
        let right = matmul(&a, &tangents[1])?;
        zip_broadcast(&left, &right, |l, r| l + r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autodiff::mode::{GradMode, set_mode};
    use approx::assert_relative_eq;

    #[test]
    fn test_matmul_gradients_with_ones() {
        let _mode = set_mode(GradMode::ENABLED);
        let a = Value::leaf(Array::ones(&[2, 3])).unwrap();
        let b = Value::leaf(Array::ones(&[3, 4])).unwrap();
        let c = a.matmul(&b).unwrap();
        assert_eq!(c.shape(), vec![2, 4]);
        c.sum_all().unwrap().backward().unwrap();
        // d(sum(AB))/dA = ones(2,4) · B^T, every entry is 4
        let ga = a.grad().unwrap().to_array();
        assert_eq!(ga.shape(), &[2, 3]);
        assert!(ga.data().iter().all(|&v| v == 4.0));
        let gb = b.grad().unwrap().to_array();
        assert_eq!(gb.shape(), &[3, 4]);
        assert!(gb.data().iter().all(|&v| v == 2.0));
    }

    #[test]
    fn test_matmul_tangent_product_rule() {
        let _mode = set_mode(GradMode::ENABLED);
        let a = Value::constant(Array::from_vec(vec![1.0, 3.0, 2.0, 4.0], &[2, 2]).unwrap());
        let b = Value::constant(Array::from_vec(vec![5.0, 7.0, 6.0, 8.0], &[2, 2]).unwrap());
        let eye = Array::from_vec(vec![1.0, 0.0, 0.0, 1.0], &[2, 2]).unwrap();
        a.make_dual(eye.clone()).unwrap();
        b.make_dual(eye).unwrap();
        let c = a.matmul(&b).unwrap();
        // I·B + A·I = A + B
        let t = c.tangent().unwrap().to_array();
        for (i, expected) in [6.0, 10.0, 8.0, 12.0].into_iter().enumerate() {
            assert_relative_eq!(t.data()[i], expected, epsilon = 1e-12);
        }
    }
}
