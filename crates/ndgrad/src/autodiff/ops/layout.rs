//! Layout changes: reshape, permute, squeeze, unsqueeze.
//!
//! None of these touch values, so their derivative rules are the inverse
//! layout change (backward) and the same layout change (forward).

use crate::array::Array;
use crate::autodiff::context::{Context, Function};
use crate::autodiff::value::Value;
use crate::error::{GradError, Result};
use crate::operations::{inverse_permutation, permutedims};
use crate::shape::check_axis;

/// Reinterpret the data with a new shape.
#[derive(Debug, Clone, Default)]
pub struct Reshape {
    shape: Vec<usize>,
    input_shape: Vec<usize>,
}

impl Reshape {
    pub fn new(shape: &[usize]) -> Self {
        Self {
            shape: shape.to_vec(),
            input_shape: Vec::new(),
        }
    }
}

impl Function for Reshape {
    fn name(&self) -> &'static str {
        "Reshape"
    }

    fn arity(&self) -> usize {
        1
    }

    fn forward(&mut self, ctx: &mut Context, inputs: &[&Value]) -> Result<Array> {
        let out = inputs[0].data().reshape(&self.shape)?;
        self.input_shape = inputs[0].shape();
        ctx.save(inputs);
        Ok(out)
    }

    fn backward(&self, _ctx: &Context, grad: &Array) -> Result<Vec<Array>> {
        Ok(vec![grad.reshape(&self.input_shape)?])
    }

    fn forward_tangent(&self, _ctx: &Context, tangents: &[Array]) -> Result<Array> {
        tangents[0].reshape(&self.shape)
    }
}

/// Reorder axes.
#[derive(Debug, Clone, Default)]
pub struct Permute {
    perm: Vec<usize>,
}

impl Permute {
    pub fn new(perm: &[usize]) -> Self {
        Self {
            perm: perm.to_vec(),
        }
    }

    /// The permutation of `ndim` axes that swaps `dim0` and `dim1`.
    pub fn swap(ndim: usize, dim0: usize, dim1: usize) -> Result<Self> {
        check_axis(dim0, ndim)?;
        check_axis(dim1, ndim)?;
        let mut perm: Vec<usize> = (0..ndim).collect();
        perm.swap(dim0, dim1);
        Ok(Self { perm })
    }

    /// The permutation of `ndim` axes that swaps the last two.
    pub fn swap_last(ndim: usize) -> Result<Self> {
        if ndim < 2 {
            return Err(GradError::RankMismatch {
                expected: 2,
                actual: ndim,
            });
        }
        Self::swap(ndim, ndim - 2, ndim - 1)
    }
}

impl Function for Permute {
    fn name(&self) -> &'static str {
        "Permute"
    }

    fn arity(&self) -> usize {
        1
    }

    fn forward(&mut self, ctx: &mut Context, inputs: &[&Value]) -> Result<Array> {
        let out = permutedims(&inputs[0].data(), &self.perm)?;
        ctx.save(inputs);
        Ok(out)
    }

    fn backward(&self, _ctx: &Context, grad: &Array) -> Result<Vec<Array>> {
        Ok(vec![permutedims(grad, &inverse_permutation(&self.perm))?])
    }

    fn forward_tangent(&self, _ctx: &Context, tangents: &[Array]) -> Result<Array> {
        permutedims(&tangents[0], &self.perm)
    }
}

/// Remove one axis of extent 1, or every such axis.
#[derive(Debug, Clone, Default)]
pub struct Squeeze {
    axis: Option<usize>,
    input_shape: Vec<usize>,
    output_shape: Vec<usize>,
}

impl Squeeze {
    pub fn new(axis: usize) -> Self {
        Self {
            axis: Some(axis),
            ..Self::default()
        }
    }

    /// Squeeze every axis of extent 1.
    pub fn all() -> Self {
        Self::default()
    }
}

impl Function for Squeeze {
    fn name(&self) -> &'static str {
        "Squeeze"
    }

    fn arity(&self) -> usize {
        1
    }

    fn forward(&mut self, ctx: &mut Context, inputs: &[&Value]) -> Result<Array> {
        let input_shape = inputs[0].shape();
        let output_shape = match self.axis {
            Some(axis) => {
                check_axis(axis, input_shape.len())?;
                let extent = input_shape[axis];
                if extent != 1 {
                    return Err(GradError::NotSqueezable { axis, extent });
                }
                let mut shape = input_shape.clone();
                shape.remove(axis);
                shape
            }
            None => input_shape.iter().copied().filter(|&d| d != 1).collect(),
        };
        let out = inputs[0].data().reshape(&output_shape)?;
        self.input_shape = input_shape;
        self.output_shape = output_shape;
        ctx.save(inputs);
        Ok(out)
    }

    fn backward(&self, _ctx: &Context, grad: &Array) -> Result<Vec<Array>> {
        Ok(vec![grad.reshape(&self.input_shape)?])
    }

    fn forward_tangent(&self, _ctx: &Context, tangents: &[Array]) -> Result<Array> {
        tangents[0].reshape(&self.output_shape)
    }
}

/// Insert an axis of extent 1.
#[derive(Debug, Clone, Default)]
pub struct Unsqueeze {
    axis: usize,
    input_shape: Vec<usize>,
}

impl Unsqueeze {
    pub fn new(axis: usize) -> Self {
        Self {
            axis,
            input_shape: Vec::new(),
        }
    }

    fn output_shape(&self) -> Vec<usize> {
        let mut shape = self.input_shape.clone();
        shape.insert(self.axis, 1);
        shape
    }
}

impl Function for Unsqueeze {
    fn name(&self) -> &'static str {
        "Unsqueeze"
    }

    fn arity(&self) -> usize {
        1
    }

    fn forward(&mut self, ctx: &mut Context, inputs: &[&Value]) -> Result<Array> {
        self.input_shape = inputs[0].shape();
        // Valid positions are 0..=ndim
        check_axis(self.axis, self.input_shape.len() + 1)?;
        let out = inputs[0].data().reshape(&self.output_shape())?;
        ctx.save(inputs);
        Ok(out)
    }

    fn backward(&self, _ctx: &Context, grad: &Array) -> Result<Vec<Array>> {
        Ok(vec![grad.reshape(&self.input_shape)?])
    }

    fn forward_tangent(&self, _ctx: &Context, tangents: &[Array]) -> Result<Array> {
        tangents[0].reshape(&self.output_shape())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autodiff::mode::{GradMode, set_mode};

    fn counting_leaf(shape: &[usize]) -> Value {
        let n: usize = shape.iter().product();
        Value::from_vec((0..n).map(|i| i as f64).collect(), shape, true).unwrap()
    }

    #[test]
    fn test_reshape_gradient_shape() {
        let _mode = set_mode(GradMode::ENABLED);
        let x = counting_leaf(&[2, 3]);
        let y = x.reshape(&[3, 2]).unwrap();
        let seed = Value::from_vec((0..6).map(|i| i as f64).collect(), &[3, 2], false).unwrap();
        y.backward_with(&seed).unwrap();
        let g = x.grad().unwrap().to_array();
        assert_eq!(g.shape(), &[2, 3]);
        assert_eq!(g.data(), &[0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_permute_gradient_follows_elements() {
        let _mode = set_mode(GradMode::ENABLED);
        let x = counting_leaf(&[2, 3, 4]);
        let y = x.permute(&[2, 0, 1]).unwrap();
        assert_eq!(y.shape(), vec![4, 2, 3]);
        // Seed equal to the permuted values routes each value back to itself
        y.backward_with(&y.detach()).unwrap();
        assert_eq!(x.grad().unwrap().to_array(), x.to_array());
    }

    #[test]
    fn test_transpose_swaps_axes() {
        let _mode = set_mode(GradMode::ENABLED);
        let x = counting_leaf(&[2, 3]);
        let t = x.transpose(0, 1).unwrap();
        assert_eq!(t.shape(), vec![3, 2]);
        assert_eq!(t.data().get(&[2, 1]), x.data().get(&[1, 2]));
        assert!(x.transpose(0, 2).is_err());
    }

    #[test]
    fn test_squeeze_unsqueeze_roundtrip() {
        let _mode = set_mode(GradMode::ENABLED);
        let x = counting_leaf(&[2, 1, 3]);
        let s = x.squeeze(1).unwrap();
        assert_eq!(s.shape(), vec![2, 3]);
        let u = s.unsqueeze(0).unwrap();
        assert_eq!(u.shape(), vec![1, 2, 3]);
        u.sum_all().unwrap().backward().unwrap();
        assert_eq!(x.grad().unwrap().shape(), vec![2, 1, 3]);
    }

    #[test]
    fn test_squeeze_rejects_wide_axis() {
        let x = counting_leaf(&[2, 3]);
        assert_eq!(
            x.squeeze(0).unwrap_err(),
            GradError::NotSqueezable { axis: 0, extent: 2 }
        );
        assert!(x.unsqueeze(3).is_err());
        assert!(x.unsqueeze(2).is_ok());
    }

    #[test]
    fn test_layout_tangents() {
        let _mode = set_mode(GradMode::ENABLED);
        let x = Value::constant(Array::ones(&[2, 3]));
        x.make_dual(Array::from_vec((0..6).map(|i| i as f64).collect(), &[2, 3]).unwrap())
            .unwrap();
        let t = x.transpose(0, 1).unwrap().unsqueeze(0).unwrap();
        let tangent = t.tangent().unwrap().to_array();
        assert_eq!(tangent.shape(), &[1, 3, 2]);
        assert_eq!(tangent.get(&[0, 2, 1]), Some(5.0));
    }

    #[test]
    fn test_squeeze_all_drops_unit_axes() {
        let _mode = set_mode(GradMode::ENABLED);
        let x = counting_leaf(&[1, 2, 1, 3]);
        let s = x.squeeze_all().unwrap();
        assert_eq!(s.shape(), vec![2, 3]);
        assert_eq!(s.tangent().unwrap().shape(), vec![2, 3]);
        s.sum_all().unwrap().backward().unwrap();
        assert_eq!(x.grad().unwrap().shape(), vec![1, 2, 1, 3]);

        let one = Value::leaf(Array::ones(&[1, 1])).unwrap();
        assert_eq!(one.squeeze_all().unwrap().shape(), Vec::<usize>::new());
    }

    #[test]
    fn test_transpose_last_swaps_trailing_axes() {
        let _mode = set_mode(GradMode::ENABLED);
        let x = counting_leaf(&[4, 2, 3]);
        let t = x.transpose_last().unwrap();
        assert_eq!(t.shape(), vec![4, 3, 2]);
        assert_eq!(t.data().get(&[1, 2, 0]), x.data().get(&[1, 0, 2]));

        let v = counting_leaf(&[3]);
        assert_eq!(
            v.transpose_last().unwrap_err(),
            GradError::RankMismatch {
                expected: 2,
                actual: 1
            }
        );
    }
}
