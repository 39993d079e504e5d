//! Sum reduction.

use crate::array::Array;
use crate::autodiff::context::{Context, Function};
use crate::autodiff::value::Value;
use crate::error::Result;
use crate::operations::{expand_to, sum_axes};

/// Sum over a set of axes (all axes when `axes` is `None`).
#[derive(Debug, Clone, Default)]
pub struct Sum {
    axes: Option<Vec<usize>>,
    keepdims: bool,
    input_shape: Vec<usize>,
}

impl Sum {
    pub fn new(axes: Option<&[usize]>, keepdims: bool) -> Self {
        Self {
            axes: axes.map(<[usize]>::to_vec),
            keepdims,
            input_shape: Vec::new(),
        }
    }

    /// Input shape with the summed axes set to 1.
    fn kept_shape(&self) -> Vec<usize> {
        self.input_shape
            .iter()
            .enumerate()
            .map(|(i, &d)| match &self.axes {
                Some(axes) if !axes.contains(&i) => d,
                _ => 1,
            })
            .collect()
    }
}

impl Function for Sum {
    fn name(&self) -> &'static str {
        "Sum"
    }

    fn arity(&self) -> usize {
        1
    }

    fn forward(&mut self, ctx: &mut Context, inputs: &[&Value]) -> Result<Array> {
        let a = inputs[0].data();
        let out = sum_axes(&a, self.axes.as_deref(), self.keepdims)?;
        self.input_shape = a.shape().to_vec();
        drop(a);
        ctx.save(inputs);
        Ok(out)
    }

    fn backward(&self, _ctx: &Context, grad: &Array) -> Result<Vec<Array>> {
        // Dropped axes have extent 1 in column-major order, so a reshape
        // restores them without moving data
        let kept = if self.keepdims {
            grad.clone()
        } else {
            grad.reshape(&self.kept_shape())?
        };
        Ok(vec![expand_to(&kept, &self.input_shape)?])
    }

    fn forward_tangent(&self, _ctx: &Context, tangents: &[Array]) -> Result<Array> {
        sum_axes(&tangents[0], self.axes.as_deref(), self.keepdims)
    }
}
