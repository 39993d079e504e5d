//! Reverse pass entry point.

use tracing::debug;

use crate::autodiff::value::Value;
use crate::error::{GradError, Result};

/// Propagate gradients from `root` to every reachable leaf.
///
/// `seed` is the gradient of the final objective with respect to `root`; it
/// defaults to ones of `root`'s shape. Gradients add into each leaf's
/// accumulator, so repeated calls accumulate until the caller clears them
/// with [`Value::zero_grad`].
///
/// A `root` without a graph node (a leaf, or a value computed without
/// tracking) makes this a no-op.
///
/// # Errors
///
/// Returns error if the seed shape differs from `root`'s shape or any node
/// on the way fails. Leaves reached before the failure keep what they
/// received.
///
/// # Example
///
/// ```
/// use ndgrad::Array;
/// use ndgrad::autodiff::{Value, backward};
///
/// let x = Value::leaf(Array::from_vec(vec![1.0, 2.0, 3.0], &[3]).unwrap()).unwrap();
/// let y = x.mul(&x).unwrap().sum_all().unwrap();
/// backward(&y, None).unwrap();
///
/// // dy/dx = 2x
/// assert_eq!(x.grad().unwrap().to_array().data(), &[2.0, 4.0, 6.0]);
/// ```
pub fn backward(root: &Value, seed: Option<&Value>) -> Result<()> {
    let Some(node) = root.grad_node() else {
        debug!("backward called on a value with no graph; nothing to do");
        return Ok(());
    };

    let seed = match seed {
        Some(seed) => {
            let (root_shape, seed_shape) = (root.shape(), seed.shape());
            if root_shape != seed_shape {
                return Err(GradError::SeedShape {
                    root: root_shape,
                    seed: seed_shape,
                });
            }
            seed.to_array()
        }
        None => root.data().ones_like(),
    };

    debug!(root = node.name(), shape = ?seed.shape(), "starting backward pass");
    node.apply(seed)
}

impl Value {
    /// Run [`backward`] from this value with the default seed.
    pub fn backward(&self) -> Result<()> {
        backward(self, None)
    }

    /// Run [`backward`] from this value with an explicit seed.
    pub fn backward_with(&self, seed: &Value) -> Result<()> {
        backward(self, Some(seed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::array::Array;
    use crate::autodiff::mode::{GradMode, set_mode};
    use approx::assert_relative_eq;

    #[test]
    fn test_backward_on_leaf_is_noop() {
        let x = Value::leaf(Array::ones(&[2])).unwrap();
        backward(&x, None).unwrap();
        assert!(x.grad().is_none());
    }

    #[test]
    fn test_seed_shape_checked() {
        let _mode = set_mode(GradMode::ENABLED);
        let x = Value::leaf(Array::ones(&[2])).unwrap();
        let y = x.sin().unwrap();
        let err = y.backward_with(&Value::constant(Array::ones(&[3]))).unwrap_err();
        assert_eq!(
            err,
            GradError::SeedShape {
                root: vec![2],
                seed: vec![3]
            }
        );
        assert!(x.grad().is_none());
    }

    #[test]
    fn test_explicit_seed_scales_gradient() {
        let _mode = set_mode(GradMode::ENABLED);
        let x = Value::leaf(Array::from_vec(vec![0.0, 1.0], &[2]).unwrap()).unwrap();
        let y = x.sin().unwrap();
        y.backward_with(&Value::constant(Array::full(&[2], 2.0))).unwrap();
        let g = x.grad().unwrap().to_array();
        assert_relative_eq!(g.data()[0], 2.0, epsilon = 1e-12);
        assert_relative_eq!(g.data()[1], 2.0 * 1.0f64.cos(), epsilon = 1e-12);
    }

    #[test]
    fn test_repeated_backward_accumulates() {
        let _mode = set_mode(GradMode::ENABLED);
        let x = Value::leaf(Array::full(&[3], 2.0)).unwrap();
        let y = x.mul(&x).unwrap().sum_all().unwrap();
        y.backward().unwrap();
        y.backward().unwrap();
        assert_eq!(x.grad().unwrap().to_array().data(), &[8.0; 3]);

        x.zero_grad();
        y.backward().unwrap();
        assert_eq!(x.grad().unwrap().to_array().data(), &[4.0; 3]);
    }
}
