//! Sum reductions.

use crate::array::Array;
use crate::error::{GradError, Result};
use crate::shape::{
    cartesian_to_linear, check_axis, compute_strides, linear_to_cartesian, numel, reduction_axes,
};

/// Sum over `axes` (all axes when `None`).
///
/// With `keepdims` the summed axes remain with extent 1, otherwise they are
/// removed.
///
/// # Errors
///
/// Returns [`GradError::InvalidAxis`] for an out-of-range axis and
/// [`GradError::InvalidOperation`] for a repeated one.
///
/// # Example
///
/// ```
/// use ndgrad::Array;
/// use ndgrad::operations::sum_axes;
///
/// // [[1, 3, 5], [2, 4, 6]] in column-major order
/// let a = Array::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]).unwrap();
/// let rows = sum_axes(&a, Some(&[1]), false).unwrap();
/// assert_eq!(rows.shape(), &[2]);
/// assert_eq!(rows.data(), &[9.0, 12.0]);
///
/// let total = sum_axes(&a, None, false).unwrap();
/// assert_eq!(total.item().unwrap(), 21.0);
/// ```
pub fn sum_axes(a: &Array, axes: Option<&[usize]>, keepdims: bool) -> Result<Array> {
    let ndim = a.ndim();
    let mut summed = vec![false; ndim];
    match axes {
        None => summed.iter_mut().for_each(|s| *s = true),
        Some(axes) => {
            for &axis in axes {
                check_axis(axis, ndim)?;
                if summed[axis] {
                    return Err(GradError::InvalidOperation(format!(
                        "axis {axis} repeated in reduction"
                    )));
                }
                summed[axis] = true;
            }
        }
    }

    // Output shape with summed axes collapsed to 1; dropped afterwards if needed
    let kept_shape: Vec<usize> = a
        .shape()
        .iter()
        .zip(&summed)
        .map(|(&d, &s)| if s { 1 } else { d })
        .collect();
    let kept_strides = compute_strides(&kept_shape);

    let mut out = vec![0.0; numel(&kept_shape)];
    for (linear, &x) in a.data().iter().enumerate() {
        let mut index = linear_to_cartesian(linear, a.shape());
        for (i, s) in index.iter_mut().zip(&summed) {
            if *s {
                *i = 0;
            }
        }
        out[cartesian_to_linear(&index, &kept_strides)] += x;
    }

    let shape = if keepdims {
        kept_shape
    } else {
        a.shape()
            .iter()
            .zip(&summed)
            .filter(|(_, s)| !**s)
            .map(|(&d, _)| d)
            .collect()
    };
    let dtype = a.dtype();
    let out = out.into_iter().map(|x| dtype.normalize(x)).collect();
    Ok(Array::from_parts(out, shape, dtype))
}

/// Reduce a broadcast gradient back onto `target` shape.
///
/// The summed axes follow [`reduction_axes`]; the result is then laid out in
/// exactly `target` shape.
///
/// # Errors
///
/// Returns [`GradError::GradientShape`] if `grad` is not a broadcast of
/// `target`.
pub fn sum_to_shape(grad: &Array, target: &[usize]) -> Result<Array> {
    if grad.shape() == target {
        return Ok(grad.clone());
    }
    let (axes, keepdims) = reduction_axes(target, grad.shape())?;
    let reduced = sum_axes(grad, Some(&axes), keepdims)?;
    if reduced.shape() == target {
        Ok(reduced)
    } else {
        reduced.reshape(target)
    }
}
