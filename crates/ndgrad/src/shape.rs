//! Shape, stride and broadcasting utilities.
//!
//! Uses column-major (Fortran) order to match faer. Broadcasting follows the
//! NumPy convention: shapes are aligned on their trailing axes and an extent
//! of 1 stretches to match the other operand.

use crate::error::{GradError, Result};

/// Compute column-major strides from shape.
///
/// For shape [d0, d1, d2, ...], returns strides [1, d0, d0*d1, ...].
///
/// # Examples
///
/// ```
/// use ndgrad::shape::compute_strides;
///
/// assert_eq!(compute_strides(&[3, 4, 5]), vec![1, 3, 12]);
/// assert_eq!(compute_strides(&[]), Vec::<usize>::new());
/// ```
pub fn compute_strides(shape: &[usize]) -> Vec<usize> {
    let mut stride = 1;
    shape
        .iter()
        .map(|&dim| {
            let s = stride;
            stride *= dim;
            s
        })
        .collect()
}

/// Convert cartesian indices to a linear offset.
#[inline]
pub fn cartesian_to_linear(indices: &[usize], strides: &[usize]) -> usize {
    indices
        .iter()
        .zip(strides.iter())
        .map(|(&idx, &stride)| idx * stride)
        .sum()
}

/// Convert a column-major linear index to cartesian indices.
pub fn linear_to_cartesian(mut linear: usize, shape: &[usize]) -> Vec<usize> {
    let mut indices = Vec::with_capacity(shape.len());
    for &dim in shape {
        indices.push(linear % dim);
        linear /= dim;
    }
    indices
}

/// Number of elements described by `shape` (1 for a 0-d shape).
#[inline]
pub fn numel(shape: &[usize]) -> usize {
    shape.iter().product()
}

/// Compute the broadcast shape of two operands.
///
/// # Errors
///
/// Returns [`GradError::BroadcastMismatch`] when a pair of aligned extents
/// differ and neither is 1.
///
/// # Examples
///
/// ```
/// use ndgrad::shape::broadcast_shapes;
///
/// assert_eq!(broadcast_shapes(&[3], &[4, 3]).unwrap(), vec![4, 3]);
/// assert_eq!(broadcast_shapes(&[2, 1], &[1, 5]).unwrap(), vec![2, 5]);
/// assert!(broadcast_shapes(&[2], &[3]).is_err());
/// ```
pub fn broadcast_shapes(lhs: &[usize], rhs: &[usize]) -> Result<Vec<usize>> {
    let ndim = lhs.len().max(rhs.len());
    let mut out = vec![0; ndim];
    for (i, slot) in out.iter_mut().enumerate() {
        let l = padded_extent(lhs, ndim, i);
        let r = padded_extent(rhs, ndim, i);
        *slot = match (l, r) {
            (l, r) if l == r => l,
            (1, r) => r,
            (l, 1) => l,
            _ => {
                return Err(GradError::BroadcastMismatch {
                    lhs: lhs.to_vec(),
                    rhs: rhs.to_vec(),
                });
            }
        };
    }
    Ok(out)
}

/// Strides that read an array of `shape` as if it had `target` shape.
///
/// Broadcast axes (missing leading axes, or extent 1 stretched to more) get
/// stride 0. `target` must be a valid broadcast of `shape`.
pub fn broadcast_strides(shape: &[usize], strides: &[usize], target: &[usize]) -> Vec<usize> {
    let offset = target.len() - shape.len();
    (0..target.len())
        .map(|i| {
            if i < offset {
                0
            } else {
                let j = i - offset;
                if shape[j] == 1 && target[i] != 1 {
                    0
                } else {
                    strides[j]
                }
            }
        })
        .collect()
}

/// Axes a gradient must be summed over to land back on `target`.
///
/// Returns the axes together with the `keepdims` flag to sum with:
///
/// - a single-element `target` sums every axis of `grad`, dropping them;
/// - otherwise `target` is left-padded with 1s to the rank of `grad`, every
///   axis where the padded extents differ is summed, and the summed axes are
///   kept only when the ranks already matched.
///
/// # Errors
///
/// Returns [`GradError::GradientShape`] when `grad` is not a broadcast of
/// `target`.
///
/// # Examples
///
/// ```
/// use ndgrad::shape::reduction_axes;
///
/// assert_eq!(reduction_axes(&[3], &[4, 3]).unwrap(), (vec![0], false));
/// assert_eq!(reduction_axes(&[1, 3], &[4, 3]).unwrap(), (vec![0], true));
/// assert_eq!(reduction_axes(&[], &[2, 3]).unwrap(), (vec![0, 1], false));
/// ```
pub fn reduction_axes(target: &[usize], grad: &[usize]) -> Result<(Vec<usize>, bool)> {
    let mismatch = || GradError::GradientShape {
        target: target.to_vec(),
        grad: grad.to_vec(),
    };

    if numel(target) == 1 {
        return Ok(((0..grad.len()).collect(), false));
    }
    if grad.len() < target.len() {
        return Err(mismatch());
    }

    let ndim = grad.len();
    let mut axes = Vec::new();
    for (i, &g) in grad.iter().enumerate() {
        let t = padded_extent(target, ndim, i);
        if t != g {
            if t != 1 {
                return Err(mismatch());
            }
            axes.push(i);
        }
    }
    Ok((axes, target.len() == grad.len()))
}

/// Validate an axis against `ndim`.
pub(crate) fn check_axis(axis: usize, ndim: usize) -> Result<()> {
    if axis >= ndim {
        return Err(GradError::InvalidAxis { axis, ndim });
    }
    Ok(())
}

/// Extent of `shape` at axis `i` after left-padding it to `ndim` axes.
#[inline]
fn padded_extent(shape: &[usize], ndim: usize, i: usize) -> usize {
    let offset = ndim - shape.len();
    if i < offset { 1 } else { shape[i - offset] }
}
