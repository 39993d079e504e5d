//! Element-wise operations with NumPy-style broadcasting.

use crate::array::Array;
use crate::error::{GradError, Result};
use crate::shape::{broadcast_shapes, broadcast_strides, numel};

/// Apply a function to every element, keeping the element type.
///
/// # Example
///
/// ```
/// use ndgrad::Array;
/// use ndgrad::operations::map;
///
/// let a = Array::from_vec(vec![1.0, 4.0, 9.0], &[3]).unwrap();
/// assert_eq!(map(&a, f64::sqrt).data(), &[1.0, 2.0, 3.0]);
/// ```
pub fn map<F>(a: &Array, f: F) -> Array
where
    F: Fn(f64) -> f64,
{
    let dtype = a.dtype();
    let data = a.data().iter().map(|&x| dtype.normalize(f(x))).collect();
    Array::from_parts(data, a.shape().to_vec(), dtype)
}

/// Multiply every element by `alpha`.
pub fn scale(a: &Array, alpha: f64) -> Array {
    map(a, |x| alpha * x)
}

/// Combine two arrays element-wise after broadcasting them together.
///
/// The result has the broadcast shape and the promoted element type.
///
/// # Errors
///
/// Returns [`GradError::BroadcastMismatch`] if the shapes are incompatible.
///
/// # Example
///
/// ```
/// use ndgrad::Array;
/// use ndgrad::operations::zip_broadcast;
///
/// let row = Array::from_vec(vec![1.0, 2.0, 3.0], &[3]).unwrap();
/// let m = Array::ones(&[4, 3]);
/// let c = zip_broadcast(&m, &row, |x, y| x + y).unwrap();
/// assert_eq!(c.shape(), &[4, 3]);
/// assert_eq!(c.get(&[3, 2]), Some(4.0));
/// ```
pub fn zip_broadcast<F>(a: &Array, b: &Array, f: F) -> Result<Array>
where
    F: Fn(f64, f64) -> f64,
{
    let dtype = a.dtype().promote(b.dtype());

    // Fast path: identical shapes
    if a.shape() == b.shape() {
        let data = a
            .data()
            .iter()
            .zip(b.data())
            .map(|(&x, &y)| dtype.normalize(f(x, y)))
            .collect();
        return Ok(Array::from_parts(data, a.shape().to_vec(), dtype));
    }

    let shape = broadcast_shapes(a.shape(), b.shape())?;
    let a_strides = broadcast_strides(a.shape(), a.strides(), &shape);
    let b_strides = broadcast_strides(b.shape(), b.strides(), &shape);

    let mut data = Vec::with_capacity(numel(&shape));
    for_each_offset_pair(&shape, &a_strides, &b_strides, |ia, ib| {
        data.push(dtype.normalize(f(a.data()[ia], b.data()[ib])));
    });
    Ok(Array::from_parts(data, shape, dtype))
}

/// Materialize `a` broadcast to `shape`.
///
/// # Errors
///
/// Returns [`GradError::BroadcastMismatch`] unless `a` broadcasts to exactly
/// `shape`.
pub fn expand_to(a: &Array, shape: &[usize]) -> Result<Array> {
    if a.shape() == shape {
        return Ok(a.clone());
    }
    if broadcast_shapes(a.shape(), shape)? != shape {
        return Err(GradError::BroadcastMismatch {
            lhs: a.shape().to_vec(),
            rhs: shape.to_vec(),
        });
    }
    let strides = broadcast_strides(a.shape(), a.strides(), shape);
    let mut data = Vec::with_capacity(numel(shape));
    for_each_offset_pair(shape, &strides, &strides, |ia, _| data.push(a.data()[ia]));
    Ok(Array::from_parts(data, shape.to_vec(), a.dtype()))
}

/// Add `src` into `dst` in place.
///
/// # Errors
///
/// Returns [`GradError::BroadcastMismatch`] if the shapes differ.
pub fn add_assign(dst: &mut Array, src: &Array) -> Result<()> {
    if dst.shape() != src.shape() {
        return Err(GradError::BroadcastMismatch {
            lhs: dst.shape().to_vec(),
            rhs: src.shape().to_vec(),
        });
    }
    let dtype = dst.dtype();
    for (d, &s) in dst.data_mut().iter_mut().zip(src.data()) {
        *d = dtype.normalize(*d + s);
    }
    Ok(())
}

/// Walk `shape` in column-major order, yielding the storage offsets of two
/// operands read through `a_strides` and `b_strides`.
fn for_each_offset_pair<F>(shape: &[usize], a_strides: &[usize], b_strides: &[usize], mut f: F)
where
    F: FnMut(usize, usize),
{
    let total = numel(shape);
    let mut index = vec![0usize; shape.len()];
    let (mut ia, mut ib) = (0usize, 0usize);
    for _ in 0..total {
        f(ia, ib);
        // Advance the column-major counter, carrying into higher axes
        for axis in 0..shape.len() {
            index[axis] += 1;
            ia += a_strides[axis];
            ib += b_strides[axis];
            if index[axis] < shape[axis] {
                break;
            }
            ia -= a_strides[axis] * shape[axis];
            ib -= b_strides[axis] * shape[axis];
            index[axis] = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dtype::DType;
    use approx::assert_relative_eq;

    #[test]
    fn test_map_keeps_dtype() {
        let a = Array::from_vec_with_dtype(vec![1.0, 2.0], &[2], DType::I32).unwrap();
        let b = map(&a, |x| x / 2.0);
        assert_eq!(b.dtype(), DType::I32);
        assert_eq!(b.data(), &[0.0, 1.0]);
    }

    #[test]
    fn test_zip_same_shape() {
        let a = Array::from_vec(vec![1.0, 2.0, 3.0], &[3]).unwrap();
        let b = Array::from_vec(vec![4.0, 5.0, 6.0], &[3]).unwrap();
        let c = zip_broadcast(&a, &b, |x, y| x * y).unwrap();
        assert_eq!(c.data(), &[4.0, 10.0, 18.0]);
    }

    #[test]
    fn test_zip_broadcast_column_and_row() {
        // col: (2, 1) = [1, 2], row: (1, 3) = [10, 20, 30]
        let col = Array::from_vec(vec![1.0, 2.0], &[2, 1]).unwrap();
        let row = Array::from_vec(vec![10.0, 20.0, 30.0], &[1, 3]).unwrap();
        let c = zip_broadcast(&col, &row, |x, y| x + y).unwrap();
        assert_eq!(c.shape(), &[2, 3]);
        for i in 0..2 {
            for j in 0..3 {
                let expected = (i + 1) as f64 + 10.0 * (j + 1) as f64;
                assert_relative_eq!(c.get(&[i, j]).unwrap(), expected, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_zip_scalar_operand() {
        let s = Array::scalar(2.0);
        let m = Array::from_vec(vec![1.0, 2.0, 3.0, 4.0], &[2, 2]).unwrap();
        let c = zip_broadcast(&s, &m, |x, y| x * y).unwrap();
        assert_eq!(c.data(), &[2.0, 4.0, 6.0, 8.0]);
    }

    #[test]
    fn test_zip_promotes_dtype() {
        let a = Array::from_vec_with_dtype(vec![1.0], &[1], DType::I64).unwrap();
        let b = Array::from_vec_with_dtype(vec![0.5], &[1], DType::F32).unwrap();
        let c = zip_broadcast(&a, &b, |x, y| x + y).unwrap();
        assert_eq!(c.dtype(), DType::F32);
        assert_eq!(c.data(), &[1.5]);
    }

    #[test]
    fn test_zip_mismatch() {
        let a = Array::ones(&[3]);
        let b = Array::ones(&[2]);
        assert!(zip_broadcast(&a, &b, |x, y| x + y).is_err());
    }

    #[test]
    fn test_expand_to() {
        let row = Array::from_vec(vec![1.0, 2.0, 3.0], &[3]).unwrap();
        let e = expand_to(&row, &[2, 3]).unwrap();
        assert_eq!(e.get(&[1, 2]), Some(3.0));
        assert_eq!(e.get(&[0, 0]), Some(1.0));
        assert!(expand_to(&Array::ones(&[2, 3]), &[3]).is_err());
    }

    #[test]
    fn test_add_assign() {
        let mut a = Array::ones(&[2]);
        add_assign(&mut a, &Array::full(&[2], 2.5)).unwrap();
        assert_eq!(a.data(), &[3.5, 3.5]);
        assert!(add_assign(&mut a, &Array::ones(&[3])).is_err());
    }
}
