//! Matrix product using faer.

use faer::linalg::matmul::matmul as faer_matmul;
use faer::{Accum, MatMut, MatRef, Par};

use crate::array::Array;
use crate::error::{GradError, Result};
use crate::operations::permutedims;

/// Product of two matrices, `(m, k) x (k, n) -> (m, n)`.
///
/// Both operands are viewed zero-copy as column-major faer matrices.
///
/// # Errors
///
/// Returns [`GradError::RankMismatch`] for non-matrix operands and
/// [`GradError::MatmulMismatch`] when the inner dimensions differ.
///
/// # Example
///
/// ```
/// use ndgrad::Array;
/// use ndgrad::operations::matmul;
///
/// let a = Array::ones(&[2, 3]);
/// let b = Array::ones(&[3, 4]);
/// let c = matmul(&a, &b).unwrap();
/// assert_eq!(c.shape(), &[2, 4]);
/// assert_eq!(c.get(&[1, 3]), Some(3.0));
/// ```
pub fn matmul(a: &Array, b: &Array) -> Result<Array> {
    for x in [a, b] {
        if x.ndim() != 2 {
            return Err(GradError::RankMismatch {
                expected: 2,
                actual: x.ndim(),
            });
        }
    }
    let (m, k) = (a.shape()[0], a.shape()[1]);
    let n = b.shape()[1];
    if b.shape()[0] != k {
        return Err(GradError::MatmulMismatch {
            lhs: a.shape().to_vec(),
            rhs: b.shape().to_vec(),
        });
    }

    let mut out = vec![0.0; m * n];
    {
        let a_mat = MatRef::from_column_major_slice(a.data(), m, k);
        let b_mat = MatRef::from_column_major_slice(b.data(), k, n);
        let c_mat = MatMut::from_column_major_slice_mut(&mut out, m, n);
        // C = A * B, overwriting C
        faer_matmul(c_mat, Accum::Replace, a_mat, b_mat, 1.0, Par::Seq);
    }

    let dtype = a.dtype().promote(b.dtype());
    let out = out.into_iter().map(|x| dtype.normalize(x)).collect();
    Ok(Array::from_parts(out, vec![m, n], dtype))
}

/// Transpose of a matrix.
pub fn transpose_matrix(a: &Array) -> Result<Array> {
    if a.ndim() != 2 {
        return Err(GradError::RankMismatch {
            expected: 2,
            actual: a.ndim(),
        });
    }
    permutedims(a, &[1, 0])
}
