//! Axis permutation.

use crate::array::Array;
use crate::error::{GradError, Result};
use crate::shape::{cartesian_to_linear, linear_to_cartesian};

/// Permute the axes of an array.
///
/// `perm[i]` gives the source axis for the i-th axis of the result.
///
/// # Errors
///
/// Returns error if `perm` is not a valid permutation of `0..ndim`.
///
/// # Example
///
/// ```
/// use ndgrad::Array;
/// use ndgrad::operations::permutedims;
///
/// let a = Array::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]).unwrap();
/// let t = permutedims(&a, &[1, 0]).unwrap();
/// assert_eq!(t.shape(), &[3, 2]);
/// assert_eq!(a.get(&[1, 2]), t.get(&[2, 1]));
/// ```
pub fn permutedims(a: &Array, perm: &[usize]) -> Result<Array> {
    validate_permutation(perm, a.ndim())?;

    let new_shape: Vec<usize> = perm.iter().map(|&p| a.shape()[p]).collect();
    // Read each output element from the source through permuted strides
    let src_strides: Vec<usize> = perm.iter().map(|&p| a.strides()[p]).collect();
    let data = (0..a.len())
        .map(|linear| {
            let index = linear_to_cartesian(linear, &new_shape);
            a.data()[cartesian_to_linear(&index, &src_strides)]
        })
        .collect();
    Ok(Array::from_parts(data, new_shape, a.dtype()))
}

/// Inverse of a permutation: `inverse[perm[i]] == i`.
pub fn inverse_permutation(perm: &[usize]) -> Vec<usize> {
    let mut inverse = vec![0; perm.len()];
    for (i, &p) in perm.iter().enumerate() {
        inverse[p] = i;
    }
    inverse
}

fn validate_permutation(perm: &[usize], ndim: usize) -> Result<()> {
    let invalid = || GradError::InvalidPermutation {
        perm: perm.to_vec(),
        ndim,
    };
    if perm.len() != ndim {
        return Err(invalid());
    }
    let mut seen = vec![false; ndim];
    for &p in perm {
        if p >= ndim || seen[p] {
            return Err(invalid());
        }
        seen[p] = true;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permute_3d() {
        let a = Array::from_vec((0..24).map(|i| i as f64).collect(), &[2, 3, 4]).unwrap();
        let p = permutedims(&a, &[2, 0, 1]).unwrap();
        assert_eq!(p.shape(), &[4, 2, 3]);
        for i in 0..2 {
            for j in 0..3 {
                for k in 0..4 {
                    assert_eq!(a.get(&[i, j, k]), p.get(&[k, i, j]));
                }
            }
        }
    }

    #[test]
    fn test_inverse_permutation_roundtrip() {
        let perm = [2, 0, 1];
        let inv = inverse_permutation(&perm);
        assert_eq!(inv, vec![1, 2, 0]);
        let a = Array::random(&[2, 3, 4]);
        let back = permutedims(&permutedims(&a, &perm).unwrap(), &inv).unwrap();
        assert_eq!(back, a);
    }

    #[test]
    fn test_invalid_permutation() {
        let a = Array::zeros(&[2, 3]);
        assert!(permutedims(&a, &[0]).is_err());
        assert!(permutedims(&a, &[0, 0]).is_err());
        assert!(permutedims(&a, &[0, 2]).is_err());
    }
}
