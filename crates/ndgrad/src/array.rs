//! Dense n-dimensional array.
//!
//! `Array` is the payload carried by every [`Value`](crate::autodiff::Value):
//! a flat column-major `f64` buffer plus its shape and element type. It knows
//! nothing about differentiation.

use crate::dtype::DType;
use crate::error::{GradError, Result};
use crate::shape::{cartesian_to_linear, compute_strides, numel};

/// A dense, column-major n-dimensional array.
#[derive(Debug, Clone, PartialEq)]
pub struct Array {
    data: Vec<f64>,
    shape: Vec<usize>,
    strides: Vec<usize>,
    dtype: DType,
}

impl Array {
    /// Create a zero-initialized `f64` array.
    ///
    /// # Examples
    ///
    /// ```
    /// use ndgrad::Array;
    ///
    /// let a = Array::zeros(&[2, 3, 4]);
    /// assert_eq!(a.shape(), &[2, 3, 4]);
    /// assert_eq!(a.len(), 24);
    /// ```
    pub fn zeros(shape: &[usize]) -> Self {
        Self::full(shape, 0.0)
    }

    /// Create an `f64` array filled with ones.
    pub fn ones(shape: &[usize]) -> Self {
        Self::full(shape, 1.0)
    }

    /// Create an `f64` array filled with `value`.
    pub fn full(shape: &[usize], value: f64) -> Self {
        Self::from_parts(vec![value; numel(shape)], shape.to_vec(), DType::F64)
    }

    /// Create a 0-dimensional `f64` array.
    pub fn scalar(value: f64) -> Self {
        Self::from_parts(vec![value], Vec::new(), DType::F64)
    }

    /// Create an `f64` array from data and shape.
    ///
    /// Data is expected to be in column-major order.
    ///
    /// # Errors
    ///
    /// Returns error if data length doesn't match the shape.
    ///
    /// # Examples
    ///
    /// ```
    /// use ndgrad::Array;
    ///
    /// let a = Array::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]).unwrap();
    /// // Column-major: a[1, 0] is the second element
    /// assert_eq!(a.get(&[1, 0]), Some(2.0));
    /// assert_eq!(a.get(&[0, 1]), Some(3.0));
    /// ```
    pub fn from_vec(data: Vec<f64>, shape: &[usize]) -> Result<Self> {
        Self::from_vec_with_dtype(data, shape, DType::F64)
    }

    /// Create an array of the given element type, normalizing every value.
    pub fn from_vec_with_dtype(data: Vec<f64>, shape: &[usize], dtype: DType) -> Result<Self> {
        let expected = numel(shape);
        if data.len() != expected {
            return Err(GradError::ShapeMismatch {
                expected,
                actual: data.len(),
            });
        }
        let data = data.into_iter().map(|x| dtype.normalize(x)).collect();
        Ok(Self::from_parts(data, shape.to_vec(), dtype))
    }

    /// Zeros with the same shape and element type as `self`.
    pub fn zeros_like(&self) -> Self {
        Self::from_parts(vec![0.0; self.len()], self.shape.clone(), self.dtype)
    }

    /// Ones with the same shape and element type as `self`.
    pub fn ones_like(&self) -> Self {
        Self::from_parts(vec![1.0; self.len()], self.shape.clone(), self.dtype)
    }

    pub(crate) fn from_parts(data: Vec<f64>, shape: Vec<usize>, dtype: DType) -> Self {
        debug_assert_eq!(data.len(), numel(&shape));
        let strides = compute_strides(&shape);
        Self {
            data,
            shape,
            strides,
            dtype,
        }
    }

    /// Shape of the array.
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Column-major strides.
    pub fn strides(&self) -> &[usize] {
        &self.strides
    }

    /// Number of dimensions.
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Total number of elements.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the array holds no elements (some extent is 0).
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Element type.
    pub fn dtype(&self) -> DType {
        self.dtype
    }

    /// Raw data in column-major order.
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// Mutable raw data in column-major order.
    pub fn data_mut(&mut self) -> &mut [f64] {
        &mut self.data
    }

    /// Consume the array and return its buffer.
    pub fn into_data(self) -> Vec<f64> {
        self.data
    }

    /// Element at cartesian `indices`, or `None` if out of bounds.
    pub fn get(&self, indices: &[usize]) -> Option<f64> {
        if indices.len() != self.ndim() {
            return None;
        }
        if indices.iter().zip(&self.shape).any(|(&i, &d)| i >= d) {
            return None;
        }
        self.data
            .get(cartesian_to_linear(indices, &self.strides))
            .copied()
    }

    /// Element at linear (column-major) position `index`.
    pub fn get_linear(&self, index: usize) -> Option<f64> {
        self.data.get(index).copied()
    }

    /// Set the element at cartesian `indices`, normalized to the dtype.
    ///
    /// # Errors
    ///
    /// Returns error if the number of indices is wrong or any is out of range.
    pub fn set(&mut self, indices: &[usize], value: f64) -> Result<()> {
        if indices.len() != self.ndim() {
            return Err(GradError::WrongNumberOfIndices {
                expected: self.ndim(),
                actual: indices.len(),
            });
        }
        for (&index, &dim_size) in indices.iter().zip(&self.shape) {
            if index >= dim_size {
                return Err(GradError::IndexOutOfBounds { index, dim_size });
            }
        }
        let pos = cartesian_to_linear(indices, &self.strides);
        self.data[pos] = self.dtype.normalize(value);
        Ok(())
    }

    /// The single element of a one-element array.
    ///
    /// # Errors
    ///
    /// Returns [`GradError::NotScalar`] for any other size.
    pub fn item(&self) -> Result<f64> {
        match self.data.as_slice() {
            [x] => Ok(*x),
            _ => Err(GradError::NotScalar {
                shape: self.shape.clone(),
            }),
        }
    }

    /// Convert to another element type.
    pub fn to_dtype(&self, dtype: DType) -> Self {
        let data = self.data.iter().map(|&x| dtype.normalize(x)).collect();
        Self::from_parts(data, self.shape.clone(), dtype)
    }

    /// Reinterpret the data with a new shape of the same size.
    ///
    /// The column-major element order is unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`GradError::ReshapeMismatch`] if the sizes differ.
    pub fn reshape(&self, shape: &[usize]) -> Result<Self> {
        if numel(shape) != self.len() {
            return Err(GradError::ReshapeMismatch {
                from: self.shape.clone(),
                to: shape.to_vec(),
            });
        }
        Ok(Self::from_parts(self.data.clone(), shape.to_vec(), self.dtype))
    }
}
