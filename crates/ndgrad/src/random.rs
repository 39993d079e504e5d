//! Random array construction.

use rand::Rng;
use rand::distr::StandardUniform;
use rand_distr::StandardNormal;

use crate::array::Array;
use crate::dtype::DType;
use crate::shape::numel;

impl Array {
    /// Create an array with uniform random values in [0, 1).
    ///
    /// # Example
    ///
    /// ```
    /// use ndgrad::Array;
    ///
    /// let a = Array::random(&[2, 3]);
    /// assert_eq!(a.shape(), &[2, 3]);
    /// assert!(a.data().iter().all(|&v| (0.0..1.0).contains(&v)));
    /// ```
    pub fn random(shape: &[usize]) -> Self {
        Self::random_with_rng(shape, &mut rand::rng())
    }

    /// Create an array with uniform random values using a specific RNG.
    ///
    /// # Example
    ///
    /// ```
    /// use ndgrad::Array;
    /// use rand::SeedableRng;
    /// use rand::rngs::StdRng;
    ///
    /// let a = Array::random_with_rng(&[2, 3], &mut StdRng::seed_from_u64(42));
    /// let b = Array::random_with_rng(&[2, 3], &mut StdRng::seed_from_u64(42));
    /// assert_eq!(a.data(), b.data());
    /// ```
    pub fn random_with_rng<R: Rng>(shape: &[usize], rng: &mut R) -> Self {
        let data: Vec<f64> = (0..numel(shape))
            .map(|_| rng.sample::<f64, _>(StandardUniform))
            .collect();
        Self::from_parts(data, shape.to_vec(), DType::F64)
    }

    /// Create an array with standard normal random values.
    pub fn randn(shape: &[usize]) -> Self {
        Self::randn_with_rng(shape, &mut rand::rng())
    }

    /// Create an array with standard normal random values using a specific RNG.
    pub fn randn_with_rng<R: Rng>(shape: &[usize], rng: &mut R) -> Self {
        let data: Vec<f64> = (0..numel(shape))
            .map(|_| rng.sample::<f64, _>(StandardNormal))
            .collect();
        Self::from_parts(data, shape.to_vec(), DType::F64)
    }
}
