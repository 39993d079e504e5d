//! ndgrad - automatic differentiation over dense n-dimensional arrays.
//!
//! The crate has two layers:
//!
//! ```text
//! autodiff   Value, graph nodes, backward, forward-mode tangents, ops
//!    │
//!    ▼
//! Array      column-major f64 storage tagged with a DType
//! operations numeric kernels: broadcasting, reductions, permutation, matmul (faer)
//! ```
//!
//! # Example
//!
//! ```
//! use ndgrad::{Array, Value};
//!
//! let x = Value::leaf(Array::from_vec(vec![1.0, 2.0], &[2]).unwrap()).unwrap();
//! let w = Value::leaf(Array::from_vec(vec![3.0, 4.0], &[2]).unwrap()).unwrap();
//!
//! // Seed a forward-mode tangent on x as well
//! x.make_dual(Array::ones(&[2])).unwrap();
//!
//! let y = x.mul(&w).unwrap().sum_all().unwrap();
//! assert_eq!(y.item().unwrap(), 11.0);
//! // dy along dx = 1: sum(w)
//! assert_eq!(y.tangent().unwrap().item().unwrap(), 7.0);
//!
//! y.backward().unwrap();
//! assert_eq!(x.grad().unwrap().to_array().data(), &[3.0, 4.0]);
//! assert_eq!(w.grad().unwrap().to_array().data(), &[1.0, 2.0]);
//! ```

pub mod array;
pub mod autodiff;
pub mod dtype;
pub mod error;
pub mod operations;
pub mod random;
pub mod shape;

pub use array::Array;
pub use autodiff::{Value, backward, no_grad};
pub use dtype::DType;
pub use error::{GradError, Result};
