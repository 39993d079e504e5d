//! Element type tags.
//!
//! Every [`Array`](crate::Array) stores its elements as `f64`. The dtype
//! decides how values are normalized on construction and whether the array
//! may participate in gradient tracking.

use std::fmt;

/// Element type of an array.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DType {
    Bool,
    U8,
    I8,
    I16,
    I32,
    I64,
    F32,
    #[default]
    F64,
}

impl DType {
    /// Whether values of this type can carry gradients and tangents.
    ///
    /// # Examples
    ///
    /// ```
    /// use ndgrad::DType;
    ///
    /// assert!(DType::F64.is_grad_capable());
    /// assert!(!DType::I64.is_grad_capable());
    /// ```
    pub fn is_grad_capable(self) -> bool {
        matches!(self, DType::F32 | DType::F64)
    }

    /// Whether this is a floating-point type.
    pub fn is_float(self) -> bool {
        self.is_grad_capable()
    }

    /// Short lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            DType::Bool => "bool",
            DType::U8 => "u8",
            DType::I8 => "i8",
            DType::I16 => "i16",
            DType::I32 => "i32",
            DType::I64 => "i64",
            DType::F32 => "f32",
            DType::F64 => "f64",
        }
    }

    /// Result type of a binary operation on `self` and `other`.
    ///
    /// Floats win over integers, and within a kind the wider type wins.
    pub fn promote(self, other: DType) -> DType {
        match (self.is_float(), other.is_float()) {
            (true, false) => self,
            (false, true) => other,
            _ => self.max(other),
        }
    }

    /// Normalize a raw value into the representable set of this type.
    ///
    /// Integer types truncate toward zero and wrap, `Bool` maps any nonzero
    /// value to 1, and `F32` rounds through single precision.
    pub fn normalize(self, x: f64) -> f64 {
        match self {
            DType::Bool => {
                if x != 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
            DType::U8 => (x as i64 as u8) as f64,
            DType::I8 => (x as i64 as i8) as f64,
            DType::I16 => (x as i64 as i16) as f64,
            DType::I32 => (x as i64 as i32) as f64,
            DType::I64 => (x as i64) as f64,
            DType::F32 => (x as f32) as f64,
            DType::F64 => x,
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
