//! Shaped numeric values held by parameters, compartments and state variables

use ndarray::{ArrayD, IxDyn};
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

/// An n-dimensional value. Scalars use the single-element shape `[1]`.
pub type Value = ArrayD<f64>;

/// Shape used for values that do not carry one of their own
pub const SCALAR_SHAPE: [usize; 1] = [1];

/// Single-element value
pub fn scalar(x: f64) -> Value {
    ArrayD::from_elem(IxDyn(&SCALAR_SHAPE), x)
}

/// Zero-filled value of the given shape
pub fn zeros(shape: &[usize]) -> Value {
    ArrayD::zeros(IxDyn(shape))
}

/// Build a value from a flat row-major buffer
pub fn from_vec(shape: &[usize], data: Vec<f64>) -> Result<Value> {
    let expected: usize = shape.iter().product();
    if expected != data.len() {
        return Err(ModelError::invalid_value(format!(
            "shape {:?} needs {} elements, got {}",
            shape,
            expected,
            data.len()
        )));
    }
    ArrayD::from_shape_vec(IxDyn(shape), data).map_err(|e| ModelError::invalid_value(e.to_string()))
}

/// Zero-dimensional values become shape `[1]`; everything else is returned as is
pub fn normalize(value: Value) -> Value {
    if value.ndim() == 0 {
        scalar(value.iter().next().copied().unwrap_or(0.0))
    } else {
        value
    }
}

/// Reshape into `shape` when the element counts agree
pub fn reshape(value: &Value, shape: &[usize]) -> Option<Value> {
    let expected: usize = shape.iter().product();
    if expected != value.len() {
        return None;
    }
    if value.shape() == shape {
        return Some(value.clone());
    }
    ArrayD::from_shape_vec(IxDyn(shape), value.iter().copied().collect()).ok()
}

/// First element of a value, used by scalar-valued update rules
pub fn first(value: &Value) -> f64 {
    value.iter().next().copied().unwrap_or(0.0)
}

/// Serialized form of a [`Value`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueRecord {
    /// Dimensions
    pub shape: Vec<usize>,
    /// Row-major elements
    pub data: Vec<f64>,
}

impl From<&Value> for ValueRecord {
    fn from(value: &Value) -> Self {
        Self {
            shape: value.shape().to_vec(),
            data: value.iter().copied().collect(),
        }
    }
}

impl ValueRecord {
    /// Rebuild the value, checking the element count
    pub fn to_value(&self) -> Result<Value> {
        from_vec(&self.shape, self.data.clone())
    }
}
