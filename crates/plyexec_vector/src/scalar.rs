use crate::datatype::ValueType;
use crate::label::Label;
use crate::vector::{PrimitiveVector, ScalarVector, Utf8Vector, Vector};

/// A single scalar value.
///
/// `List` and `Tuple` variants are the native views of block and tuple rows;
/// they also serve as the staging representation produced by lifted functions
/// before one of the `adapt_*` pipeline primitives restructures them into
/// columnar form.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    Missing,
    Unit,
    Bool(bool),
    Int64(i64),
    Float64(f64),
    Utf8(String),
    List(Vec<ScalarValue>),
    Tuple {
        labels: Vec<Label>,
        values: Vec<ScalarValue>,
    },
}

impl ScalarValue {
    /// Type of the value, None for missing and compound values.
    pub fn value_type(&self) -> Option<ValueType> {
        match self {
            Self::Unit => Some(ValueType::Unit),
            Self::Bool(_) => Some(ValueType::Bool),
            Self::Int64(_) => Some(ValueType::Int64),
            Self::Float64(_) => Some(ValueType::Float64),
            Self::Utf8(_) => Some(ValueType::Utf8),
            Self::Missing | Self::List(_) | Self::Tuple { .. } => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

    /// Create a vector of length `n` holding this value at every position.
    pub fn as_vector(&self, n: usize) -> Vector {
        match self {
            Self::Unit => Vector::Unit(n),
            Self::Bool(v) => {
                Vector::Bool(PrimitiveVector::from_iter(std::iter::repeat(*v).take(n)))
            }
            Self::Int64(v) => {
                Vector::Int64(PrimitiveVector::from_iter(std::iter::repeat(*v).take(n)))
            }
            Self::Float64(v) => {
                Vector::Float64(PrimitiveVector::from_iter(std::iter::repeat(*v).take(n)))
            }
            Self::Utf8(v) => {
                Vector::Utf8(Utf8Vector::from_iter(std::iter::repeat(v.as_str()).take(n)))
            }
            other => Vector::Scalars(ScalarVector::new(vec![other.clone(); n])),
        }
    }
}

impl From<bool> for ScalarValue {
    fn from(value: bool) -> Self {
        ScalarValue::Bool(value)
    }
}

impl From<i64> for ScalarValue {
    fn from(value: i64) -> Self {
        ScalarValue::Int64(value)
    }
}

impl From<i32> for ScalarValue {
    fn from(value: i32) -> Self {
        ScalarValue::Int64(value as i64)
    }
}

impl From<f64> for ScalarValue {
    fn from(value: f64) -> Self {
        ScalarValue::Float64(value)
    }
}

impl From<&str> for ScalarValue {
    fn from(value: &str) -> Self {
        ScalarValue::Utf8(value.to_string())
    }
}

impl From<String> for ScalarValue {
    fn from(value: String) -> Self {
        ScalarValue::Utf8(value)
    }
}

impl<T: Into<ScalarValue>> From<Option<T>> for ScalarValue {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => v.into(),
            None => ScalarValue::Missing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_vector_from_scalar() {
        let v = ScalarValue::Int64(4).as_vector(3);
        assert_eq!(3, v.len());
        assert_eq!(ScalarValue::Int64(4), v.scalar(2).unwrap());
    }

    #[test]
    fn constant_vector_from_missing() {
        let v = ScalarValue::Missing.as_vector(2);
        assert_eq!(2, v.len());
        assert_eq!(ScalarValue::Missing, v.scalar(0).unwrap());
    }
}
