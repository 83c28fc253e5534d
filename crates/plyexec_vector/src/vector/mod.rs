pub mod block;
pub mod primitive;
pub mod tuple;
pub mod varlen;

pub use block::{BlockVector, Offsets};
pub use primitive::{BoolVector, Float64Vector, Int64Vector, PrimitiveVector};
pub use tuple::TupleVector;
pub use varlen::Utf8Vector;

use crate::bitmap::Bitmap;
use crate::cardinality::Cardinality;
use crate::datatype::ValueType;
use crate::scalar::ScalarValue;
use plyexec_error::{PlyexecError, Result};
use std::fmt::Debug;
use std::sync::Arc;

/// Vector storing arbitrary scalar values.
///
/// Staging form for values that have no dedicated columnar layout yet, most
/// notably the outputs of lifted functions before an `adapt_*` primitive
/// restructures them. Missings are stored in-band.
#[derive(Debug, Clone, PartialEq)]
pub struct ScalarVector {
    values: Vec<ScalarValue>,
}

impl ScalarVector {
    pub fn new(values: Vec<ScalarValue>) -> Self {
        ScalarVector { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[ScalarValue] {
        &self.values
    }
}

/// A columnar vector.
#[derive(Debug, Clone, PartialEq)]
pub enum Vector {
    /// `n` copies of the unit value.
    Unit(usize),
    Bool(BoolVector),
    Int64(Int64Vector),
    Float64(Float64Vector),
    Utf8(Utf8Vector),
    Scalars(ScalarVector),
    Block(BlockVector),
    Tuple(TupleVector),
}

impl Vector {
    pub fn bool(vals: impl IntoIterator<Item = bool>) -> Vector {
        Vector::Bool(PrimitiveVector::from_iter(vals))
    }

    pub fn int64(vals: impl IntoIterator<Item = i64>) -> Vector {
        Vector::Int64(PrimitiveVector::from_iter(vals))
    }

    pub fn float64(vals: impl IntoIterator<Item = f64>) -> Vector {
        Vector::Float64(PrimitiveVector::from_iter(vals))
    }

    pub fn utf8<S: AsRef<str>>(vals: impl IntoIterator<Item = S>) -> Vector {
        Vector::Utf8(Utf8Vector::from_iter(vals))
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Unit(n) => *n,
            Self::Bool(v) => v.len(),
            Self::Int64(v) => v.len(),
            Self::Float64(v) => v.len(),
            Self::Utf8(v) => v.len(),
            Self::Scalars(v) => v.len(),
            Self::Block(v) => v.len(),
            Self::Tuple(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element type for scalar vectors, None for compound vectors.
    pub fn value_type(&self) -> Option<ValueType> {
        match self {
            Self::Unit(_) => Some(ValueType::Unit),
            Self::Bool(_) => Some(ValueType::Bool),
            Self::Int64(_) => Some(ValueType::Int64),
            Self::Float64(_) => Some(ValueType::Float64),
            Self::Utf8(_) => Some(ValueType::Utf8),
            Self::Scalars(_) | Self::Block(_) | Self::Tuple(_) => None,
        }
    }

    /// Whether any position of a scalar vector holds a missing value.
    pub fn has_missing(&self) -> bool {
        match self {
            Self::Bool(v) => v.validity().map(|b| !b.all_valid()).unwrap_or(false),
            Self::Int64(v) => v.validity().map(|b| !b.all_valid()).unwrap_or(false),
            Self::Float64(v) => v.validity().map(|b| !b.all_valid()).unwrap_or(false),
            Self::Utf8(v) => v.validity().map(|b| !b.all_valid()).unwrap_or(false),
            Self::Scalars(v) => v.values().iter().any(|v| v.is_missing()),
            _ => false,
        }
    }

    /// Whether the value at `idx` is present.
    pub fn is_valid(&self, idx: usize) -> Option<bool> {
        match self {
            Self::Unit(n) => (idx < *n).then_some(true),
            Self::Bool(v) => v.is_valid(idx),
            Self::Int64(v) => v.is_valid(idx),
            Self::Float64(v) => v.is_valid(idx),
            Self::Utf8(v) => v.is_valid(idx),
            Self::Scalars(v) => v.values().get(idx).map(|v| !v.is_missing()),
            Self::Block(v) => (idx < v.len()).then_some(true),
            Self::Tuple(v) => (idx < v.len()).then_some(true),
        }
    }

    /// Native view of the value at `idx`.
    ///
    /// Blocks materialize according to their cardinality: regular blocks as
    /// the single value, optional blocks as the value or missing, plural
    /// blocks as lists. Tuples materialize recursively.
    pub fn scalar(&self, idx: usize) -> Result<ScalarValue> {
        if idx >= self.len() {
            return Err(PlyexecError::new(format!(
                "Row index {idx} out of bounds, vector has {} rows",
                self.len(),
            )));
        }

        Ok(match self {
            Self::Unit(_) => ScalarValue::Unit,
            Self::Bool(v) => match v.is_valid(idx) {
                Some(true) => ScalarValue::Bool(*v.value(idx).expect("index in bounds")),
                _ => ScalarValue::Missing,
            },
            Self::Int64(v) => match v.is_valid(idx) {
                Some(true) => ScalarValue::Int64(*v.value(idx).expect("index in bounds")),
                _ => ScalarValue::Missing,
            },
            Self::Float64(v) => match v.is_valid(idx) {
                Some(true) => ScalarValue::Float64(*v.value(idx).expect("index in bounds")),
                _ => ScalarValue::Missing,
            },
            Self::Utf8(v) => match v.is_valid(idx) {
                Some(true) => {
                    ScalarValue::Utf8(v.value(idx).expect("index in bounds").to_string())
                }
                _ => ScalarValue::Missing,
            },
            Self::Scalars(v) => v.values()[idx].clone(),
            Self::Block(v) => {
                let (start, end) = v.block_bounds(idx);
                if !v.card().is_plural() {
                    match end - start {
                        0 => ScalarValue::Missing,
                        _ => v.elements().scalar(start)?,
                    }
                } else {
                    let mut vals = Vec::with_capacity(end - start);
                    for elem_idx in start..end {
                        vals.push(v.elements().scalar(elem_idx)?);
                    }
                    ScalarValue::List(vals)
                }
            }
            Self::Tuple(v) => {
                let mut vals = Vec::with_capacity(v.num_columns());
                for col in v.columns() {
                    vals.push(col.scalar(idx)?);
                }
                ScalarValue::Tuple {
                    labels: v.labels().to_vec(),
                    values: vals,
                }
            }
        })
    }

    /// Gather rows by index, producing a new vector.
    pub fn take(&self, indices: &[usize]) -> Result<Vector> {
        if let Some(&idx) = indices.iter().find(|&&idx| idx >= self.len()) {
            return Err(PlyexecError::new(format!(
                "Take index {idx} out of bounds, vector has {} rows",
                self.len(),
            )));
        }

        Ok(match self {
            Self::Unit(_) => Vector::Unit(indices.len()),
            Self::Bool(v) => Vector::Bool(take_primitive(v, indices)),
            Self::Int64(v) => Vector::Int64(take_primitive(v, indices)),
            Self::Float64(v) => Vector::Float64(take_primitive(v, indices)),
            Self::Utf8(v) => {
                let mut out = Utf8Vector::empty();
                for &idx in indices {
                    match v.is_valid(idx).expect("index in bounds") {
                        true => out.push_value(v.value(idx).expect("index in bounds")),
                        false => out.push_missing(),
                    }
                }
                Vector::Utf8(out)
            }
            Self::Scalars(v) => Vector::Scalars(ScalarVector::new(
                indices.iter().map(|&idx| v.values()[idx].clone()).collect(),
            )),
            Self::Block(v) => {
                let offsets = Offsets::from_lengths(indices.iter().map(|&idx| v.block_len(idx)));
                let mut elem_indices =
                    Vec::with_capacity(indices.iter().map(|&idx| v.block_len(idx)).sum());
                for &idx in indices {
                    let (start, end) = v.block_bounds(idx);
                    elem_indices.extend(start..end);
                }
                let elements = v.elements().take(&elem_indices)?;
                Vector::Block(BlockVector::try_new(offsets, elements, v.card())?)
            }
            Self::Tuple(v) => {
                let columns = v
                    .columns()
                    .iter()
                    .map(|col| col.take(indices).map(Arc::new))
                    .collect::<Result<Vec<_>>>()?;
                Vector::Tuple(TupleVector::try_new(
                    v.labels().to_vec(),
                    indices.len(),
                    columns,
                )?)
            }
        })
    }

    /// Build a columnar vector from a sequence of scalar values.
    ///
    /// Uniformly typed values (allowing missings) get a dedicated layout
    /// with a validity bitmap; anything else stays in the dynamic form.
    pub fn from_scalars(values: Vec<ScalarValue>) -> Vector {
        let ty = values
            .iter()
            .find(|v| !v.is_missing())
            .and_then(|v| v.value_type());

        let uniform = match ty {
            Some(ty) => values
                .iter()
                .all(|v| v.is_missing() || v.value_type() == Some(ty)),
            None => false,
        };
        if !uniform {
            return Vector::Scalars(ScalarVector::new(values));
        }
        let has_missing = values.iter().any(|v| v.is_missing());

        match ty.expect("uniform implies a type") {
            ValueType::Unit if !has_missing => Vector::Unit(values.len()),
            ValueType::Bool => build_primitive(&values, has_missing, false, |v| match v {
                ScalarValue::Bool(b) => Some(*b),
                _ => None,
            })
            .map(Vector::Bool)
            .unwrap_or_else(|| Vector::Scalars(ScalarVector::new(values))),
            ValueType::Int64 => build_primitive(&values, has_missing, 0, |v| match v {
                ScalarValue::Int64(i) => Some(*i),
                _ => None,
            })
            .map(Vector::Int64)
            .unwrap_or_else(|| Vector::Scalars(ScalarVector::new(values))),
            ValueType::Float64 => build_primitive(&values, has_missing, 0.0, |v| match v {
                ScalarValue::Float64(f) => Some(*f),
                _ => None,
            })
            .map(Vector::Float64)
            .unwrap_or_else(|| Vector::Scalars(ScalarVector::new(values))),
            ValueType::Utf8 => {
                let mut out = Utf8Vector::empty();
                for v in &values {
                    match v {
                        ScalarValue::Utf8(s) => out.push_value(s),
                        _ => out.push_missing(),
                    }
                }
                Vector::Utf8(out)
            }
            _ => Vector::Scalars(ScalarVector::new(values)),
        }
    }
}

fn take_primitive<T: Copy + Debug>(v: &PrimitiveVector<T>, indices: &[usize]) -> PrimitiveVector<T> {
    let values: Vec<_> = indices.iter().map(|&idx| v.values()[idx]).collect();
    match v.validity() {
        Some(validity) => {
            let new_validity = Bitmap::from_iter(indices.iter().map(|&idx| validity.value(idx)));
            PrimitiveVector::with_validity(values, new_validity)
        }
        None => PrimitiveVector::from_values(values),
    }
}

fn build_primitive<T: Debug>(
    values: &[ScalarValue],
    has_missing: bool,
    fill: T,
    f: impl Fn(&ScalarValue) -> Option<T>,
) -> Option<PrimitiveVector<T>>
where
    T: Copy,
{
    let mut out = Vec::with_capacity(values.len());
    let mut validity = Bitmap::with_len_all_valid(values.len());
    for (idx, v) in values.iter().enumerate() {
        match f(v) {
            Some(val) => out.push(val),
            None if v.is_missing() => {
                out.push(fill);
                validity.set(idx, false);
            }
            None => return None,
        }
    }
    Some(if has_missing {
        PrimitiveVector::with_validity(out, validity)
    } else {
        PrimitiveVector::from_values(out)
    })
}

/// Build an empty vector with the layout of the given type.
pub fn empty_of(ty: ValueType) -> Vector {
    match ty {
        ValueType::Unit => Vector::Unit(0),
        ValueType::Bool => Vector::bool([]),
        ValueType::Int64 => Vector::int64([]),
        ValueType::Float64 => Vector::float64([]),
        ValueType::Utf8 => Vector::Utf8(Utf8Vector::empty()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_scalar_respects_cardinality() {
        // Regular block: single value, not a list.
        let regular = Vector::Block(BlockVector::wrapping(Vector::int64([5, 6])));
        assert_eq!(ScalarValue::Int64(6), regular.scalar(1).unwrap());

        // Optional empty block: missing.
        let optional = Vector::Block(
            BlockVector::try_new(
                Offsets::from_lengths([1, 0]),
                Vector::int64([5]),
                Cardinality::OPT,
            )
            .unwrap(),
        );
        assert_eq!(ScalarValue::Int64(5), optional.scalar(0).unwrap());
        assert_eq!(ScalarValue::Missing, optional.scalar(1).unwrap());

        // Plural block: list.
        let plural = Vector::Block(
            BlockVector::try_new(
                Offsets::from_lengths([2, 0]),
                Vector::int64([5, 6]),
                Cardinality::ANY,
            )
            .unwrap(),
        );
        assert_eq!(
            ScalarValue::List(vec![ScalarValue::Int64(5), ScalarValue::Int64(6)]),
            plural.scalar(0).unwrap()
        );
        assert_eq!(ScalarValue::List(Vec::new()), plural.scalar(1).unwrap());
    }

    #[test]
    fn take_block_rebuilds_offsets() {
        let b = BlockVector::try_new(
            Offsets::from_lengths([2, 0, 1]),
            Vector::int64([1, 2, 3]),
            Cardinality::ANY,
        )
        .unwrap();
        let taken = Vector::Block(b).take(&[2, 0]).unwrap();

        match &taken {
            Vector::Block(b) => {
                assert_eq!(2, b.len());
                assert_eq!((0, 1), b.block_bounds(0));
                assert_eq!((1, 3), b.block_bounds(1));
                assert_eq!(&Vector::int64([3, 1, 2]), b.elements().as_ref());
            }
            other => panic!("unexpected vector: {other:?}"),
        }
    }

    #[test]
    fn take_out_of_bounds() {
        assert!(Vector::int64([1, 2]).take(&[2]).is_err());
    }

    #[test]
    fn from_scalars_uniform_with_missing() {
        let v = Vector::from_scalars(vec![
            ScalarValue::Int64(1),
            ScalarValue::Missing,
            ScalarValue::Int64(3),
        ]);
        match &v {
            Vector::Int64(v) => {
                assert_eq!(Some(false), v.is_valid(1));
                assert_eq!(Some(&3), v.value(2));
            }
            other => panic!("unexpected vector: {other:?}"),
        }
    }

    #[test]
    fn from_scalars_mixed_stays_dynamic() {
        let v = Vector::from_scalars(vec![ScalarValue::Int64(1), ScalarValue::Utf8("a".into())]);
        assert!(matches!(v, Vector::Scalars(_)));
    }
}
