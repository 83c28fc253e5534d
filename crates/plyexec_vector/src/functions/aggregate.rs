use crate::datatype::ValueType;
use crate::scalar::ScalarValue;
use crate::vector::{BlockVector, PrimitiveVector, Vector};
use plyexec_error::{PlyexecError, Result};
use std::fmt::Debug;

/// Reductions applied per block by the `block_lift` primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockAggregate {
    Sum,
    Min,
    Max,
}

impl BlockAggregate {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Sum => "sum",
            Self::Min => "min",
            Self::Max => "max",
        }
    }

    /// Value emitted for an empty block, None if the aggregate has no
    /// neutral element and must emit missing instead.
    pub fn default_value(&self, ty: ValueType) -> Option<ScalarValue> {
        match (self, ty) {
            (Self::Sum, ValueType::Int64) => Some(ScalarValue::Int64(0)),
            (Self::Sum, ValueType::Float64) => Some(ScalarValue::Float64(0.0)),
            _ => None,
        }
    }

    pub fn return_type(&self, input: ValueType) -> Result<ValueType> {
        match self {
            Self::Sum => {
                if input.is_numeric() {
                    Ok(input)
                } else {
                    Err(PlyexecError::new(format!("Cannot sum values of type {input}")))
                }
            }
            Self::Min | Self::Max => match input {
                ValueType::Unit => Err(PlyexecError::new(format!(
                    "Cannot take {} of values of type {input}",
                    self.name(),
                ))),
                other => Ok(other),
            },
        }
    }

    /// Reduce each block to a single value.
    ///
    /// Empty blocks emit `default` when given, missing otherwise.
    pub fn execute(
        &self,
        blocks: &BlockVector,
        default: Option<&ScalarValue>,
    ) -> Result<Vector> {
        let elements = blocks.elements().as_ref();
        let mut out = Vec::with_capacity(blocks.len());

        for k in 0..blocks.len() {
            let (start, end) = blocks.block_bounds(k);
            let reduced = match (self, elements) {
                (Self::Sum, Vector::Int64(v)) => {
                    reduce(v, start, end, |acc, val| acc.wrapping_add(*val)).map(ScalarValue::Int64)
                }
                (Self::Sum, Vector::Float64(v)) => {
                    reduce(v, start, end, |acc, val| acc + val).map(ScalarValue::Float64)
                }
                (Self::Min, Vector::Int64(v)) => {
                    reduce(v, start, end, |acc, val| acc.min(*val)).map(ScalarValue::Int64)
                }
                (Self::Max, Vector::Int64(v)) => {
                    reduce(v, start, end, |acc, val| acc.max(*val)).map(ScalarValue::Int64)
                }
                (Self::Min, Vector::Float64(v)) => {
                    reduce(v, start, end, |acc, val| acc.min(*val)).map(ScalarValue::Float64)
                }
                (Self::Max, Vector::Float64(v)) => {
                    reduce(v, start, end, |acc, val| acc.max(*val)).map(ScalarValue::Float64)
                }
                (Self::Min, Vector::Bool(v)) => {
                    reduce(v, start, end, |acc, val| acc && *val).map(ScalarValue::Bool)
                }
                (Self::Max, Vector::Bool(v)) => {
                    reduce(v, start, end, |acc, val| acc || *val).map(ScalarValue::Bool)
                }
                (Self::Min | Self::Max, Vector::Utf8(v)) => {
                    let mut acc: Option<&str> = None;
                    for idx in start..end {
                        if v.is_valid(idx) != Some(true) {
                            continue;
                        }
                        let val = v.value(idx).expect("index in bounds");
                        acc = Some(match acc {
                            None => val,
                            Some(acc) => match self {
                                Self::Min => acc.min(val),
                                _ => acc.max(val),
                            },
                        });
                    }
                    acc.map(|s| ScalarValue::Utf8(s.to_string()))
                }
                (_, other) => {
                    return Err(PlyexecError::new(format!(
                        "Cannot apply '{}' to element vector {other:?}",
                        self.name(),
                    )))
                }
            };

            match reduced {
                Some(val) => out.push(val),
                None => out.push(default.cloned().unwrap_or(ScalarValue::Missing)),
            }
        }

        Ok(Vector::from_scalars(out))
    }
}

/// Reduce the valid values of a primitive vector slice, None if the slice
/// holds no valid values.
fn reduce<T, F>(v: &PrimitiveVector<T>, start: usize, end: usize, f: F) -> Option<T>
where
    T: Copy + Debug,
    F: Fn(T, &T) -> T,
{
    let mut acc: Option<T> = None;
    for idx in start..end {
        if v.is_valid(idx) != Some(true) {
            continue;
        }
        let val = &v.values()[idx];
        acc = Some(match acc {
            None => *val,
            Some(acc) => f(acc, val),
        });
    }
    acc
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cardinality::Cardinality;
    use crate::vector::Offsets;

    fn blocks() -> BlockVector {
        // [1, 2, 3] [] [5]
        BlockVector::try_new(
            Offsets::from_lengths([3, 0, 1]),
            Vector::int64([1, 2, 3, 5]),
            Cardinality::ANY,
        )
        .unwrap()
    }

    #[test]
    fn sum_with_default() {
        let out = BlockAggregate::Sum
            .execute(&blocks(), Some(&ScalarValue::Int64(0)))
            .unwrap();
        assert_eq!(Vector::int64([6, 0, 5]), out);
    }

    #[test]
    fn max_emits_missing_for_empty() {
        let out = BlockAggregate::Max.execute(&blocks(), None).unwrap();
        assert_eq!(ScalarValue::Int64(3), out.scalar(0).unwrap());
        assert_eq!(ScalarValue::Missing, out.scalar(1).unwrap());
        assert_eq!(ScalarValue::Int64(5), out.scalar(2).unwrap());
    }

    #[test]
    fn min_utf8() {
        let blocks = BlockVector::try_new(
            Offsets::from_lengths([2]),
            Vector::utf8(["pear", "apple"]),
            Cardinality::ANY,
        )
        .unwrap();
        let out = BlockAggregate::Min.execute(&blocks, None).unwrap();
        assert_eq!(ScalarValue::Utf8("apple".into()), out.scalar(0).unwrap());
    }
}
