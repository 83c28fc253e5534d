use super::{check_arity, executor, invalid_input_types, ReturnKind, ScalarFunction};
use crate::datatype::ValueType;
use crate::vector::{BoolVector, Vector};
use plyexec_error::{PlyexecError, Result};
use std::cmp::Ordering;

fn comparable(a: ValueType, b: ValueType) -> bool {
    a == b && !matches!(a, ValueType::Unit)
}

fn compare(name: &str, inputs: &[&Vector], keep: fn(Ordering) -> bool) -> Result<Vector> {
    check_arity(name, inputs.len(), 2)?;
    Ok(match (inputs[0], inputs[1]) {
        (Vector::Int64(a), Vector::Int64(b)) => {
            Vector::Bool(executor::binary(a, b, |a, b| keep(a.cmp(b)))?)
        }
        (Vector::Float64(a), Vector::Float64(b)) => Vector::Bool(executor::binary(a, b, |a, b| {
            a.partial_cmp(b).map(keep).unwrap_or(false)
        })?),
        (Vector::Bool(a), Vector::Bool(b)) => {
            Vector::Bool(executor::binary(a, b, |a, b| keep(a.cmp(b)))?)
        }
        (Vector::Utf8(a), Vector::Utf8(b)) => {
            if a.len() != b.len() {
                return Err(PlyexecError::new(format!(
                    "Input length mismatch, got {} and {}",
                    a.len(),
                    b.len(),
                )));
            }
            let values = (0..a.len()).map(|idx| match (a.value(idx), b.value(idx)) {
                (Some(a), Some(b)) => keep(a.cmp(b)),
                _ => false,
            });
            let validity = executor::combined_validity(a.validity(), b.validity())?;
            let vals: Vec<_> = values.collect();
            Vector::Bool(match validity {
                Some(validity) => BoolVector::with_validity(vals, validity),
                None => BoolVector::from_values(vals),
            })
        }
        _ => {
            return Err(PlyexecError::new(format!(
                "Unexpected input vectors for '{name}'",
            )))
        }
    })
}

macro_rules! comparison_fn {
    ($name:ident, $display:literal, $keep:expr) => {
        #[derive(Debug, Clone, Copy)]
        pub struct $name;

        impl ScalarFunction for $name {
            fn name(&self) -> &'static str {
                $display
            }

            fn return_type(&self, inputs: &[ValueType]) -> Result<ReturnKind> {
                check_arity(self.name(), inputs.len(), 2)?;
                if comparable(inputs[0], inputs[1]) {
                    Ok(ReturnKind::Value(ValueType::Bool))
                } else {
                    Err(invalid_input_types(self.name(), inputs))
                }
            }

            fn execute(&self, inputs: &[&Vector]) -> Result<Vector> {
                compare(self.name(), inputs, $keep)
            }
        }
    };
}

comparison_fn!(Eq, "==", |ord| ord == Ordering::Equal);
comparison_fn!(NotEq, "!=", |ord| ord != Ordering::Equal);
comparison_fn!(Lt, "<", |ord| ord == Ordering::Less);
comparison_fn!(LtEq, "<=", |ord| ord != Ordering::Greater);
comparison_fn!(Gt, ">", |ord| ord == Ordering::Greater);
comparison_fn!(GtEq, ">=", |ord| ord != Ordering::Less);
