use super::{check_arity, executor, invalid_input_types, ReturnKind, ScalarFunction};
use crate::datatype::ValueType;
use crate::vector::Vector;
use plyexec_error::{PlyexecError, Result};

macro_rules! int_predicate {
    ($name:ident, $display:literal, $op:expr) => {
        #[derive(Debug, Clone, Copy)]
        pub struct $name;

        impl ScalarFunction for $name {
            fn name(&self) -> &'static str {
                $display
            }

            fn return_type(&self, inputs: &[ValueType]) -> Result<ReturnKind> {
                check_arity(self.name(), inputs.len(), 1)?;
                match inputs[0] {
                    ValueType::Int64 => Ok(ReturnKind::Value(ValueType::Bool)),
                    _ => Err(invalid_input_types(self.name(), inputs)),
                }
            }

            fn execute(&self, inputs: &[&Vector]) -> Result<Vector> {
                check_arity(self.name(), inputs.len(), 1)?;
                match inputs[0] {
                    Vector::Int64(v) => {
                        let op: fn(i64) -> bool = $op;
                        Ok(Vector::Bool(executor::unary(v, |&v| op(v))))
                    }
                    _ => Err(PlyexecError::new(format!(
                        "Unexpected input vector for '{}'",
                        self.name(),
                    ))),
                }
            }
        }
    };
}

int_predicate!(IsOdd, "isodd", |v| v.rem_euclid(2) == 1);
int_predicate!(IsEven, "iseven", |v| v.rem_euclid(2) == 0);
int_predicate!(Positive, "positive", |v| v > 0);
