use super::{check_arity, executor, invalid_input_types, ReturnKind, ScalarFunction};
use crate::datatype::ValueType;
use crate::vector::Vector;
use plyexec_error::{PlyexecError, Result};

macro_rules! binary_bool {
    ($name:ident, $display:literal, $op:expr) => {
        #[derive(Debug, Clone, Copy)]
        pub struct $name;

        impl ScalarFunction for $name {
            fn name(&self) -> &'static str {
                $display
            }

            fn return_type(&self, inputs: &[ValueType]) -> Result<ReturnKind> {
                check_arity(self.name(), inputs.len(), 2)?;
                match (inputs[0], inputs[1]) {
                    (ValueType::Bool, ValueType::Bool) => Ok(ReturnKind::Value(ValueType::Bool)),
                    _ => Err(invalid_input_types(self.name(), inputs)),
                }
            }

            fn execute(&self, inputs: &[&Vector]) -> Result<Vector> {
                check_arity(self.name(), inputs.len(), 2)?;
                match (inputs[0], inputs[1]) {
                    (Vector::Bool(a), Vector::Bool(b)) => {
                        let op: fn(bool, bool) -> bool = $op;
                        Ok(Vector::Bool(executor::binary(a, b, |&a, &b| op(a, b))?))
                    }
                    _ => Err(PlyexecError::new(format!(
                        "Unexpected input vectors for '{}'",
                        self.name(),
                    ))),
                }
            }
        }
    };
}

binary_bool!(And, "&", |a, b| a && b);
binary_bool!(Or, "|", |a, b| a || b);

#[derive(Debug, Clone, Copy)]
pub struct Not;

impl ScalarFunction for Not {
    fn name(&self) -> &'static str {
        "!"
    }

    fn return_type(&self, inputs: &[ValueType]) -> Result<ReturnKind> {
        check_arity(self.name(), inputs.len(), 1)?;
        match inputs[0] {
            ValueType::Bool => Ok(ReturnKind::Value(ValueType::Bool)),
            _ => Err(invalid_input_types(self.name(), inputs)),
        }
    }

    fn execute(&self, inputs: &[&Vector]) -> Result<Vector> {
        check_arity(self.name(), inputs.len(), 1)?;
        match inputs[0] {
            Vector::Bool(v) => Ok(Vector::Bool(executor::unary(v, |&v| !v))),
            _ => Err(PlyexecError::new("Unexpected input vector for '!'")),
        }
    }
}
