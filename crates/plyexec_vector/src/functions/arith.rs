use super::{check_arity, executor, invalid_input_types, ReturnKind, ScalarFunction};
use crate::datatype::ValueType;
use crate::vector::Vector;
use plyexec_error::{PlyexecError, Result};

macro_rules! binary_arith {
    ($name:ident, $display:literal, $int_op:expr, $float_op:expr) => {
        #[derive(Debug, Clone, Copy)]
        pub struct $name;

        impl ScalarFunction for $name {
            fn name(&self) -> &'static str {
                $display
            }

            fn return_type(&self, inputs: &[ValueType]) -> Result<ReturnKind> {
                check_arity(self.name(), inputs.len(), 2)?;
                match (inputs[0], inputs[1]) {
                    (ValueType::Int64, ValueType::Int64) => Ok(ReturnKind::Value(ValueType::Int64)),
                    (ValueType::Float64, ValueType::Float64) => {
                        Ok(ReturnKind::Value(ValueType::Float64))
                    }
                    _ => Err(invalid_input_types(self.name(), inputs)),
                }
            }

            fn execute(&self, inputs: &[&Vector]) -> Result<Vector> {
                check_arity(self.name(), inputs.len(), 2)?;
                match (inputs[0], inputs[1]) {
                    (Vector::Int64(a), Vector::Int64(b)) => {
                        let op: fn(i64, i64) -> i64 = $int_op;
                        Ok(Vector::Int64(executor::binary(a, b, |&a, &b| op(a, b))?))
                    }
                    (Vector::Float64(a), Vector::Float64(b)) => {
                        let op: fn(f64, f64) -> f64 = $float_op;
                        Ok(Vector::Float64(executor::binary(a, b, |&a, &b| op(a, b))?))
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

binary_arith!(Add, "+", |a, b| a.wrapping_add(b), |a, b| a + b);
binary_arith!(Sub, "-", |a, b| a.wrapping_sub(b), |a, b| a - b);
binary_arith!(Mul, "*", |a, b| a.wrapping_mul(b), |a, b| a * b);
binary_arith!(Div, "div", |a, b| a.wrapping_div(b), |a, b| a / b);

#[derive(Debug, Clone, Copy)]
pub struct Neg;

impl ScalarFunction for Neg {
    fn name(&self) -> &'static str {
        "neg"
    }

    fn return_type(&self, inputs: &[ValueType]) -> Result<ReturnKind> {
        check_arity(self.name(), inputs.len(), 1)?;
        match inputs[0] {
            ValueType::Int64 => Ok(ReturnKind::Value(ValueType::Int64)),
            ValueType::Float64 => Ok(ReturnKind::Value(ValueType::Float64)),
            _ => Err(invalid_input_types(self.name(), inputs)),
        }
    }

    fn execute(&self, inputs: &[&Vector]) -> Result<Vector> {
        check_arity(self.name(), inputs.len(), 1)?;
        match inputs[0] {
            Vector::Int64(v) => Ok(Vector::Int64(executor::unary(v, |&v| v.wrapping_neg()))),
            Vector::Float64(v) => Ok(Vector::Float64(executor::unary(v, |&v| -v))),
            _ => Err(PlyexecError::new("Unexpected input vector for 'neg'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scalar::ScalarValue;

    #[test]
    fn add_int64() {
        let a = Vector::int64([1, 2, 3]);
        let b = Vector::int64([10, 20, 30]);
        let out = Add.execute(&[&a, &b]).unwrap();
        assert_eq!(Vector::int64([11, 22, 33]), out);
    }

    #[test]
    fn mul_float64() {
        let a = Vector::float64([1.5, 2.0]);
        let b = Vector::float64([2.0, 2.0]);
        let out = Mul.execute(&[&a, &b]).unwrap();
        assert_eq!(ScalarValue::Float64(3.0), out.scalar(0).unwrap());
    }

    #[test]
    fn add_rejects_mixed_types() {
        assert!(Add
            .return_type(&[ValueType::Int64, ValueType::Utf8])
            .is_err());
    }
}
