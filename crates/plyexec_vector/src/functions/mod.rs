pub mod aggregate;
pub mod arith;
pub mod boolean;
pub mod comparison;
pub mod executor;
pub mod numeric;

use crate::datatype::ValueType;
use crate::vector::Vector;
use dyn_clone::DynClone;
use once_cell::sync::Lazy;
use plyexec_error::{PlyexecError, Result};
use std::fmt::Debug;

/// What a lifted function produces per input row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnKind {
    /// One value per row.
    Value(ValueType),
    /// A value or missing per row.
    Optional(ValueType),
    /// A native list per row.
    ListOf(ValueType),
}

impl ReturnKind {
    pub fn value_type(&self) -> ValueType {
        match self {
            Self::Value(ty) | Self::Optional(ty) | Self::ListOf(ty) => *ty,
        }
    }
}

/// A scalar function liftable over element vectors.
///
/// `execute` is vectorized: it receives equal-length input columns and must
/// return a vector of the same length. `return_type` runs during assembly;
/// failing there aborts the query before anything executes.
pub trait ScalarFunction: Debug + Sync + Send + DynClone {
    fn name(&self) -> &'static str;

    /// Infer the output of the function for the given input types.
    ///
    /// Errors if the function cannot accept the inferred argument tuple.
    fn return_type(&self, inputs: &[ValueType]) -> Result<ReturnKind>;

    fn execute(&self, inputs: &[&Vector]) -> Result<Vector>;
}

dyn_clone::clone_trait_object!(ScalarFunction);

/// List of all built-in scalar functions.
pub static BUILTIN_SCALAR_FUNCTIONS: Lazy<Vec<Box<dyn ScalarFunction>>> = Lazy::new(|| {
    vec![
        // Arith
        Box::new(arith::Add),
        Box::new(arith::Sub),
        Box::new(arith::Mul),
        Box::new(arith::Div),
        Box::new(arith::Neg),
        // Comparison
        Box::new(comparison::Eq),
        Box::new(comparison::NotEq),
        Box::new(comparison::Lt),
        Box::new(comparison::LtEq),
        Box::new(comparison::Gt),
        Box::new(comparison::GtEq),
        // Boolean
        Box::new(boolean::And),
        Box::new(boolean::Or),
        Box::new(boolean::Not),
        // Numeric predicates
        Box::new(numeric::IsOdd),
        Box::new(numeric::IsEven),
        Box::new(numeric::Positive),
    ]
});

/// Find a built-in scalar function by name.
pub fn find_scalar_function(name: &str) -> Option<&'static dyn ScalarFunction> {
    BUILTIN_SCALAR_FUNCTIONS
        .iter()
        .find(|f| f.name() == name)
        .map(|f| f.as_ref())
}

pub(crate) fn check_arity(name: &str, inputs: usize, expected: usize) -> Result<()> {
    if inputs != expected {
        return Err(PlyexecError::new(format!(
            "Expected {expected} inputs to '{name}', got {inputs}",
        )));
    }
    Ok(())
}

pub(crate) fn invalid_input_types(name: &str, inputs: &[ValueType]) -> PlyexecError {
    let types: Vec<_> = inputs.iter().map(|t| t.to_string()).collect();
    PlyexecError::new(format!(
        "Cannot apply '{name}' to types ({})",
        types.join(", "),
    ))
}
