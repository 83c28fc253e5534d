use crate::query::Query;
use plyexec_error::{PlyexecError, Result};
use plyexec_vector::cardinality::Cardinality;
use plyexec_vector::label::Label;
use plyexec_vector::scalar::ScalarValue;
use plyexec_vector::shape::Shape;
use plyexec_vector::vector::{BlockVector, Offsets, TupleVector, Vector};
use std::sync::Arc;

/// An outward-facing columnar value: a one-row block cell paired with the
/// shape of its contents.
///
/// Scalars become regular one-element blocks, collections become
/// unconstrained blocks, missing becomes an empty optional block, and the
/// argument-less knot holds the unit value.
#[derive(Debug, Clone, PartialEq)]
pub struct DataKnot {
    cell: BlockVector,
    shape: Shape,
}

impl DataKnot {
    /// The unit knot.
    pub fn unit() -> DataKnot {
        DataKnot {
            cell: BlockVector::wrapping(Vector::Unit(1)),
            shape: Shape::block(Shape::Value(plyexec_vector::ValueType::Unit), Cardinality::ONE),
        }
    }

    /// The empty optional knot.
    pub fn missing() -> DataKnot {
        DataKnot {
            cell: BlockVector::empty_with_n_rows(1),
            shape: Shape::block(Shape::Empty, Cardinality::OPT),
        }
    }

    /// Knot holding a single scalar value.
    ///
    /// `Missing` produces the empty optional knot and a native list produces
    /// a collection knot.
    pub fn new(value: impl Into<ScalarValue>) -> DataKnot {
        match value.into() {
            ScalarValue::Missing => Self::missing(),
            ScalarValue::List(vals) => Self::from_values(vals),
            value => {
                let elements = Vector::from_scalars(vec![value]);
                let shape = Shape::block(element_shape(&elements), Cardinality::ONE);
                DataKnot {
                    cell: BlockVector::wrapping(elements),
                    shape,
                }
            }
        }
    }

    /// Knot holding a collection.
    pub fn from_values<I, V>(values: I) -> DataKnot
    where
        I: IntoIterator<Item = V>,
        V: Into<ScalarValue>,
    {
        let values: Vec<ScalarValue> = values.into_iter().map(Into::into).collect();
        let n = values.len();
        let elements = Vector::from_scalars(values);
        let shape = Shape::block(element_shape(&elements), Cardinality::ANY);
        let cell = BlockVector::try_new(Offsets::Ragged(vec![0, n]), elements, Cardinality::ANY)
            .expect("one full block is always well formed");
        DataKnot { cell, shape }
    }

    /// Knot holding a record of named fields.
    pub fn record<I, S>(fields: I) -> Result<DataKnot>
    where
        I: IntoIterator<Item = (S, DataKnot)>,
        S: Into<Label>,
    {
        let mut labels = Vec::new();
        let mut columns = Vec::new();
        let mut column_shapes = Vec::new();
        for (name, knot) in fields {
            labels.push(name.into());
            column_shapes.push(knot.shape);
            columns.push(Arc::new(Vector::Block(knot.cell)));
        }

        let tuple = TupleVector::try_new(labels.clone(), 1, columns)?;
        let shape = Shape::block(Shape::tuple(labels, column_shapes), Cardinality::ONE);
        Ok(DataKnot {
            cell: BlockVector::wrapping(Vector::Tuple(tuple)),
            shape,
        })
    }

    /// Build a knot from a result cell and its shape.
    pub fn from_parts(cell: BlockVector, shape: Shape) -> Result<DataKnot> {
        if cell.len() != 1 {
            return Err(PlyexecError::new(format!(
                "Expected a one-row cell, got {} rows",
                cell.len(),
            )));
        }
        Ok(DataKnot { cell, shape })
    }

    pub fn cell(&self) -> &BlockVector {
        &self.cell
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn card(&self) -> Cardinality {
        self.cell.card()
    }

    /// Native view of the knot's contents.
    ///
    /// Regular knots yield the single value, empty optional knots yield
    /// missing, plural knots yield a list; nested blocks and tuples
    /// materialize recursively.
    pub fn get(&self) -> Result<ScalarValue> {
        Vector::Block(self.cell.clone()).scalar(0)
    }

    /// Run a query over the knot, confining aggregates to its elements.
    pub fn query(&self, query: impl Into<Query>) -> Result<DataKnot> {
        crate::run::run(self, Query::each(query.into()))
    }
}

/// Shape of the elements held by a vector.
pub(crate) fn element_shape(v: &Vector) -> Shape {
    if v.is_empty() {
        return Shape::Empty;
    }
    match v.value_type() {
        Some(ty) => Shape::Value(ty),
        None => match v {
            Vector::Block(b) => Shape::block(element_shape(b.elements()), b.card()),
            Vector::Tuple(t) => Shape::tuple(
                t.labels().to_vec(),
                t.columns().iter().map(|c| element_shape(c)).collect(),
            ),
            _ => Shape::Any,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_roundtrip() {
        let knot = DataKnot::new(42);
        assert_eq!(Cardinality::ONE, knot.card());
        assert_eq!(ScalarValue::Int64(42), knot.get().unwrap());
    }

    #[test]
    fn vector_roundtrip() {
        let knot = DataKnot::from_values(["GARRY M", "ANTHONY R", "DANA A"]);
        assert_eq!(Cardinality::ANY, knot.card());
        assert_eq!(
            ScalarValue::List(vec![
                ScalarValue::Utf8("GARRY M".into()),
                ScalarValue::Utf8("ANTHONY R".into()),
                ScalarValue::Utf8("DANA A".into()),
            ]),
            knot.get().unwrap()
        );
    }

    #[test]
    fn missing_roundtrip() {
        let knot = DataKnot::new(ScalarValue::Missing);
        assert_eq!(Cardinality::OPT, knot.card());
        assert_eq!(ScalarValue::Missing, knot.get().unwrap());
    }

    #[test]
    fn unit_roundtrip() {
        let knot = DataKnot::unit();
        assert_eq!(ScalarValue::Unit, knot.get().unwrap());
    }

    #[test]
    fn record_roundtrip() {
        let knot =
            DataKnot::record([("x", DataKnot::new(1)), ("y", DataKnot::new(2))]).unwrap();
        match knot.get().unwrap() {
            ScalarValue::Tuple { labels, values } => {
                assert_eq!("x", labels[0].as_str());
                assert_eq!(
                    vec![ScalarValue::Int64(1), ScalarValue::Int64(2)],
                    values
                );
            }
            other => panic!("unexpected value: {other:?}"),
        }
    }

    #[test]
    fn nested_vector_roundtrip() {
        let knot = DataKnot::from_values([
            ScalarValue::List(vec![ScalarValue::Int64(1), ScalarValue::Int64(2)]),
            ScalarValue::List(vec![ScalarValue::Int64(3)]),
        ]);
        // Nested lists stay in the dynamic layout but the native view still
        // materializes them recursively.
        assert_eq!(
            ScalarValue::List(vec![
                ScalarValue::List(vec![ScalarValue::Int64(1), ScalarValue::Int64(2)]),
                ScalarValue::List(vec![ScalarValue::Int64(3)]),
            ]),
            knot.get().unwrap()
        );
    }
}
