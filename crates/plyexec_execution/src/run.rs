use crate::assemble::{self, Environment};
use crate::knot::DataKnot;
use crate::query::Query;
use plyexec_error::{PlyexecError, Result};
use plyexec_vector::label::Label;
use plyexec_vector::pipeline::{self, optimize};
use plyexec_vector::shape::Shape;
use plyexec_vector::vector::{TupleVector, Vector};
use std::sync::Arc;
use tracing::debug;

/// Run a query over an input knot.
pub fn run(input: &DataKnot, query: impl Into<Query>) -> Result<DataKnot> {
    run_with(input, query, Vec::new())
}

/// Run a query over an input knot with named parameters.
///
/// Parameters are packed into a scope around the input before assembly, so
/// `It.name` finds them through the context branch of the scope.
pub fn run_with(
    input: &DataKnot,
    query: impl Into<Query>,
    params: Vec<(Label, DataKnot)>,
) -> Result<DataKnot> {
    let query = query.into();
    let (root_vec, root_shape, param_labels) = pack(input, params)?;
    let env = Environment::new(param_labels);

    let flow = assemble::cover(&root_shape)?;
    let p = assemble::assemble(&env, &query, flow)?;
    debug!(shape = ?p.target(), "assembled query");

    let p = optimize::optimize(p);
    let out = p.evaluate(&root_vec)?;
    debug!(rows = out.len(), "executed pipeline");

    let (elem, card) = p.target().flow_block()?;
    let label = p.target().label().cloned();

    // Strip any residual scope so the caller sees plain subjects.
    let (out, elem) = if elem.is_scope() {
        let (subject, _) = elem.scope_parts()?;
        let projected = pipeline::with_elements(pipeline::column(0)).evaluate(&out)?;
        (projected, subject.clone())
    } else {
        (out, elem.clone())
    };

    let cell = match out {
        Vector::Block(cell) => cell,
        other => {
            return Err(PlyexecError::new(format!(
                "Expected a block result, got {other:?}"
            )))
        }
    };

    let shape = Shape::block(elem, card).with_label(label);
    DataKnot::from_parts(cell, shape)
}

/// Pack the input and named parameters into the root vector and its shape.
fn pack(
    input: &DataKnot,
    params: Vec<(Label, DataKnot)>,
) -> Result<(Vector, Shape, Vec<Label>)> {
    if params.is_empty() {
        return Ok((
            Vector::Block(input.cell().clone()),
            input.shape().clone(),
            Vec::new(),
        ));
    }

    let mut labels = Vec::with_capacity(params.len());
    let mut columns = Vec::with_capacity(params.len());
    let mut column_shapes = Vec::with_capacity(params.len());
    for (name, knot) in params {
        labels.push(name);
        column_shapes.push(knot.shape().clone());
        columns.push(Arc::new(Vector::Block(knot.cell().clone())));
    }

    let ctx = TupleVector::try_new(labels.clone(), 1, columns)?;
    let root = TupleVector::try_new(
        Vec::new(),
        1,
        vec![
            Arc::new(Vector::Block(input.cell().clone())),
            Arc::new(Vector::Tuple(ctx)),
        ],
    )?;
    let shape = Shape::scope(Shape::tuple(
        Vec::new(),
        vec![
            input.shape().clone(),
            Shape::tuple(labels.clone(), column_shapes),
        ],
    ));

    Ok((Vector::Tuple(root), shape, labels))
}
