pub(crate) mod step;

use crate::query::{AggKind, Query, TakeArg};
use plyexec_error::{PlyexecError, Result};
use plyexec_vector::cardinality::Cardinality;
use plyexec_vector::datatype::ValueType;
use plyexec_vector::functions::aggregate::BlockAggregate;
use plyexec_vector::functions::numeric;
use plyexec_vector::label::Label;
use plyexec_vector::pipeline::{self, BlockFunc, Pipeline};
use plyexec_vector::scalar::ScalarValue;
use plyexec_vector::shape::Shape;
use plyexec_vector::signature::Signature;
use std::sync::Arc;

/// Per-run assembly state: the named parameters supplied with the run, used
/// for error reporting on failed lookups.
pub(crate) struct Environment {
    pub(crate) params: Vec<Label>,
}

impl Environment {
    pub(crate) fn new(params: Vec<Label>) -> Self {
        Environment { params }
    }
}

/// Construct the flow over a vector shape.
///
/// Blocks are marked as the flow directly; plain values and tuples wrap into
/// singleton blocks. A scope whose subject is a block distributes the subject
/// against the context so that every element carries the scope.
pub(crate) fn cover(shape: &Shape) -> Result<Pipeline> {
    if shape.is_scope() {
        let (subject, ctx) = shape.scope_parts()?;
        if let Ok((subj_elem, card)) = subject.flow_block() {
            let elem = Shape::scope(Shape::tuple(
                Vec::new(),
                vec![subj_elem.clone(), Shape::Tuple(ctx.clone())],
            ));
            let target = Shape::flow(Shape::block(elem, card));
            return Ok(pipeline::distribute(0)
                .designate(Signature::new(shape.clone(), target)));
        }
    } else if shape.flow_block().is_ok() {
        return Ok(pipeline::pass()
            .designate(Signature::new(shape.clone(), Shape::flow(shape.clone()))));
    }

    let target = Shape::flow(Shape::block(shape.clone(), Cardinality::ONE));
    Ok(pipeline::wrap().designate(Signature::new(shape.clone(), target)))
}

/// Construct a flow over the rows of a vector, without fanning out into the
/// blocks the rows may hold.
///
/// Used for queries that run once per source row, like the count argument of
/// `Take`. Scoped rows keep their scope, so parameters stay reachable.
pub(crate) fn cover_rows(shape: &Shape) -> Pipeline {
    let target = Shape::flow(Shape::block(shape.clone(), Cardinality::ONE));
    pipeline::wrap().designate(Signature::new(shape.clone(), target))
}

/// Strip the flow decorator from a pipeline's target, exposing the plain
/// block underneath.
pub(crate) fn uncover(p: Pipeline) -> Pipeline {
    let sig = Signature::new(p.source().clone(), p.target().clone().unflow());
    p.designate(sig)
}

/// Element shape and cardinality of a flow pipeline's target.
pub(crate) fn flow_parts(p: &Pipeline) -> Result<(Shape, Cardinality)> {
    let (elem, card) = p.target().flow_block()?;
    Ok((elem.clone(), card))
}

/// Compose two flow pipelines: the right side operates on the elements of
/// the left side's flow.
pub(crate) fn compose(p1: Pipeline, p2: Pipeline) -> Result<Pipeline> {
    let (elem1, card1) = flow_parts(&p1)?;
    let p2 = realign_scope(&elem1, p2)?;

    if !elem1.fits(p2.source()) {
        return Err(PlyexecError::new(format!(
            "Shape mismatch in composition: {elem1:?} does not fit {:?}",
            p2.source(),
        )));
    }

    let (elem2, card2) = flow_parts(&p2)?;
    let label = p2.target().label().cloned();
    let target = Shape::flow(Shape::block(elem2, card1 | card2).with_label(label));
    let source = p1.source().clone();

    Ok(
        pipeline::chain_of([p1, pipeline::with_elements(p2), pipeline::flatten()])
            .designate(Signature::new(source, target)),
    )
}

/// Thread a scope the right side does not carry: apply it to the subject
/// column and distribute the result against the context.
fn realign_scope(elem1: &Shape, p2: Pipeline) -> Result<Pipeline> {
    if elem1.fits(p2.source()) || !elem1.is_scope() {
        return Ok(p2);
    }
    let (subject, ctx) = elem1.scope_parts()?;
    if !subject.fits(p2.source()) {
        return Ok(p2);
    }

    let (elem2, card2) = flow_parts(&p2)?;
    let label = p2.target().label().cloned();
    let elem = Shape::scope(Shape::tuple(
        Vec::new(),
        vec![elem2, Shape::Tuple(ctx.clone())],
    ));
    let target = Shape::flow(Shape::block(elem, card2).with_label(label));

    Ok(pipeline::chain_of([
        pipeline::with_column(0, uncover(p2)),
        pipeline::distribute(0),
    ])
    .designate(Signature::new(elem1.clone(), target)))
}

/// Lift a per-row block step into a flow pipeline, re-attaching the scope
/// context from the input when the input is scoped.
pub(crate) fn attach(input: &Shape, step_block: Pipeline) -> Result<Pipeline> {
    if !input.is_scope() {
        let target = Shape::flow(step_block.target().clone());
        let sig = Signature::new(input.clone(), target);
        return Ok(step_block.designate(sig));
    }

    let (out_elem, out_card) = step_block.target().flow_block()?;
    let out_elem = out_elem.clone();
    let label = step_block.target().label().cloned();
    let (_, ctx) = input.scope_parts()?;
    let elem = Shape::scope(Shape::tuple(
        Vec::new(),
        vec![out_elem, Shape::Tuple(ctx.clone())],
    ));
    let target = Shape::flow(Shape::block(elem, out_card).with_label(label));

    Ok(pipeline::chain_of([
        pipeline::tuple_of(Vec::new(), vec![step_block, pipeline::column(1)]),
        pipeline::distribute(0),
    ])
    .designate(Signature::new(input.clone(), target)))
}

/// Rewrite the output label of a flow pipeline.
pub(crate) fn relabel(p: Pipeline, label: Option<Label>) -> Pipeline {
    let source = p.source().clone();
    let target = p.target().clone().with_label(label);
    p.designate(Signature::new(source, target))
}

/// Scalar element type underneath label decorators.
pub(crate) fn value_type_of(shape: &Shape) -> Result<ValueType> {
    let mut s = shape;
    loop {
        match s {
            Shape::Labeled(_, inner) => s = inner,
            _ => break,
        }
    }
    match s {
        Shape::Value(ty) => Ok(*ty),
        other => Err(PlyexecError::new(format!(
            "Expected a scalar shape, got {other:?}"
        ))),
    }
}

fn is_empty_shape(shape: &Shape) -> bool {
    let mut s = shape;
    loop {
        match s {
            Shape::Labeled(_, inner) => s = inner,
            _ => break,
        }
    }
    matches!(s, Shape::Empty)
}

/// Assemble a query against the flow built so far.
///
/// The invariant is that `p_in`'s target is always a flow shape; every step
/// composes a new flow onto it. Flow-level combinators (suffix aggregates,
/// take/drop, relabeling) consume `p_in` directly, everything else is
/// assembled against the flow's element shape.
pub(crate) fn assemble(env: &Environment, query: &Query, p_in: Pipeline) -> Result<Pipeline> {
    match query {
        Query::Chain(parts) => {
            let mut p = p_in;
            for part in parts {
                p = assemble(env, part, p)?;
            }
            Ok(p)
        }
        Query::AsLabel(label) => Ok(relabel(p_in, label.clone())),
        Query::Agg(kind, None) => flow_aggregate(*kind, p_in),
        Query::Take(arg, rev) => assemble_take(env, arg, *rev, p_in),
        other => {
            let (elem, _) = flow_parts(&p_in)?;
            let step = step::assemble_step(env, other, &elem)?;
            compose(p_in, step)
        }
    }
}

/// Aggregate the whole flow of `p_in` into one value per source row.
pub(crate) fn flow_aggregate(kind: AggKind, p_in: Pipeline) -> Result<Pipeline> {
    let source = p_in.source().clone();
    let (elem, card) = flow_parts(&p_in)?;
    let mut raw = uncover(p_in);

    let subject = if elem.is_scope() {
        let (s, _) = elem.scope_parts()?;
        let s = s.clone();
        raw = pipeline::chain_of([raw, pipeline::with_elements(pipeline::column(0))]);
        s
    } else {
        elem
    };

    let step = match kind {
        AggKind::Count => {
            let target = Shape::block(Shape::Value(ValueType::Int64), Cardinality::ONE);
            pipeline::chain_of([raw, pipeline::block_length(), pipeline::wrap()])
                .designate(Signature::new(source.clone(), target))
        }
        AggKind::Exists => {
            let target = Shape::block(Shape::Value(ValueType::Bool), Cardinality::ONE);
            pipeline::chain_of([
                raw,
                pipeline::block_length(),
                pipeline::lift(Arc::new(numeric::Positive)),
                pipeline::wrap(),
            ])
            .designate(Signature::new(source.clone(), target))
        }
        AggKind::Any | AggKind::All => {
            let target = Shape::block(Shape::Value(ValueType::Bool), Cardinality::ONE);
            if is_empty_shape(&subject) {
                // An always-empty flow has a fixed answer.
                let neutral = ScalarValue::Bool(kind == AggKind::All);
                pipeline::chain_of([pipeline::filler(neutral), pipeline::wrap()])
                    .designate(Signature::new(source.clone(), target))
            } else {
                if value_type_of(&subject)? != ValueType::Bool {
                    return Err(PlyexecError::new(format!(
                        "{} expected a boolean flow, got {subject:?}",
                        kind.name(),
                    )));
                }
                let prim = match kind {
                    AggKind::Any => pipeline::block_any(),
                    _ => pipeline::block_all(),
                };
                pipeline::chain_of([raw, prim, pipeline::wrap()])
                    .designate(Signature::new(source.clone(), target))
            }
        }
        AggKind::Sum | AggKind::Min | AggKind::Max => {
            if is_empty_shape(&subject) {
                // Aggregating an always-empty flow: sum has a neutral
                // element, min/max yield the empty optional.
                match kind {
                    AggKind::Sum => {
                        let target =
                            Shape::block(Shape::Value(ValueType::Int64), Cardinality::ONE);
                        pipeline::chain_of([
                            pipeline::filler(ScalarValue::Int64(0)),
                            pipeline::wrap(),
                        ])
                        .designate(Signature::new(source.clone(), target))
                    }
                    _ => {
                        let target = Shape::block(Shape::Empty, Cardinality::OPT);
                        pipeline::null_filler()
                            .designate(Signature::new(source.clone(), target))
                    }
                }
            } else {
                let ty = value_type_of(&subject).map_err(|_| {
                    PlyexecError::new(format!(
                        "{} expected a scalar flow, got {subject:?}",
                        kind.name(),
                    ))
                })?;
                let agg = match kind {
                    AggKind::Sum => BlockAggregate::Sum,
                    AggKind::Min => BlockAggregate::Min,
                    _ => BlockAggregate::Max,
                };
                let out_ty = agg.return_type(ty)?;

                match agg.default_value(ty) {
                    Some(default) => {
                        let target = Shape::block(Shape::Value(out_ty), Cardinality::ONE);
                        pipeline::chain_of([
                            raw,
                            pipeline::block_lift(BlockFunc::Agg(agg), Some(default)),
                            pipeline::wrap(),
                        ])
                        .designate(Signature::new(source.clone(), target))
                    }
                    // No neutral element: the missing-aware variant applies
                    // when the flow may be empty.
                    None if card.is_optional() => {
                        let target = Shape::block(Shape::Value(out_ty), Cardinality::OPT);
                        pipeline::chain_of([
                            raw,
                            pipeline::block_lift(BlockFunc::Agg(agg), None),
                            pipeline::adapt_missing(),
                        ])
                        .designate(Signature::new(source.clone(), target))
                    }
                    None => {
                        let target = Shape::block(Shape::Value(out_ty), Cardinality::ONE);
                        pipeline::chain_of([
                            raw,
                            pipeline::block_lift(BlockFunc::Agg(agg), None),
                            pipeline::wrap(),
                        ])
                        .designate(Signature::new(source.clone(), target))
                    }
                }
            }
        }
    };

    attach(&source, step)
}

/// Slice the current flow per block.
///
/// A query-valued count is assembled against the source of the flow, not
/// its elements, and must produce at most one integer per source row.
fn assemble_take(
    env: &Environment,
    arg: &TakeArg,
    rev: bool,
    p_in: Pipeline,
) -> Result<Pipeline> {
    let source = p_in.source().clone();
    let (elem, card) = flow_parts(&p_in)?;
    let label = p_in.target().label().cloned();
    let target = Shape::flow(Shape::block(elem, card | Cardinality::OPT).with_label(label));

    match arg {
        TakeArg::Count(n) => Ok(pipeline::chain_of([uncover(p_in), pipeline::slice(*n, rev)])
            .designate(Signature::new(source, target))),
        TakeArg::Query(q) => {
            let n_flow = assemble(env, q, cover_rows(&source))?;
            let (n_elem, n_card) = flow_parts(&n_flow)?;
            let mut n_block = uncover(n_flow);
            let n_subject = if n_elem.is_scope() {
                let (s, _) = n_elem.scope_parts()?;
                let s = s.clone();
                n_block = pipeline::chain_of([
                    n_block,
                    pipeline::with_elements(pipeline::column(0)),
                ]);
                s
            } else {
                n_elem
            };

            match value_type_of(&n_subject) {
                Ok(ValueType::Int64) => (),
                _ => {
                    return Err(PlyexecError::new(format!(
                        "Take expected an integer count, got {n_subject:?}"
                    )))
                }
            }
            if !n_card.fits(Cardinality::OPT) {
                return Err(PlyexecError::new(
                    "Take expected at most one count per source row",
                ));
            }

            Ok(pipeline::chain_of([
                pipeline::tuple_of(Vec::new(), vec![uncover(p_in), n_block]),
                pipeline::slice_by(rev),
            ])
            .designate(Signature::new(source, target)))
        }
    }
}
