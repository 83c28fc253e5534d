use super::{
    assemble, attach, compose, cover, flow_aggregate, flow_parts, relabel, uncover,
    value_type_of, Environment,
};
use crate::knot::element_shape;
use crate::query::Query;
use plyexec_error::{PlyexecError, Result};
use plyexec_vector::cardinality::Cardinality;
use plyexec_vector::datatype::ValueType;
use plyexec_vector::functions::{ReturnKind, ScalarFunction};
use plyexec_vector::label::Label;
use plyexec_vector::pipeline::{self, BlockFunc, Pipeline};
use plyexec_vector::scalar::ScalarValue;
use plyexec_vector::shape::{Shape, TupleShape};
use plyexec_vector::signature::Signature;
use plyexec_vector::vector::Vector;
use std::sync::Arc;

/// Assemble one combinator against the current flow's element shape,
/// producing a pipeline from the element vector to a new flow.
pub(crate) fn assemble_step(env: &Environment, query: &Query, elem: &Shape) -> Result<Pipeline> {
    match query {
        Query::It => {
            let target = Shape::flow(Shape::block(elem.clone(), Cardinality::ONE));
            Ok(pipeline::wrap().designate(Signature::new(elem.clone(), target)))
        }
        Query::Get(name) => assemble_get(env, name, elem),
        Query::Const(value) => {
            let step = const_step(value, elem)?;
            attach(elem, step)
        }
        Query::ConstList(values) => {
            let vector = Vector::from_scalars(values.clone());
            let target = Shape::block(element_shape(&vector), Cardinality::ANY);
            let step = pipeline::block_filler(vector, Cardinality::ANY)
                .designate(Signature::new(elem.clone(), target));
            attach(elem, step)
        }
        Query::Knot(knot) => {
            let step = pipeline::block_filler(knot.cell().elements().clone(), knot.card())
                .designate(Signature::new(elem.clone(), knot.shape().clone()));
            attach(elem, step)
        }
        Query::Apply(f, args) => assemble_apply(env, f, args, elem),
        Query::Record(fields) => assemble_record(env, fields, elem),
        Query::Filter(q) => assemble_filter(env, q, elem),
        Query::Agg(kind, Some(q)) => {
            let sub = assemble(env, q, cover(elem)?)?;
            flow_aggregate(*kind, sub)
        }
        Query::Keep(bindings) => assemble_keep(env, bindings, elem),
        Query::Given(bindings, body) => assemble_given(env, bindings, body, elem),
        Query::Tag(name, q) => {
            let step = assemble_step(env, q, elem)?;
            Ok(relabel(step, Some(name.clone())))
        }
        Query::Each(q) => assemble(env, q, cover(elem)?),
        // Flow-level forms used in element position run as a sub-flow over
        // the element.
        other => assemble(env, other, cover(elem)?),
    }
}

fn const_step(value: &ScalarValue, elem: &Shape) -> Result<Pipeline> {
    Ok(match value {
        ScalarValue::Missing => {
            let target = Shape::block(Shape::Empty, Cardinality::OPT);
            pipeline::null_filler().designate(Signature::new(elem.clone(), target))
        }
        ScalarValue::List(values) => {
            let vector = Vector::from_scalars(values.clone());
            let target = Shape::block(element_shape(&vector), Cardinality::ANY);
            pipeline::block_filler(vector, Cardinality::ANY)
                .designate(Signature::new(elem.clone(), target))
        }
        value => {
            let ty = value.value_type().ok_or_else(|| {
                PlyexecError::new(format!("Cannot lift constant {value:?}"))
            })?;
            let target = Shape::block(Shape::Value(ty), Cardinality::ONE);
            pipeline::chain_of([pipeline::filler(value.clone()), pipeline::wrap()])
                .designate(Signature::new(elem.clone(), target))
        }
    })
}

fn assemble_get(env: &Environment, name: &Label, elem: &Shape) -> Result<Pipeline> {
    if elem.is_scope() {
        let (subject, ctx) = elem.scope_parts()?;

        // The context side shadows the subject.
        if let Some(j) = ctx.labels.iter().position(|l| l == name) {
            let target = ctx.columns[j].clone().with_label(Some(name.clone()));
            let step = pipeline::chain_of([pipeline::column(1), pipeline::column(j)])
                .designate(Signature::new(elem.clone(), target));
            return attach(elem, step);
        }

        let inner = lookup(env, subject, name, &ctx.labels)?;
        let target = inner.target().clone();
        let step = pipeline::chain_of([pipeline::column(0), inner])
            .designate(Signature::new(elem.clone(), target));
        return attach(elem, step);
    }

    let step = lookup(env, elem, name, &[])?;
    attach(elem, step)
}

/// Structural lookup of a name in a tuple shape, producing a pipeline from
/// the tuple vector to the field's block.
fn lookup(
    env: &Environment,
    shape: &Shape,
    name: &Label,
    ctx_labels: &[Label],
) -> Result<Pipeline> {
    let mut stripped = shape;
    loop {
        match stripped {
            Shape::Labeled(_, inner) => stripped = inner,
            _ => break,
        }
    }

    let tuple = match stripped {
        Shape::Tuple(tuple) => tuple,
        _ => return Err(unknown_name(env, name, &[], ctx_labels)),
    };

    let j = tuple
        .labels
        .iter()
        .position(|l| l == name)
        .or_else(|| (0..tuple.columns.len()).find(|&idx| &Label::ordinal(idx) == name))
        .ok_or_else(|| unknown_name(env, name, &tuple.labels, ctx_labels))?;

    let col = tuple.columns[j].clone();
    if col.flow_block().is_ok() {
        // Field columns hold blocks; select and relabel.
        let target = col.with_label(Some(name.clone()));
        Ok(pipeline::column(j).designate(Signature::new(shape.clone(), target)))
    } else {
        // A plain column becomes a regular singleton flow.
        let target = Shape::labeled(name.clone(), Shape::block(col, Cardinality::ONE));
        Ok(
            pipeline::chain_of([pipeline::column(j), pipeline::wrap()])
                .designate(Signature::new(shape.clone(), target)),
        )
    }
}

fn unknown_name(
    env: &Environment,
    name: &Label,
    available: &[Label],
    ctx_labels: &[Label],
) -> PlyexecError {
    let mut msg = format!("Unknown name '{name}'");
    let fields: Vec<_> = available.iter().map(|l| l.to_string()).collect();
    if !fields.is_empty() {
        msg.push_str(&format!(", available fields: {}", fields.join(", ")));
    }
    let mut params: Vec<_> = ctx_labels.iter().map(|l| l.to_string()).collect();
    for p in &env.params {
        let rendered = p.to_string();
        if !params.contains(&rendered) {
            params.push(rendered);
        }
    }
    if !params.is_empty() {
        msg.push_str(&format!(", parameters in scope: {}", params.join(", ")));
    } else if fields.is_empty() {
        msg.push_str(", no fields or parameters in scope");
    }
    PlyexecError::new(msg)
}

/// Assemble an argument query and expose its raw block, projecting away any
/// scope its elements carry.
fn argument_block(
    env: &Environment,
    q: &Query,
    elem: &Shape,
) -> Result<(Pipeline, Shape, Cardinality, Option<Label>)> {
    let x = assemble(env, q, cover(elem)?)?;
    let (x_elem, x_card) = flow_parts(&x)?;
    let label = x.target().label().cloned();
    let mut block = uncover(x);
    let subject = if x_elem.is_scope() {
        let (s, _) = x_elem.scope_parts()?;
        let s = s.clone();
        block = pipeline::chain_of([block, pipeline::with_elements(pipeline::column(0))]);
        s
    } else {
        x_elem
    };
    Ok((block, subject, x_card, label))
}

fn assemble_apply(
    env: &Environment,
    f: &Arc<dyn ScalarFunction>,
    args: &[Query],
    elem: &Shape,
) -> Result<Pipeline> {
    if args.is_empty() {
        return Err(PlyexecError::new(format!(
            "Lifted function '{}' requires at least one argument",
            f.name(),
        )));
    }

    let mut blocks = Vec::with_capacity(args.len());
    let mut types = Vec::with_capacity(args.len());
    let mut cards = Vec::with_capacity(args.len());
    for arg in args {
        let (block, subject, card, _) = argument_block(env, arg, elem)?;

        // An always-empty argument makes the whole application empty.
        if matches!(subject, Shape::Empty) {
            let target = Shape::block(Shape::Empty, Cardinality::OPT);
            let step = pipeline::null_filler()
                .designate(Signature::new(elem.clone(), target));
            return attach(elem, step);
        }

        let ty = value_type_of(&subject).map_err(|_| {
            PlyexecError::new(format!(
                "Cannot apply '{}' to a non-scalar argument of shape {subject:?}",
                f.name(),
            ))
        })?;
        blocks.push(block);
        types.push(ty);
        cards.push(card);
    }

    // Inferring the return type here aborts the assembly eagerly when the
    // function cannot accept the argument tuple.
    let kind = f.return_type(&types)?;
    let out_ty = kind.value_type();

    // A single plural argument with a scalar-returning function receives
    // each block as a native list.
    if args.len() == 1 && cards[0].is_plural() && !matches!(kind, ReturnKind::ListOf(_)) {
        let block = blocks.pop().expect("one argument");
        let (prim, out_card) = match kind {
            ReturnKind::Optional(_) => (pipeline::adapt_missing(), Cardinality::OPT),
            _ => (pipeline::wrap(), Cardinality::ONE),
        };
        let target = Shape::block(Shape::Value(out_ty), out_card);
        let step = pipeline::chain_of([
            block,
            pipeline::block_lift(BlockFunc::Lifted(f.clone()), None),
            prim,
        ])
        .designate(Signature::new(elem.clone(), target));
        return attach(elem, step);
    }

    let (cover_prim, kind_card) = match kind {
        ReturnKind::Value(_) => (pipeline::wrap(), Cardinality::ONE),
        ReturnKind::Optional(_) => (pipeline::adapt_missing(), Cardinality::OPT),
        ReturnKind::ListOf(_) => (pipeline::adapt_vector(), Cardinality::ANY),
    };
    let mut card = kind_card;
    for c in &cards {
        card = card | *c;
    }

    let step = if args.len() == 1 {
        let block = blocks.pop().expect("one argument");
        pipeline::chain_of([
            block,
            pipeline::with_elements(pipeline::chain_of([
                pipeline::lift(f.clone()),
                cover_prim,
            ])),
            pipeline::flatten(),
        ])
    } else {
        pipeline::chain_of([
            pipeline::tuple_of(Vec::new(), blocks),
            pipeline::distribute_all(),
            pipeline::with_elements(pipeline::chain_of([
                pipeline::tuple_lift(f.clone()),
                cover_prim,
            ])),
            pipeline::flatten(),
        ])
    };

    let target = Shape::block(Shape::Value(out_ty), card);
    let step = step.designate(Signature::new(elem.clone(), target));
    attach(elem, step)
}

fn assemble_record(env: &Environment, fields: &[Query], elem: &Shape) -> Result<Pipeline> {
    if fields.is_empty() {
        return Err(PlyexecError::new("Record requires at least one field"));
    }

    let mut parts = Vec::with_capacity(fields.len());
    let mut labels = Vec::with_capacity(fields.len());
    let mut column_shapes = Vec::with_capacity(fields.len());
    for (idx, field) in fields.iter().enumerate() {
        let (block, subject, card, label) = argument_block(env, field, elem)?;
        labels.push(label.unwrap_or_else(|| Label::ordinal(idx)));
        column_shapes.push(Shape::block(subject, card));
        parts.push(block);
    }

    // Duplicate labels are demoted to ordinal names.
    let originals = labels.clone();
    for (idx, label) in labels.iter_mut().enumerate() {
        if originals.iter().filter(|l| *l == label).count() > 1 {
            *label = Label::ordinal(idx);
        }
    }

    let tuple_shape = Shape::tuple(labels.clone(), column_shapes);
    let target = Shape::block(tuple_shape, Cardinality::ONE);
    let step = pipeline::chain_of([pipeline::tuple_of(labels, parts), pipeline::wrap()])
        .designate(Signature::new(elem.clone(), target));
    attach(elem, step)
}

fn assemble_filter(env: &Environment, q: &Query, elem: &Shape) -> Result<Pipeline> {
    let (block, subject, _, _) = argument_block(env, q, elem)?;
    match value_type_of(&subject) {
        Ok(ValueType::Bool) => (),
        _ => {
            return Err(PlyexecError::new(format!(
                "Filter expected a boolean predicate, got {subject:?}"
            )))
        }
    }

    let pred = pipeline::chain_of([block, pipeline::block_any()]);
    let target = Shape::flow(Shape::block(elem.clone(), Cardinality::OPT));
    Ok(pipeline::chain_of([
        pipeline::tuple_of(Vec::new(), vec![pipeline::pass(), pred]),
        pipeline::sieve(),
    ])
    .designate(Signature::new(elem.clone(), target)))
}

fn assemble_keep(
    env: &Environment,
    bindings: &[(Label, Query)],
    elem: &Shape,
) -> Result<Pipeline> {
    if bindings.is_empty() {
        return Err(PlyexecError::new("Keep requires at least one binding"));
    }

    let mut current = keep_one(env, &bindings[0], elem)?;
    for binding in &bindings[1..] {
        let (cur_elem, _) = flow_parts(&current)?;
        let next = keep_one(env, binding, &cur_elem)?;
        current = compose(current, next)?;
    }
    Ok(current)
}

fn keep_one(
    env: &Environment,
    (name, q): &(Label, Query),
    elem: &Shape,
) -> Result<Pipeline> {
    let (block, subject, card, _) = argument_block(env, q, elem)?;
    let binding_shape = Shape::block(subject, card);

    let (subject_part, subject_shape, old_labels, old_columns) = if elem.is_scope() {
        let (s, ctx) = elem.scope_parts()?;
        (
            pipeline::column(0),
            s.clone(),
            ctx.labels.clone(),
            ctx.columns.clone(),
        )
    } else {
        (pipeline::pass(), elem.clone(), Vec::new(), Vec::new())
    };

    let mut ctx_labels = old_labels;
    let mut ctx_shapes = old_columns;
    let mut ctx_parts: Vec<Pipeline> = (0..ctx_shapes.len())
        .map(|idx| pipeline::chain_of([pipeline::column(1), pipeline::column(idx)]))
        .collect();

    // A rebinding replaces the prior entry in place.
    match ctx_labels.iter().position(|l| l == name) {
        Some(j) => {
            ctx_parts[j] = block;
            ctx_shapes[j] = binding_shape;
        }
        None => {
            ctx_labels.push(name.clone());
            ctx_parts.push(block);
            ctx_shapes.push(binding_shape);
        }
    }

    let ctx_shape = TupleShape {
        labels: ctx_labels.clone(),
        columns: ctx_shapes,
    };
    let scoped = Shape::scope(Shape::tuple(
        Vec::new(),
        vec![subject_shape, Shape::Tuple(ctx_shape)],
    ));
    let target = Shape::flow(Shape::block(scoped, Cardinality::ONE));

    Ok(pipeline::chain_of([
        pipeline::tuple_of(
            Vec::new(),
            vec![subject_part, pipeline::tuple_of(ctx_labels, ctx_parts)],
        ),
        pipeline::wrap(),
    ])
    .designate(Signature::new(elem.clone(), target)))
}

/// `Given` runs its body under the extended scope and exposes only the
/// body's subject; the outer context is re-attached from the input, so
/// bindings introduced here stay local.
fn assemble_given(
    env: &Environment,
    bindings: &[(Label, Query)],
    body: &Query,
    elem: &Shape,
) -> Result<Pipeline> {
    let keep = assemble_keep(env, bindings, elem)?;
    let p = assemble(env, body, keep)?;

    let (p_elem, p_card) = flow_parts(&p)?;
    let label = p.target().label().cloned();
    let mut raw = uncover(p);
    let subject = if p_elem.is_scope() {
        let (s, _) = p_elem.scope_parts()?;
        let s = s.clone();
        raw = pipeline::chain_of([raw, pipeline::with_elements(pipeline::column(0))]);
        s
    } else {
        p_elem
    };

    let target = Shape::block(subject, p_card).with_label(label);
    let step = raw.designate(Signature::new(elem.clone(), target));
    attach(elem, step)
}
