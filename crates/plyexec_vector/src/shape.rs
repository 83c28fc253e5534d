use crate::cardinality::Cardinality;
use crate::datatype::ValueType;
use crate::label::Label;
use plyexec_error::{PlyexecError, Result};

/// Structural type describing what a vector contains, independent of its
/// storage.
///
/// `Labeled`, `Flow` and `Scope` are decorators: they wrap an inner shape
/// without changing its runtime layout. `Any` and `Empty` are the lattice
/// top and bottom so that `bound`/`ibound` are total.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Any,
    Empty,
    Value(ValueType),
    Block(Box<BlockShape>),
    Tuple(TupleShape),
    /// Carries a symbol attributed to the surrounding container on output.
    Labeled(Label, Box<Shape>),
    /// Marks a block as the current flow.
    Flow(Box<Shape>),
    /// Marks a two-column tuple whose second column holds named parameters.
    Scope(Box<Shape>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlockShape {
    pub elements: Shape,
    pub card: Cardinality,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TupleShape {
    pub labels: Vec<Label>,
    pub columns: Vec<Shape>,
}

impl Shape {
    pub fn block(elements: Shape, card: Cardinality) -> Shape {
        Shape::Block(Box::new(BlockShape { elements, card }))
    }

    pub fn tuple(labels: Vec<Label>, columns: Vec<Shape>) -> Shape {
        Shape::Tuple(TupleShape { labels, columns })
    }

    pub fn labeled(label: Label, inner: Shape) -> Shape {
        Shape::Labeled(label, Box::new(inner))
    }

    pub fn flow(inner: Shape) -> Shape {
        Shape::Flow(Box::new(inner))
    }

    pub fn scope(inner: Shape) -> Shape {
        Shape::Scope(Box::new(inner))
    }

    /// Output label of the shape, if any. Looks through the flow decorator.
    pub fn label(&self) -> Option<&Label> {
        match self {
            Shape::Flow(inner) => inner.label(),
            Shape::Labeled(label, _) => Some(label),
            _ => None,
        }
    }

    /// Rewrite the label decorator, stripping it when `label` is None.
    pub fn with_label(self, label: Option<Label>) -> Shape {
        match self {
            Shape::Flow(inner) => Shape::flow(inner.with_label(label)),
            Shape::Labeled(_, inner) => match label {
                Some(label) => Shape::Labeled(label, inner),
                None => *inner,
            },
            other => match label {
                Some(label) => Shape::labeled(label, other),
                None => other,
            },
        }
    }

    pub fn is_flow(&self) -> bool {
        matches!(self, Shape::Flow(_))
    }

    /// Remove the flow decorator, exposing the underlying (possibly labeled)
    /// block shape.
    pub fn unflow(self) -> Shape {
        match self {
            Shape::Flow(inner) => *inner,
            other => other,
        }
    }

    /// Element shape and cardinality of the block underneath flow and label
    /// decorators.
    pub fn flow_block(&self) -> Result<(&Shape, Cardinality)> {
        let mut shape = self;
        loop {
            match shape {
                Shape::Flow(inner) => shape = inner,
                Shape::Labeled(_, inner) => shape = inner,
                Shape::Block(block) => return Ok((&block.elements, block.card)),
                other => {
                    return Err(PlyexecError::new(format!(
                        "Expected a block shape, got {other:?}"
                    )))
                }
            }
        }
    }

    pub fn is_scope(&self) -> bool {
        matches!(self, Shape::Scope(_))
    }

    /// Subject and context shapes of a scope-decorated tuple.
    pub fn scope_parts(&self) -> Result<(&Shape, &TupleShape)> {
        let inner = match self {
            Shape::Scope(inner) => inner.as_ref(),
            other => {
                return Err(PlyexecError::new(format!(
                    "Expected a scope shape, got {other:?}"
                )))
            }
        };
        match inner {
            Shape::Tuple(tuple) if tuple.columns.len() == 2 => {
                let ctx = match &tuple.columns[1] {
                    Shape::Tuple(ctx) => ctx,
                    other => {
                        return Err(PlyexecError::new(format!(
                            "Expected a tuple context in scope, got {other:?}"
                        )))
                    }
                };
                Ok((&tuple.columns[0], ctx))
            }
            other => Err(PlyexecError::new(format!(
                "Expected a two-column tuple in scope, got {other:?}"
            ))),
        }
    }

    /// `self` can be substituted wherever `other` is expected.
    ///
    /// Decorators do not change runtime layout and are transparent here;
    /// cardinalities compare by the lattice order.
    pub fn fits(&self, other: &Shape) -> bool {
        let a = strip(self);
        let b = strip(other);
        match (a, b) {
            (_, Shape::Any) => true,
            (Shape::Empty, _) => true,
            (Shape::Any, _) => false,
            (_, Shape::Empty) => false,
            (Shape::Value(a), Shape::Value(b)) => a == b,
            (Shape::Block(a), Shape::Block(b)) => {
                a.card.fits(b.card) && a.elements.fits(&b.elements)
            }
            (Shape::Tuple(a), Shape::Tuple(b)) => {
                a.columns.len() == b.columns.len()
                    && a.columns
                        .iter()
                        .zip(b.columns.iter())
                        .all(|(a, b)| a.fits(b))
            }
            _ => false,
        }
    }

    /// Least upper bound.
    pub fn bound(&self, other: &Shape) -> Shape {
        combine(self, other, &|a, b| match (a, b) {
            (Shape::Empty, other) | (other, Shape::Empty) => other.clone(),
            (Shape::Any, _) | (_, Shape::Any) => Shape::Any,
            (Shape::Value(a), Shape::Value(b)) if a == b => Shape::Value(*a),
            (Shape::Block(a), Shape::Block(b)) => {
                Shape::block(a.elements.bound(&b.elements), a.card | b.card)
            }
            (Shape::Tuple(a), Shape::Tuple(b)) if a.columns.len() == b.columns.len() => {
                let labels = if a.labels == b.labels {
                    a.labels.clone()
                } else {
                    Vec::new()
                };
                let columns = a
                    .columns
                    .iter()
                    .zip(b.columns.iter())
                    .map(|(a, b)| a.bound(b))
                    .collect();
                Shape::tuple(labels, columns)
            }
            _ => Shape::Any,
        })
    }

    /// Greatest lower bound.
    pub fn ibound(&self, other: &Shape) -> Shape {
        combine(self, other, &|a, b| match (a, b) {
            (Shape::Any, other) | (other, Shape::Any) => other.clone(),
            (Shape::Empty, _) | (_, Shape::Empty) => Shape::Empty,
            (Shape::Value(a), Shape::Value(b)) if a == b => Shape::Value(*a),
            (Shape::Block(a), Shape::Block(b)) => {
                Shape::block(a.elements.ibound(&b.elements), a.card & b.card)
            }
            (Shape::Tuple(a), Shape::Tuple(b)) if a.columns.len() == b.columns.len() => {
                let labels = if a.labels == b.labels {
                    a.labels.clone()
                } else {
                    Vec::new()
                };
                let columns = a
                    .columns
                    .iter()
                    .zip(b.columns.iter())
                    .map(|(a, b)| a.ibound(b))
                    .collect();
                Shape::tuple(labels, columns)
            }
            _ => Shape::Empty,
        })
    }
}

/// Strip decorators from the top of a shape.
fn strip(shape: &Shape) -> &Shape {
    let mut shape = shape;
    loop {
        match shape {
            Shape::Labeled(_, inner) | Shape::Flow(inner) | Shape::Scope(inner) => {
                shape = inner;
            }
            other => return other,
        }
    }
}

/// Combine two shapes with a core lattice operation, re-applying the
/// decorators both sides agree on.
fn combine(a: &Shape, b: &Shape, core: &dyn Fn(&Shape, &Shape) -> Shape) -> Shape {
    match (a, b) {
        (Shape::Labeled(la, ia), Shape::Labeled(lb, ib)) => {
            let inner = combine(ia, ib, core);
            if la == lb {
                Shape::labeled(la.clone(), inner)
            } else {
                inner
            }
        }
        (Shape::Labeled(_, ia), b) => combine(ia, b, core),
        (a, Shape::Labeled(_, ib)) => combine(a, ib, core),
        (Shape::Flow(ia), Shape::Flow(ib)) => Shape::flow(combine(ia, ib, core)),
        (Shape::Flow(ia), b) => combine(ia, b, core),
        (a, Shape::Flow(ib)) => combine(a, ib, core),
        (Shape::Scope(ia), Shape::Scope(ib)) => Shape::scope(combine(ia, ib, core)),
        (Shape::Scope(ia), b) => combine(ia, b, core),
        (a, Shape::Scope(ib)) => combine(a, ib, core),
        (a, b) => core(a, b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int_block(card: Cardinality) -> Shape {
        Shape::block(Shape::Value(ValueType::Int64), card)
    }

    #[test]
    fn fits_widens_cardinality() {
        assert!(int_block(Cardinality::ONE).fits(&int_block(Cardinality::ANY)));
        assert!(!int_block(Cardinality::ANY).fits(&int_block(Cardinality::ONE)));
    }

    #[test]
    fn fits_ignores_decorators() {
        let plain = int_block(Cardinality::OPT);
        let decorated = Shape::flow(Shape::labeled(Label::new("x"), plain.clone()));
        assert!(decorated.fits(&plain));
        assert!(plain.fits(&decorated));
    }

    #[test]
    fn bound_merges_blocks() {
        let a = int_block(Cardinality::ONE);
        let b = int_block(Cardinality::OPT);
        assert_eq!(int_block(Cardinality::OPT), a.bound(&b));
    }

    #[test]
    fn bound_of_distinct_values_is_any() {
        let a = Shape::Value(ValueType::Int64);
        let b = Shape::Value(ValueType::Utf8);
        assert_eq!(Shape::Any, a.bound(&b));
        assert_eq!(Shape::Empty, a.ibound(&b));
    }

    #[test]
    fn bound_keeps_agreeing_labels() {
        let a = Shape::labeled(Label::new("x"), int_block(Cardinality::ONE));
        let b = Shape::labeled(Label::new("x"), int_block(Cardinality::PLUS));
        let c = Shape::labeled(Label::new("y"), int_block(Cardinality::PLUS));

        assert_eq!(
            Shape::labeled(Label::new("x"), int_block(Cardinality::PLUS)),
            a.bound(&b)
        );
        assert_eq!(int_block(Cardinality::PLUS), a.bound(&c));
    }

    #[test]
    fn relabel() {
        let shape = Shape::flow(Shape::labeled(Label::new("x"), int_block(Cardinality::ONE)));
        assert_eq!(Some(&Label::new("x")), shape.label());

        let relabeled = shape.clone().with_label(Some(Label::new("y")));
        assert_eq!(Some(&Label::new("y")), relabeled.label());

        let stripped = shape.with_label(None);
        assert_eq!(None, stripped.label());
        assert!(stripped.is_flow());
    }

    #[test]
    fn flow_block_sees_through_decorators() {
        let shape = Shape::flow(Shape::labeled(Label::new("x"), int_block(Cardinality::PLUS)));
        let (elements, card) = shape.flow_block().unwrap();
        assert_eq!(&Shape::Value(ValueType::Int64), elements);
        assert_eq!(Cardinality::PLUS, card);
    }
}
