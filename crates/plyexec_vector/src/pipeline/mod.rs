pub mod eval;
pub mod optimize;

use crate::cardinality::Cardinality;
use crate::functions::aggregate::BlockAggregate;
use crate::functions::ScalarFunction;
use crate::label::Label;
use crate::scalar::ScalarValue;
use crate::shape::Shape;
use crate::signature::Signature;
use crate::vector::Vector;
use plyexec_error::Result;
use std::sync::Arc;

/// Column selector for `column` pipelines.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnRef {
    Index(usize),
    Name(Label),
}

/// Function applied per block by `block_lift`.
#[derive(Debug, Clone)]
pub enum BlockFunc {
    Agg(BlockAggregate),
    /// A lifted function receiving each block as a native list.
    Lifted(Arc<dyn ScalarFunction>),
}

/// Pipeline operators.
///
/// Every operator is a vectorized transform over a columnar vector. Static
/// arguments live on the variant; the input vector is supplied at execution.
#[derive(Debug, Clone)]
pub enum Op {
    /// Identity on the vector.
    Pass,
    /// Sequential composition.
    Chain(Vec<Pipeline>),
    /// Elementwise apply of a scalar function.
    Lift(Arc<dyn ScalarFunction>),
    /// Apply a scalar function to the row tuples of a tuple vector.
    TupleLift(Arc<dyn ScalarFunction>),
    /// Apply a function to each block of a block vector. Empty blocks emit
    /// `default` when given.
    BlockLift {
        func: BlockFunc,
        default: Option<ScalarValue>,
    },
    /// Constant vector, same length as the input.
    Filler(ScalarValue),
    /// One empty block per input row.
    NullFiller,
    /// Repeat a fixed block as each row's block.
    BlockFiller {
        elements: Arc<Vector>,
        card: Cardinality,
    },
    /// Scalar vector with missings to a block vector with empty blocks where
    /// missing.
    AdaptMissing,
    /// Vector of native lists to a block vector.
    AdaptVector,
    /// Vector of native tuples to a tuple vector.
    AdaptTuple,
    /// Plain vector to a block vector of singleton blocks.
    Wrap,
    /// Apply a pipeline to the element vector, preserving offsets.
    WithElements(Box<Pipeline>),
    /// Apply a pipeline to one column, preserving the others.
    WithColumn(usize, Box<Pipeline>),
    /// Collapse a nested block vector by composing offsets.
    Flatten,
    /// Apply each part to the input vector and assemble the outputs as
    /// columns.
    TupleOf {
        labels: Vec<Label>,
        parts: Vec<Pipeline>,
    },
    /// Select a column of a tuple vector.
    Column(ColumnRef),
    /// Turn a tuple vector whose column `j` is a block vector into a block
    /// vector of tuples, replicating the other columns along the blocks.
    Distribute(usize),
    /// Distribute every column at once, producing the per-row cartesian
    /// assembly of the column blocks.
    DistributeAll,
    /// Block sizes as integers.
    BlockLength,
    /// Per-block disjunction of a block vector of booleans.
    BlockAny,
    /// Per-block conjunction of a block vector of booleans.
    BlockAll,
    /// Two-column tuple of values and booleans to an optional block vector
    /// keeping values where the predicate holds.
    Sieve,
    /// Per-block take/drop. A static count when `count` is Some, otherwise
    /// the count comes per row from the second column of a two-column tuple
    /// (missing leaves the block unchanged). `rev` drops instead of taking.
    Slice { count: Option<i64>, rev: bool },
}

/// A signature-annotated vectorized transform, the execution unit of the
/// engine.
///
/// Constructors produce the unconstrained signature; the assembler
/// designates concrete ones while threading shapes through a query.
#[derive(Debug, Clone)]
pub struct Pipeline {
    op: Op,
    sig: Signature,
}

impl Pipeline {
    fn from_op(op: Op) -> Pipeline {
        Pipeline {
            op,
            sig: Signature::unconstrained(),
        }
    }

    pub(crate) fn from_parts(op: Op, sig: Signature) -> Pipeline {
        Pipeline { op, sig }
    }

    pub(crate) fn into_parts(self) -> (Op, Signature) {
        (self.op, self.sig)
    }

    pub fn designate(mut self, sig: Signature) -> Pipeline {
        self.sig = sig;
        self
    }

    pub fn signature(&self) -> &Signature {
        &self.sig
    }

    pub fn source(&self) -> &Shape {
        &self.sig.source
    }

    pub fn target(&self) -> &Shape {
        &self.sig.target
    }

    pub fn op(&self) -> &Op {
        &self.op
    }

    pub fn is_pass(&self) -> bool {
        matches!(self.op, Op::Pass)
    }

    /// Execute the pipeline over an input vector.
    pub fn evaluate(&self, input: &Vector) -> Result<Vector> {
        eval::eval(&self.op, input)
    }
}

pub fn pass() -> Pipeline {
    Pipeline::from_op(Op::Pass)
}

/// Sequential composition: source of the first, target of the last.
pub fn chain_of(ps: impl IntoIterator<Item = Pipeline>) -> Pipeline {
    let ps: Vec<_> = ps.into_iter().collect();
    match ps.len() {
        0 => pass(),
        1 => ps.into_iter().next().expect("one element"),
        _ => {
            let sig = Signature::new(
                ps.first().expect("nonempty").source().clone(),
                ps.last().expect("nonempty").target().clone(),
            );
            Pipeline::from_op(Op::Chain(ps)).designate(sig)
        }
    }
}

pub fn lift(f: Arc<dyn ScalarFunction>) -> Pipeline {
    Pipeline::from_op(Op::Lift(f))
}

pub fn tuple_lift(f: Arc<dyn ScalarFunction>) -> Pipeline {
    Pipeline::from_op(Op::TupleLift(f))
}

pub fn block_lift(func: BlockFunc, default: Option<ScalarValue>) -> Pipeline {
    Pipeline::from_op(Op::BlockLift { func, default })
}

pub fn filler(value: ScalarValue) -> Pipeline {
    Pipeline::from_op(Op::Filler(value))
}

pub fn null_filler() -> Pipeline {
    Pipeline::from_op(Op::NullFiller)
}

pub fn block_filler(elements: impl Into<Arc<Vector>>, card: Cardinality) -> Pipeline {
    Pipeline::from_op(Op::BlockFiller {
        elements: elements.into(),
        card,
    })
}

pub fn adapt_missing() -> Pipeline {
    Pipeline::from_op(Op::AdaptMissing)
}

pub fn adapt_vector() -> Pipeline {
    Pipeline::from_op(Op::AdaptVector)
}

pub fn adapt_tuple() -> Pipeline {
    Pipeline::from_op(Op::AdaptTuple)
}

pub fn wrap() -> Pipeline {
    Pipeline::from_op(Op::Wrap)
}

pub fn with_elements(p: Pipeline) -> Pipeline {
    Pipeline::from_op(Op::WithElements(Box::new(p)))
}

pub fn with_column(j: usize, p: Pipeline) -> Pipeline {
    Pipeline::from_op(Op::WithColumn(j, Box::new(p)))
}

pub fn flatten() -> Pipeline {
    Pipeline::from_op(Op::Flatten)
}

pub fn tuple_of(labels: Vec<Label>, parts: Vec<Pipeline>) -> Pipeline {
    Pipeline::from_op(Op::TupleOf { labels, parts })
}

pub fn column(idx: usize) -> Pipeline {
    Pipeline::from_op(Op::Column(ColumnRef::Index(idx)))
}

pub fn column_by_name(name: Label) -> Pipeline {
    Pipeline::from_op(Op::Column(ColumnRef::Name(name)))
}

pub fn distribute(j: usize) -> Pipeline {
    Pipeline::from_op(Op::Distribute(j))
}

pub fn distribute_all() -> Pipeline {
    Pipeline::from_op(Op::DistributeAll)
}

pub fn block_length() -> Pipeline {
    Pipeline::from_op(Op::BlockLength)
}

pub fn block_any() -> Pipeline {
    Pipeline::from_op(Op::BlockAny)
}

pub fn block_all() -> Pipeline {
    Pipeline::from_op(Op::BlockAll)
}

pub fn sieve() -> Pipeline {
    Pipeline::from_op(Op::Sieve)
}

/// Per-block slice with a static count.
pub fn slice(count: i64, rev: bool) -> Pipeline {
    Pipeline::from_op(Op::Slice {
        count: Some(count),
        rev,
    })
}

/// Per-block slice with the count supplied per row.
pub fn slice_by(rev: bool) -> Pipeline {
    Pipeline::from_op(Op::Slice { count: None, rev })
}
