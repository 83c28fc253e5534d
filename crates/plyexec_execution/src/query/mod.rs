use crate::knot::DataKnot;
use plyexec_vector::functions::{arith, boolean, comparison, ScalarFunction};
use plyexec_vector::label::Label;
use plyexec_vector::scalar::ScalarValue;
use std::ops;
use std::sync::Arc;

/// Aggregate combinator kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggKind {
    Count,
    Sum,
    Min,
    Max,
    Exists,
    Any,
    All,
}

impl AggKind {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            Self::Count => "Count",
            Self::Sum => "Sum",
            Self::Min => "Min",
            Self::Max => "Max",
            Self::Exists => "Exists",
            Self::Any => "Any",
            Self::All => "All",
        }
    }
}

/// Count argument of `Take`/`Drop`: a static count or a query evaluated
/// against the source of the current flow.
#[derive(Debug, Clone)]
pub enum TakeArg {
    Count(i64),
    Query(Box<Query>),
}

/// A user-level query expression.
///
/// Queries are assembled into pipelines by the assembler; nothing executes
/// until a query is run against a knot.
#[derive(Debug, Clone)]
pub enum Query {
    /// Identity on the current flow.
    It,
    /// Structural lookup of a name in the current shape.
    Get(Label),
    /// Composition, left to right.
    Chain(Vec<Query>),
    /// A constant scalar (`Missing` produces an empty optional flow).
    Const(ScalarValue),
    /// A constant collection.
    ConstList(Vec<ScalarValue>),
    /// A constant knot.
    Knot(DataKnot),
    /// A scalar function lifted over the given argument queries.
    Apply(Arc<dyn ScalarFunction>, Vec<Query>),
    /// Bundle field queries into a record.
    Record(Vec<Query>),
    /// Rewrite the output label; None strips it.
    AsLabel(Option<Label>),
    /// Display-only alias, semantically the inner query.
    Tag(Label, Box<Query>),
    /// Assemble the inner query per element of the current flow.
    Each(Box<Query>),
    /// Keep elements where the predicate holds.
    Filter(Box<Query>),
    /// Per-block take (`rev` = false) or drop (`rev` = true).
    Take(TakeArg, bool),
    /// Aggregate; None is the `>>`-suffix form aggregating the current flow.
    Agg(AggKind, Option<Box<Query>>),
    /// Extend the scope with named bindings.
    Keep(Vec<(Label, Query)>),
    /// Evaluate the body with extra bindings, restoring the scope after.
    Given(Vec<(Label, Query)>, Box<Query>),
}

impl Query {
    pub fn it() -> Query {
        Query::It
    }

    pub fn get(name: impl Into<Label>) -> Query {
        Query::Get(name.into())
    }

    /// Navigation through nested fields: `path(["a", "b"])` addresses
    /// `It.a.b`.
    pub fn path<I, S>(names: I) -> Query
    where
        I: IntoIterator<Item = S>,
        S: Into<Label>,
    {
        Query::Chain(names.into_iter().map(|n| Query::Get(n.into())).collect())
    }

    pub fn lift(value: impl Into<ScalarValue>) -> Query {
        Query::Const(value.into())
    }

    pub fn lift_list<I, V>(values: I) -> Query
    where
        I: IntoIterator<Item = V>,
        V: Into<ScalarValue>,
    {
        Query::ConstList(values.into_iter().map(Into::into).collect())
    }

    pub fn knot(knot: DataKnot) -> Query {
        Query::Knot(knot)
    }

    /// Lift a scalar function over argument queries; the Rust rendition of
    /// broadcasting syntax.
    pub fn apply<F>(f: F, args: Vec<Query>) -> Query
    where
        F: ScalarFunction + 'static,
    {
        Query::Apply(Arc::new(f), args)
    }

    pub fn record(fields: impl IntoIterator<Item = Query>) -> Query {
        Query::Record(fields.into_iter().collect())
    }

    pub fn each(q: Query) -> Query {
        Query::Each(Box::new(q))
    }

    pub fn filter(q: Query) -> Query {
        Query::Filter(Box::new(q))
    }

    pub fn take(n: i64) -> Query {
        Query::Take(TakeArg::Count(n), false)
    }

    pub fn drop(n: i64) -> Query {
        Query::Take(TakeArg::Count(n), true)
    }

    pub fn take_by(n: Query) -> Query {
        Query::Take(TakeArg::Query(Box::new(n)), false)
    }

    pub fn drop_by(n: Query) -> Query {
        Query::Take(TakeArg::Query(Box::new(n)), true)
    }

    /// First element of the flow produced by `q`.
    pub fn first(q: Query) -> Query {
        q >> Query::take(1)
    }

    /// Last element of the flow produced by `q`.
    pub fn last(q: Query) -> Query {
        q >> Query::drop(-1)
    }

    pub fn count(q: Query) -> Query {
        Query::Agg(AggKind::Count, Some(Box::new(q)))
    }

    pub fn sum(q: Query) -> Query {
        Query::Agg(AggKind::Sum, Some(Box::new(q)))
    }

    pub fn min(q: Query) -> Query {
        Query::Agg(AggKind::Min, Some(Box::new(q)))
    }

    pub fn max(q: Query) -> Query {
        Query::Agg(AggKind::Max, Some(Box::new(q)))
    }

    pub fn exists(q: Query) -> Query {
        Query::Agg(AggKind::Exists, Some(Box::new(q)))
    }

    pub fn any_of(q: Query) -> Query {
        Query::Agg(AggKind::Any, Some(Box::new(q)))
    }

    pub fn all_of(q: Query) -> Query {
        Query::Agg(AggKind::All, Some(Box::new(q)))
    }

    /// Suffix aggregate forms: `X >> Count` spells `x.then_count()`.
    pub fn then_count(self) -> Query {
        self >> Query::Agg(AggKind::Count, None)
    }

    pub fn then_sum(self) -> Query {
        self >> Query::Agg(AggKind::Sum, None)
    }

    pub fn then_min(self) -> Query {
        self >> Query::Agg(AggKind::Min, None)
    }

    pub fn then_max(self) -> Query {
        self >> Query::Agg(AggKind::Max, None)
    }

    pub fn then_exists(self) -> Query {
        self >> Query::Agg(AggKind::Exists, None)
    }

    pub fn then_any(self) -> Query {
        self >> Query::Agg(AggKind::Any, None)
    }

    pub fn then_all(self) -> Query {
        self >> Query::Agg(AggKind::All, None)
    }

    pub fn keep<I, S>(bindings: I) -> Query
    where
        I: IntoIterator<Item = (S, Query)>,
        S: Into<Label>,
    {
        Query::Keep(bindings.into_iter().map(|(n, q)| (n.into(), q)).collect())
    }

    pub fn given<I, S>(bindings: I, body: Query) -> Query
    where
        I: IntoIterator<Item = (S, Query)>,
        S: Into<Label>,
    {
        Query::Given(
            bindings.into_iter().map(|(n, q)| (n.into(), q)).collect(),
            Box::new(body),
        )
    }

    /// Bind an output label; the Rust rendition of `:name => query`.
    pub fn label(self, name: impl Into<Label>) -> Query {
        self >> Query::AsLabel(Some(name.into()))
    }

    pub fn unlabeled(self) -> Query {
        self >> Query::AsLabel(None)
    }

    pub fn tag(name: impl Into<Label>, q: Query) -> Query {
        Query::Tag(name.into(), Box::new(q))
    }

    pub fn eq(self, other: impl Into<Query>) -> Query {
        Query::apply(comparison::Eq, vec![self, other.into()])
    }

    pub fn ne(self, other: impl Into<Query>) -> Query {
        Query::apply(comparison::NotEq, vec![self, other.into()])
    }

    pub fn lt(self, other: impl Into<Query>) -> Query {
        Query::apply(comparison::Lt, vec![self, other.into()])
    }

    pub fn le(self, other: impl Into<Query>) -> Query {
        Query::apply(comparison::LtEq, vec![self, other.into()])
    }

    pub fn gt(self, other: impl Into<Query>) -> Query {
        Query::apply(comparison::Gt, vec![self, other.into()])
    }

    pub fn ge(self, other: impl Into<Query>) -> Query {
        Query::apply(comparison::GtEq, vec![self, other.into()])
    }

    pub fn and(self, other: impl Into<Query>) -> Query {
        Query::apply(boolean::And, vec![self, other.into()])
    }

    pub fn or(self, other: impl Into<Query>) -> Query {
        Query::apply(boolean::Or, vec![self, other.into()])
    }

    pub fn not(self) -> Query {
        Query::apply(boolean::Not, vec![self])
    }
}

/// Composition: `a >> b`.
impl ops::Shr for Query {
    type Output = Query;

    fn shr(self, rhs: Query) -> Query {
        let mut parts = match self {
            Query::Chain(parts) => parts,
            other => vec![other],
        };
        match rhs {
            Query::Chain(rest) => parts.extend(rest),
            other => parts.push(other),
        }
        Query::Chain(parts)
    }
}

impl ops::Add for Query {
    type Output = Query;

    fn add(self, rhs: Query) -> Query {
        Query::apply(arith::Add, vec![self, rhs])
    }
}

impl ops::Sub for Query {
    type Output = Query;

    fn sub(self, rhs: Query) -> Query {
        Query::apply(arith::Sub, vec![self, rhs])
    }
}

impl ops::Mul for Query {
    type Output = Query;

    fn mul(self, rhs: Query) -> Query {
        Query::apply(arith::Mul, vec![self, rhs])
    }
}

impl ops::Neg for Query {
    type Output = Query;

    fn neg(self) -> Query {
        Query::apply(arith::Neg, vec![self])
    }
}

macro_rules! query_from_scalar {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Query {
                fn from(value: $ty) -> Self {
                    Query::Const(value.into())
                }
            }
        )*
    };
}

query_from_scalar!(bool, i32, i64, f64, &str, String);

impl From<DataKnot> for Query {
    fn from(value: DataKnot) -> Self {
        Query::Knot(value)
    }
}
