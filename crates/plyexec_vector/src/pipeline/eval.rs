use super::{BlockFunc, ColumnRef, Op};
use crate::cardinality::Cardinality;
use crate::scalar::ScalarValue;
use crate::vector::{BlockVector, Offsets, ScalarVector, TupleVector, Vector};
use plyexec_error::{PlyexecError, Result};
use std::sync::Arc;

/// Execute a pipeline operator over an input vector.
///
/// Operators never mutate the input; outputs are fresh vectors that may
/// share element storage with the input through reference counting.
pub(crate) fn eval(op: &Op, input: &Vector) -> Result<Vector> {
    match op {
        Op::Pass => Ok(input.clone()),
        Op::Chain(ps) => {
            let mut current = input.clone();
            for p in ps {
                current = eval(p.op(), &current)?;
            }
            Ok(current)
        }
        Op::Lift(f) => {
            let out = f.execute(&[input])?;
            check_length_conservation(f.name(), input.len(), out.len())?;
            Ok(out)
        }
        Op::TupleLift(f) => {
            let tuple = as_tuple(input)?;
            let cols: Vec<&Vector> = tuple.columns().iter().map(|c| c.as_ref()).collect();
            let out = f.execute(&cols)?;
            check_length_conservation(f.name(), tuple.len(), out.len())?;
            Ok(out)
        }
        Op::BlockLift { func, default } => eval_block_lift(func, default.as_ref(), input),
        Op::Filler(value) => Ok(value.as_vector(input.len())),
        Op::NullFiller => Ok(Vector::Block(BlockVector::empty_with_n_rows(input.len()))),
        Op::BlockFiller { elements, card } => eval_block_filler(elements, *card, input),
        Op::AdaptMissing => eval_adapt_missing(input),
        Op::AdaptVector => eval_adapt_vector(input),
        Op::AdaptTuple => eval_adapt_tuple(input),
        Op::Wrap => Ok(Vector::Block(BlockVector::wrapping(input.clone()))),
        Op::WithElements(p) => {
            let block = as_block(input)?;
            let out = p.evaluate(block.elements())?;
            if out.len() != block.elements().len() {
                return Err(PlyexecError::new(format!(
                    "Element pipeline changed length from {} to {}",
                    block.elements().len(),
                    out.len(),
                )));
            }
            Ok(Vector::Block(BlockVector::try_new(
                block.offsets().clone(),
                out,
                block.card(),
            )?))
        }
        Op::WithColumn(j, p) => {
            let tuple = as_tuple(input)?;
            let col = tuple.column(*j)?;
            let out = p.evaluate(col)?;
            Ok(Vector::Tuple(tuple.with_column(*j, out)?))
        }
        Op::Flatten => {
            let outer = as_block(input)?;
            let inner = match outer.elements().as_ref() {
                Vector::Block(inner) => inner,
                other => {
                    return Err(PlyexecError::new(format!(
                        "Expected nested blocks to flatten, got {other:?}"
                    )))
                }
            };
            Ok(Vector::Block(BlockVector::try_new(
                Offsets::compose(outer.offsets(), inner.offsets()),
                inner.elements().clone(),
                outer.card() | inner.card(),
            )?))
        }
        Op::TupleOf { labels, parts } => {
            let columns = parts
                .iter()
                .map(|p| p.evaluate(input).map(Arc::new))
                .collect::<Result<Vec<_>>>()?;
            Ok(Vector::Tuple(TupleVector::try_new(
                labels.clone(),
                input.len(),
                columns,
            )?))
        }
        Op::Column(col_ref) => {
            let tuple = as_tuple(input)?;
            let idx = match col_ref {
                ColumnRef::Index(idx) => *idx,
                ColumnRef::Name(name) => tuple.column_index(name).ok_or_else(|| {
                    PlyexecError::new(format!("Unknown column '{name}' in tuple vector"))
                })?,
            };
            Ok(tuple.column(idx)?.as_ref().clone())
        }
        Op::Distribute(j) => eval_distribute(*j, input),
        Op::DistributeAll => eval_distribute_all(input),
        Op::BlockLength => {
            let block = as_block(input)?;
            Ok(Vector::int64(
                (0..block.len()).map(|k| block.block_len(k) as i64),
            ))
        }
        Op::BlockAny => eval_block_bools(input, false),
        Op::BlockAll => eval_block_bools(input, true),
        Op::Sieve => eval_sieve(input),
        Op::Slice { count, rev } => eval_slice(*count, *rev, input),
    }
}

fn as_block(input: &Vector) -> Result<&BlockVector> {
    match input {
        Vector::Block(block) => Ok(block),
        other => Err(PlyexecError::new(format!(
            "Expected a block vector, got {other:?}"
        ))),
    }
}

fn as_tuple(input: &Vector) -> Result<&TupleVector> {
    match input {
        Vector::Tuple(tuple) => Ok(tuple),
        other => Err(PlyexecError::new(format!(
            "Expected a tuple vector, got {other:?}"
        ))),
    }
}

fn check_length_conservation(name: &str, input: usize, output: usize) -> Result<()> {
    if input != output {
        return Err(PlyexecError::new(format!(
            "Function '{name}' returned {output} rows for {input} input rows",
        )));
    }
    Ok(())
}

fn eval_block_lift(
    func: &BlockFunc,
    default: Option<&ScalarValue>,
    input: &Vector,
) -> Result<Vector> {
    let blocks = as_block(input)?;
    match func {
        BlockFunc::Agg(agg) => agg.execute(blocks, default),
        BlockFunc::Lifted(f) => {
            // Rows with an empty block and a default bypass the function.
            let mut lists = Vec::new();
            let mut defaulted = vec![false; blocks.len()];
            for k in 0..blocks.len() {
                let (start, end) = blocks.block_bounds(k);
                if start == end && default.is_some() {
                    defaulted[k] = true;
                    continue;
                }
                let mut vals = Vec::with_capacity(end - start);
                for idx in start..end {
                    vals.push(blocks.elements().scalar(idx)?);
                }
                lists.push(ScalarValue::List(vals));
            }

            let applied_len = lists.len();
            let applied = f.execute(&[&Vector::Scalars(ScalarVector::new(lists))])?;
            check_length_conservation(f.name(), applied_len, applied.len())?;

            let mut out = Vec::with_capacity(blocks.len());
            let mut next = 0;
            for was_defaulted in defaulted {
                if was_defaulted {
                    out.push(default.expect("default present").clone());
                } else {
                    out.push(applied.scalar(next)?);
                    next += 1;
                }
            }
            Ok(Vector::from_scalars(out))
        }
    }
}

fn eval_block_filler(elements: &Arc<Vector>, card: Cardinality, input: &Vector) -> Result<Vector> {
    let n = input.len();
    let m = elements.len();

    // A zero-length input yields a zero-length block vector whose element
    // vector is an empty slice of the fill block.
    let indices: Vec<usize> = (0..n).flat_map(|_| 0..m).collect();
    let repeated = elements.take(&indices)?;
    let offsets = Offsets::from_lengths(std::iter::repeat(m).take(n));

    Ok(Vector::Block(BlockVector::try_new(offsets, repeated, card)?))
}

fn eval_adapt_missing(input: &Vector) -> Result<Vector> {
    let n = input.len();
    let mut valid_indices = Vec::with_capacity(n);
    let mut lens = Vec::with_capacity(n);
    for idx in 0..n {
        if input.is_valid(idx) == Some(true) {
            valid_indices.push(idx);
            lens.push(1);
        } else {
            lens.push(0);
        }
    }

    let elements = match input {
        // Re-layout dynamic values while dropping the missings.
        Vector::Scalars(v) => Vector::from_scalars(
            valid_indices
                .iter()
                .map(|&idx| v.values()[idx].clone())
                .collect(),
        ),
        other => other.take(&valid_indices)?,
    };

    Ok(Vector::Block(BlockVector::try_new(
        Offsets::from_lengths(lens),
        elements,
        Cardinality::OPT,
    )?))
}

fn eval_adapt_vector(input: &Vector) -> Result<Vector> {
    let values = match input {
        Vector::Scalars(v) => v.values(),
        other => {
            return Err(PlyexecError::new(format!(
                "Expected a vector of native lists, got {other:?}"
            )))
        }
    };

    let mut lens = Vec::with_capacity(values.len());
    let mut flat = Vec::new();
    for value in values {
        match value {
            ScalarValue::List(vals) => {
                lens.push(vals.len());
                flat.extend(vals.iter().cloned());
            }
            ScalarValue::Missing => lens.push(0),
            other => {
                return Err(PlyexecError::new(format!(
                    "Expected a native list, got {other:?}"
                )))
            }
        }
    }

    Ok(Vector::Block(BlockVector::try_new(
        Offsets::from_lengths(lens),
        Vector::from_scalars(flat),
        Cardinality::ANY,
    )?))
}

fn eval_adapt_tuple(input: &Vector) -> Result<Vector> {
    let values = match input {
        Vector::Scalars(v) => v.values(),
        other => {
            return Err(PlyexecError::new(format!(
                "Expected a vector of native tuples, got {other:?}"
            )))
        }
    };

    let (labels, ncols) = match values.first() {
        Some(ScalarValue::Tuple { labels, values }) => (labels.clone(), values.len()),
        Some(other) => {
            return Err(PlyexecError::new(format!(
                "Expected a native tuple, got {other:?}"
            )))
        }
        None => return Ok(Vector::Tuple(TupleVector::try_new(Vec::new(), 0, Vec::new())?)),
    };

    let mut cols: Vec<Vec<ScalarValue>> = vec![Vec::with_capacity(values.len()); ncols];
    for value in values {
        match value {
            ScalarValue::Tuple { values, .. } if values.len() == ncols => {
                for (col, val) in cols.iter_mut().zip(values.iter()) {
                    col.push(val.clone());
                }
            }
            other => {
                return Err(PlyexecError::new(format!(
                    "Expected a native tuple with {ncols} fields, got {other:?}"
                )))
            }
        }
    }

    let columns = cols
        .into_iter()
        .map(|col| Arc::new(Vector::from_scalars(col)))
        .collect();
    Ok(Vector::Tuple(TupleVector::try_new(
        labels,
        values.len(),
        columns,
    )?))
}

fn eval_distribute(j: usize, input: &Vector) -> Result<Vector> {
    let tuple = as_tuple(input)?;
    let block = match tuple.column(j)?.as_ref() {
        Vector::Block(block) => block,
        other => {
            return Err(PlyexecError::new(format!(
                "Expected column {j} to be a block vector, got {other:?}"
            )))
        }
    };

    // Dense offsets mean one element per row; no replication needed.
    let columns = if block.offsets().is_dense() {
        tuple
            .columns()
            .iter()
            .enumerate()
            .map(|(idx, col)| {
                if idx == j {
                    block.elements().clone()
                } else {
                    col.clone()
                }
            })
            .collect::<Vec<_>>()
    } else {
        let mut rep_indices = Vec::with_capacity(block.elements().len());
        for k in 0..block.len() {
            let (start, end) = block.block_bounds(k);
            rep_indices.extend(std::iter::repeat(k).take(end - start));
        }

        tuple
            .columns()
            .iter()
            .enumerate()
            .map(|(idx, col)| {
                if idx == j {
                    Ok(block.elements().clone())
                } else {
                    col.take(&rep_indices).map(Arc::new)
                }
            })
            .collect::<Result<Vec<_>>>()?
    };

    let elements = TupleVector::try_new(tuple.labels().to_vec(), block.elements().len(), columns)?;
    Ok(Vector::Block(BlockVector::try_new(
        block.offsets().clone(),
        Vector::Tuple(elements),
        block.card(),
    )?))
}

fn eval_distribute_all(input: &Vector) -> Result<Vector> {
    let tuple = as_tuple(input)?;
    let blocks = tuple
        .columns()
        .iter()
        .map(|col| match col.as_ref() {
            Vector::Block(block) => Ok(block),
            other => Err(PlyexecError::new(format!(
                "Expected every column to be a block vector, got {other:?}"
            ))),
        })
        .collect::<Result<Vec<_>>>()?;
    let ncols = blocks.len();

    let mut card = Cardinality::ONE;
    for block in &blocks {
        card = card | block.card();
    }

    // Per row, the cartesian assembly of the column blocks, rightmost column
    // fastest.
    let mut lens = Vec::with_capacity(tuple.len());
    let mut indices: Vec<Vec<usize>> = vec![Vec::new(); ncols];
    for row in 0..tuple.len() {
        let bounds: Vec<_> = blocks.iter().map(|b| b.block_bounds(row)).collect();
        let count: usize = bounds.iter().map(|(s, e)| e - s).product();
        lens.push(count);

        for combo in 0..count {
            let mut rem = combo;
            for i in (0..ncols).rev() {
                let (start, end) = bounds[i];
                let len = end - start;
                indices[i].push(start + rem % len);
                rem /= len;
            }
        }
    }

    let total: usize = lens.iter().sum();
    let columns = blocks
        .iter()
        .zip(indices.iter())
        .map(|(block, idxs)| block.elements().take(idxs).map(Arc::new))
        .collect::<Result<Vec<_>>>()?;

    let elements = TupleVector::try_new(tuple.labels().to_vec(), total, columns)?;
    Ok(Vector::Block(BlockVector::try_new(
        Offsets::from_lengths(lens),
        Vector::Tuple(elements),
        card,
    )?))
}

fn eval_block_bools(input: &Vector, all: bool) -> Result<Vector> {
    let block = as_block(input)?;
    let bools = match block.elements().as_ref() {
        Vector::Bool(v) => v,
        other => {
            return Err(PlyexecError::new(format!(
                "Expected a block vector of booleans, got {other:?}"
            )))
        }
    };

    let out = (0..block.len()).map(|k| {
        let (start, end) = block.block_bounds(k);
        let mut vals = (start..end)
            .filter(|&idx| bools.is_valid(idx) == Some(true))
            .map(|idx| *bools.value(idx).expect("index in bounds"));
        if all {
            vals.all(|v| v)
        } else {
            vals.any(|v| v)
        }
    });

    Ok(Vector::bool(out))
}

fn eval_sieve(input: &Vector) -> Result<Vector> {
    let tuple = as_tuple(input)?;
    if tuple.num_columns() != 2 {
        return Err(PlyexecError::new(format!(
            "Expected a two-column tuple vector, got {} columns",
            tuple.num_columns(),
        )));
    }
    let values = tuple.column(0)?;
    let preds = match tuple.column(1)?.as_ref() {
        Vector::Bool(v) => v,
        other => {
            return Err(PlyexecError::new(format!(
                "Expected a boolean predicate column, got {other:?}"
            )))
        }
    };

    let mut kept = Vec::new();
    let mut lens = Vec::with_capacity(tuple.len());
    for idx in 0..tuple.len() {
        let keep = preds.is_valid(idx) == Some(true) && *preds.value(idx).expect("index in bounds");
        if keep {
            kept.push(idx);
            lens.push(1);
        } else {
            lens.push(0);
        }
    }

    Ok(Vector::Block(BlockVector::try_new(
        Offsets::from_lengths(lens),
        values.take(&kept)?,
        Cardinality::OPT,
    )?))
}

/// Element range kept within a block of `len` elements.
///
/// A non-negative count keeps the first `n` elements; a negative count keeps
/// all but the last `-n`. With `rev` the kept range is dropped instead.
fn slice_bounds(len: usize, n: i64, rev: bool) -> (usize, usize) {
    let keep = if n >= 0 {
        (n as usize).min(len)
    } else {
        len.saturating_sub(n.unsigned_abs() as usize)
    };
    if rev {
        (keep, len)
    } else {
        (0, keep)
    }
}

fn eval_slice(count: Option<i64>, rev: bool, input: &Vector) -> Result<Vector> {
    let (block, counts): (&BlockVector, Option<&Vector>) = match count {
        Some(_) => (as_block(input)?, None),
        None => {
            let tuple = as_tuple(input)?;
            if tuple.num_columns() != 2 {
                return Err(PlyexecError::new(format!(
                    "Expected a two-column tuple vector, got {} columns",
                    tuple.num_columns(),
                )));
            }
            let block = match tuple.column(0)?.as_ref() {
                Vector::Block(block) => block,
                other => {
                    return Err(PlyexecError::new(format!(
                        "Expected a block vector to slice, got {other:?}"
                    )))
                }
            };
            (block, Some(tuple.column(1)?.as_ref()))
        }
    };

    let mut lens = Vec::with_capacity(block.len());
    let mut indices = Vec::new();
    for k in 0..block.len() {
        let (start, end) = block.block_bounds(k);
        let len = end - start;

        let n = match (count, counts) {
            (Some(n), _) => Some(n),
            (None, Some(counts)) => row_count(counts, k)?,
            (None, None) => unreachable!("count or counts column present"),
        };

        let (lo, hi) = match n {
            Some(n) => slice_bounds(len, n, rev),
            // Missing count leaves the block unchanged.
            None => (0, len),
        };
        lens.push(hi - lo);
        indices.extend(start + lo..start + hi);
    }

    Ok(Vector::Block(BlockVector::try_new(
        Offsets::from_lengths(lens),
        block.elements().take(&indices)?,
        block.card() | Cardinality::OPT,
    )?))
}

/// Per-row slice count: an integer vector with missings, or an optional
/// block of integers with empty blocks as missing.
fn row_count(counts: &Vector, row: usize) -> Result<Option<i64>> {
    match counts {
        Vector::Int64(v) => Ok(match v.is_valid(row) {
            Some(true) => Some(*v.value(row).expect("index in bounds")),
            _ => None,
        }),
        Vector::Block(block) => {
            let (start, end) = block.block_bounds(row);
            if start == end {
                return Ok(None);
            }
            match block.elements().scalar(start)? {
                ScalarValue::Int64(n) => Ok(Some(n)),
                other => Err(PlyexecError::new(format!(
                    "Expected an integer slice count, got {other:?}"
                ))),
            }
        }
        other => Err(PlyexecError::new(format!(
            "Expected an integer count column, got {other:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{self, BlockFunc};

    fn abc_block() -> Vector {
        Vector::Block(
            BlockVector::try_new(
                Offsets::from_lengths([3]),
                Vector::utf8(["a", "b", "c"]),
                Cardinality::ANY,
            )
            .unwrap(),
        )
    }

    #[test]
    fn wrap_then_flatten_is_identity() {
        let input = abc_block();
        let wrapped = pipeline::wrap().evaluate(&input).unwrap();
        let flattened = pipeline::flatten().evaluate(&wrapped).unwrap();
        assert_eq!(input, flattened);
    }

    #[test]
    fn slice_take_negative() {
        // Taking -2 of a 3-element block keeps the first element.
        let out = pipeline::slice(-2, false).evaluate(&abc_block()).unwrap();
        match out {
            Vector::Block(b) => {
                assert_eq!(1, b.block_len(0));
                assert_eq!(&Vector::utf8(["a"]), b.elements().as_ref());
            }
            other => panic!("unexpected vector: {other:?}"),
        }
    }

    #[test]
    fn slice_drop_negative() {
        // Dropping -2 keeps the last two elements.
        let out = pipeline::slice(-2, true).evaluate(&abc_block()).unwrap();
        match out {
            Vector::Block(b) => {
                assert_eq!(&Vector::utf8(["b", "c"]), b.elements().as_ref());
            }
            other => panic!("unexpected vector: {other:?}"),
        }
    }

    #[test]
    fn slice_count_past_length_is_identity() {
        let out = pipeline::slice(10, false).evaluate(&abc_block()).unwrap();
        match out {
            Vector::Block(b) => assert_eq!(3, b.block_len(0)),
            other => panic!("unexpected vector: {other:?}"),
        }
    }

    #[test]
    fn slice_negative_past_length_is_empty() {
        let out = pipeline::slice(-4, false).evaluate(&abc_block()).unwrap();
        match out {
            Vector::Block(b) => assert_eq!(0, b.block_len(0)),
            other => panic!("unexpected vector: {other:?}"),
        }
    }

    #[test]
    fn slice_negative_on_empty_block_is_noop() {
        let input = Vector::Block(BlockVector::empty_with_n_rows(1));
        let out = pipeline::slice(-2, false).evaluate(&input).unwrap();
        match out {
            Vector::Block(b) => assert_eq!(0, b.block_len(0)),
            other => panic!("unexpected vector: {other:?}"),
        }
    }

    #[test]
    fn block_filler_zero_length_input() {
        let p = pipeline::block_filler(Vector::int64([1, 2]), Cardinality::ANY);
        let out = p.evaluate(&Vector::Unit(0)).unwrap();
        match out {
            Vector::Block(b) => {
                assert_eq!(0, b.len());
                assert_eq!(&Vector::int64([]), b.elements().as_ref());
            }
            other => panic!("unexpected vector: {other:?}"),
        }
    }

    #[test]
    fn distribute_replicates_other_columns() {
        // Column 0: blocks [10, 20], [30]. Column 1: labels per row.
        let blocks = BlockVector::try_new(
            Offsets::from_lengths([2, 1]),
            Vector::int64([10, 20, 30]),
            Cardinality::ANY,
        )
        .unwrap();
        let tuple = TupleVector::try_new(
            Vec::new(),
            2,
            vec![
                Arc::new(Vector::Block(blocks)),
                Arc::new(Vector::utf8(["x", "y"])),
            ],
        )
        .unwrap();

        let out = pipeline::distribute(0).evaluate(&Vector::Tuple(tuple)).unwrap();
        match out {
            Vector::Block(b) => {
                assert_eq!(2, b.len());
                match b.elements().as_ref() {
                    Vector::Tuple(t) => {
                        assert_eq!(&Vector::int64([10, 20, 30]), t.column(0).unwrap().as_ref());
                        assert_eq!(
                            &Vector::utf8(["x", "x", "y"]),
                            t.column(1).unwrap().as_ref()
                        );
                    }
                    other => panic!("unexpected elements: {other:?}"),
                }
            }
            other => panic!("unexpected vector: {other:?}"),
        }
    }

    #[test]
    fn distribute_dense_skips_replication() {
        let tuple = TupleVector::try_new(
            Vec::new(),
            2,
            vec![
                Arc::new(Vector::Block(BlockVector::wrapping(Vector::int64([1, 2])))),
                Arc::new(Vector::utf8(["x", "y"])),
            ],
        )
        .unwrap();

        let out = pipeline::distribute(0).evaluate(&Vector::Tuple(tuple)).unwrap();
        match out {
            Vector::Block(b) => {
                assert!(b.offsets().is_dense());
                match b.elements().as_ref() {
                    Vector::Tuple(t) => {
                        assert_eq!(&Vector::utf8(["x", "y"]), t.column(1).unwrap().as_ref())
                    }
                    other => panic!("unexpected elements: {other:?}"),
                }
            }
            other => panic!("unexpected vector: {other:?}"),
        }
    }

    #[test]
    fn distribute_all_cartesian() {
        let a = BlockVector::try_new(
            Offsets::from_lengths([2]),
            Vector::int64([1, 2]),
            Cardinality::ANY,
        )
        .unwrap();
        let b = BlockVector::try_new(
            Offsets::from_lengths([2]),
            Vector::utf8(["x", "y"]),
            Cardinality::ANY,
        )
        .unwrap();
        let tuple = TupleVector::try_new(
            Vec::new(),
            1,
            vec![Arc::new(Vector::Block(a)), Arc::new(Vector::Block(b))],
        )
        .unwrap();

        let out = pipeline::distribute_all()
            .evaluate(&Vector::Tuple(tuple))
            .unwrap();
        match out {
            Vector::Block(block) => {
                assert_eq!(4, block.block_len(0));
                match block.elements().as_ref() {
                    Vector::Tuple(t) => {
                        assert_eq!(
                            &Vector::int64([1, 1, 2, 2]),
                            t.column(0).unwrap().as_ref()
                        );
                        assert_eq!(
                            &Vector::utf8(["x", "y", "x", "y"]),
                            t.column(1).unwrap().as_ref()
                        );
                    }
                    other => panic!("unexpected elements: {other:?}"),
                }
            }
            other => panic!("unexpected vector: {other:?}"),
        }
    }

    #[test]
    fn sieve_keeps_where_true() {
        let tuple = TupleVector::try_new(
            Vec::new(),
            3,
            vec![
                Arc::new(Vector::int64([1, 2, 3])),
                Arc::new(Vector::bool([true, false, true])),
            ],
        )
        .unwrap();

        let out = pipeline::sieve().evaluate(&Vector::Tuple(tuple)).unwrap();
        match out {
            Vector::Block(b) => {
                assert_eq!(3, b.len());
                assert_eq!(Cardinality::OPT, b.card());
                assert_eq!(&Vector::int64([1, 3]), b.elements().as_ref());
                assert_eq!(0, b.block_len(1));
            }
            other => panic!("unexpected vector: {other:?}"),
        }
    }

    #[test]
    fn block_any_and_all() {
        let blocks = Vector::Block(
            BlockVector::try_new(
                Offsets::from_lengths([2, 0, 2]),
                Vector::bool([true, false, true, true]),
                Cardinality::ANY,
            )
            .unwrap(),
        );

        assert_eq!(
            Vector::bool([true, false, true]),
            pipeline::block_any().evaluate(&blocks).unwrap()
        );
        assert_eq!(
            Vector::bool([false, true, true]),
            pipeline::block_all().evaluate(&blocks).unwrap()
        );
    }

    #[test]
    fn adapt_missing_builds_optional_blocks() {
        let input = Vector::from_scalars(vec![
            ScalarValue::Int64(1),
            ScalarValue::Missing,
            ScalarValue::Int64(3),
        ]);
        let out = pipeline::adapt_missing().evaluate(&input).unwrap();
        match out {
            Vector::Block(b) => {
                assert_eq!(Cardinality::OPT, b.card());
                assert_eq!(3, b.len());
                assert_eq!(0, b.block_len(1));
                assert_eq!(&Vector::int64([1, 3]), b.elements().as_ref());
            }
            other => panic!("unexpected vector: {other:?}"),
        }
    }

    #[test]
    fn adapt_vector_flattens_lists() {
        let input = Vector::Scalars(ScalarVector::new(vec![
            ScalarValue::List(vec![ScalarValue::Int64(1), ScalarValue::Int64(2)]),
            ScalarValue::List(Vec::new()),
        ]));
        let out = pipeline::adapt_vector().evaluate(&input).unwrap();
        match out {
            Vector::Block(b) => {
                assert_eq!(Cardinality::ANY, b.card());
                assert_eq!(2, b.block_len(0));
                assert_eq!(0, b.block_len(1));
                assert_eq!(&Vector::int64([1, 2]), b.elements().as_ref());
            }
            other => panic!("unexpected vector: {other:?}"),
        }
    }

    #[test]
    fn adapt_tuple_builds_columns() {
        let row = |a: i64, b: &str| ScalarValue::Tuple {
            labels: vec![crate::label::Label::new("n"), crate::label::Label::new("s")],
            values: vec![ScalarValue::Int64(a), ScalarValue::Utf8(b.into())],
        };
        let input = Vector::Scalars(ScalarVector::new(vec![row(1, "x"), row(2, "y")]));
        let out = pipeline::adapt_tuple().evaluate(&input).unwrap();
        match out {
            Vector::Tuple(t) => {
                assert_eq!(&Vector::int64([1, 2]), t.column(0).unwrap().as_ref());
                assert_eq!(&Vector::utf8(["x", "y"]), t.column(1).unwrap().as_ref());
                assert_eq!("n", t.labels()[0].as_str());
            }
            other => panic!("unexpected vector: {other:?}"),
        }
    }

    #[test]
    fn block_lift_lifted_with_default() {
        // Count the native list length per block, defaulting empties to -1.
        #[derive(Debug, Clone, Copy)]
        struct ListLen;

        impl crate::functions::ScalarFunction for ListLen {
            fn name(&self) -> &'static str {
                "listlen"
            }

            fn return_type(
                &self,
                _inputs: &[crate::datatype::ValueType],
            ) -> Result<crate::functions::ReturnKind> {
                Ok(crate::functions::ReturnKind::Value(
                    crate::datatype::ValueType::Int64,
                ))
            }

            fn execute(&self, inputs: &[&Vector]) -> Result<Vector> {
                let vals = match inputs[0] {
                    Vector::Scalars(v) => v.values(),
                    other => panic!("unexpected input: {other:?}"),
                };
                Ok(Vector::int64(vals.iter().map(|v| match v {
                    ScalarValue::List(l) => l.len() as i64,
                    _ => panic!("expected list"),
                })))
            }
        }

        let blocks = Vector::Block(
            BlockVector::try_new(
                Offsets::from_lengths([2, 0, 1]),
                Vector::int64([1, 2, 3]),
                Cardinality::ANY,
            )
            .unwrap(),
        );
        let p = pipeline::block_lift(
            BlockFunc::Lifted(Arc::new(ListLen)),
            Some(ScalarValue::Int64(-1)),
        );
        let out = p.evaluate(&blocks).unwrap();
        assert_eq!(Vector::int64([2, -1, 1]), out);
    }
}
