use super::{chain_of, ColumnRef, Op, Pipeline};
use crate::label::Label;

/// Rewrite a pipeline with the peephole rules until a fixed point.
///
/// Every rule strictly decreases the chain length or nesting depth, so the
/// loop terminates. The top-level signature is preserved.
pub fn optimize(p: Pipeline) -> Pipeline {
    let sig = p.signature().clone();
    let mut current = p;
    loop {
        let (next, changed) = simplify(current);
        current = next;
        if !changed {
            break;
        }
    }
    current.designate(sig)
}

fn simplify(p: Pipeline) -> (Pipeline, bool) {
    let (op, sig) = p.into_parts();
    let mut changed = false;

    let op = match op {
        Op::Chain(ps) => {
            let mut items: Vec<Pipeline> = Vec::with_capacity(ps.len());
            for child in ps {
                let (child, child_changed) = simplify(child);
                changed |= child_changed;
                // Nested chains are spliced into the parent.
                match child.into_parts() {
                    (Op::Chain(sub), _) => {
                        changed = true;
                        items.extend(sub);
                    }
                    (Op::Pass, _) => changed = true,
                    (op, sig) => items.push(Pipeline::from_parts(op, sig)),
                }
            }
            changed |= apply_chain_rules(&mut items);

            match items.len() {
                0 => Op::Pass,
                1 => {
                    let only = items.pop().expect("one element");
                    return (only.designate(sig), true);
                }
                _ => Op::Chain(items),
            }
        }
        Op::WithElements(inner) => {
            let (inner, child_changed) = simplify(*inner);
            changed |= child_changed;
            if inner.is_pass() {
                changed = true;
                Op::Pass
            } else {
                Op::WithElements(Box::new(inner))
            }
        }
        Op::WithColumn(j, inner) => {
            let (inner, child_changed) = simplify(*inner);
            changed |= child_changed;
            if inner.is_pass() {
                changed = true;
                Op::Pass
            } else {
                Op::WithColumn(j, Box::new(inner))
            }
        }
        Op::TupleOf { labels, parts } => {
            let parts = parts
                .into_iter()
                .map(|part| {
                    let (part, child_changed) = simplify(part);
                    changed |= child_changed;
                    part
                })
                .collect();
            Op::TupleOf { labels, parts }
        }
        other => other,
    };

    (Pipeline::from_parts(op, sig), changed)
}

fn is_wrap(p: &Pipeline) -> bool {
    matches!(p.op(), Op::Wrap)
}

fn is_flatten(p: &Pipeline) -> bool {
    matches!(p.op(), Op::Flatten)
}

fn is_with_elements(p: &Pipeline) -> bool {
    matches!(p.op(), Op::WithElements(_))
}

fn is_with_elements_wrap(p: &Pipeline) -> bool {
    match p.op() {
        Op::WithElements(inner) => is_wrap(inner),
        _ => false,
    }
}

fn into_with_elements_inner(p: Pipeline) -> Pipeline {
    match p.into_parts() {
        (Op::WithElements(inner), _) => *inner,
        _ => unreachable!("caller checked the operator"),
    }
}

/// Splice a pipeline into the chain at position `k`, flattening if it is
/// itself a chain.
fn splice(items: &mut Vec<Pipeline>, k: usize, p: Pipeline) {
    match p.into_parts() {
        (Op::Chain(sub), _) => {
            for (offset, sub_item) in sub.into_iter().enumerate() {
                items.insert(k + offset, sub_item);
            }
        }
        (Op::Pass, _) => (),
        (op, sig) => items.insert(k, Pipeline::from_parts(op, sig)),
    }
}

/// Resolve a column selector against the labels of a `tuple_of`.
fn resolve_column(labels: &[Label], num_parts: usize, col_ref: &ColumnRef) -> Option<usize> {
    match col_ref {
        ColumnRef::Index(idx) => (*idx < num_parts).then_some(*idx),
        ColumnRef::Name(name) => {
            if let Some(idx) = labels.iter().position(|l| l == name) {
                return Some(idx);
            }
            (0..num_parts).find(|&idx| &Label::ordinal(idx) == name)
        }
    }
}

fn apply_chain_rules(items: &mut Vec<Pipeline>) -> bool {
    let mut changed = false;
    let mut k = 0;

    while k < items.len() {
        // Drop pass().
        if items[k].is_pass() {
            items.remove(k);
            changed = true;
            continue;
        }

        // with_elements(wrap()) . flatten() -> drop.
        if k + 1 < items.len()
            && is_with_elements_wrap(&items[k])
            && is_flatten(&items[k + 1])
        {
            items.drain(k..k + 2);
            changed = true;
            k = k.saturating_sub(1);
            continue;
        }

        // wrap() . with_elements(p) . flatten() -> p.
        if k + 2 < items.len()
            && is_wrap(&items[k])
            && is_with_elements(&items[k + 1])
            && is_flatten(&items[k + 2])
        {
            let inner = into_with_elements_inner(items.remove(k + 1));
            items.remove(k + 1); // flatten, shifted down by one
            items.remove(k); // wrap
            splice(items, k, inner);
            changed = true;
            k = k.saturating_sub(1);
            continue;
        }

        // with_elements(p) . flatten() . with_elements(q)
        //     -> with_elements(chain_of(p, with_elements(q))) . flatten().
        //
        // The trailing q acted on the elements of the inner blocks, so it
        // re-enters one element level deeper when pushed back through the
        // flatten.
        if k + 2 < items.len()
            && is_with_elements(&items[k])
            && is_flatten(&items[k + 1])
            && is_with_elements(&items[k + 2])
        {
            let q = into_with_elements_inner(items.remove(k + 2));
            let p = into_with_elements_inner(items.remove(k));
            items.insert(
                k,
                super::with_elements(chain_of([p, super::with_elements(q)])),
            );
            changed = true;
            continue;
        }

        // with_elements(p) . with_elements(q) -> with_elements(chain_of(p, q)).
        if k + 1 < items.len()
            && is_with_elements(&items[k])
            && is_with_elements(&items[k + 1])
        {
            let q = into_with_elements_inner(items.remove(k + 1));
            let p = into_with_elements_inner(items.remove(k));
            items.insert(k, super::with_elements(chain_of([p, q])));
            changed = true;
            continue;
        }

        // tuple_of(_, ps) . column(i) -> ps[i].
        if k + 1 < items.len() {
            let resolved = match (items[k].op(), items[k + 1].op()) {
                (Op::TupleOf { labels, parts }, Op::Column(col_ref)) => {
                    resolve_column(labels, parts.len(), col_ref)
                }
                _ => None,
            };
            if let Some(idx) = resolved {
                items.remove(k + 1);
                let tuple = items.remove(k);
                let part = match tuple.into_parts() {
                    (Op::TupleOf { mut parts, .. }, _) => parts.swap_remove(idx),
                    _ => unreachable!("caller checked the operator"),
                };
                splice(items, k, part);
                changed = true;
                k = k.saturating_sub(1);
                continue;
            }
        }

        k += 1;
    }

    changed
}
