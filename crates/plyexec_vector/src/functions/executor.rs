use crate::bitmap::Bitmap;
use crate::vector::PrimitiveVector;
use plyexec_error::{PlyexecError, Result};
use std::fmt::Debug;

/// Apply `f` to every value of a primitive vector, carrying validity over.
pub(crate) fn unary<T, R, F>(input: &PrimitiveVector<T>, f: F) -> PrimitiveVector<R>
where
    T: Debug,
    R: Debug,
    F: Fn(&T) -> R,
{
    let values: Vec<_> = input.values().iter().map(f).collect();
    match input.validity() {
        Some(validity) => PrimitiveVector::with_validity(values, validity.clone()),
        None => PrimitiveVector::from_values(values),
    }
}

/// Apply `f` pairwise to two equal-length primitive vectors.
///
/// Output validity is the intersection of the input validities.
pub(crate) fn binary<A, B, R, F>(
    left: &PrimitiveVector<A>,
    right: &PrimitiveVector<B>,
    f: F,
) -> Result<PrimitiveVector<R>>
where
    A: Debug,
    B: Debug,
    R: Debug,
    F: Fn(&A, &B) -> R,
{
    if left.len() != right.len() {
        return Err(PlyexecError::new(format!(
            "Input length mismatch, got {} and {}",
            left.len(),
            right.len(),
        )));
    }

    let values: Vec<_> = left
        .values()
        .iter()
        .zip(right.values().iter())
        .map(|(a, b)| f(a, b))
        .collect();

    let validity = combined_validity(left.validity(), right.validity())?;
    Ok(match validity {
        Some(validity) => PrimitiveVector::with_validity(values, validity),
        None => PrimitiveVector::from_values(values),
    })
}

pub(crate) fn combined_validity(
    left: Option<&Bitmap>,
    right: Option<&Bitmap>,
) -> Result<Option<Bitmap>> {
    Ok(match (left, right) {
        (Some(a), Some(b)) => Some(a.intersect(b)?),
        (Some(a), None) => Some(a.clone()),
        (None, Some(b)) => Some(b.clone()),
        (None, None) => None,
    })
}
