use crate::bitmap::Bitmap;
use std::fmt::Debug;

/// Vector storing fixed-size primitive values.
#[derive(Debug, Clone, PartialEq)]
pub struct PrimitiveVector<T> {
    /// Validity bitmap.
    ///
    /// "True" values indicate the value at that index is valid, "false"
    /// indicates missing.
    validity: Option<Bitmap>,

    /// Underlying values.
    values: Vec<T>,
}

pub type BoolVector = PrimitiveVector<bool>;
pub type Int64Vector = PrimitiveVector<i64>;
pub type Float64Vector = PrimitiveVector<f64>;

impl<T: Debug> PrimitiveVector<T> {
    pub fn from_values(values: Vec<T>) -> Self {
        PrimitiveVector {
            validity: None,
            values,
        }
    }

    pub fn with_validity(values: Vec<T>, validity: Bitmap) -> Self {
        debug_assert_eq!(values.len(), validity.len());
        PrimitiveVector {
            validity: Some(validity),
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Get a value at the given index, None if the index is out of bounds.
    pub fn value(&self, idx: usize) -> Option<&T> {
        self.values.get(idx)
    }

    pub fn is_valid(&self, idx: usize) -> Option<bool> {
        if idx >= self.len() {
            return None;
        }
        Some(self.validity.as_ref().map(|v| v.value(idx)).unwrap_or(true))
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }

    pub fn validity(&self) -> Option<&Bitmap> {
        self.validity.as_ref()
    }

    /// Iterate values with missings as None.
    pub fn opt_iter(&self) -> impl Iterator<Item = Option<&T>> + '_ {
        self.values.iter().enumerate().map(|(idx, v)| {
            match &self.validity {
                Some(validity) if !validity.value(idx) => None,
                _ => Some(v),
            }
        })
    }
}

impl<T: Debug> FromIterator<T> for PrimitiveVector<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from_values(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_without_validity() {
        let v = Int64Vector::from_iter([1, 2, 3]);
        assert_eq!(3, v.len());
        assert_eq!(Some(&2), v.value(1));
        assert_eq!(Some(true), v.is_valid(1));
        assert_eq!(None, v.value(3));
    }

    #[test]
    fn values_with_validity() {
        let v = Int64Vector::with_validity(vec![1, 0, 3], Bitmap::from_iter([true, false, true]));
        assert_eq!(Some(false), v.is_valid(1));
        let got: Vec<_> = v.opt_iter().collect();
        assert_eq!(vec![Some(&1), None, Some(&3)], got);
    }
}
