use crate::label::Label;
use crate::vector::Vector;
use plyexec_error::{PlyexecError, Result};
use std::sync::Arc;

/// A parallel array of equal-length columns.
///
/// `labels` is either empty (positional columns) or holds one label per
/// column. Columns are reference counted; selecting a column shares storage
/// with the parent.
#[derive(Debug, Clone, PartialEq)]
pub struct TupleVector {
    labels: Vec<Label>,
    length: usize,
    columns: Vec<Arc<Vector>>,
}

impl TupleVector {
    pub fn try_new(
        labels: Vec<Label>,
        length: usize,
        columns: Vec<Arc<Vector>>,
    ) -> Result<Self> {
        if !labels.is_empty() && labels.len() != columns.len() {
            return Err(PlyexecError::new(format!(
                "Expected {} labels, got {}",
                columns.len(),
                labels.len(),
            )));
        }

        for (idx, col) in columns.iter().enumerate() {
            if col.len() != length {
                return Err(PlyexecError::new(format!(
                    "Expected column {idx} to have length {length}, got {}",
                    col.len(),
                )));
            }
        }

        Ok(TupleVector {
            labels,
            length,
            columns,
        })
    }

    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn columns(&self) -> &[Arc<Vector>] {
        &self.columns
    }

    pub fn column(&self, idx: usize) -> Result<&Arc<Vector>> {
        self.columns.get(idx).ok_or_else(|| {
            PlyexecError::new(format!(
                "Column index {idx} out of bounds, tuple has {} columns",
                self.columns.len(),
            ))
        })
    }

    /// Resolve a column by label.
    ///
    /// Falls back to ordinal labels (`#A`, `#B`, ...) when the tuple is
    /// positional or the name is not among the declared labels.
    pub fn column_index(&self, name: &Label) -> Option<usize> {
        if let Some(idx) = self.labels.iter().position(|l| l == name) {
            return Some(idx);
        }
        (0..self.columns.len()).find(|&idx| &Label::ordinal(idx) == name)
    }

    /// Return a new tuple vector with column `j` replaced.
    ///
    /// The column list is copied; the remaining columns continue sharing
    /// storage with the original.
    pub fn with_column(&self, j: usize, col: impl Into<Arc<Vector>>) -> Result<TupleVector> {
        let col = col.into();
        if j >= self.columns.len() {
            return Err(PlyexecError::new(format!(
                "Column index {j} out of bounds, tuple has {} columns",
                self.columns.len(),
            )));
        }
        if col.len() != self.length {
            return Err(PlyexecError::new(format!(
                "Expected replacement column to have length {}, got {}",
                self.length,
                col.len(),
            )));
        }

        let mut columns = self.columns.clone();
        columns[j] = col;

        Ok(TupleVector {
            labels: self.labels.clone(),
            length: self.length,
            columns,
        })
    }
}
