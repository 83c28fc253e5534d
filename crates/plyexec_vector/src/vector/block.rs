use crate::cardinality::Cardinality;
use crate::vector::Vector;
use plyexec_error::{PlyexecError, Result};
use std::sync::Arc;

/// Offsets partitioning an element vector into per-row blocks.
///
/// `bounds(k)` names the half-open slice of the element vector belonging to
/// row `k`. The dense form encodes the common "one element per row" case
/// without materializing the offset sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Offsets {
    /// One element per row; row `k` owns elements `k..k+1`.
    Dense(usize),

    /// Explicit offsets. Length is one more than the number of rows, first
    /// entry is 0, entries are non-decreasing, last entry equals the length
    /// of the element vector.
    Ragged(Vec<usize>),
}

impl Offsets {
    pub fn from_lengths(lens: impl IntoIterator<Item = usize>) -> Self {
        let mut offsets = vec![0];
        let mut total = 0;
        for len in lens {
            total += len;
            offsets.push(total);
        }
        Offsets::Ragged(offsets)
    }

    /// Number of rows described by the offsets.
    pub fn num_rows(&self) -> usize {
        match self {
            Self::Dense(n) => *n,
            Self::Ragged(offsets) => offsets.len() - 1,
        }
    }

    /// Total number of elements covered.
    pub fn num_elements(&self) -> usize {
        match self {
            Self::Dense(n) => *n,
            Self::Ragged(offsets) => *offsets.last().expect("offsets are never empty"),
        }
    }

    /// Element bounds for row `k`.
    pub fn bounds(&self, k: usize) -> (usize, usize) {
        match self {
            Self::Dense(_) => (k, k + 1),
            Self::Ragged(offsets) => (offsets[k], offsets[k + 1]),
        }
    }

    pub fn row_len(&self, k: usize) -> usize {
        let (start, end) = self.bounds(k);
        end - start
    }

    pub fn is_dense(&self) -> bool {
        matches!(self, Self::Dense(_))
    }

    /// Compose nested offsets: `outer` partitions rows over an inner block
    /// vector, `inner` partitions that vector's rows over its elements. The
    /// result partitions the outer rows directly over the inner elements.
    pub fn compose(outer: &Offsets, inner: &Offsets) -> Offsets {
        match (outer, inner) {
            (Offsets::Dense(_), inner) => inner.clone(),
            (outer, Offsets::Dense(_)) => outer.clone(),
            (Offsets::Ragged(outer), Offsets::Ragged(inner)) => {
                Offsets::Ragged(outer.iter().map(|&o| inner[o]).collect())
            }
        }
    }

    fn validate(&self) -> Result<()> {
        if let Self::Ragged(offsets) = self {
            if offsets.is_empty() {
                return Err(PlyexecError::new("Offsets may not be empty"));
            }
            if offsets[0] != 0 {
                return Err(PlyexecError::new(format!(
                    "Offsets must start at 0, got {}",
                    offsets[0]
                )));
            }
            if offsets.windows(2).any(|w| w[0] > w[1]) {
                return Err(PlyexecError::new("Offsets must be non-decreasing"));
            }
        }
        Ok(())
    }
}

/// A ragged sequence of blocks over a shared element vector.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockVector {
    offsets: Offsets,
    elements: Arc<Vector>,
    card: Cardinality,
}

impl BlockVector {
    /// Create a new block vector, validating offsets well-formedness and that
    /// every block length is allowed by `card`.
    pub fn try_new(
        offsets: Offsets,
        elements: impl Into<Arc<Vector>>,
        card: Cardinality,
    ) -> Result<Self> {
        let elements = elements.into();
        offsets.validate()?;

        if offsets.num_elements() != elements.len() {
            return Err(PlyexecError::new(format!(
                "Offsets cover {} elements, element vector has {}",
                offsets.num_elements(),
                elements.len(),
            )));
        }

        for k in 0..offsets.num_rows() {
            let len = offsets.row_len(k);
            if !card.accepts(len) {
                return Err(PlyexecError::new(format!(
                    "Block {k} has {len} elements, not allowed by cardinality {card}",
                )));
            }
        }

        Ok(BlockVector {
            offsets,
            elements,
            card,
        })
    }

    /// Wrap a plain vector so that each value becomes a one-element block.
    pub fn wrapping(elements: impl Into<Arc<Vector>>) -> Self {
        let elements = elements.into();
        BlockVector {
            offsets: Offsets::Dense(elements.len()),
            elements,
            card: Cardinality::ONE,
        }
    }

    /// Produce a block vector containing `n` rows with each row being an
    /// empty block.
    pub fn empty_with_n_rows(n: usize) -> Self {
        BlockVector {
            offsets: Offsets::Ragged(vec![0; n + 1]),
            elements: Arc::new(Vector::Unit(0)),
            card: Cardinality::OPT,
        }
    }

    pub fn len(&self) -> usize {
        self.offsets.num_rows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn card(&self) -> Cardinality {
        self.card
    }

    pub fn offsets(&self) -> &Offsets {
        &self.offsets
    }

    pub fn elements(&self) -> &Arc<Vector> {
        &self.elements
    }

    pub fn block_bounds(&self, k: usize) -> (usize, usize) {
        self.offsets.bounds(k)
    }

    pub fn block_len(&self, k: usize) -> usize {
        self.offsets.row_len(k)
    }
}
