use plyexec_error::{PlyexecError, Result};

/// An LSB-ordered bitmap used for tracking validity of values in a vector.
///
/// A "true" bit indicates the value at that position is valid, "false"
/// indicates missing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    len: usize,
    data: Vec<u8>,
}

impl Bitmap {
    /// All-valid bitmap of the given length.
    ///
    /// Bits past `len` in the backing bytes are kept zero so that equal
    /// bitmaps compare equal regardless of how they were built.
    pub fn with_len_all_valid(len: usize) -> Self {
        let mut bitmap = Bitmap {
            len,
            data: vec![0; len.div_ceil(8)],
        };
        for idx in 0..len {
            bitmap.set(idx, true);
        }
        bitmap
    }

    pub fn with_len_all_invalid(len: usize) -> Self {
        Bitmap {
            len,
            data: vec![0; len.div_ceil(8)],
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Get the value of the bit at `idx`.
    ///
    /// Panics if `idx` is out of bounds.
    pub fn value(&self, idx: usize) -> bool {
        assert!(idx < self.len, "bit index out of bounds");
        self.data[idx / 8] & (1 << (idx % 8)) != 0
    }

    pub fn set(&mut self, idx: usize, val: bool) {
        assert!(idx < self.len, "bit index out of bounds");
        if val {
            self.data[idx / 8] |= 1 << (idx % 8);
        } else {
            self.data[idx / 8] &= !(1 << (idx % 8));
        }
    }

    pub fn push(&mut self, val: bool) {
        if self.len % 8 == 0 {
            self.data.push(0);
        }
        self.len += 1;
        self.set(self.len - 1, val);
    }

    /// Number of "true" bits in the bitmap.
    pub fn popcnt(&self) -> usize {
        self.iter().filter(|&b| b).count()
    }

    pub fn all_valid(&self) -> bool {
        self.popcnt() == self.len
    }

    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        (0..self.len).map(|idx| self.value(idx))
    }

    /// Iterate over the indices of "true" bits.
    pub fn index_iter(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.len).filter(|&idx| self.value(idx))
    }

    /// Bitwise AND of two equal-length bitmaps.
    pub fn intersect(&self, other: &Bitmap) -> Result<Bitmap> {
        if self.len != other.len {
            return Err(PlyexecError::new(format!(
                "Cannot intersect bitmaps of different lengths, got {} and {}",
                self.len, other.len,
            )));
        }

        let data = self
            .data
            .iter()
            .zip(other.data.iter())
            .map(|(a, b)| a & b)
            .collect();

        Ok(Bitmap {
            len: self.len,
            data,
        })
    }
}

impl FromIterator<bool> for Bitmap {
    fn from_iter<T: IntoIterator<Item = bool>>(iter: T) -> Self {
        let mut bitmap = Bitmap {
            len: 0,
            data: Vec::new(),
        };
        for val in iter {
            bitmap.push(val);
        }
        bitmap
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_value() {
        let mut bm = Bitmap::with_len_all_invalid(10);
        bm.set(3, true);
        bm.set(9, true);

        assert!(!bm.value(0));
        assert!(bm.value(3));
        assert!(bm.value(9));
        assert_eq!(2, bm.popcnt());
    }

    #[test]
    fn from_iter_roundtrip() {
        let vals = [true, false, true, true, false, false, true, true, true];
        let bm = Bitmap::from_iter(vals);

        assert_eq!(vals.len(), bm.len());
        let got: Vec<_> = bm.iter().collect();
        assert_eq!(vals.as_slice(), got.as_slice());
    }

    #[test]
    fn index_iter_skips_invalid() {
        let bm = Bitmap::from_iter([false, true, false, true]);
        let idxs: Vec<_> = bm.index_iter().collect();
        assert_eq!(vec![1, 3], idxs);
    }

    #[test]
    fn intersect_length_mismatch() {
        let a = Bitmap::with_len_all_valid(4);
        let b = Bitmap::with_len_all_valid(5);
        assert!(a.intersect(&b).is_err());
    }
}
