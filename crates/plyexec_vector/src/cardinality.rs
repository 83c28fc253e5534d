use std::fmt;
use std::ops::{BitAnd, BitOr};

/// Structural bound on the number of elements a block may hold.
///
/// Formed from two independent bits: the "optional" bit allows empty blocks,
/// the "plural" bit allows blocks with more than one element. The four
/// combinations form a small lattice where `|` widens and `&` tightens.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cardinality(u8);

const OPTIONAL_BIT: u8 = 0b01;
const PLURAL_BIT: u8 = 0b10;

impl Cardinality {
    /// Exactly one element.
    pub const ONE: Cardinality = Cardinality(0);
    /// Zero or one element.
    pub const OPT: Cardinality = Cardinality(OPTIONAL_BIT);
    /// One or more elements.
    pub const PLUS: Cardinality = Cardinality(PLURAL_BIT);
    /// Any number of elements.
    pub const ANY: Cardinality = Cardinality(OPTIONAL_BIT | PLURAL_BIT);

    pub const fn is_optional(self) -> bool {
        self.0 & OPTIONAL_BIT != 0
    }

    pub const fn is_plural(self) -> bool {
        self.0 & PLURAL_BIT != 0
    }

    /// A block of `len` elements is allowed under this cardinality.
    pub const fn accepts(self, len: usize) -> bool {
        if len == 0 && !self.is_optional() {
            return false;
        }
        if len > 1 && !self.is_plural() {
            return false;
        }
        true
    }

    /// `self` can be used wherever `other` is expected.
    pub fn fits(self, other: Cardinality) -> bool {
        self | other == other
    }
}

impl BitOr for Cardinality {
    type Output = Cardinality;

    fn bitor(self, rhs: Self) -> Self::Output {
        Cardinality(self.0 | rhs.0)
    }
}

impl BitAnd for Cardinality {
    type Output = Cardinality;

    fn bitand(self, rhs: Self) -> Self::Output {
        Cardinality(self.0 & rhs.0)
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match *self {
            Cardinality::ONE => "1:1",
            Cardinality::OPT => "0:1",
            Cardinality::PLUS => "1:N",
            _ => "0:N",
        };
        write!(f, "{s}")
    }
}

impl fmt::Debug for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Cardinality({self})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widen_and_tighten() {
        assert_eq!(Cardinality::ANY, Cardinality::OPT | Cardinality::PLUS);
        assert_eq!(Cardinality::ONE, Cardinality::OPT & Cardinality::PLUS);
        assert_eq!(Cardinality::OPT, Cardinality::OPT | Cardinality::ONE);
    }

    #[test]
    fn fits_is_lattice_order() {
        assert!(Cardinality::ONE.fits(Cardinality::ANY));
        assert!(Cardinality::ONE.fits(Cardinality::OPT));
        assert!(Cardinality::ONE.fits(Cardinality::PLUS));
        assert!(!Cardinality::ANY.fits(Cardinality::ONE));
        assert!(!Cardinality::OPT.fits(Cardinality::PLUS));
        assert!(Cardinality::OPT.fits(Cardinality::OPT));
    }

    #[test]
    fn accepts_block_lengths() {
        assert!(Cardinality::ONE.accepts(1));
        assert!(!Cardinality::ONE.accepts(0));
        assert!(!Cardinality::ONE.accepts(2));
        assert!(Cardinality::OPT.accepts(0));
        assert!(!Cardinality::OPT.accepts(2));
        assert!(Cardinality::PLUS.accepts(3));
        assert!(!Cardinality::PLUS.accepts(0));
        assert!(Cardinality::ANY.accepts(0));
        assert!(Cardinality::ANY.accepts(100));
    }
}
