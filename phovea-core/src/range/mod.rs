//! Range addressing engine.
//!
//! A compact slice description language (`start:end:step`, Python style
//! negative and omitted fields) and the value types built on it:
//!
//! - [`RangeElem`]: one `start:end:step` triple or a single index
//! - [`Range1D`]: ordered union of elements selecting one dimension
//! - [`Range`]: one [`Range1D`] per dataset dimension
//! - [`Selection`]: "everything" or an explicit [`Range`]
//!
//! Negative fields count from the end of the dimension and are resolved
//! lazily through [`fix`] once the dimension size is known.

mod elem;
mod nd;
mod range1d;
mod selection;

pub use elem::{ElemIter, RangeElem, SingleRangeElem, SliceElem};
pub use nd::{Range, DIMENSION_SEPARATOR};
pub use range1d::{Range1D, SliceSpec};
pub use selection::Selection;

/// Resolve a possibly negative index against a possibly unknown size.
///
/// Non-negative values are returned unchanged whatever the size. Negative
/// values count from the end: `-1` maps to `size` itself (one past the last
/// valid index), `-2` to `size - 1` and so on. An unknown size propagates
/// to the result for negative values, as does a result outside `i64`. No
/// clamping is performed.
pub fn fix(value: i64, size: Option<i64>) -> Option<i64> {
    if value >= 0 {
        Some(value)
    } else {
        size.and_then(|n| n.checked_add(value)?.checked_add(1))
    }
}

/// One end of a range element, tagged by how it resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bound {
    /// Absolute 0-based index.
    At(i64),
    /// Through the end of the dimension (raw `-1`).
    ThroughEnd,
    /// `k` positions before the end, i.e. `size - k` (raw `-k - 1`).
    FromEnd(i64),
}

impl Bound {
    /// Decode the integer wire form.
    pub fn from_raw(value: i64) -> Self {
        match value {
            v if v >= 0 => Bound::At(v),
            -1 => Bound::ThroughEnd,
            v => Bound::FromEnd(-(v + 1)),
        }
    }

    /// Encode back to the integer wire form.
    pub fn raw(self) -> i64 {
        match self {
            Bound::At(v) => v,
            Bound::ThroughEnd => -1,
            Bound::FromEnd(k) => -k - 1,
        }
    }

    /// Resolve against a dimension size via [`fix`].
    pub fn resolve(self, size: Option<i64>) -> Option<i64> {
        fix(self.raw(), size)
    }

    pub fn is_absolute(self) -> bool {
        matches!(self, Bound::At(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fix_constant() {
        assert_eq!(fix(1, Some(10)), Some(1));
        assert_eq!(fix(0, Some(10)), Some(0));
    }

    #[test]
    fn fix_constant_ignores_size() {
        assert_eq!(fix(10, Some(-1)), Some(10));
        assert_eq!(fix(10, None), Some(10));
    }

    #[test]
    fn fix_negative() {
        assert_eq!(fix(-1, Some(10)), Some(10));
        assert_eq!(fix(-2, Some(10)), Some(9));
        assert_eq!(fix(-8, Some(10)), Some(3));
        assert_eq!(fix(-13, Some(10)), Some(-2));
    }

    #[test]
    fn fix_negative_unknown_size() {
        assert_eq!(fix(-1, None), None);
    }

    #[test]
    fn fix_extremes() {
        assert_eq!(fix(i64::MIN, Some(10)), Some(i64::MIN + 11));
        assert_eq!(fix(i64::MIN, Some(i64::MAX)), Some(0));
        assert_eq!(fix(-2, Some(i64::MIN)), None);
        assert_eq!(fix(i64::MAX, None), Some(i64::MAX));
    }

    #[test]
    fn bound_raw_roundtrip() {
        for raw in [i64::MIN, -5, -2, -1, 0, 3, i64::MAX] {
            assert_eq!(Bound::from_raw(raw).raw(), raw);
        }
        assert_eq!(Bound::from_raw(-1), Bound::ThroughEnd);
        assert_eq!(Bound::from_raw(-2), Bound::FromEnd(1));
        assert_eq!(Bound::FromEnd(1).resolve(Some(10)), Some(9));
        assert_eq!(Bound::ThroughEnd.resolve(Some(10)), Some(10));
        assert_eq!(Bound::from_raw(i64::MIN), Bound::FromEnd(i64::MAX));
    }
}
