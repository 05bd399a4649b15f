//! The atomic one-dimensional range primitive.

use std::fmt;
use std::str::FromStr;

use super::{fix, Bound};
use crate::error::{RangeError, Result};

/// A `start:end:step` triple.
///
/// `end` is exclusive. With a negative step, an end of [`Bound::ThroughEnd`]
/// walks down through index 0 and never needs the dimension size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SliceElem {
    start: Bound,
    end: Bound,
    step: i64,
}

impl SliceElem {
    pub fn start(&self) -> Bound {
        self.start
    }

    pub fn end(&self) -> Bound {
        self.end
    }

    pub fn step(&self) -> i64 {
        self.step
    }

    /// Concrete `(start, end)`, or `None` if a field needs an unknown size.
    fn resolve(&self, size: Option<i64>) -> Option<(i64, i64)> {
        let start = self.start.resolve(size)?;
        let end = match self.end {
            Bound::ThroughEnd if self.step < 0 => -1,
            end => end.resolve(size)?,
        };
        Some((start, end))
    }

    /// Whether the end bound is relative to the dimension size.
    fn end_is_relative(&self) -> bool {
        match self.end {
            Bound::At(_) => false,
            Bound::ThroughEnd => self.step > 0,
            Bound::FromEnd(_) => true,
        }
    }
}

/// Exactly one index, kept as a scalar so it prints as a bare integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SingleRangeElem {
    value: i64,
}

impl SingleRangeElem {
    pub fn new(value: i64) -> Self {
        Self { value }
    }

    pub fn value(&self) -> i64 {
        self.value
    }
}

/// One element of a [`Range1D`](super::Range1D).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RangeElem {
    Slice(SliceElem),
    Single(SingleRangeElem),
}

/// Number of `step` spaced integers walking from `start` towards `end`,
/// `None` if it does not fit in an `i64`.
fn count(start: i64, end: i64, step: i64) -> Option<i64> {
    let (start, end, step) = (i128::from(start), i128::from(end), i128::from(step));
    let n = if step > 0 {
        if end <= start {
            0
        } else {
            (end - start - 1) / step + 1
        }
    } else if start <= end {
        0
    } else {
        (start - end - 1) / -step + 1
    };
    i64::try_from(n).ok()
}

fn within(index: i64, start: i64, end: i64, step: i64) -> bool {
    let inside = if step > 0 {
        start <= index && index < end
    } else {
        end < index && index <= start
    };
    inside && (i128::from(index) - i128::from(start)) % i128::from(step) == 0
}

/// Last of `count` indices walking from `start`.
///
/// Lies between `start` and the exclusive end, so it always fits.
fn last_index(start: i64, count: i64, step: i64) -> i64 {
    let last = i128::from(start) + i128::from(count - 1) * i128::from(step);
    last as i64
}

/// Reverse of a resolved, non-negative run of `count` indices.
fn reversed_absolute(origin: &RangeElem, start: i64, count: i64, step: i64) -> Result<RangeElem> {
    if count <= 0 {
        return Ok(RangeElem::none());
    }
    let overflow = || RangeError::overflow(origin);
    let last = last_index(start, count, step);
    let end = if step > 0 {
        start.checked_sub(1)
    } else {
        start.checked_add(1)
    }
    .ok_or_else(overflow)?;
    RangeElem::new(last, end, step.checked_neg().ok_or_else(overflow)?)
}

impl RangeElem {
    /// Create a range element from raw integer fields.
    ///
    /// Negative `start`/`end` count from the end of the dimension, `-1`
    /// meaning "through the end". Fails on a zero step, or when both fields
    /// are absolute and the step walks away from `end`.
    pub fn new(start: i64, end: i64, step: i64) -> Result<Self> {
        if step == 0 {
            return Err(RangeError::ZeroStep);
        }
        if start >= 0 && end >= 0 && ((step > 0 && start > end) || (step < 0 && start < end)) {
            return Err(RangeError::DirectionMismatch { start, end, step });
        }
        Ok(RangeElem::Slice(SliceElem {
            start: Bound::from_raw(start),
            end: Bound::from_raw(end),
            step,
        }))
    }

    /// `start:end` with unit step.
    pub fn span(start: i64, end: i64) -> Result<Self> {
        Self::new(start, end, 1)
    }

    /// `start:` through the end of the dimension.
    pub fn starting_at(start: i64) -> Self {
        RangeElem::Slice(SliceElem {
            start: Bound::from_raw(start),
            end: Bound::ThroughEnd,
            step: 1,
        })
    }

    /// The whole dimension.
    pub fn all() -> Self {
        Self::starting_at(0)
    }

    /// Selects nothing.
    pub fn none() -> Self {
        RangeElem::Slice(SliceElem {
            start: Bound::At(0),
            end: Bound::At(0),
            step: 1,
        })
    }

    pub fn single(value: i64) -> Self {
        RangeElem::Single(SingleRangeElem::new(value))
    }

    /// Ascending unit-step run `start..end` with `0 <= start <= end`.
    pub(super) fn run(start: i64, end: i64) -> Self {
        RangeElem::Slice(SliceElem {
            start: Bound::At(start),
            end: Bound::At(end),
            step: 1,
        })
    }

    /// Parse `[start][:[end][:step]]` or a bare integer.
    pub fn parse(text: &str) -> Result<Self> {
        text.parse()
    }

    /// Raw start field.
    pub fn start(&self) -> i64 {
        match self {
            RangeElem::Slice(s) => s.start.raw(),
            RangeElem::Single(s) => s.value,
        }
    }

    /// Raw end field (`value + 1` for a single index, saturating).
    pub fn end(&self) -> i64 {
        match self {
            RangeElem::Slice(s) => s.end.raw(),
            RangeElem::Single(s) => s.value.saturating_add(1),
        }
    }

    pub fn step(&self) -> i64 {
        match self {
            RangeElem::Slice(s) => s.step,
            RangeElem::Single(_) => 1,
        }
    }

    fn resolve(&self, size: Option<i64>) -> Option<(i64, i64, i64)> {
        match self {
            RangeElem::Slice(s) => s.resolve(size).map(|(start, end)| (start, end, s.step)),
            RangeElem::Single(s) => fix(s.value, size).map(|v| match v.checked_add(1) {
                Some(end) => (v, end, 1),
                // i64::MAX walks down instead so its end stays representable
                None => (v, v - 1, -1),
            }),
        }
    }

    fn resolved(&self, size: Option<i64>) -> Result<(i64, i64, i64)> {
        self.resolve(size).ok_or_else(|| RangeError::unbound(self))
    }

    /// Resolved `(start, step, count)`.
    fn extent(&self, size: Option<i64>) -> Result<(i64, i64, i64)> {
        let (start, end, step) = self.resolved(size)?;
        let n = count(start, end, step).ok_or_else(|| RangeError::overflow(self))?;
        Ok((start, step, n))
    }

    /// Full dimension with unit step.
    pub fn is_all(&self) -> bool {
        matches!(
            self,
            RangeElem::Slice(SliceElem {
                start: Bound::At(0),
                end: Bound::ThroughEnd,
                step: 1,
            })
        )
    }

    /// Needs a concrete dimension size to resolve.
    pub fn is_unbound(&self) -> bool {
        self.resolve(None).is_none()
    }

    /// Selects exactly one index regardless of the dimension size.
    pub fn is_single(&self) -> bool {
        match self {
            RangeElem::Single(_) => true,
            RangeElem::Slice(s) => {
                if let Some((start, end)) = s.resolve(None) {
                    count(start, end, s.step) == Some(1)
                } else if !s.start.is_absolute() && s.end_is_relative() {
                    // both fields shift with the size, so their distance is fixed
                    count(s.start.raw(), s.end.raw(), s.step) == Some(1)
                } else {
                    false
                }
            }
        }
    }

    /// Number of selected indices.
    pub fn size(&self, size: Option<i64>) -> Result<i64> {
        self.extent(size).map(|(_, _, n)| n)
    }

    /// Selected indices in selection order.
    pub fn iter(&self, size: Option<i64>) -> Result<ElemIter> {
        let (start, step, remaining) = self.extent(size)?;
        Ok(ElemIter {
            next: start,
            step,
            remaining,
        })
    }

    /// Whether `index` is produced by [`iter`](Self::iter).
    ///
    /// Without a size, an element running through the end of an ascending
    /// dimension is treated as unlimited; any other unresolved field yields
    /// `false`.
    pub fn contains(&self, index: i64, size: Option<i64>) -> bool {
        if let Some((start, end, step)) = self.resolve(size) {
            return within(index, start, end, step);
        }
        match self {
            RangeElem::Slice(SliceElem {
                start: Bound::At(start),
                end: Bound::ThroughEnd,
                step,
            }) if *step > 0 && size.is_none() => {
                index >= *start && (index - start) % step == 0
            }
            _ => false,
        }
    }

    /// Map a position within the selection back to an absolute index.
    pub fn invert(&self, index: i64, size: Option<i64>) -> Result<i64> {
        let (start, step) = match self {
            RangeElem::Slice(s) => (s.start.resolve(size), s.step),
            RangeElem::Single(s) => (fix(s.value, size), 1),
        };
        let start = start.ok_or_else(|| RangeError::unbound(self))?;
        index
            .checked_mul(step)
            .and_then(|offset| start.checked_add(offset))
            .ok_or_else(|| RangeError::overflow(self))
    }

    /// Element iterating the same indices in the opposite order.
    ///
    /// Unbound elements can only be reversed without a size when the step
    /// is `1` or `-1` and the reversed bounds are expressible; use
    /// [`reverse_in`](Self::reverse_in) otherwise.
    pub fn reverse(&self) -> Result<RangeElem> {
        let s = match self {
            RangeElem::Single(_) => return Ok(*self),
            RangeElem::Slice(s) => s,
        };
        if s.resolve(None).is_some() {
            let (start, step, n) = self.extent(None)?;
            return reversed_absolute(self, start, n, step);
        }
        let bounds = match s.step {
            // start:end walks back as (end - 1):(start - 1):-1
            1 => {
                let start = match s.end {
                    Bound::At(0) => return Ok(RangeElem::none()),
                    Bound::At(e) => Some(Bound::At(e - 1)),
                    Bound::ThroughEnd => Some(Bound::FromEnd(1)),
                    Bound::FromEnd(k) => k.checked_add(1).map(Bound::FromEnd),
                };
                let end = match s.start {
                    Bound::At(0) => Some(Bound::ThroughEnd),
                    Bound::At(a) => Some(Bound::At(a - 1)),
                    Bound::ThroughEnd => Some(Bound::FromEnd(1)),
                    Bound::FromEnd(k) => k.checked_add(1).map(Bound::FromEnd),
                };
                start.zip(end)
            }
            // start:end:-1 walks back as (end + 1):(start + 1)
            -1 => {
                let start = match s.end {
                    Bound::ThroughEnd => Some(Bound::At(0)),
                    Bound::At(e) => e.checked_add(1).map(Bound::At),
                    Bound::FromEnd(1) => Some(Bound::ThroughEnd),
                    Bound::FromEnd(k) => Some(Bound::FromEnd(k - 1)),
                };
                let end = match s.start {
                    Bound::At(a) => a.checked_add(1).map(Bound::At),
                    Bound::FromEnd(1) => Some(Bound::ThroughEnd),
                    Bound::FromEnd(k) => Some(Bound::FromEnd(k - 1)),
                    Bound::ThroughEnd => return Err(RangeError::unbound(self)),
                };
                start.zip(end)
            }
            _ => return Err(RangeError::unbound(self)),
        };
        let (start, end) = bounds.ok_or_else(|| RangeError::overflow(self))?;
        Ok(RangeElem::Slice(SliceElem {
            start,
            end,
            step: -s.step,
        }))
    }

    /// Reverse against a known dimension size.
    pub fn reverse_in(&self, size: i64) -> Result<RangeElem> {
        if let RangeElem::Single(_) = self {
            return Ok(*self);
        }
        let (start, step, n) = self.extent(Some(size))?;
        if n > 0 {
            let lowest = start.min(last_index(start, n, step));
            if lowest < 0 {
                return Err(RangeError::OutOfBounds {
                    index: lowest,
                    size,
                });
            }
        }
        reversed_absolute(self, start, n, step)
    }
}

impl From<SingleRangeElem> for RangeElem {
    fn from(value: SingleRangeElem) -> Self {
        RangeElem::Single(value)
    }
}

impl fmt::Display for RangeElem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RangeElem::Single(s) => write!(f, "{}", s.value),
            RangeElem::Slice(s) => {
                // `:` fields left out parse back to start 0 and end -1
                match (s.start.raw(), s.end) {
                    (0, Bound::ThroughEnd) => f.write_str(":")?,
                    (start, Bound::ThroughEnd) => write!(f, "{start}:")?,
                    (start, end) => write!(f, "{start}:{}", end.raw())?,
                }
                if s.step != 1 {
                    write!(f, ":{}", s.step)?;
                }
                Ok(())
            }
        }
    }
}

impl FromStr for RangeElem {
    type Err = RangeError;

    fn from_str(source: &str) -> Result<Self> {
        let text = source.trim();

        let parse_int = |field: &str, default: i64| -> Result<i64> {
            let field = field.trim();
            if field.is_empty() {
                return Ok(default);
            }
            field
                .parse::<i64>()
                .map_err(|_| RangeError::parse(source, format!("'{field}' is not an integer")))
        };

        if !text.contains(':') {
            if text.is_empty() {
                return Ok(Self::all());
            }
            return parse_int(text, 0).map(Self::single);
        }

        let fields: Vec<&str> = text.split(':').collect();
        if fields.len() > 3 {
            return Err(RangeError::parse(
                source,
                "expected at most three ':' separated fields",
            ));
        }
        let start = parse_int(fields[0], 0)?;
        let end = parse_int(fields[1], -1)?;
        let step = parse_int(fields.get(2).copied().unwrap_or(""), 1)?;
        Self::new(start, end, step)
    }
}

/// Lazy iterator over the indices of one [`RangeElem`].
///
/// Cloning it restarts from the current position.
#[derive(Debug, Clone)]
pub struct ElemIter {
    next: i64,
    step: i64,
    remaining: i64,
}

impl Iterator for ElemIter {
    type Item = i64;

    fn next(&mut self) -> Option<i64> {
        if self.remaining <= 0 {
            return None;
        }
        let value = self.next;
        // past the last index the value is never read
        self.next = self.next.wrapping_add(self.step);
        self.remaining -= 1;
        Some(value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining.max(0) as usize;
        (n, Some(n))
    }
}

impl ExactSizeIterator for ElemIter {}

#[cfg(test)]
mod tests {
    use super::*;

    fn elem(start: i64, end: i64, step: i64) -> RangeElem {
        RangeElem::new(start, end, step).unwrap()
    }

    fn list(e: RangeElem, size: Option<i64>) -> Vec<i64> {
        e.iter(size).unwrap().collect()
    }

    #[test]
    fn default_is_all() {
        let e = RangeElem::starting_at(0);
        assert_eq!(e.start(), 0);
        assert_eq!(e.end(), -1);
        assert_eq!(e.step(), 1);
        assert!(e.is_all());
        assert!(e.is_unbound());
        assert!(!e.is_single());
        assert!(!RangeElem::starting_at(1).is_all());
    }

    #[test]
    fn size() {
        assert_eq!(elem(0, 5, 1).size(None).unwrap(), 5);
        assert_eq!(elem(4, -1, -1).size(None).unwrap(), 5);
        assert_eq!(elem(0, 5, 2).size(None).unwrap(), 3);
        assert_eq!(RangeElem::starting_at(0).size(Some(5)).unwrap(), 5);
        assert_eq!(elem(-1, 4, -1).size(Some(10)).unwrap(), 6);
        assert_eq!(RangeElem::none().size(None).unwrap(), 0);
    }

    #[test]
    fn size_of_unbound_needs_dimension() {
        let err = RangeElem::all().size(None).unwrap_err();
        assert!(err.is_unbound());
        assert!(RangeElem::all().iter(None).is_err());
    }

    #[test]
    fn iterate() {
        assert_eq!(list(elem(0, 5, 1), None), vec![0, 1, 2, 3, 4]);
        assert_eq!(list(elem(4, -1, -1), None), vec![4, 3, 2, 1, 0]);
        assert_eq!(list(elem(0, 5, 2), None), vec![0, 2, 4]);
        assert_eq!(list(RangeElem::starting_at(0), Some(5)), vec![0, 1, 2, 3, 4]);
        assert_eq!(list(elem(-1, 4, -1), Some(10)), vec![10, 9, 8, 7, 6, 5]);
    }

    #[test]
    fn iterator_is_restartable() {
        let it = elem(0, 3, 1).iter(None).unwrap();
        assert_eq!(it.len(), 3);
        let again = it.clone();
        assert_eq!(it.collect::<Vec<_>>(), again.collect::<Vec<_>>());
    }

    #[test]
    fn parse() {
        assert_eq!(RangeElem::parse("").unwrap(), RangeElem::all());
        assert_eq!(RangeElem::parse("::").unwrap(), RangeElem::all());
        assert_eq!(RangeElem::parse("2").unwrap(), RangeElem::single(2));
        assert_eq!(RangeElem::parse("2:5").unwrap(), elem(2, 5, 1));
        assert_eq!(RangeElem::parse(":5").unwrap(), elem(0, 5, 1));
        assert_eq!(RangeElem::parse("2:5:2").unwrap(), elem(2, 5, 2));
        assert_eq!(RangeElem::parse("::2").unwrap(), elem(0, -1, 2));
    }

    #[test]
    fn parse_rejects_non_integers() {
        assert!(RangeElem::parse("a").unwrap_err().is_parse_error());
        assert!(RangeElem::parse("0:a").unwrap_err().is_parse_error());
        assert!(RangeElem::parse("1:2:3:4").unwrap_err().is_parse_error());
    }

    #[test]
    fn construction_errors() {
        assert_eq!(RangeElem::new(0, 5, 0), Err(RangeError::ZeroStep));
        assert_eq!(RangeElem::parse("::0"), Err(RangeError::ZeroStep));
        assert!(matches!(
            RangeElem::new(5, 2, 1),
            Err(RangeError::DirectionMismatch { .. })
        ));
        assert!(matches!(
            RangeElem::new(2, 5, -1),
            Err(RangeError::DirectionMismatch { .. })
        ));
    }

    #[test]
    fn display() {
        assert_eq!(RangeElem::single(7).to_string(), "7");
        assert_eq!(elem(1, 4, 1).to_string(), "1:4");
        assert_eq!(elem(0, -1, 2).to_string(), "::2");
        assert_eq!(RangeElem::all().to_string(), ":");
        assert_eq!(elem(-3, -1, 1).to_string(), "-3:");
        assert_eq!(elem(4, -1, -1).to_string(), "4::-1");
        assert_eq!(RangeElem::none().to_string(), "0:0");
        for e in [
            RangeElem::all(),
            RangeElem::none(),
            elem(1, 4, 1),
            elem(0, -1, 2),
            elem(-3, -1, 1),
            elem(4, -1, -1),
            elem(0, -1, -1),
            RangeElem::single(3),
        ] {
            assert_eq!(RangeElem::parse(&e.to_string()).unwrap(), e);
        }
    }

    #[test]
    fn single() {
        let s = RangeElem::single(3);
        assert!(s.is_single());
        assert!(!s.is_unbound());
        assert_eq!(s.size(None).unwrap(), 1);
        assert_eq!(list(s, None), vec![3]);
        assert!(elem(2, 3, 1).is_single());
        assert!(elem(0, 5, 10).is_single());
        assert!(elem(-2, -1, 1).is_single());
        assert!(!elem(2, 4, 1).is_single());
    }

    #[test]
    fn contains() {
        let e = elem(0, 10, 3);
        assert!(e.contains(0, None));
        assert!(e.contains(9, None));
        assert!(!e.contains(10, None));
        assert!(!e.contains(4, None));
        let down = elem(4, -1, -1);
        assert!(down.contains(0, None));
        assert!(!down.contains(5, None));
        assert!(RangeElem::all().contains(1000, None));
        assert!(!RangeElem::all().contains(10, Some(10)));
        assert!(!elem(-3, -1, 1).contains(1, None));
        assert!(elem(-3, -1, 1).contains(8, Some(10)));
    }

    #[test]
    fn invert() {
        assert_eq!(elem(2, 10, 3).invert(2, None).unwrap(), 8);
        assert_eq!(elem(4, -1, -1).invert(1, None).unwrap(), 3);
        assert_eq!(RangeElem::single(5).invert(0, None).unwrap(), 5);
        assert_eq!(elem(-3, -1, 1).invert(1, Some(10)).unwrap(), 9);
        assert!(elem(-3, -1, 1).invert(1, None).is_err());
    }

    #[test]
    fn reverse_bounded() {
        for e in [elem(0, 5, 1), elem(1, 8, 3), elem(4, -1, -1), elem(5, 2, -1), elem(9, 0, -4)] {
            let mut expected = list(e, None);
            expected.reverse();
            assert_eq!(list(e.reverse().unwrap(), None), expected, "reversing {e}");
        }
        assert_eq!(RangeElem::single(4).reverse().unwrap(), RangeElem::single(4));
        assert_eq!(elem(3, 3, 1).reverse().unwrap().size(None).unwrap(), 0);
    }

    #[test]
    fn reverse_unbound_unit_step() {
        for e in [RangeElem::all(), elem(2, -1, 1), elem(-4, -2, 1), elem(-2, 3, -1), elem(-3, -1, -1)] {
            let reversed = e.reverse().unwrap();
            for n in [0, 1, 5, 10] {
                let mut expected = list(e, Some(n));
                expected.reverse();
                assert_eq!(list(reversed, Some(n)), expected, "reversing {e} in {n}");
            }
        }
        assert_eq!(RangeElem::all().reverse().unwrap().reverse().unwrap(), RangeElem::all());
    }

    #[test]
    fn reverse_unbound_stepped_needs_size() {
        let e = elem(0, -1, 2);
        assert!(e.reverse().unwrap_err().is_unbound());
        let reversed = e.reverse_in(7).unwrap();
        assert_eq!(list(reversed, Some(7)), vec![6, 4, 2, 0]);
    }

    #[test]
    fn extreme_fields_do_not_overflow() {
        let from_min = RangeElem::parse("-9223372036854775808:").unwrap();
        assert_eq!(from_min.start(), i64::MIN);
        assert_eq!(from_min.to_string(), "-9223372036854775808:");
        assert_eq!(from_min.size(Some(i64::MAX)).unwrap(), i64::MAX);
        assert!(from_min.size(Some(i64::MIN)).unwrap_err().is_unbound());

        let wide = RangeElem::parse("0:9223372036854775807:2").unwrap();
        assert_eq!(wide.size(None).unwrap(), i64::MAX / 2 + 1);
        assert!(wide.contains(i64::MAX - 1, None));
        assert!(!wide.contains(i64::MAX, None));
        assert_eq!(wide.invert(i64::MAX / 2, None).unwrap(), i64::MAX - 1);
        assert_eq!(
            wide.invert(i64::MAX / 2 + 1, None).unwrap_err().error_type(),
            "range_overflow"
        );

        let top = elem(i64::MAX - 2, i64::MAX, 1);
        assert_eq!(list(top, None), vec![i64::MAX - 2, i64::MAX - 1]);
        assert_eq!(list(top.reverse().unwrap(), None), vec![i64::MAX - 1, i64::MAX - 2]);

        let max = RangeElem::single(i64::MAX);
        assert_eq!(max.end(), i64::MAX);
        assert_eq!(list(max, None), vec![i64::MAX]);
        assert!(max.contains(i64::MAX, None));
    }

    #[test]
    fn span_wider_than_i64_is_an_error() {
        // resolves to i64::MIN + 1 .. i64::MAX in an empty dimension
        let e = RangeElem::parse("-9223372036854775808:9223372036854775807").unwrap();
        let err = e.size(Some(0)).unwrap_err();
        assert_eq!(err.error_type(), "range_overflow");
        assert!(e.iter(Some(0)).is_err());
    }

    #[test]
    fn reverse_at_the_edges() {
        let step_min = elem(5, -1, i64::MIN);
        assert_eq!(list(step_min, None), vec![5]);
        assert_eq!(step_min.reverse().unwrap_err().error_type(), "range_overflow");

        let from_min = RangeElem::parse("-9223372036854775808:").unwrap();
        assert_eq!(from_min.reverse().unwrap_err().error_type(), "range_overflow");
    }
}
