//! One dimension's selection as an ordered union of range elements.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::RangeElem;
use crate::error::{RangeError, Result};

/// Ordered union of [`RangeElem`] values.
///
/// Insertion order is preserved and defines the order of the selected
/// indices.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Range1D {
    elems: Vec<RangeElem>,
}

/// A [`Range1D`] lowered to something a data layer can apply directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SliceSpec {
    /// One contiguous slice. `stop` is exclusive, and `None` when the slice
    /// runs off the edge of the index domain, as a descending slice through
    /// index 0 does.
    Slice {
        start: i64,
        stop: Option<i64>,
        step: i64,
    },
    /// Explicit absolute indices, in selection order.
    Indices(Vec<i64>),
}

impl Range1D {
    pub fn from_elems(elems: Vec<RangeElem>) -> Self {
        Self { elems }
    }

    pub fn all() -> Self {
        Self::from_elems(vec![RangeElem::all()])
    }

    pub fn none() -> Self {
        Self::from_elems(vec![RangeElem::none()])
    }

    pub fn single(value: i64) -> Self {
        Self::from_elems(vec![RangeElem::single(value)])
    }

    /// Compress a list of indices.
    ///
    /// Only maximal strictly ascending `+1` runs of at least two
    /// non-negative values become a `start:end` element; every other value
    /// is kept as a single index, in input order. Descending runs and runs
    /// with other steps are not compressed. `i64::MAX` has no exclusive end
    /// and always stays a single index.
    pub fn from_list(values: &[i64]) -> Self {
        if values.is_empty() {
            return Self::none();
        }

        let mut elems = Vec::new();
        let mut push_run = |start: i64, len: i64| {
            if len >= 2 {
                elems.push(RangeElem::run(start, start + len));
            } else {
                elems.push(RangeElem::single(start));
            }
        };

        let mut run_start = values[0];
        let mut run_len = 1;
        for pair in values.windows(2) {
            let (prev, next) = (pair[0], pair[1]);
            if prev >= 0 && prev.checked_add(1) == Some(next) && next < i64::MAX {
                run_len += 1;
            } else {
                push_run(run_start, run_len);
                run_start = next;
                run_len = 1;
            }
        }
        push_run(run_start, run_len);

        log::debug!("compressed {} indices into {} elements", values.len(), elems.len());
        Self { elems }
    }

    /// Parse the comma separated form, with or without enclosing parentheses.
    pub fn parse(text: &str) -> Result<Self> {
        text.parse()
    }

    pub fn elems(&self) -> &[RangeElem] {
        &self.elems
    }

    pub fn is_all(&self) -> bool {
        self.elems.len() == 1 && self.elems[0].is_all()
    }

    pub fn is_none(&self) -> bool {
        self.elems.iter().all(|e| matches!(e.size(None), Ok(0)))
    }

    pub fn is_unbound(&self) -> bool {
        self.elems.iter().any(RangeElem::is_unbound)
    }

    /// Total number of selected indices.
    pub fn size(&self, size: Option<i64>) -> Result<i64> {
        self.elems.iter().try_fold(0i64, |total, e| {
            total
                .checked_add(e.size(size)?)
                .ok_or_else(|| RangeError::overflow(self))
        })
    }

    /// Number of selected indices, failing for unbound selections.
    pub fn len(&self) -> Result<usize> {
        if self.is_unbound() {
            return Err(RangeError::unbound(self));
        }
        self.size(None).map(|n| n as usize)
    }

    /// Selected indices in selection order.
    pub fn iter(&self, size: Option<i64>) -> Result<impl Iterator<Item = i64> + Clone> {
        let iters = self
            .elems
            .iter()
            .map(|e| e.iter(size))
            .collect::<Result<Vec<_>>>()?;
        Ok(iters.into_iter().flatten())
    }

    /// Resolved absolute index list.
    pub fn to_vec(&self, size: Option<i64>) -> Result<Vec<i64>> {
        Ok(self.iter(size)?.collect())
    }

    pub fn contains(&self, index: i64, size: Option<i64>) -> bool {
        self.elems.iter().any(|e| e.contains(index, size))
    }

    /// Map a position within the whole union back to an absolute index.
    pub fn invert(&self, index: i64, size: Option<i64>) -> Result<i64> {
        let mut offset = index;
        let mut total: i64 = 0;
        for elem in &self.elems {
            let n = elem.size(size)?;
            if offset < n {
                return elem.invert(offset, size);
            }
            offset -= n;
            total = total.saturating_add(n);
        }
        Err(RangeError::OutOfBounds { index, size: total })
    }

    /// Selection iterating the same indices in the opposite order.
    pub fn reverse(&self) -> Result<Self> {
        let elems = self
            .elems
            .iter()
            .rev()
            .map(RangeElem::reverse)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { elems })
    }

    /// Lower to a single slice when there is exactly one element, to an
    /// index list otherwise.
    pub fn asslice(&self, size: Option<i64>) -> Result<SliceSpec> {
        if let [elem] = self.elems.as_slice() {
            let n = elem.size(size)?;
            let start = elem.invert(0, size)?;
            let step = elem.step();
            let stop = i128::from(start) + i128::from(n) * i128::from(step);
            return Ok(SliceSpec::Slice {
                start,
                stop: i64::try_from(stop).ok().filter(|stop| *stop >= 0),
                step,
            });
        }
        self.to_vec(size).map(SliceSpec::Indices)
    }

    /// Pick the selected items out of `data`, resolving against its length.
    pub fn select<T: Clone>(&self, data: &[T]) -> Result<Vec<T>> {
        let size = data.len() as i64;
        self.iter(Some(size))?
            .map(|i| {
                if (0..size).contains(&i) {
                    Ok(data[i as usize].clone())
                } else {
                    Err(RangeError::OutOfBounds { index: i, size })
                }
            })
            .collect()
    }
}

impl From<RangeElem> for Range1D {
    fn from(elem: RangeElem) -> Self {
        Self::from_elems(vec![elem])
    }
}

impl fmt::Display for Range1D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, elem) in self.elems.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            if !elem.is_all() {
                write!(f, "{elem}")?;
            }
        }
        f.write_str(")")
    }
}

impl FromStr for Range1D {
    type Err = RangeError;

    fn from_str(source: &str) -> Result<Self> {
        let text = source.trim();
        let inner = match (text.strip_prefix('('), text.ends_with(')')) {
            (Some(rest), true) => &rest[..rest.len() - 1],
            (None, false) => text,
            _ => return Err(RangeError::parse(source, "unbalanced parentheses")),
        };
        let elems = inner
            .split(',')
            .map(RangeElem::from_str)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { elems })
    }
}

impl Serialize for Range1D {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Range1D {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Range1D::parse(&s).map_err(serde::de::Error::custom)
    }
}
