//! Multi-dimensional range addresses.

use std::fmt;
use std::ops::Index;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::{Range1D, SliceSpec};
use crate::error::{RangeError, Result};

/// Separator between dimensions in the wire format.
pub const DIMENSION_SEPARATOR: char = ',';

/// One [`Range1D`] per addressed dimension, in positional order.
///
/// Dimensions beyond the explicit ones select everything, so
/// [`Range::all`] has no explicit dimensions at all.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Range {
    dims: Vec<Range1D>,
}

impl Range {
    pub fn new(dims: Vec<Range1D>) -> Self {
        Self { dims }
    }

    pub fn all() -> Self {
        Self::default()
    }

    /// Parse the wire format, e.g. `(1:4,6),(0:3)`.
    pub fn parse(text: &str) -> Result<Self> {
        text.parse()
    }

    pub fn dims(&self) -> &[Range1D] {
        &self.dims
    }

    /// Number of explicit dimensions.
    pub fn ndim(&self) -> usize {
        self.dims.len()
    }

    /// Selection of dimension `i`, everything if it was not given.
    pub fn dim(&self, i: usize) -> Range1D {
        self.dims.get(i).cloned().unwrap_or_else(Range1D::all)
    }

    pub fn is_all(&self) -> bool {
        self.dims.iter().all(Range1D::is_all)
    }

    pub fn is_unbound(&self) -> bool {
        self.dims.iter().any(Range1D::is_unbound)
    }

    /// Number of selected indices per dimension of a container with `shape`.
    pub fn size(&self, shape: &[i64]) -> Result<Vec<i64>> {
        shape
            .iter()
            .enumerate()
            .map(|(i, &n)| self.dim(i).size(Some(n)))
            .collect()
    }

    /// Lower every dimension of a container with `shape` to something the
    /// data layer can apply directly.
    ///
    /// Explicit dimensions beyond `shape` are lowered without a size and fail
    /// if they need one.
    pub fn asslice(&self, shape: &[i64]) -> Result<Vec<SliceSpec>> {
        let ndim = self.ndim().max(shape.len());
        (0..ndim)
            .map(|i| self.dim(i).asslice(shape.get(i).copied()))
            .collect()
    }
}

impl From<Vec<Range1D>> for Range {
    fn from(dims: Vec<Range1D>) -> Self {
        Self::new(dims)
    }
}

impl Index<usize> for Range {
    type Output = Range1D;

    fn index(&self, i: usize) -> &Range1D {
        &self.dims[i]
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, dim) in self.dims.iter().enumerate() {
            if i > 0 {
                write!(f, "{DIMENSION_SEPARATOR}")?;
            }
            write!(f, "{dim}")?;
        }
        Ok(())
    }
}

/// Split on separators outside of parentheses.
fn split_top_level(source: &str) -> Result<Vec<&str>> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut begin = 0;
    for (i, c) in source.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| RangeError::parse(source, "unbalanced parentheses"))?;
            }
            c if c == DIMENSION_SEPARATOR && depth == 0 => {
                parts.push(&source[begin..i]);
                begin = i + c.len_utf8();
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(RangeError::parse(source, "unbalanced parentheses"));
    }
    parts.push(&source[begin..]);
    Ok(parts)
}

impl FromStr for Range {
    type Err = RangeError;

    fn from_str(source: &str) -> Result<Self> {
        let text = source.trim();
        if text.is_empty() {
            return Ok(Self::all());
        }
        let dims = split_top_level(text)?
            .into_iter()
            .map(Range1D::from_str)
            .collect::<Result<Vec<_>>>()?;
        log::debug!("parsed range '{}' with {} dimension(s)", text, dims.len());
        Ok(Self { dims })
    }
}

impl Serialize for Range {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Range {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Range::parse(&s).map_err(serde::de::Error::custom)
    }
}
