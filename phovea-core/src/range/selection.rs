//! "Everything" versus an explicit range address.

use super::{Range, Range1D};
use crate::error::Result;

/// What a request asked for.
///
/// An absent `range` parameter is [`Selection::All`] and never reaches the
/// parser; an explicit `Range::all()` is still [`Selection::Explicit`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    All,
    Explicit(Range),
}

impl Selection {
    /// Build from an optional query parameter value.
    pub fn from_query(value: Option<&str>) -> Result<Self> {
        match value {
            None => Ok(Selection::All),
            Some(text) => Range::parse(text).map(Selection::Explicit),
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Selection::All)
    }

    pub fn range(&self) -> Option<&Range> {
        match self {
            Selection::All => None,
            Selection::Explicit(range) => Some(range),
        }
    }

    /// Selection of dimension `i`, `None` when everything is selected.
    pub fn dim(&self, i: usize) -> Option<Range1D> {
        self.range().map(|r| r.dim(i))
    }

    /// Pick the selected items out of one dimension's data.
    pub fn select<T: Clone>(&self, dim: usize, data: &[T]) -> Result<Vec<T>> {
        match self.dim(dim) {
            None => Ok(data.to_vec()),
            Some(range) => range.select(data),
        }
    }
}

impl From<Range> for Selection {
    fn from(range: Range) -> Self {
        Selection::Explicit(range)
    }
}
