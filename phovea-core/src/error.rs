//! Range engine error types.
//!
//! Every variant carries a stable `error_type()` string so that callers
//! exposing the engine over HTTP can report a machine readable kind next to
//! the human message.

use thiserror::Error;

/// Error raised by the range addressing engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RangeError {
    /// A field of a range string is not a valid integer.
    #[error("invalid range '{text}': {reason}")]
    Parse { text: String, reason: String },

    /// A range element was constructed with a step of zero.
    #[error("range step must not be zero")]
    ZeroStep,

    /// The step sign disagrees with the direction implied by start and end.
    #[error("step {step} cannot walk from {start} to {end}")]
    DirectionMismatch { start: i64, end: i64, step: i64 },

    /// The operation needs the dimension size, which was not supplied.
    #[error("ambiguous range {range}: dimension size is unknown")]
    Unbound { range: String },

    /// Index arithmetic on the range leaves the `i64` domain.
    #[error("range {range} exceeds the supported index domain")]
    Overflow { range: String },

    /// A resolved index lies outside the addressed container.
    #[error("index {index} is out of bounds for dimension of size {size}")]
    OutOfBounds { index: i64, size: i64 },
}

impl RangeError {
    /// Create a parse error for the given input.
    pub fn parse(text: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Parse {
            text: text.into(),
            reason: reason.into(),
        }
    }

    /// Create an "unbound range" error for the given range description.
    pub fn unbound(range: impl ToString) -> Self {
        Self::Unbound {
            range: range.to_string(),
        }
    }

    /// Create an overflow error for the given range description.
    pub fn overflow(range: impl ToString) -> Self {
        Self::Overflow {
            range: range.to_string(),
        }
    }

    /// Get the error type as a string.
    ///
    /// These strings are stable.
    pub fn error_type(&self) -> &'static str {
        match self {
            RangeError::Parse { .. } => "range_parse_error",
            RangeError::ZeroStep => "zero_step",
            RangeError::DirectionMismatch { .. } => "direction_mismatch",
            RangeError::Unbound { .. } => "unbound_range",
            RangeError::Overflow { .. } => "range_overflow",
            RangeError::OutOfBounds { .. } => "out_of_bounds",
        }
    }

    /// Whether the error was caused by malformed client input (HTTP 400).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            RangeError::Parse { .. }
                | RangeError::ZeroStep
                | RangeError::DirectionMismatch { .. }
                | RangeError::Overflow { .. }
        )
    }

    /// Check if this is a parse error.
    pub fn is_parse_error(&self) -> bool {
        matches!(self, RangeError::Parse { .. })
    }

    /// Check if this is an unbound range error.
    pub fn is_unbound(&self) -> bool {
        matches!(self, RangeError::Unbound { .. })
    }
}

pub type Result<T> = std::result::Result<T, RangeError>;
