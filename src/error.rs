//! Error type shared by all set and coordinate system operations.

use thiserror::Error;

/// Failure of a set or coordinate system operation.
///
/// Every variant carries a diagnostic message. Points that merely fall
/// outside a set are not errors; they are reported per point as NaN or `None`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SetError {
    /// Array shapes disagree with declared domain or manifold dimensions.
    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),
    /// Samples or grid lengths do not form a valid set.
    #[error("invalid grid: {0}")]
    InvalidGrid(String),
    /// Units cannot be converted into each other.
    #[error("non-convertible units: {0}")]
    IncompatibleUnits(String),
    /// The operation is not available for this kind of set.
    #[error("unimplemented: {0}")]
    Unimplemented(String),
    /// Coordinate systems or reference types do not fit together.
    #[error("inconsistent coordinate systems: {0}")]
    Inconsistent(String),
}

pub type Result<T> = std::result::Result<T, SetError>;

/// Returns early with the given `SetError` variant and a formatted message.
#[macro_export]
macro_rules! fail {
    ($kind:ident, $($fmt_arg:tt)*) => {
        return Err($crate::error::SetError::$kind(format!($($fmt_arg)*)))
    };
}

/// Returns early with the given `SetError` variant unless the condition holds.
#[macro_export]
macro_rules! ensure {
    ($logic:expr, $kind:ident, $($fmt_arg:tt)*) => {
        if !$logic {
            $crate::fail!($kind, $($fmt_arg)*);
        }
    };
}
