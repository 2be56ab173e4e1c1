//! Error types for boxfit.

use thiserror::Error;

use crate::cuboid::MAX_EDGE;

/// Result type alias for boxfit operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Caller misuse detected at construction or call time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A cuboid edge is zero or too long.
    #[error("invalid dimension {value}: edges must lie in 1..={max}", max = MAX_EDGE)]
    InvalidDimension { value: u32 },

    /// A call argument is out of range.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Text that does not describe a cuboid.
    #[error("cannot parse `{0}` as a cuboid, expected WIDTHxHEIGHTxLENGTH")]
    Parse(String),
}
