//! Error types for observable arrays.

use thiserror::Error;

/// Main error type for array operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArrayError {
    #[error("Change event must carry at least one inserted, removed or updated element")]
    InvalidEvent,

    #[error("Index {index} out of bounds (len {len})")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("Range {start}..{end} out of bounds (len {len})")]
    RangeOutOfBounds { start: usize, end: usize, len: usize },

    #[error("Operation requires a non-empty array")]
    EmptyContainer,
}

/// Result type for array operations.
pub type Result<T> = std::result::Result<T, ArrayError>;
