//! Error types for slicetex.

use thiserror::Error;

/// The main error type for slicetex operations.
#[derive(Error, Debug)]
pub enum SliceError {
    /// An extent whose minimum exceeds its maximum on some axis.
    #[error("invalid extent {0:?}")]
    InvalidExtent([i32; 6]),

    /// Data size mismatch.
    #[error("data size mismatch: expected {expected}, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    /// Unsupported number of scalar components.
    #[error("unsupported component count {0} (expected 1 to 4)")]
    UnsupportedComponents(usize),

    /// A lookup table without entries.
    #[error("lookup table has no entries")]
    EmptyLookupTable,

    /// A color map name that is not registered.
    #[error("color map '{0}' not found")]
    ColorMapNotFound(String),

    /// A direction matrix that cannot be inverted.
    #[error("direction matrix is singular")]
    SingularDirection,

    /// Failure reported by the rendering backend.
    #[error("backend error: {0}")]
    Backend(String),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// A specialized Result type for slicetex operations.
pub type Result<T> = std::result::Result<T, SliceError>;
