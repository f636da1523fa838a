//! Error types for contourmatch.

use thiserror::Error;

/// Result alias for contourmatch operations.
pub type ContourMatchResult<T> = std::result::Result<T, ContourMatchError>;

/// Errors that can occur when extracting, storing or matching contours.
///
/// An unrecognized contour is not an error: the finder reports it as `None`.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ContourMatchError {
    /// Image dimensions are zero or overflow.
    #[error("invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },
    /// Row stride is smaller than the image width.
    #[error("invalid stride {stride} for width {width}")]
    InvalidStride { width: usize, stride: usize },
    /// Backing buffer is too small for the requested view.
    #[error("buffer too small: needed {needed} elements, got {got}")]
    BufferTooSmall { needed: usize, got: usize },
    /// The contour cannot be normalized into a descriptor.
    #[error("degenerate contour: {reason}")]
    DegenerateContour { reason: &'static str },
    /// Persisted template data is malformed or of an unknown version.
    #[error("corrupt template store: {reason}")]
    CorruptStore { reason: String },
    /// A configuration value is out of range.
    #[error("invalid configuration for `{field}`: {reason}")]
    InvalidConfig {
        field: &'static str,
        reason: &'static str,
    },
    /// No template with the given name exists in the store.
    #[error("unknown template `{name}`")]
    UnknownTemplate { name: String },
    /// A template with the given name already exists in the store.
    #[error("duplicate template `{name}`")]
    DuplicateTemplate { name: String },
    /// Image decoding failed.
    #[error("image I/O failed: {reason}")]
    ImageIo { reason: String },
    /// Reading or writing persisted data failed.
    #[error("I/O failed: {reason}")]
    Io { reason: String },
}

impl From<std::io::Error> for ContourMatchError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            reason: err.to_string(),
        }
    }
}
