//! Error types for editor operations.

use thiserror::Error;

use crate::codec::DecodeError;

/// Result type for editor operations.
pub type EditorResult<T> = Result<T, EditorError>;

/// Errors that can occur in editor operations.
///
/// Geometry and persistence failures are always recovered internally: the
/// operation that produced them is aborted and prior valid state is kept.
/// Only [`EditorError::Template`] represents a condition worth surfacing.
#[derive(Debug, Error)]
pub enum EditorError {
    /// A viewport calculation produced a non-finite or degenerate result.
    #[error("geometry error: {0}")]
    Geometry(String),

    /// Writing state to the address bar failed.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// No usable template is available.
    #[error("template error: {0}")]
    Template(String),

    /// A share token could not be decoded.
    #[error(transparent)]
    Decode(#[from] DecodeError),
}
