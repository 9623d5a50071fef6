//! Error and Result types for tickstore operations.

use std::io;
use thiserror::Error;

/// A convenience `Result` type for tickstore operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// The error type for storage-core operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Frame bytes were truncated, overwritten, or misaligned.
    ///
    /// Raised by the column stream read path when the trailing checksum
    /// byte does not match the expected sentinel, when a frame header or
    /// payload is cut short, or when the decoded entry count disagrees
    /// with the frame header. A corrupted frame cannot be partially
    /// trusted, so this is never retried internally.
    #[error("Corrupted data: {0}")]
    CorruptedData(String),

    /// Unsupported column stream frame version.
    #[error("Unsupported frame version: {0}")]
    UnsupportedVersion(u8),

    /// A column declared a value type with no matching codec or cursor.
    ///
    /// Fatal for that column only.
    #[error("Unsupported field type code: {0}")]
    UnsupportedType(u8),

    /// Buffer size arithmetic wrapped around.
    #[error("Buffer capacity overflow")]
    Overflow,

    /// B-tree degree below the structural minimum.
    #[error("B-tree degree must be at least 2, got {0}")]
    InvalidDegree(usize),

    /// Underlying I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
