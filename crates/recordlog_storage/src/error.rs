//! Error types for log targets.

use std::io;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur while writing to a log target.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The target has been closed.
    #[error("log target is closed")]
    Closed,
}

impl StorageError {
    /// Returns true if this error came from the operating system.
    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io(_))
    }
}
