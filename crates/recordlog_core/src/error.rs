//! Error types for recordlog core.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in recordlog core operations.
///
/// Writing never surfaces I/O trouble through this type: the sink logs and
/// drops instead. What reaches callers are state errors, value-shape errors
/// and reader failures.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Log target error.
    #[error("storage error: {0}")]
    Storage(#[from] recordlog_storage::StorageError),

    /// JSON codec error.
    #[error("codec error: {0}")]
    Codec(#[from] recordlog_codec::CodecError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Compression error.
    #[error("compression error: {0}")]
    Compression(#[from] CompressError),

    /// Operation not permitted in current state.
    #[error("invalid operation: {message}")]
    InvalidOperation {
        /// Description of why operation is invalid.
        message: String,
    },

    /// Configuration rejected by validation.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the problem.
        message: String,
    },

    /// A record does not fit in the reader's maximum buffer.
    #[error("record exceeds maximum buffer size of {max_buffer_size} bytes")]
    RecordTooLarge {
        /// The configured maximum.
        max_buffer_size: usize,
    },

    /// The stream ended in the middle of a record.
    #[error("stream ended inside a record after {buffered} buffered bytes")]
    TruncatedStream {
        /// Bytes of the incomplete record that were read.
        buffered: usize,
    },
}

impl CoreError {
    /// Creates an invalid operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }

    /// Creates an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Returns true for errors caused by using a closed component.
    pub fn is_invalid_operation(&self) -> bool {
        matches!(self, Self::InvalidOperation { .. })
    }

    /// Returns true if the reader cannot continue after this error.
    pub fn is_fatal_for_reader(&self) -> bool {
        !matches!(self, Self::Codec(_))
    }
}

/// Errors from compressing a retired log file.
#[derive(Debug, Error)]
pub enum CompressError {
    /// I/O error while reading the source or writing the archive.
    #[error("I/O error compressing {}: {source}", .path.display())]
    Io {
        /// The file being compressed.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: io::Error,
    },

    /// The zip writer failed.
    #[error("zip error compressing {}: {source}", .path.display())]
    Zip {
        /// The file being compressed.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: zip::result::ZipError,
    },

    /// The source file has no usable file name.
    #[error("invalid source path: {}", .path.display())]
    InvalidSource {
        /// The rejected path.
        path: PathBuf,
    },
}

impl CompressError {
    /// Creates an I/O error for the given path.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates a zip error for the given path.
    pub fn zip(path: impl Into<PathBuf>, source: zip::result::ZipError) -> Self {
        Self::Zip {
            path: path.into(),
            source,
        }
    }
}
