//! Error types for the codec crate.

use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur during encoding or decoding.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// A value cannot be represented on the wire.
    ///
    /// This is a caller programming error (non-text map key, non-finite
    /// float, malformed decimal literal), never an I/O condition.
    #[error("unsupported value shape: {message}")]
    ValueShape {
        /// Description of the offending value.
        message: String,
    },

    /// Failed to decode a record line.
    #[error("decoding failed at byte {offset}: {message}")]
    DecodingFailed {
        /// Byte offset within the decoded slice.
        offset: usize,
        /// Description of the decoding error.
        message: String,
    },

    /// Invalid UTF-8 in a text literal.
    #[error("invalid UTF-8 string at byte {offset}")]
    InvalidUtf8 {
        /// Byte offset of the string literal.
        offset: usize,
    },

    /// Unexpected end of input.
    #[error("unexpected end of input")]
    UnexpectedEof,

    /// Nesting of lists and maps exceeds the decoder limit.
    #[error("nesting depth exceeds {max_depth}")]
    NestingTooDeep {
        /// Maximum supported depth.
        max_depth: usize,
    },

    /// Bytes remain after a complete value.
    #[error("trailing data at byte {offset}")]
    TrailingData {
        /// Offset of the first unexpected byte.
        offset: usize,
    },
}

impl CodecError {
    /// Create a value shape error.
    pub fn value_shape(message: impl Into<String>) -> Self {
        Self::ValueShape {
            message: message.into(),
        }
    }

    /// Create a decoding failed error.
    pub fn decoding_failed(offset: usize, message: impl Into<String>) -> Self {
        Self::DecodingFailed {
            offset,
            message: message.into(),
        }
    }

    /// Returns true if this error is a caller programming error.
    pub fn is_value_shape(&self) -> bool {
        matches!(self, Self::ValueShape { .. })
    }
}
