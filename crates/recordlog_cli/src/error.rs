//! CLI error type.

use thiserror::Error;

/// Result type for CLI commands.
pub type CliResult<T> = Result<T, CliError>;

/// Errors reported by the `recordlog` commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// Reading, writing or compressing a log failed.
    #[error(transparent)]
    Core(#[from] recordlog_core::CoreError),

    /// A record could not be rendered.
    #[error("unable to render record: {0}")]
    Codec(#[from] recordlog_codec::CodecError),

    /// Pretty output failed.
    #[error("unable to render record: {0}")]
    Json(#[from] serde_json::Error),

    /// Writing to stdout failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// One or more files did not verify.
    #[error("{failed} of {total} files failed verification")]
    VerificationFailed {
        /// Files with a fatal or malformed record.
        failed: usize,
        /// Files checked.
        total: usize,
    },

    /// Bad command-line input.
    #[error("{0}")]
    Usage(String),
}
