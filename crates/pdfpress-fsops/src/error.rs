//! # Design
//!
//! - Constant-message errors; operation and path live in fields.
//! - Retry exhaustion keeps the final IO error as its source.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for filesystem operations.
pub type FsOpsResult<T> = Result<T, FsOpsError>;

/// Errors produced by filesystem helpers.
#[derive(Debug, Error)]
pub enum FsOpsError {
    /// IO failure that was not retried.
    #[error("fsops io failure")]
    Io {
        /// Operation that triggered the failure.
        operation: &'static str,
        /// Path involved in the failure.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// A retryable failure persisted through every attempt.
    #[error("fsops retries exhausted")]
    RetriesExhausted {
        /// Operation that was retried.
        operation: &'static str,
        /// Path involved in the failure.
        path: PathBuf,
        /// Attempts made before giving up.
        attempts: u32,
        /// Error from the final attempt.
        source: io::Error,
    },
}

impl FsOpsError {
    pub(crate) fn io(operation: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }

    /// Underlying IO error.
    #[must_use]
    pub const fn io_source(&self) -> &io::Error {
        match self {
            Self::Io { source, .. } | Self::RetriesExhausted { source, .. } => source,
        }
    }

    /// Single-line description including the underlying cause.
    #[must_use]
    pub fn describe(&self) -> String {
        format!("{self}: {}", self.io_source())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_source_exposes_underlying_error() {
        let err = FsOpsError::io("copy", "/tmp/x", io::Error::other("boom"));
        assert_eq!(err.to_string(), "fsops io failure");
        assert_eq!(err.io_source().to_string(), "boom");
        assert_eq!(err.describe(), "fsops io failure: boom");
    }
}
