//! # Design
//!
//! - Only unexpected failures surface here; tool failures are attempt results.
//! - Constant messages with the operation and path carried as fields.

use std::io;
use std::path::PathBuf;

use pdfpress_fsops::FsOpsError;
use thiserror::Error;

/// Result alias for compression operations.
pub type CompressResult<T> = Result<T, CompressError>;

/// Errors that abort processing of a single file.
#[derive(Debug, Error)]
pub enum CompressError {
    /// Filesystem operation failed.
    #[error("compression io failure")]
    Io {
        /// Operation identifier.
        operation: &'static str,
        /// Path involved in the failure.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// Copying an artifact into place failed.
    #[error("compression copy failure")]
    Copy {
        /// Artifact being copied.
        from: PathBuf,
        /// Underlying filesystem error.
        source: FsOpsError,
    },
    /// Request cannot be processed as given.
    #[error("invalid compression request")]
    InvalidRequest {
        /// Field that failed validation.
        field: &'static str,
        /// Static reason for the failure.
        reason: &'static str,
    },
}

impl CompressError {
    pub(crate) fn io(operation: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }

    /// Single-line description including the underlying cause.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Io {
                operation,
                path,
                source,
            } => format!("{operation} failed for {}: {source}", path.display()),
            Self::Copy { from, source } => {
                format!("copy of {} failed: {}", from.display(), source.io_source())
            }
            Self::InvalidRequest { field, reason } => format!("invalid {field}: {reason}"),
        }
    }
}
