//! Error types for the directory monitor.

use std::path::PathBuf;

use thiserror::Error;

/// Result alias for monitor operations.
pub type WatchResult<T> = Result<T, WatchError>;

/// Failures raised while starting a watch.
#[derive(Debug, Error)]
pub enum WatchError {
    /// The watched root is missing or not a directory.
    #[error("watch root is not a directory")]
    NotADirectory {
        /// Offending root.
        path: PathBuf,
    },
    /// The notification backend rejected the request.
    #[error("watch backend failure")]
    Backend {
        /// Operation identifier.
        operation: &'static str,
        /// Root being watched.
        path: PathBuf,
        /// Underlying backend error.
        source: notify::Error,
    },
}

impl WatchError {
    /// Render the error as a single operator-facing sentence.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::NotADirectory { path } => format!("{} is not a directory", path.display()),
            Self::Backend {
                operation,
                path,
                source,
            } => format!("{operation} failed for {}: {source}", path.display()),
        }
    }
}
