//! Error types for configuration operations.
//!
//! # Design
//! - Constant messages; context lives in fields.
//! - `describe` renders an operator-facing sentence for the activity log.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Primary error type for configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required field was empty.
    #[error("missing configuration field")]
    MissingField {
        /// Name of the empty field.
        field: &'static str,
    },
    /// Field contained an invalid value.
    #[error("invalid configuration field")]
    InvalidField {
        /// Section that failed validation.
        section: &'static str,
        /// Field that failed validation.
        field: String,
        /// Offending value when available.
        value: Option<String>,
        /// Machine-readable reason for the failure.
        reason: &'static str,
    },
    /// Field did not exist in the target section.
    #[error("unknown configuration field")]
    UnknownField {
        /// Section where the unknown field was encountered.
        section: String,
        /// Name of the unexpected field.
        field: String,
    },
    /// A configured path does not exist on disk.
    #[error("configured path does not exist")]
    PathNotFound {
        /// Field holding the path.
        field: &'static str,
        /// Path that could not be found.
        path: PathBuf,
    },
    /// File system operation failed.
    #[error("filesystem operation failed")]
    Io {
        /// Operation identifier.
        operation: &'static str,
        /// Path involved in the failure.
        path: PathBuf,
        /// Source IO error.
        source: io::Error,
    },
    /// JSON encoding or decoding failed.
    #[error("configuration json failure")]
    Json {
        /// Operation identifier.
        operation: &'static str,
        /// Source serde error.
        source: serde_json::Error,
    },
}

impl ConfigError {
    pub(crate) fn io(operation: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }

    pub(crate) const fn json(operation: &'static str, source: serde_json::Error) -> Self {
        Self::Json { operation, source }
    }

    pub(crate) fn invalid(
        section: &'static str,
        field: impl Into<String>,
        value: Option<String>,
        reason: &'static str,
    ) -> Self {
        Self::InvalidField {
            section,
            field: field.into(),
            value,
            reason,
        }
    }

    /// Render the error as a single operator-facing sentence.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::MissingField { field } => format!("{field} is not defined"),
            Self::InvalidField {
                section,
                field,
                value,
                reason,
            } => match value {
                Some(value) => format!("invalid {section}.{field} '{value}': {reason}"),
                None => format!("invalid {section}.{field}: {reason}"),
            },
            Self::UnknownField { section, field } => {
                format!("unknown field '{field}' in '{section}'")
            }
            Self::PathNotFound { field, path } => {
                format!("{field} does not exist: {}", path.display())
            }
            Self::Io {
                operation,
                path,
                source,
            } => format!("{operation} failed for {}: {source}", path.display()),
            Self::Json { operation, source } => format!("{operation} failed: {source}"),
        }
    }
}

/// Convenience alias for configuration results.
pub type ConfigResult<T> = Result<T, ConfigError>;
