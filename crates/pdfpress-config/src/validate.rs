//! Validation helpers for configuration documents.

use crate::defaults::ALLOWED_COMPATIBILITY_LEVELS;
use crate::error::{ConfigError, ConfigResult};
use crate::model::{ChannelPolicy, CompressionPolicy, Settings};

/// Validate the invariants of a compression policy.
///
/// # Errors
///
/// Returns the first [`ConfigError::InvalidField`] encountered.
pub fn validate_policy(policy: &CompressionPolicy) -> ConfigResult<()> {
    let level = policy.compatibility_level.trim();
    if !ALLOWED_COMPATIBILITY_LEVELS.contains(&level) {
        return Err(ConfigError::invalid(
            "policy",
            "compatibility_level",
            Some(policy.compatibility_level.clone()),
            "unsupported_level",
        ));
    }

    validate_channel("color", &policy.color)?;
    validate_channel("gray", &policy.gray)?;
    validate_channel("mono", &policy.mono)?;
    Ok(())
}

fn validate_channel(channel: &'static str, policy: &ChannelPolicy) -> ConfigResult<()> {
    if policy.resolution == 0 {
        return Err(ConfigError::invalid(
            "policy",
            format!("{channel}.resolution"),
            Some(policy.resolution.to_string()),
            "must_be_positive",
        ));
    }
    if !policy.threshold.is_finite() || policy.threshold <= 0.0 {
        return Err(ConfigError::invalid(
            "policy",
            format!("{channel}.threshold"),
            Some(policy.threshold.to_string()),
            "must_be_positive",
        ));
    }
    Ok(())
}

/// Check that the settings describe a pipeline that can start.
///
/// Collects every problem rather than stopping at the first so operators see
/// the full list at once.
#[must_use]
pub fn validate_for_start(settings: &Settings) -> Vec<ConfigError> {
    let mut errors = Vec::new();

    let source = settings.source_dir();
    if source.as_os_str().is_empty() {
        errors.push(ConfigError::MissingField {
            field: "source_path",
        });
    } else {
        let path = source.as_path();
        if !path.exists() {
            errors.push(ConfigError::PathNotFound {
                field: "source_path",
                path: path.to_path_buf(),
            });
        } else if !path.is_dir() {
            errors.push(ConfigError::invalid(
                "paths",
                "source_path",
                Some(path.display().to_string()),
                "not_a_directory",
            ));
        }
    }

    if settings.dest_dir().as_os_str().is_empty() {
        errors.push(ConfigError::MissingField { field: "dest_path" });
    }

    if let Err(err) = validate_policy(&settings.policy) {
        errors.push(err);
    }

    errors
}
