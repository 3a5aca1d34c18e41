//! RFC9457-style API error wrapper.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use pdfpress_config::ConfigError;

use crate::http::constants::{PROBLEM_CONFIG_INVALID, PROBLEM_INTERNAL};
use crate::models::{ProblemDetails, ProblemInvalidParam};

/// Structured API error with optional RFC9457 fields.
#[derive(Debug)]
pub(crate) struct ApiError {
    pub(crate) status: StatusCode,
    pub(crate) kind: &'static str,
    title: &'static str,
    detail: Option<String>,
    pub(crate) invalid_params: Option<Vec<ProblemInvalidParam>>,
}

impl ApiError {
    const fn new(status: StatusCode, kind: &'static str, title: &'static str) -> Self {
        Self {
            status,
            kind,
            title,
            detail: None,
            invalid_params: None,
        }
    }

    pub(crate) fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub(crate) fn with_invalid_params(mut self, params: Vec<ProblemInvalidParam>) -> Self {
        self.invalid_params = Some(params);
        self
    }

    pub(crate) fn internal(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            PROBLEM_INTERNAL,
            "internal server error",
        )
        .with_detail(message)
    }

    pub(crate) fn config_invalid(detail: impl Into<String>) -> Self {
        Self::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            PROBLEM_CONFIG_INVALID,
            "configuration invalid",
        )
        .with_detail(detail)
    }

    /// Map a rejected settings save onto a problem response.
    pub(crate) fn from_config(err: &ConfigError) -> Self {
        match err {
            ConfigError::Io { .. } => Self::internal("failed to persist configuration"),
            ConfigError::InvalidField { section, field, .. } => {
                Self::config_invalid(err.describe()).with_invalid_params(vec![
                    ProblemInvalidParam {
                        pointer: pointer_for(section, field),
                        message: err.describe(),
                    },
                ])
            }
            ConfigError::UnknownField { section, field } => {
                Self::config_invalid(err.describe()).with_invalid_params(vec![
                    ProblemInvalidParam {
                        pointer: pointer_for(section, field),
                        message: "unknown field".to_string(),
                    },
                ])
            }
            _ => Self::config_invalid(err.describe()),
        }
    }
}

fn pointer_for(section: &str, field: &str) -> String {
    let path = field.replace('.', "/");
    if section == "settings" {
        format!("/{path}")
    } else {
        format!("/{section}/{path}")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ProblemDetails {
            kind: self.kind.to_string(),
            title: self.title.to_string(),
            status: self.status.as_u16(),
            detail: self.detail,
            invalid_params: self.invalid_params,
        };
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::path::PathBuf;

    #[test]
    fn invalid_field_carries_pointer() {
        let err = ConfigError::InvalidField {
            section: "policy",
            field: "color.resolution".to_string(),
            value: Some("0".to_string()),
            reason: "must_be_positive",
        };
        let api = ApiError::from_config(&err);
        assert_eq!(api.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(api.kind, PROBLEM_CONFIG_INVALID);
        let params = api.invalid_params.expect("invalid params");
        assert_eq!(params[0].pointer, "/policy/color/resolution");
    }

    #[test]
    fn unknown_top_level_field_points_at_root() {
        let err = ConfigError::UnknownField {
            section: "settings".to_string(),
            field: "watch_dir".to_string(),
        };
        let params = ApiError::from_config(&err)
            .invalid_params
            .expect("invalid params");
        assert_eq!(params[0].pointer, "/watch_dir");
    }

    #[test]
    fn io_failures_are_internal() {
        let err = ConfigError::Io {
            operation: "config.write",
            path: PathBuf::from("/ro/config.json"),
            source: io::Error::from(io::ErrorKind::PermissionDenied),
        };
        let api = ApiError::from_config(&err);
        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(api.invalid_params.is_none());
    }
}
