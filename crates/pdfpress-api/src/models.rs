//! Wire-level DTOs returned by the control surface.

use pdfpress_config::Settings;
use serde::{Deserialize, Serialize};

/// Result of a lifecycle or maintenance call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResponse {
    /// Whether the call changed state as requested.
    pub success: bool,
    /// Human-readable summary.
    pub message: String,
}

impl ActionResponse {
    pub(crate) fn new(success: bool, message: impl Into<String>) -> Self {
        Self {
            success,
            message: message.into(),
        }
    }
}

/// Body of `GET /api/status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Whether the monitor is running.
    pub running: bool,
    /// Files currently in flight.
    pub in_flight: usize,
    /// Current settings snapshot.
    pub config: Settings,
}

/// RFC9457 problem document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemDetails {
    /// Problem type URI.
    #[serde(rename = "type")]
    pub kind: String,
    /// Short summary.
    pub title: String,
    /// HTTP status code.
    pub status: u16,
    /// Occurrence-specific explanation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Offending request fields.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invalid_params: Option<Vec<ProblemInvalidParam>>,
}

/// Field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemInvalidParam {
    /// JSON pointer to the field.
    pub pointer: String,
    /// What was wrong with it.
    pub message: String,
}
