//! Configuration endpoints.

use std::sync::Arc;

use axum::{Json, extract::State};
use pdfpress_config::Settings;
use serde_json::Value;
use tracing::warn;

use crate::http::errors::ApiError;
use crate::models::ActionResponse;
use crate::state::ApiState;

pub(crate) async fn get_config(State(state): State<Arc<ApiState>>) -> Json<Settings> {
    Json(state.config.get().await)
}

/// Apply a partial settings document; the pipeline restarts if it was running.
pub(crate) async fn update_config(
    State(state): State<Arc<ApiState>>,
    Json(patch): Json<Value>,
) -> Result<Json<ActionResponse>, ApiError> {
    state
        .control
        .reconfigure(patch)
        .await
        .map(|_| Json(ActionResponse::new(true, "Configuration saved")))
        .map_err(|err| {
            warn!(error = %err.describe(), "configuration update rejected");
            ApiError::from_config(&err)
        })
}
