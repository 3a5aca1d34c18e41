//! Health and metrics endpoints.

use std::sync::Arc;

use axum::{Json, body::Body, extract::State, http::StatusCode, response::Response};
use pdfpress_telemetry::build_sha;
use serde::Serialize;
use tracing::error;

use crate::http::errors::ApiError;
use crate::state::ApiState;

#[derive(Debug, Serialize)]
pub(crate) struct HealthResponse {
    pub(crate) status: &'static str,
    pub(crate) build: &'static str,
    pub(crate) running: bool,
}

pub(crate) async fn health(State(state): State<Arc<ApiState>>) -> Json<HealthResponse> {
    let status = state.control.status().await;
    Json(HealthResponse {
        status: "ok",
        build: build_sha(),
        running: status.running,
    })
}

pub(crate) async fn metrics(State(state): State<Arc<ApiState>>) -> Result<Response, ApiError> {
    let body = state.telemetry.render().map_err(|err| {
        error!(error = %err, "failed to render metrics");
        ApiError::internal("failed to render metrics")
    })?;
    Response::builder()
        .status(StatusCode::OK)
        .header(
            axum::http::header::CONTENT_TYPE,
            "text/plain; version=0.0.4",
        )
        .body(Body::from(body))
        .map_err(|err| {
            error!(error = %err, "failed to build metrics response");
            ApiError::internal("failed to build metrics response")
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::test_support::state;

    #[tokio::test]
    async fn health_reports_run_state() {
        let (state, control) = state();
        assert!(!health(State(state.clone())).await.running);
        control.set_running(true);
        let Json(body) = health(State(state)).await;
        assert_eq!(body.status, "ok");
        assert!(body.running);
    }

    #[tokio::test]
    async fn metrics_renders_prometheus_text() {
        let (state, _) = state();
        state.telemetry.set_ingestion_running(true);
        let response = metrics(State(state)).await.expect("metrics response");
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let text = String::from_utf8(bytes.to_vec()).expect("utf8");
        assert!(text.contains("ingestion_running 1"));
    }
}
