//! Lifecycle endpoints.

use std::sync::Arc;

use axum::{Json, extract::State};
use tracing::info;

use crate::models::{ActionResponse, StatusResponse};
use crate::state::ApiState;

pub(crate) async fn start(State(state): State<Arc<ApiState>>) -> Json<ActionResponse> {
    let started = state.control.start().await;
    info!(started, "start requested");
    let message = if started {
        "Watcher started"
    } else {
        "Failed to start watcher"
    };
    Json(ActionResponse::new(started, message))
}

pub(crate) async fn stop(State(state): State<Arc<ApiState>>) -> Json<ActionResponse> {
    let stopped = state.control.stop().await;
    info!(stopped, "stop requested");
    let message = if stopped {
        "Watcher stopped"
    } else {
        "Watcher is not running"
    };
    Json(ActionResponse::new(stopped, message))
}

pub(crate) async fn status(State(state): State<Arc<ApiState>>) -> Json<StatusResponse> {
    let status = state.control.status().await;
    Json(StatusResponse {
        running: status.running,
        in_flight: status.in_flight,
        config: state.config.get().await,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::test_support::state;

    #[tokio::test]
    async fn start_then_stop_round_trips_state() {
        let (state, _) = state();

        let Json(first) = start(State(state.clone())).await;
        assert!(first.success);
        let Json(second) = start(State(state.clone())).await;
        assert!(!second.success);

        let Json(current) = status(State(state.clone())).await;
        assert!(current.running);

        let Json(stopped) = stop(State(state.clone())).await;
        assert!(stopped.success);
        let Json(again) = stop(State(state)).await;
        assert!(!again.success);
        assert_eq!(again.message, "Watcher is not running");
    }
}
