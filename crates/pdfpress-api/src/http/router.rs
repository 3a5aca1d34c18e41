//! Router construction and server host for the control surface.

use std::future::Future;
use std::io;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    http::Request,
    routing::{get, post},
};
use pdfpress_telemetry::{build_sha, propagate_request_id_layer, set_request_id_layer};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::Span;

use crate::http::constants::HEADER_REQUEST_ID;
use crate::http::control::{start, status, stop};
use crate::http::health::{health, metrics};
use crate::http::logs::{clear_logs, list_logs, stream_logs};
use crate::http::settings::{get_config, update_config};
use crate::http::telemetry::HttpMetricsLayer;
use crate::state::ApiState;

/// Axum router wrapper hosting the control surface.
pub struct ApiServer {
    router: Router,
}

impl ApiServer {
    /// Build the router with tracing, request ids, CORS, and request metrics.
    #[must_use]
    pub fn new(state: ApiState) -> Self {
        let telemetry = state.telemetry.clone();
        let state = Arc::new(state);

        let trace_layer = TraceLayer::new_for_http()
            .make_span_with(|request: &Request<_>| {
                let request_id = request
                    .headers()
                    .get(HEADER_REQUEST_ID)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("")
                    .to_string();
                tracing::info_span!(
                    "http.request",
                    method = %request.method(),
                    route = %request.uri().path(),
                    request_id = %request_id,
                    build_sha = %build_sha(),
                    status_code = tracing::field::Empty,
                    latency_ms = tracing::field::Empty
                )
            })
            .on_request(|_request: &Request<_>, _span: &Span| {})
            .on_response(
                |response: &axum::response::Response, latency: Duration, span: &Span| {
                    span.record("status_code", response.status().as_u16());
                    let latency_ms = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);
                    span.record("latency_ms", latency_ms);
                },
            );
        let layered = ServiceBuilder::new()
            .layer(set_request_id_layer())
            .layer(propagate_request_id_layer())
            .layer(trace_layer)
            .layer(HttpMetricsLayer::new(telemetry));

        let router = Self::routes()
            .layer(CorsLayer::permissive())
            .route_layer(layered)
            .with_state(state);

        Self { router }
    }

    fn routes() -> Router<Arc<ApiState>> {
        Router::new()
            .route("/health", get(health))
            .route("/metrics", get(metrics))
            .route("/api/config", get(get_config).post(update_config))
            .route("/api/start", post(start))
            .route("/api/stop", post(stop))
            .route("/api/status", get(status))
            .route("/api/logs", get(list_logs).delete(clear_logs))
            .route("/api/logs/stream", get(stream_logs))
    }

    /// Consume the server and return the underlying router.
    #[must_use]
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Serve on `listener` until `shutdown` resolves.
    ///
    /// # Errors
    ///
    /// Returns an error if the server terminates unexpectedly.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if let Ok(addr) = listener.local_addr() {
            tracing::info!(%addr, "control surface listening");
        }
        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await
    }
}
