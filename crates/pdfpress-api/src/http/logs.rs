//! Activity log endpoints.
//!
//! # Design
//! - `GET` returns the retained records, newest first.
//! - The stream endpoint pushes new records as SSE without replaying history.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json,
    extract::State,
    response::sse::{self, Sse},
};
use futures_core::Stream;
use pdfpress_events::{ActivityRecord, ActivityStream};

use crate::http::constants::SSE_KEEP_ALIVE_SECS;
use crate::models::ActionResponse;
use crate::state::ApiState;

pub(crate) async fn list_logs(State(state): State<Arc<ApiState>>) -> Json<Vec<ActivityRecord>> {
    Json(state.activity.snapshot())
}

pub(crate) async fn clear_logs(State(state): State<Arc<ApiState>>) -> Json<ActionResponse> {
    state.activity.clear();
    Json(ActionResponse::new(true, pdfpress_events::CLEARED_MESSAGE))
}

pub(crate) async fn stream_logs(
    State(state): State<Arc<ApiState>>,
) -> Sse<impl Stream<Item = Result<sse::Event, Infallible>> + Send> {
    Sse::new(activity_events(state.activity.subscribe())).keep_alive(
        sse::KeepAlive::new()
            .interval(Duration::from_secs(SSE_KEEP_ALIVE_SECS))
            .text("keep-alive"),
    )
}

fn activity_events(
    stream: ActivityStream,
) -> impl Stream<Item = Result<sse::Event, Infallible>> + Send {
    futures_util::stream::unfold(stream, |mut stream| async move {
        let record = stream.next().await?;
        Some((Ok(to_event(&record)), stream))
    })
}

fn to_event(record: &ActivityRecord) -> sse::Event {
    sse::Event::default()
        .event("activity")
        .id(record.id.to_string())
        .json_data(record)
        .unwrap_or_else(|err| {
            sse::Event::default()
                .event("activity_status")
                .data(format!("failed to encode record {}: {err}", record.id))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::test_support::state;
    use futures_util::StreamExt;
    use pdfpress_events::Severity;
    use std::pin::pin;
    use tokio::time::timeout;

    #[tokio::test]
    async fn list_is_newest_first_and_clear_leaves_marker() {
        let (state, _) = state();
        state.activity.info("first");
        state.activity.warning("second");

        let Json(records) = list_logs(State(state.clone())).await;
        assert_eq!(records[0].message, "second");
        assert_eq!(records[1].severity, Severity::Info);

        let Json(cleared) = clear_logs(State(state.clone())).await;
        assert!(cleared.success);
        let Json(records) = list_logs(State(state)).await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].message, pdfpress_events::CLEARED_MESSAGE);
    }

    #[tokio::test]
    async fn stream_yields_new_records() {
        let (state, _) = state();
        let mut events = pin!(activity_events(state.activity.subscribe()));
        state.activity.success("compressed");
        let next = timeout(Duration::from_secs(2), events.next())
            .await
            .expect("stream item in time");
        assert!(matches!(next, Some(Ok(_))));
    }
}
