//! Server-Sent Events feed of trace activity.

use std::convert::Infallible;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio::sync::broadcast::error::RecvError;

use crate::api::AppState;
use crate::services::TraceEvent;

/// `GET /api/v1/traces:stream`
///
/// Emits `trace_recorded` and `check_recorded` events as they happen. A
/// client that falls behind receives a `lagged` event with the number of
/// events it missed. Nothing is replayed.
#[utoipa::path(
    get,
    path = "/api/v1/traces:stream",
    tag = "traces",
    operation_id = "traces.stream",
    responses(
        (status = 200, description = "text/event-stream of trace events", content_type = "text/event-stream", body = String),
    )
)]
pub async fn stream_traces(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let mut rx = state.events.subscribe();
    tracing::debug!(subscribers = state.events.subscriber_count(), "Trace stream opened");

    let stream = async_stream::stream! {
        loop {
            match rx.recv().await {
                Ok(event) => yield Ok(to_sse(&event)),
                Err(RecvError::Lagged(missed)) => {
                    tracing::warn!(missed, "Trace stream subscriber lagged");
                    yield Ok(Event::default().event("lagged").data(missed.to_string()));
                }
                Err(RecvError::Closed) => break,
            }
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::default())
}

fn to_sse(event: &TraceEvent) -> Event {
    let base = Event::default().event(event.name());
    match serde_json::to_string(event) {
        Ok(json) => base.data(json),
        Err(e) => {
            tracing::error!(error = %e, event = event.name(), "Failed to serialize trace event");
            base.comment("serialization-error")
        }
    }
}
