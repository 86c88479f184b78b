//! Event stream encoders
//!
//! A curriculum run produces a `Stream` of [`GenerationEvent`]s. These helpers
//! turn that stream into an HTTP response body without the producer knowing
//! about the wire format:
//! - NDJSON (`application/x-ndjson`): one JSON object per line
//! - SSE (`text/event-stream`): `event: <type>` + `data: <json>` frames

use axum::{
    body::Body,
    http::{header, HeaderValue, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
};
use futures::stream::{Stream, StreamExt};
use std::convert::Infallible;
use std::time::Duration;
use tracing::{debug, warn};

use crate::events::GenerationEvent;

/// Content type of newline-delimited JSON streams
pub const NDJSON_CONTENT_TYPE: &str = "application/x-ndjson";

/// Encode one event as a newline-terminated JSON line
pub fn encode_ndjson_line(event: &GenerationEvent) -> serde_json::Result<String> {
    let mut line = serde_json::to_string(event)?;
    line.push('\n');
    Ok(line)
}

/// Stream events as newline-delimited JSON
pub fn ndjson_response<S>(events: S) -> Response
where
    S: Stream<Item = GenerationEvent> + Send + 'static,
{
    let body = async_stream::stream! {
        futures::pin_mut!(events);
        while let Some(event) = events.next().await {
            match encode_ndjson_line(&event) {
                Ok(line) => {
                    debug!(event_type = event.event_type(), "NDJSON: Sending event");
                    yield Ok::<String, Infallible>(line);
                }
                Err(e) => {
                    warn!("NDJSON: Failed to serialize event {}: {}", event.event_type(), e);
                }
            }
        }
    };

    let mut response = (StatusCode::OK, Body::from_stream(body)).into_response();
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(NDJSON_CONTENT_TYPE),
    );
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    response
}

/// Stream events as Server-Sent Events
///
/// Each frame carries the event type as the SSE event name and the full JSON
/// envelope (including `type`) as data.
pub fn sse_response<S>(events: S) -> Sse<impl Stream<Item = Result<Event, Infallible>>>
where
    S: Stream<Item = GenerationEvent> + Send + 'static,
{
    let stream = async_stream::stream! {
        futures::pin_mut!(events);
        while let Some(event) = events.next().await {
            let event_type = event.event_type();
            match serde_json::to_string(&event) {
                Ok(event_json) => {
                    debug!("SSE: Sending event: {}", event_type);
                    yield Ok(Event::default().event(event_type).data(event_json));
                }
                Err(e) => {
                    warn!("SSE: Failed to serialize event {}: {}", event_type, e);
                }
            }
        }
    };

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("heartbeat"),
    )
}
