//! Server-Sent Events for live session logs

use std::convert::Infallible;
use std::time::Duration;

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::Stream;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

use crate::AppState;

/// GET /api/events - SSE stream of session log entries
///
/// Each entry is sent with its kind (`log` or `error`) as the event name and
/// the JSON entry as data. Entries of every session started after the client
/// connects are streamed. The stream ends when the server begins shutting
/// down, so open clients do not hold graceful shutdown.
pub async fn event_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    info!("New SSE client connected to session events");

    let mut rx = state.events.subscribe();
    let shutdown = state.shutdown.clone();

    let stream = async_stream::stream! {
        loop {
            let received = tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    debug!("SSE: Server shutting down, closing stream");
                    break;
                }
                received = rx.recv() => received,
            };

            match received {
                Ok(entry) => {
                    let event_type = match entry.kind {
                        scout_common::LogKind::Log => "log",
                        scout_common::LogKind::Error => "error",
                    };
                    match serde_json::to_string(&entry) {
                        Ok(json) => yield Ok(Event::default().event(event_type).data(json)),
                        Err(e) => warn!("SSE: Failed to serialize log entry: {}", e),
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    debug!(skipped, "SSE: Client lagging, entries skipped");
                }
                Err(RecvError::Closed) => break,
            }
        }
    };

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("heartbeat"),
    )
}
