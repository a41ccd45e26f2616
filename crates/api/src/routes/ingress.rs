//! Subscriber event ingress: the endpoint the event store broadcasts to.

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};

use crate::error::ApiError;
use crate::worker::WorkQueue;

/// POST /event: decodes a broadcast event and queues it for the worker.
///
/// Acceptance means queued, not applied. Events that arrive while the
/// projection is still loading history are held by the worker.
pub async fn receive(
    State(queue): State<WorkQueue>,
    headers: HeaderMap,
    body: String,
) -> Result<StatusCode, ApiError> {
    let event = event_store::wire::stored_event_from_request(&headers, body)?;
    tracing::debug!(
        event_index = %event.event_index,
        event_type = %event.event_type,
        "event received"
    );
    queue.submit_event(event).await?;
    metrics::counter!("events_received_total").increment(1);
    Ok(StatusCode::ACCEPTED)
}
