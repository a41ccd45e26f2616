//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::DomainError;
use event_store::EventStoreError;
use projections::ProjectionError;
use saga::SagaError;
use thiserror::Error;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// The service cannot take work right now.
    Unavailable(String),
    /// Domain logic error.
    Domain(DomainError),
    /// Event decoding or log error.
    EventStore(EventStoreError),
    /// Projection query error.
    Projection(ProjectionError),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            ApiError::Domain(err) => domain_error_to_response(err),
            ApiError::EventStore(err) => event_store_error_to_response(err),
            ApiError::Projection(ProjectionError::Domain(err)) => domain_error_to_response(err),
            ApiError::Projection(err) => internal(err.to_string()),
            ApiError::Internal(msg) => internal(msg),
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn internal(msg: String) -> (StatusCode, String) {
    tracing::error!(error = %msg, "internal server error");
    (StatusCode::INTERNAL_SERVER_ERROR, msg)
}

fn domain_error_to_response(err: DomainError) -> (StatusCode, String) {
    match &err {
        DomainError::TransactionNotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
        _ if err.is_client_error() => (StatusCode::BAD_REQUEST, err.to_string()),
        _ => internal(err.to_string()),
    }
}

fn event_store_error_to_response(err: EventStoreError) -> (StatusCode, String) {
    match &err {
        EventStoreError::MissingHeader(_) | EventStoreError::InvalidHeader { .. } => {
            (StatusCode::BAD_REQUEST, err.to_string())
        }
        _ => internal(err.to_string()),
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Domain(err)
    }
}

impl From<EventStoreError> for ApiError {
    fn from(err: EventStoreError) -> Self {
        ApiError::EventStore(err)
    }
}

impl From<ProjectionError> for ApiError {
    fn from(err: ProjectionError) -> Self {
        ApiError::Projection(err)
    }
}

/// Reasons a subscriber's worker stops.
#[derive(Debug, Error)]
pub enum WorkerError {
    /// History could not be loaded or replayed.
    #[error("bootstrap failed: {0}")]
    Bootstrap(#[from] ProjectionError),

    /// The command processor can no longer keep its projection in step with
    /// the log.
    #[error("command processing stopped: {0}")]
    Halted(#[from] SagaError),
}

/// Errors that stop a service binary.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Worker(#[from] WorkerError),

    #[error("worker task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] EventStoreError),

    #[error("failed to install metrics recorder: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::TransactionId;

    fn status_of(err: ApiError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_client_errors_map_to_4xx() {
        assert_eq!(
            status_of(ApiError::Domain(DomainError::Validation("x".into()))),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(ApiError::Domain(DomainError::TransactionNotFound(
                TransactionId::new()
            ))),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(ApiError::EventStore(EventStoreError::MissingHeader(
                "Event-Id"
            ))),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_server_errors_map_to_5xx() {
        assert_eq!(
            status_of(ApiError::Unavailable("closed".into())),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_of(ApiError::Domain(DomainError::UnknownEventType("X".into()))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_of(ApiError::Projection(ProjectionError::Projection(
                "x".into()
            ))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
