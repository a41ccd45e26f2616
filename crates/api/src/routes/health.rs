//! Health endpoints.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use projections::ReplayPhase;
use serde::Serialize;
use tokio::sync::watch;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
}

/// GET /health for services without a replay phase.
pub async fn check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        phase: None,
    })
}

/// GET /health for subscribers: 503 until the projection is live.
pub async fn replay(
    State(phase): State<watch::Receiver<ReplayPhase>>,
) -> (StatusCode, Json<HealthResponse>) {
    let current = *phase.borrow();
    let (status, label) = match current {
        ReplayPhase::Live => (StatusCode::OK, "ok"),
        ReplayPhase::Loading | ReplayPhase::Draining => {
            (StatusCode::SERVICE_UNAVAILABLE, "starting")
        }
    };
    (
        status,
        Json(HealthResponse {
            status: label,
            phase: Some(current.to_string()),
        }),
    )
}
