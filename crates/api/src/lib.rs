//! HTTP services for the event-sourced ledger.
//!
//! Three services share this crate:
//! - the event store (`eventstore` binary): append, history, broadcast
//! - the write side (`account-command`): event ingress plus the command API
//! - the read side (`account-query`): event ingress plus the query API
//!
//! Each exposes `/health` and Prometheus `/metrics` alongside its routes.

pub mod config;
pub mod error;
pub mod routes;
pub mod server;
pub mod telemetry;
pub mod worker;

use axum::Router;
use axum::routing::{delete, get, post};
use event_store::InMemoryEventLog;
use metrics_exporter_prometheus::PrometheusHandle;
use projections::{ProjectionStore, ReplayPhase};
use tokio::sync::watch;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use worker::WorkQueue;

/// Router for the event store service.
pub fn eventstore_app(log: InMemoryEventLog, metrics_handle: PrometheusHandle) -> Router {
    let router = Router::new()
        .route("/health", get(routes::health::check))
        .route("/event", post(routes::store::append))
        .route("/history", get(routes::store::history))
        .with_state(log);
    finish(router, metrics_handle)
}

/// Router for a subscriber's event ingress.
pub fn ingress_app(
    queue: WorkQueue,
    phase: watch::Receiver<ReplayPhase>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let health = Router::new()
        .route("/health", get(routes::health::replay))
        .with_state(phase);
    let router = Router::new()
        .route("/event", post(routes::ingress::receive))
        .with_state(queue)
        .merge(health);
    finish(router, metrics_handle)
}

/// Router for the write side's command API.
pub fn command_app(queue: WorkQueue, metrics_handle: PrometheusHandle) -> Router {
    let router = Router::new()
        .route("/health", get(routes::health::check))
        .route("/transaction", post(routes::commands::add))
        .route("/transaction/{id}", delete(routes::commands::delete))
        .with_state(queue);
    finish(router, metrics_handle)
}

/// Router for the read side's query API.
pub fn query_app(store: ProjectionStore, metrics_handle: PrometheusHandle) -> Router {
    let router = Router::new()
        .route("/health", get(routes::health::check))
        .route("/transaction", get(routes::queries::list))
        .route("/balance", get(routes::queries::balance))
        .with_state(store);
    finish(router, metrics_handle)
}

fn finish(router: Router, metrics_handle: PrometheusHandle) -> Router {
    router
        .merge(routes::metrics::router(metrics_handle))
        .fallback(routes::not_found)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
