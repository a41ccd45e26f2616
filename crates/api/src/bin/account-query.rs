//! Read side: serves transactions and balance, optionally as of a snapshot.

use api::config::Config;
use api::error::ServiceError;
use api::server::{self, Shutdown, SubscriberSettings};
use api::telemetry;
use domain::{Aggregate, Ledger};
use event_store::EventStoreClient;
use projections::{ProjectionStore, ReplayCoordinator};

#[tokio::main]
async fn main() -> Result<(), ServiceError> {
    let config = Config::from_env();
    telemetry::init_tracing(&config);
    let metrics_handle = telemetry::install_metrics()?;

    let client = event_store::http_client(config.request_timeout)?;
    let event_store = EventStoreClient::new(&config.eventstore_url, client);
    let store = ProjectionStore::new("account-query");
    let coordinator = ReplayCoordinator::new(store.clone(), Ledger::aggregate_type());

    let settings = SubscriberSettings {
        service: "account-query",
        event_addr: config.query_event_addr(),
        api_addr: config.query_api_addr(),
        policy: config.retry_policy(),
    };
    let api_metrics = metrics_handle.clone();
    server::run_subscriber(
        settings,
        coordinator,
        event_store,
        metrics_handle,
        move |_queue| api::query_app(store, api_metrics),
        Shutdown::on_signal(),
    )
    .await
}
