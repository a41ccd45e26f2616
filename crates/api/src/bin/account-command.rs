//! Write side: accepts ledger commands and publishes their events.

use api::config::Config;
use api::error::ServiceError;
use api::server::{self, Shutdown, SubscriberSettings};
use api::telemetry;
use domain::{Aggregate, Ledger};
use event_store::EventStoreClient;
use projections::{ProjectionStore, ReplayCoordinator};
use saga::CommandProcessor;

#[tokio::main]
async fn main() -> Result<(), ServiceError> {
    let config = Config::from_env();
    telemetry::init_tracing(&config);
    let metrics_handle = telemetry::install_metrics()?;

    let client = event_store::http_client(config.request_timeout)?;
    let event_store = EventStoreClient::new(&config.eventstore_url, client);
    let processor = CommandProcessor::new(
        ProjectionStore::new("account-command"),
        event_store.clone(),
    );
    let coordinator = ReplayCoordinator::new(processor, Ledger::aggregate_type());

    let settings = SubscriberSettings {
        service: "account-command",
        event_addr: config.command_event_addr(),
        api_addr: config.command_api_addr(),
        policy: config.retry_policy(),
    };
    let api_metrics = metrics_handle.clone();
    server::run_subscriber(
        settings,
        coordinator,
        event_store,
        metrics_handle,
        move |queue| api::command_app(queue, api_metrics),
        Shutdown::on_signal(),
    )
    .await
}
