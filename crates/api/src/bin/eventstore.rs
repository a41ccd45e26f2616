//! Event store service: append, history and broadcast.

use api::config::Config;
use api::error::ServiceError;
use api::server::{self, Shutdown};
use api::telemetry;
use event_store::{Broadcaster, InMemoryEventLog};

#[tokio::main]
async fn main() -> Result<(), ServiceError> {
    let config = Config::from_env();
    telemetry::init_tracing(&config);
    let metrics_handle = telemetry::install_metrics()?;

    let log = InMemoryEventLog::new();
    let client = event_store::http_client(config.request_timeout)?;
    let broadcaster = Broadcaster::http(config.subscriber_urls.clone(), client);
    tracing::info!(
        subscribers = broadcaster.subscriber_count(),
        "broadcasting to subscribers"
    );
    let broadcast_task = broadcaster.spawn(log.subscribe());

    let listener = server::bind(&config.eventstore_addr(), "eventstore").await?;
    let app = api::eventstore_app(log, metrics_handle);
    server::serve(listener, app, Shutdown::on_signal()).await?;

    // The router owned the last handle to the log, so the feed is closed.
    broadcast_task.await?;
    tracing::info!("server shut down gracefully");
    Ok(())
}
