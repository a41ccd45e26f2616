//! Process plumbing shared by the service binaries: listeners, graceful
//! shutdown and the subscriber startup sequence.

use std::io;

use axum::Router;
use event_store::HistorySource;
use metrics_exporter_prometheus::PrometheusHandle;
use projections::{ReplayCoordinator, ReplayPhase, RetryPolicy};
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::watch;

use crate::error::ServiceError;
use crate::worker::{WorkHandler, WorkQueue, Worker};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

/// A shutdown trigger shared by every server in the process.
#[derive(Clone)]
pub struct Shutdown(watch::Receiver<bool>);

impl Shutdown {
    /// Fires on SIGINT or SIGTERM.
    pub fn on_signal() -> Self {
        let (trigger, shutdown) = Self::manual();
        tokio::spawn(async move {
            shutdown_signal().await;
            let _ = trigger.send(true);
        });
        shutdown
    }

    /// Fires when `true` is sent on the returned sender.
    pub fn manual() -> (watch::Sender<bool>, Self) {
        let (tx, rx) = watch::channel(false);
        (tx, Self(rx))
    }

    /// Resolves once shutdown has been triggered or the trigger is gone.
    pub async fn wait(mut self) {
        let _ = self.0.wait_for(|fired| *fired).await;
    }
}

/// Binds a listener, logging the address it ended up on.
pub async fn bind(addr: &str, service: &'static str) -> io::Result<TcpListener> {
    let listener = TcpListener::bind(addr).await?;
    let local = listener.local_addr()?;
    tracing::info!(%local, service, "listening");
    Ok(listener)
}

/// Serves a router until shutdown, letting in-flight requests finish.
pub async fn serve(listener: TcpListener, app: Router, shutdown: Shutdown) -> io::Result<()> {
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.wait())
        .await
}

/// Where and how a subscriber service runs.
#[derive(Debug, Clone)]
pub struct SubscriberSettings {
    pub service: &'static str,
    pub event_addr: String,
    pub api_addr: String,
    pub policy: RetryPolicy,
}

/// Runs a subscriber service to completion.
///
/// The event ingress comes up first so broadcasts arriving during bootstrap
/// are queued rather than lost. The API is only bound once the projection is
/// live. A worker failure ends the service with an error.
pub async fn run_subscriber<P, H, F>(
    settings: SubscriberSettings,
    coordinator: ReplayCoordinator<P>,
    source: H,
    metrics_handle: PrometheusHandle,
    api: F,
    shutdown: Shutdown,
) -> Result<(), ServiceError>
where
    P: WorkHandler + 'static,
    H: HistorySource + 'static,
    F: FnOnce(WorkQueue) -> Router,
{
    let mut phase = coordinator.watch_phase();
    let (queue, worker) = Worker::new(coordinator);

    let ingress_listener = bind(&settings.event_addr, settings.service).await?;
    let ingress = crate::ingress_app(queue.clone(), phase.clone(), metrics_handle);
    let ingress_task = tokio::spawn(serve(ingress_listener, ingress, shutdown.clone()));

    let mut worker_task = tokio::spawn(worker.run(source, settings.policy));

    tokio::select! {
        live = wait_until_live(&mut phase) => {
            if !live {
                worker_task.await??;
                return Ok(());
            }
        }
        result = &mut worker_task => {
            result??;
            return Ok(());
        }
        () = shutdown.clone().wait() => {
            tracing::info!(service = settings.service, "shut down before bootstrap finished");
            return Ok(());
        }
    }

    let api_listener = bind(&settings.api_addr, settings.service).await?;
    let api_server = serve(api_listener, api(queue), shutdown);

    tokio::select! {
        result = api_server => result?,
        result = &mut worker_task => {
            result??;
            return Ok(());
        }
    }

    ingress_task.await??;
    worker_task.await??;
    tracing::info!(service = settings.service, "server shut down gracefully");
    Ok(())
}

async fn wait_until_live(phase: &mut watch::Receiver<ReplayPhase>) -> bool {
    phase
        .wait_for(|p| *p == ReplayPhase::Live)
        .await
        .is_ok()
}
