//! The single consumer behind a subscriber service.
//!
//! HTTP handlers never touch the projection for writes. They push broadcast
//! events and commands onto bounded queues, and one worker task drains both,
//! so every state change happens in the order the worker sees it.

use async_trait::async_trait;
use domain::LedgerCommand;
use event_store::{EventPublisher, HistorySource, StoredEvent};
use projections::{Projection, ProjectionStore, ReplayCoordinator, RetryPolicy};
use saga::{CommandProcessor, CommandReceipt, SagaError};
use tokio::sync::mpsc;

use crate::error::{ApiError, WorkerError};

/// Capacity of each work queue. Producers wait when it is full.
pub const QUEUE_CAPACITY: usize = 100;

/// A projection that can also be asked to run commands.
#[async_trait]
pub trait WorkHandler: Projection {
    async fn execute(&self, command: LedgerCommand) -> Result<CommandReceipt, SagaError> {
        Err(SagaError::Unsupported(command.command_type()))
    }
}

impl WorkHandler for ProjectionStore {}

#[async_trait]
impl<P: EventPublisher> WorkHandler for CommandProcessor<P> {
    async fn execute(&self, command: LedgerCommand) -> Result<CommandReceipt, SagaError> {
        CommandProcessor::execute(self, command).await
    }
}

/// Producer side of a worker's queues, cloned into every handler.
#[derive(Clone)]
pub struct WorkQueue {
    events: mpsc::Sender<StoredEvent>,
    commands: mpsc::Sender<LedgerCommand>,
}

impl WorkQueue {
    /// Enqueues a broadcast event.
    pub async fn submit_event(&self, event: StoredEvent) -> Result<(), ApiError> {
        self.events
            .send(event)
            .await
            .map_err(|_| ApiError::Unavailable("event worker has stopped".to_string()))
    }

    /// Enqueues a validated command.
    pub async fn submit_command(&self, command: LedgerCommand) -> Result<(), ApiError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| ApiError::Unavailable("command worker has stopped".to_string()))
    }
}

/// Consumer side: owns the coordinator and both receivers.
pub struct Worker<P> {
    coordinator: ReplayCoordinator<P>,
    events: mpsc::Receiver<StoredEvent>,
    commands: mpsc::Receiver<LedgerCommand>,
}

impl<P: WorkHandler> Worker<P> {
    /// Creates a worker and the queue handle that feeds it.
    pub fn new(coordinator: ReplayCoordinator<P>) -> (WorkQueue, Self) {
        let (event_tx, event_rx) = mpsc::channel(QUEUE_CAPACITY);
        let (command_tx, command_rx) = mpsc::channel(QUEUE_CAPACITY);
        let queue = WorkQueue {
            events: event_tx,
            commands: command_tx,
        };
        let worker = Self {
            coordinator,
            events: event_rx,
            commands: command_rx,
        };
        (queue, worker)
    }

    /// Bootstraps from history, then processes work until every producer is
    /// gone.
    ///
    /// Commands wait in their queue until bootstrap finishes. Failing to load
    /// history or a fatal command error stops the worker.
    pub async fn run<H>(mut self, source: H, policy: RetryPolicy) -> Result<(), WorkerError>
    where
        H: HistorySource,
    {
        let name = self.coordinator.projection().name();
        let stats = self
            .coordinator
            .bootstrap(&source, &policy, &mut self.events)
            .await?;
        tracing::info!(
            projection = name,
            replayed = stats.replayed,
            drained = stats.drained,
            "worker live"
        );

        loop {
            tokio::select! {
                Some(event) = self.events.recv() => {
                    // Failures are logged and counted by the coordinator.
                    let _ = self.coordinator.handle(event).await;
                }
                Some(command) = self.commands.recv() => {
                    let command_type = command.command_type();
                    match self.coordinator.projection().execute(command).await {
                        Ok(receipt) => tracing::debug!(
                            command_type,
                            transaction_id = %receipt.transaction_id,
                            "command processed"
                        ),
                        Err(e) if e.is_fatal() => {
                            tracing::error!(command_type, error = %e, "worker stopping");
                            return Err(e.into());
                        }
                        Err(e) => tracing::warn!(command_type, error = %e, "command failed"),
                    }
                }
                else => break,
            }
        }

        tracing::info!(projection = name, "worker stopped");
        Ok(())
    }
}
