//! Write-side command processing.
//!
//! Each command is a two-step saga: change the local projection, then
//! publish the event. If publishing fails the local change is undone with a
//! [`Compensation`] computed before the publish was attempted.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use common::TransactionId;
use domain::{
    AddTransaction, DeleteTransaction, LedgerCommand, Transaction, TransactionAddedData,
    TransactionDeletedData, TransactionEvent,
};
use event_store::{EventId, EventPublisher, StoredEvent};
use projections::{Projection, ProjectionPosition, ProjectionStore};
use tokio::sync::Mutex;

use crate::compensation::Compensation;
use crate::error::{Result, SagaError};
use crate::state::SagaState;

/// What a successfully processed command did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandReceipt {
    pub command_type: &'static str,
    pub transaction_id: TransactionId,
}

/// Applies ledger commands to the write-side projection and publishes the
/// resulting events.
///
/// Commands must be executed one at a time; the processor relies on its
/// caller (the single worker task) for that.
pub struct CommandProcessor<P> {
    store: ProjectionStore,
    publisher: P,
    published: Mutex<HashSet<EventId>>,
    halted: AtomicBool,
}

impl<P: EventPublisher> CommandProcessor<P> {
    pub fn new(store: ProjectionStore, publisher: P) -> Self {
        Self {
            store,
            publisher,
            published: Mutex::new(HashSet::new()),
            halted: AtomicBool::new(false),
        }
    }

    /// The write-side projection.
    pub fn store(&self) -> &ProjectionStore {
        &self.store
    }

    /// Returns true once a failed compensation has stopped the processor.
    pub fn is_halted(&self) -> bool {
        self.halted.load(Ordering::SeqCst)
    }

    /// Executes one command.
    ///
    /// Validation, not-found and overflow errors leave state unchanged. A publish
    /// failure is compensated and returned as [`SagaError::Publish`]; if the
    /// compensation fails too, the processor halts and returns
    /// [`SagaError::Divergence`].
    #[tracing::instrument(skip(self, command), fields(command_type = command.command_type()))]
    pub async fn execute(&self, command: LedgerCommand) -> Result<CommandReceipt> {
        if self.is_halted() {
            return Err(SagaError::Halted);
        }
        let command_type = command.command_type();

        let result = match command {
            LedgerCommand::AddTransaction(cmd) => self.add(cmd).await,
            LedgerCommand::DeleteTransaction(cmd) => self.delete(cmd).await,
        };

        let outcome = match &result {
            Ok(_) => "ok",
            Err(SagaError::Domain(_)) => "rejected",
            Err(e) if e.is_fatal() => "diverged",
            Err(_) => "failed",
        };
        metrics::counter!(
            "commands_processed_total",
            "command" => command_type,
            "outcome" => outcome
        )
        .increment(1);

        result.map(|transaction_id| CommandReceipt {
            command_type,
            transaction_id,
        })
    }

    async fn add(&self, cmd: AddTransaction) -> Result<TransactionId> {
        cmd.validate()?;

        let tx = Transaction {
            id: TransactionId::new(),
            debit_account: cmd.debit_account,
            credit_account: cmd.credit_account,
            amount: cmd.amount,
            description: cmd.description,
            occurred: cmd.occurred,
        };
        let id = tx.id;
        let event = TransactionEvent::TransactionAdded(TransactionAddedData::from(&tx));

        self.store.insert_local(tx).await?;
        tracing::debug!(
            state = %SagaState::Applied,
            transaction_id = %id,
            "transaction added locally"
        );

        self.publish_or_compensate(event, Compensation::RemoveAdded(id))
            .await?;
        tracing::info!(transaction_id = %id, "successfully processed AddTransaction command");
        Ok(id)
    }

    async fn delete(&self, cmd: DeleteTransaction) -> Result<TransactionId> {
        let id = cmd.transaction_id;
        let event = TransactionEvent::TransactionDeleted(TransactionDeletedData {
            transaction_id: id,
        });

        let (position, transaction) = self.store.remove_local(id).await?;
        tracing::debug!(
            state = %SagaState::Applied,
            transaction_id = %id,
            position,
            "transaction removed locally"
        );
        let compensation = Compensation::Restore {
            position,
            transaction,
        };

        self.publish_or_compensate(event, compensation).await?;
        tracing::info!(transaction_id = %id, "successfully processed DeleteTransaction command");
        Ok(id)
    }

    async fn publish_or_compensate(
        &self,
        event: TransactionEvent,
        compensation: Compensation,
    ) -> Result<()> {
        let new_event = event.to_new_event()?;
        let event_id = new_event.event_id.clone();

        let publish_error = match self.publisher.publish(new_event).await {
            Ok(()) => {
                self.published.lock().await.insert(event_id);
                tracing::debug!(state = %SagaState::Completed, "event published");
                return Ok(());
            }
            Err(e) => e,
        };

        let name = compensation.name();
        tracing::warn!(
            state = %SagaState::Compensating,
            compensation = name,
            error = %publish_error,
            "error publishing event, compensating"
        );
        metrics::counter!("compensations_total", "compensation" => name).increment(1);

        match compensation.run(&self.store).await {
            Ok(()) => {
                tracing::info!(
                    state = %SagaState::Failed,
                    compensation = name,
                    "compensation complete"
                );
                Err(SagaError::Publish(publish_error))
            }
            Err(e) => {
                self.halted.store(true, Ordering::SeqCst);
                tracing::error!(
                    state = %SagaState::Diverged,
                    compensation = name,
                    error = %e,
                    "compensation failed, local state diverged from the log"
                );
                Err(SagaError::Divergence {
                    compensation: name,
                    publish: publish_error.to_string(),
                    reason: e.to_string(),
                })
            }
        }
    }
}

#[async_trait]
impl<P: EventPublisher> Projection for CommandProcessor<P> {
    fn name(&self) -> &'static str {
        self.store.name()
    }

    /// Applies an event from the log unless it is the echo of one this
    /// processor published, which local state already reflects.
    async fn apply(&self, event: &StoredEvent) -> projections::Result<()> {
        if self.published.lock().await.remove(&event.event_id) {
            tracing::debug!(
                event_index = %event.event_index,
                event_id = %event.event_id,
                "skipped own published event"
            );
            return Ok(());
        }
        self.store.apply(event).await
    }

    async fn position(&self) -> ProjectionPosition {
        self.store.position().await
    }
}
