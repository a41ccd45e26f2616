//! Undo actions for the local step of a command.

use common::TransactionId;
use domain::Transaction;
use projections::{ProjectionStore, Result};

/// How to undo a local change if its event cannot be published.
///
/// Computed from the local step before publishing, so the undo never has to
/// be reconstructed after the fact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Compensation {
    /// Undo an add by removing the transaction again.
    RemoveAdded(TransactionId),

    /// Undo a delete by putting the transaction back where it was.
    Restore {
        position: usize,
        transaction: Transaction,
    },
}

impl Compensation {
    /// Returns the compensation name used in logs and metrics.
    pub fn name(&self) -> &'static str {
        match self {
            Compensation::RemoveAdded(_) => "RemoveAdded",
            Compensation::Restore { .. } => "Restore",
        }
    }

    /// Applies the undo to the store.
    pub async fn run(self, store: &ProjectionStore) -> Result<()> {
        match self {
            Compensation::RemoveAdded(id) => store.remove_local(id).await.map(|_| ()),
            Compensation::Restore {
                position,
                transaction,
            } => store.restore_local(position, transaction).await,
        }
    }
}
