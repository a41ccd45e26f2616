//! Domain error types.

use common::TransactionId;
use thiserror::Error;

/// Errors that can occur while validating commands or applying ledger events.
#[derive(Debug, Error)]
pub enum DomainError {
    /// A delete targeted a transaction that is not in the ledger.
    #[error("transaction {0} not found")]
    TransactionNotFound(TransactionId),

    /// A command was rejected before any state changed.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Applying the transaction would take the balance out of range.
    #[error("balance {balance} would overflow")]
    BalanceOverflow { balance: i64 },

    /// The event type is not one the ledger understands.
    #[error("unknown event type: {0}")]
    UnknownEventType(String),

    /// The event payload could not be decoded.
    #[error("invalid event payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),
}

impl DomainError {
    /// Returns true if the error was caused by bad client input.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            DomainError::TransactionNotFound(_)
                | DomainError::Validation(_)
                | DomainError::BalanceOverflow { .. }
        )
    }
}
