//! Write-side commands.

use chrono::{DateTime, Utc};
use common::TransactionId;

use crate::error::DomainError;

/// Request to record a new transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddTransaction {
    pub debit_account: String,
    pub credit_account: String,
    pub amount: i64,
    pub description: String,
    pub occurred: DateTime<Utc>,
}

/// Request to remove a recorded transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteTransaction {
    pub transaction_id: TransactionId,
}

/// Commands accepted by the ledger's write side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerCommand {
    AddTransaction(AddTransaction),
    DeleteTransaction(DeleteTransaction),
}

impl LedgerCommand {
    /// Returns the command type name echoed back to clients.
    pub fn command_type(&self) -> &'static str {
        match self {
            LedgerCommand::AddTransaction(_) => "AddTransactionCommand",
            LedgerCommand::DeleteTransaction(_) => "DeleteTransactionCommand",
        }
    }

    /// Checks the command before it is queued.
    pub fn validate(&self) -> Result<(), DomainError> {
        match self {
            LedgerCommand::AddTransaction(cmd) => cmd.validate(),
            LedgerCommand::DeleteTransaction(_) => Ok(()),
        }
    }
}

impl AddTransaction {
    /// Both accounts are required and must differ.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.debit_account.trim().is_empty() {
            return Err(DomainError::Validation(
                "debit account is required".to_string(),
            ));
        }
        if self.credit_account.trim().is_empty() {
            return Err(DomainError::Validation(
                "credit account is required".to_string(),
            ));
        }
        if self.debit_account == self.credit_account {
            return Err(DomainError::Validation(format!(
                "debit and credit account must differ, both are {}",
                self.debit_account
            )));
        }
        Ok(())
    }
}

impl From<AddTransaction> for LedgerCommand {
    fn from(cmd: AddTransaction) -> Self {
        LedgerCommand::AddTransaction(cmd)
    }
}

impl From<DeleteTransaction> for LedgerCommand {
    fn from(cmd: DeleteTransaction) -> Self {
        LedgerCommand::DeleteTransaction(cmd)
    }
}
