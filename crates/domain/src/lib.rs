//! Domain layer for the accounting ledger.
//!
//! This crate provides:
//! - [`Aggregate`] and [`DomainEvent`] traits for event-sourced state
//! - [`Transaction`] and the [`TransactionEvent`] sum type with its wire encoding
//! - [`LedgerCommand`] for the write side, with request validation
//! - [`Ledger`], the aggregate both sides of the system project into

pub mod aggregate;
pub mod command;
pub mod error;
pub mod events;
pub mod ledger;
pub mod transaction;

pub use aggregate::{Aggregate, DomainEvent};
pub use command::{AddTransaction, DeleteTransaction, LedgerCommand};
pub use error::DomainError;
pub use events::{
    AGGREGATE_TYPE, TRANSACTION_ADDED, TRANSACTION_DELETED, TransactionAddedData,
    TransactionDeletedData, TransactionEvent,
};
pub use ledger::Ledger;
pub use transaction::Transaction;
