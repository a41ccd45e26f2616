//! Shared types used across the event store and the account services.

pub mod time;
pub mod types;

pub use types::TransactionId;
