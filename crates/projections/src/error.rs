//! Projection error types.

use thiserror::Error;

/// Errors that can occur while projecting events or bootstrapping.
#[derive(Debug, Error)]
pub enum ProjectionError {
    /// An error occurred talking to the event store.
    #[error("Event store error: {0}")]
    EventStore(#[from] event_store::EventStoreError),

    /// The event could not be decoded or applied to the ledger.
    #[error("Domain error: {0}")]
    Domain(#[from] domain::DomainError),

    /// History could not be loaded within the retry budget.
    #[error("failed to load history after {attempts} attempts: {source}")]
    Bootstrap {
        attempts: u32,
        #[source]
        source: event_store::EventStoreError,
    },

    /// A projection-specific error.
    #[error("Projection error: {0}")]
    Projection(String),
}

/// Result type for projection operations.
pub type Result<T> = std::result::Result<T, ProjectionError>;
