use thiserror::Error;

/// Errors that can occur when interacting with the event store.
#[derive(Debug, Error)]
pub enum EventStoreError {
    /// A required event header was absent or empty.
    #[error("required header missing: {0}")]
    MissingHeader(&'static str),

    /// A header was present but could not be parsed or encoded.
    #[error("invalid header {header}: {reason}")]
    InvalidHeader {
        header: &'static str,
        reason: String,
    },

    /// A required field was not set on an event builder.
    #[error("event is missing required field: {0}")]
    MissingField(&'static str),

    /// The remote endpoint could not be reached or timed out.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The remote endpoint answered with an unexpected status.
    #[error("rejected by {endpoint} with status {status}: {body}")]
    Rejected {
        endpoint: String,
        status: u16,
        body: String,
    },

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for event store operations.
pub type Result<T> = std::result::Result<T, EventStoreError>;
