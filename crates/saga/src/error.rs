//! Command processing error types.

use domain::DomainError;
use event_store::EventStoreError;
use projections::ProjectionError;
use thiserror::Error;

/// Errors that can occur while processing a command.
#[derive(Debug, Error)]
pub enum SagaError {
    /// The command was invalid or referred to a missing transaction.
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    /// The local projection failed for a reason other than the domain.
    #[error("Projection error: {0}")]
    Projection(ProjectionError),

    /// The event could not be published; local state was rolled back.
    #[error("error publishing event: {0}")]
    Publish(#[source] EventStoreError),

    /// Rolling back a failed publish also failed, so local state no longer
    /// matches the log.
    #[error("compensation '{compensation}' failed after publish error ({publish}): {reason}")]
    Divergence {
        compensation: &'static str,
        publish: String,
        reason: String,
    },

    /// A previous divergence stopped the processor.
    #[error("command processor halted after divergence")]
    Halted,

    /// The receiving service does not process commands.
    #[error("{0} is not supported here")]
    Unsupported(&'static str),
}

impl SagaError {
    /// Returns true if the process must stop accepting commands.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SagaError::Divergence { .. } | SagaError::Halted)
    }
}

impl From<ProjectionError> for SagaError {
    fn from(err: ProjectionError) -> Self {
        match err {
            ProjectionError::Domain(e) => SagaError::Domain(e),
            other => SagaError::Projection(other),
        }
    }
}

/// Convenience type alias for command processing results.
pub type Result<T> = std::result::Result<T, SagaError>;
