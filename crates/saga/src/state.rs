//! Lifecycle of a single command run.

/// The state of one command as it moves through its two steps.
///
/// State transitions:
/// ```text
/// Applied ──┬──► Completed
///           └──► Compensating ──┬──► Failed
///                               └──► Diverged
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SagaState {
    /// Local state was updated; the event has not been published yet.
    Applied,

    /// Publishing failed and the local step is being undone.
    Compensating,

    /// The event was published (terminal state).
    Completed,

    /// The local step was undone after a failed publish (terminal state).
    Failed,

    /// The undo itself failed (terminal state).
    Diverged,
}

impl SagaState {
    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            SagaState::Applied => "Applied",
            SagaState::Compensating => "Compensating",
            SagaState::Completed => "Completed",
            SagaState::Failed => "Failed",
            SagaState::Diverged => "Diverged",
        }
    }
}

impl std::fmt::Display for SagaState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
