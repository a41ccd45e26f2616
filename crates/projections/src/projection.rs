//! Core projection trait and position tracking.

use async_trait::async_trait;
use event_store::{EventIndex, StoredEvent};

use crate::Result;

/// Tracks how far a projection has got through the log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProjectionPosition {
    /// Number of events applied by this projection.
    pub events_applied: u64,
    /// Index of the most recently applied event.
    pub last_index: EventIndex,
}

impl ProjectionPosition {
    /// Creates a new position at zero.
    pub fn zero() -> Self {
        Self::default()
    }

    /// Advances the position past the event at `index`.
    pub fn advance(&self, index: EventIndex) -> Self {
        Self {
            events_applied: self.events_applied + 1,
            last_index: index,
        }
    }
}

impl std::fmt::Display for ProjectionPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "position({} applied, last index {})",
            self.events_applied, self.last_index
        )
    }
}

/// Something that folds log events into in-memory state.
///
/// Implementations serialize their own updates; callers may apply events
/// from any task, but the replay coordinator only ever applies one at a time.
#[async_trait]
pub trait Projection: Send + Sync {
    /// Returns the name of this projection, used in logs and metrics.
    fn name(&self) -> &'static str;

    /// Applies a single event. A failed apply leaves the state unchanged.
    async fn apply(&self, event: &StoredEvent) -> Result<()>;

    /// Returns the current position of this projection.
    async fn position(&self) -> ProjectionPosition;
}
