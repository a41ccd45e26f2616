use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{RwLock, broadcast};

use crate::{EventIndex, EventLog, HistoryFilter, NewEvent, Result, StoredEvent};

/// Number of appended events the live feed buffers for a slow receiver
/// before it starts reporting lag.
pub const DEFAULT_FEED_CAPACITY: usize = 1024;

/// Source of append timestamps.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

#[derive(Default)]
struct LogState {
    events: Vec<StoredEvent>,
    last_index: EventIndex,
}

/// In-memory event log.
///
/// One write lock guards index assignment, storage, and the hand-off to the
/// live feed, so the feed observes events in exactly the order of their
/// indices. Subscribers are never contacted while the lock is held.
#[derive(Clone)]
pub struct InMemoryEventLog {
    state: Arc<RwLock<LogState>>,
    feed: broadcast::Sender<StoredEvent>,
    clock: Clock,
}

impl InMemoryEventLog {
    /// Creates a new empty log stamping events with the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(Utc::now))
    }

    /// Creates a new empty log with a custom timestamp source.
    pub fn with_clock(clock: Clock) -> Self {
        let (feed, _) = broadcast::channel(DEFAULT_FEED_CAPACITY);
        Self {
            state: Arc::new(RwLock::new(LogState::default())),
            feed,
            clock,
        }
    }

    /// Subscribes to every event appended from now on, in index order.
    pub fn subscribe(&self) -> broadcast::Receiver<StoredEvent> {
        self.feed.subscribe()
    }

    /// Returns the total number of events stored.
    pub async fn len(&self) -> usize {
        self.state.read().await.events.len()
    }

    /// Returns true if nothing has been appended yet.
    pub async fn is_empty(&self) -> bool {
        self.state.read().await.events.is_empty()
    }

    /// Returns the index of the most recently appended event.
    pub async fn last_index(&self) -> EventIndex {
        self.state.read().await.last_index
    }
}

impl Default for InMemoryEventLog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventLog for InMemoryEventLog {
    async fn append(&self, event: NewEvent) -> Result<StoredEvent> {
        let mut state = self.state.write().await;

        let index = state.last_index.next();
        let stored = StoredEvent::from_new(event, index, (self.clock)());
        state.events.push(stored.clone());
        state.last_index = index;

        // No receivers is fine: nobody is listening yet.
        let _ = self.feed.send(stored.clone());
        drop(state);

        metrics::counter!("events_appended_total").increment(1);
        tracing::debug!(
            event_index = %stored.event_index,
            event_id = %stored.event_id,
            event_type = %stored.event_type,
            "saved event"
        );

        Ok(stored)
    }

    async fn history(&self, filter: &HistoryFilter) -> Result<Vec<StoredEvent>> {
        let state = self.state.read().await;
        Ok(state
            .events
            .iter()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect())
    }
}
