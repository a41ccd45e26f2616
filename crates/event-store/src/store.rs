use async_trait::async_trait;

use crate::{HistoryFilter, NewEvent, Result, StoredEvent};

/// Core trait for event log implementations.
///
/// The log is append-only: there is no API to mutate or remove an event once
/// it has been appended. All implementations must be thread-safe.
#[async_trait]
pub trait EventLog: Send + Sync {
    /// Appends an event and returns it with its assigned index and timestamp.
    ///
    /// Indices start at 1, are never reused and have no gaps. The content of
    /// the event is not validated.
    async fn append(&self, event: NewEvent) -> Result<StoredEvent>;

    /// Retrieves events matching the filter, in append order.
    async fn history(&self, filter: &HistoryFilter) -> Result<Vec<StoredEvent>>;
}

/// Something a producer can publish new events to.
///
/// Subscribers publish through the HTTP client; tests and single-process
/// setups can publish straight into an [`EventLog`].
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publishes an event. Success means the event store accepted it.
    async fn publish(&self, event: NewEvent) -> Result<()>;
}

/// A pull-based source of event history, used by subscribers to bootstrap.
#[async_trait]
pub trait HistorySource: Send + Sync {
    /// Fetches all events matching the filter from the beginning of the log.
    async fn fetch_history(&self, filter: &HistoryFilter) -> Result<Vec<StoredEvent>>;
}

#[async_trait]
impl<T: EventLog + ?Sized> EventPublisher for T {
    async fn publish(&self, event: NewEvent) -> Result<()> {
        self.append(event).await.map(|_| ())
    }
}

#[async_trait]
impl<T: EventLog + ?Sized> HistorySource for T {
    async fn fetch_history(&self, filter: &HistoryFilter) -> Result<Vec<StoredEvent>> {
        self.history(filter).await
    }
}
