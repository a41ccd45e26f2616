//! Event store for the accounting ledger.
//!
//! - [`EventLog`] assigns a total order to events and serves filtered history
//! - [`InMemoryEventLog`] is the single-process implementation
//! - [`Broadcaster`] fans appended events out to subscriber endpoints
//! - [`EventStoreClient`] is the HTTP side used by subscribers to publish and
//!   to fetch history

pub mod broadcast;
pub mod client;
pub mod error;
pub mod event;
pub mod memory;
pub mod query;
pub mod store;
pub mod wire;

pub use broadcast::{BroadcastFailure, Broadcaster, HttpSubscriber, Subscriber};
pub use client::{EventStoreClient, http_client};
pub use error::{EventStoreError, Result};
pub use event::{EventId, EventIndex, NewEvent, NewEventBuilder, StoredEvent};
pub use memory::InMemoryEventLog;
pub use query::HistoryFilter;
pub use store::{EventLog, EventPublisher, HistorySource};
