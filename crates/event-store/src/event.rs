use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EventStoreError, Result};

/// Caller-supplied, globally unique identifier for an event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(String);

impl EventId {
    /// Creates a new random event ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Returns the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for EventId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for EventId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Position of an event in the log.
///
/// Indices start at 1 for the first appended event and increase by exactly 1
/// for every subsequent append. Index 0 means "nothing appended yet".
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct EventIndex(i64);

impl EventIndex {
    /// Creates an index from a raw value.
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// The index before any event has been appended.
    pub fn initial() -> Self {
        Self(0)
    }

    /// The index of the first appended event.
    pub fn first() -> Self {
        Self(1)
    }

    /// Returns the next index.
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }

    /// Returns the raw index value.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for EventIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for EventIndex {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<EventIndex> for i64 {
    fn from(index: EventIndex) -> Self {
        index.0
    }
}

/// An event as submitted by a producer, before the log has ordered it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEvent {
    pub event_id: EventId,
    pub event_type: String,
    pub aggregate_id: String,
    pub aggregate_type: String,
    /// JSON payload, kept as opaque text.
    pub payload: String,
}

impl NewEvent {
    /// Creates a new event builder.
    pub fn builder() -> NewEventBuilder {
        NewEventBuilder::default()
    }
}

/// Builder for constructing new events.
#[derive(Debug, Default)]
pub struct NewEventBuilder {
    event_id: Option<EventId>,
    event_type: Option<String>,
    aggregate_id: Option<String>,
    aggregate_type: Option<String>,
    payload: Option<String>,
}

impl NewEventBuilder {
    /// Sets the event ID. If not set, a new ID will be generated.
    pub fn event_id(mut self, id: impl Into<EventId>) -> Self {
        self.event_id = Some(id.into());
        self
    }

    /// Sets the event type.
    pub fn event_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = Some(event_type.into());
        self
    }

    /// Sets the aggregate ID.
    pub fn aggregate_id(mut self, id: impl Into<String>) -> Self {
        self.aggregate_id = Some(id.into());
        self
    }

    /// Sets the aggregate type.
    pub fn aggregate_type(mut self, aggregate_type: impl Into<String>) -> Self {
        self.aggregate_type = Some(aggregate_type.into());
        self
    }

    /// Sets the payload from a serializable value.
    pub fn payload<T: Serialize>(mut self, payload: &T) -> Result<Self> {
        self.payload = Some(serde_json::to_string(payload)?);
        Ok(self)
    }

    /// Sets the payload from raw JSON text.
    pub fn payload_raw(mut self, payload: impl Into<String>) -> Self {
        self.payload = Some(payload.into());
        self
    }

    /// Builds the event, failing if a required field is missing.
    pub fn build(self) -> Result<NewEvent> {
        Ok(NewEvent {
            event_id: self.event_id.unwrap_or_default(),
            event_type: self
                .event_type
                .ok_or(EventStoreError::MissingField("event_type"))?,
            aggregate_id: self
                .aggregate_id
                .ok_or(EventStoreError::MissingField("aggregate_id"))?,
            aggregate_type: self
                .aggregate_type
                .ok_or(EventStoreError::MissingField("aggregate_type"))?,
            payload: self.payload.ok_or(EventStoreError::MissingField("payload"))?,
        })
    }
}

/// An event after it has been appended to the log.
///
/// Serializes to the history wire format:
/// `{eventIndex, eventId, eventType, aggregateId, aggregateType, timestamp, data}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredEvent {
    pub event_index: EventIndex,
    pub event_id: EventId,
    pub event_type: String,
    pub aggregate_id: String,
    pub aggregate_type: String,
    #[serde(rename = "timestamp", with = "common::time::rfc3339_nanos")]
    pub occurred_at: DateTime<Utc>,
    #[serde(rename = "data")]
    pub payload: String,
}

impl StoredEvent {
    /// Stamps a new event with its log position and append time.
    pub fn from_new(event: NewEvent, event_index: EventIndex, occurred_at: DateTime<Utc>) -> Self {
        Self {
            event_index,
            event_id: event.event_id,
            event_type: event.event_type,
            aggregate_id: event.aggregate_id,
            aggregate_type: event.aggregate_type,
            occurred_at,
            payload: event.payload,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_event_id_new_creates_unique_ids() {
        assert_ne!(EventId::new(), EventId::new());
    }

    #[test]
    fn test_index_ordering() {
        assert!(EventIndex::new(1) < EventIndex::new(2));
        assert_eq!(EventIndex::initial().next(), EventIndex::first());
        assert_eq!(EventIndex::first().as_i64(), 1);
    }

    #[test]
    fn test_builder_fills_event_id() {
        let event = NewEvent::builder()
            .event_type("TransactionAdded")
            .aggregate_id("agg-1")
            .aggregate_type("Transaction")
            .payload_raw("{}")
            .build()
            .unwrap();

        assert_eq!(event.event_type, "TransactionAdded");
        assert!(!event.event_id.as_str().is_empty());
    }

    #[test]
    fn test_builder_reports_missing_field() {
        let result = NewEvent::builder().event_type("X").build();
        assert!(matches!(
            result,
            Err(EventStoreError::MissingField("aggregate_id"))
        ));
    }

    #[test]
    fn test_stored_event_uses_history_wire_names() {
        let new = NewEvent::builder()
            .event_id("e-1")
            .event_type("TransactionDeleted")
            .aggregate_id("agg-1")
            .aggregate_type("Transaction")
            .payload_raw(r#"{"transactionId":"agg-1"}"#)
            .build()
            .unwrap();
        let at = Utc.timestamp_opt(1_700_000_000, 42).unwrap();
        let stored = StoredEvent::from_new(new, EventIndex::new(7), at);

        let json = serde_json::to_value(&stored).unwrap();
        assert_eq!(json["eventIndex"], 7);
        assert_eq!(json["eventId"], "e-1");
        assert_eq!(json["aggregateType"], "Transaction");
        assert_eq!(json["timestamp"], "2023-11-14T22:13:20.000000042Z");
        assert_eq!(json["data"], r#"{"transactionId":"agg-1"}"#);

        let back: StoredEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, stored);
    }
}
