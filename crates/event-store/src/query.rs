use chrono::{DateTime, Utc};

use crate::StoredEvent;

/// Filter for history retrieval.
///
/// Every field is optional; an absent field matches all events. Results are
/// always returned in append order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryFilter {
    /// Filter by aggregate type (exact match).
    pub aggregate_type: Option<String>,

    /// Filter by aggregate ID (exact match).
    pub aggregate_id: Option<String>,

    /// Filter by event types (any of these types).
    pub event_types: Option<Vec<String>>,

    /// Events appended at or after this time.
    pub from: Option<DateTime<Utc>>,

    /// Events appended at or before this time.
    pub to: Option<DateTime<Utc>>,
}

impl HistoryFilter {
    /// Creates a filter that matches every event.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a filter for a specific aggregate type.
    pub fn for_aggregate_type(aggregate_type: impl Into<String>) -> Self {
        Self {
            aggregate_type: Some(aggregate_type.into()),
            ..Default::default()
        }
    }

    /// Filters by aggregate type.
    pub fn aggregate_type(mut self, aggregate_type: impl Into<String>) -> Self {
        self.aggregate_type = Some(aggregate_type.into());
        self
    }

    /// Filters by aggregate ID.
    pub fn aggregate_id(mut self, aggregate_id: impl Into<String>) -> Self {
        self.aggregate_id = Some(aggregate_id.into());
        self
    }

    /// Filters by event type.
    pub fn event_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_types = Some(vec![event_type.into()]);
        self
    }

    /// Filters by multiple event types (any of these).
    pub fn event_types(mut self, event_types: Vec<String>) -> Self {
        self.event_types = Some(event_types);
        self
    }

    /// Filters to events appended at or after this time.
    pub fn from(mut self, timestamp: DateTime<Utc>) -> Self {
        self.from = Some(timestamp);
        self
    }

    /// Filters to events appended at or before this time.
    pub fn to(mut self, timestamp: DateTime<Utc>) -> Self {
        self.to = Some(timestamp);
        self
    }

    /// Returns true if the event passes every filter that is set.
    pub fn matches(&self, event: &StoredEvent) -> bool {
        if let Some(ref agg_type) = self.aggregate_type
            && &event.aggregate_type != agg_type
        {
            return false;
        }
        if let Some(ref agg_id) = self.aggregate_id
            && &event.aggregate_id != agg_id
        {
            return false;
        }
        if let Some(ref types) = self.event_types
            && !types.contains(&event.event_type)
        {
            return false;
        }
        if let Some(from) = self.from
            && event.occurred_at < from
        {
            return false;
        }
        if let Some(to) = self.to
            && event.occurred_at > to
        {
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EventIndex, NewEvent};
    use chrono::TimeZone;

    fn event(aggregate_type: &str, event_type: &str, secs: i64) -> StoredEvent {
        let new = NewEvent::builder()
            .event_type(event_type)
            .aggregate_id("agg-1")
            .aggregate_type(aggregate_type)
            .payload_raw("{}")
            .build()
            .unwrap();
        StoredEvent::from_new(
            new,
            EventIndex::first(),
            Utc.timestamp_opt(secs, 0).unwrap(),
        )
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        let filter = HistoryFilter::new();
        assert!(filter.matches(&event("Transaction", "TransactionAdded", 10)));
        assert!(filter.matches(&event("Other", "Whatever", 10)));
    }

    #[test]
    fn test_aggregate_type_is_exact_match() {
        let filter = HistoryFilter::for_aggregate_type("Transaction");
        assert!(filter.matches(&event("Transaction", "TransactionAdded", 10)));
        assert!(!filter.matches(&event("transaction", "TransactionAdded", 10)));
    }

    #[test]
    fn test_time_range_is_inclusive() {
        let filter = HistoryFilter::new()
            .from(Utc.timestamp_opt(10, 0).unwrap())
            .to(Utc.timestamp_opt(20, 0).unwrap());
        assert!(filter.matches(&event("T", "E", 10)));
        assert!(filter.matches(&event("T", "E", 20)));
        assert!(!filter.matches(&event("T", "E", 9)));
        assert!(!filter.matches(&event("T", "E", 21)));
    }

    #[test]
    fn test_builder_chain() {
        let filter = HistoryFilter::new()
            .aggregate_type("Transaction")
            .aggregate_id("agg-1")
            .event_type("TransactionDeleted");

        assert_eq!(filter.aggregate_type.as_deref(), Some("Transaction"));
        assert_eq!(filter.aggregate_id.as_deref(), Some("agg-1"));
        assert!(filter.matches(&event("Transaction", "TransactionDeleted", 1)));
        assert!(!filter.matches(&event("Transaction", "TransactionAdded", 1)));
    }
}
