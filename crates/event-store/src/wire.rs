//! HTTP header encoding of events.
//!
//! Event metadata travels in headers and the payload travels as the request
//! body. Producers send the four identity headers; the store adds the index
//! and timestamp when it broadcasts.

use reqwest::header::{HeaderMap, HeaderValue};

use crate::{EventIndex, EventStoreError, NewEvent, Result, StoredEvent};

pub const HEADER_EVENT_INDEX: &str = "Event-Index";
pub const HEADER_EVENT_ID: &str = "Event-Id";
pub const HEADER_EVENT_TYPE: &str = "Event-Type";
pub const HEADER_AGGREGATE_ID: &str = "Aggregate-Id";
pub const HEADER_AGGREGATE_TYPE: &str = "Aggregate-Type";
pub const HEADER_TIMESTAMP: &str = "Timestamp";

/// Headers a producer sends when publishing to the store.
pub fn publish_headers(event: &NewEvent) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    insert(&mut headers, HEADER_EVENT_ID, event.event_id.as_str())?;
    insert(&mut headers, HEADER_EVENT_TYPE, &event.event_type)?;
    insert(&mut headers, HEADER_AGGREGATE_ID, &event.aggregate_id)?;
    insert(&mut headers, HEADER_AGGREGATE_TYPE, &event.aggregate_type)?;
    Ok(headers)
}

/// Headers the store sends when broadcasting to a subscriber.
pub fn broadcast_headers(event: &StoredEvent) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    insert(
        &mut headers,
        HEADER_EVENT_INDEX,
        &event.event_index.to_string(),
    )?;
    insert(&mut headers, HEADER_EVENT_ID, event.event_id.as_str())?;
    insert(&mut headers, HEADER_EVENT_TYPE, &event.event_type)?;
    insert(&mut headers, HEADER_AGGREGATE_ID, &event.aggregate_id)?;
    insert(&mut headers, HEADER_AGGREGATE_TYPE, &event.aggregate_type)?;
    insert(
        &mut headers,
        HEADER_TIMESTAMP,
        &common::time::format_nanos(&event.occurred_at),
    )?;
    Ok(headers)
}

/// Reads a producer's event from request headers and body.
///
/// All four identity headers are required; an empty header counts as missing.
pub fn new_event_from_request(headers: &HeaderMap, body: String) -> Result<NewEvent> {
    Ok(NewEvent {
        event_id: required(headers, HEADER_EVENT_ID)?.into(),
        event_type: required(headers, HEADER_EVENT_TYPE)?,
        aggregate_id: required(headers, HEADER_AGGREGATE_ID)?,
        aggregate_type: required(headers, HEADER_AGGREGATE_TYPE)?,
        payload: body,
    })
}

/// Reads a broadcast event from request headers and body.
pub fn stored_event_from_request(headers: &HeaderMap, body: String) -> Result<StoredEvent> {
    let raw_index = required(headers, HEADER_EVENT_INDEX)?;
    let event_index = raw_index
        .parse::<i64>()
        .map(EventIndex::new)
        .map_err(|e| EventStoreError::InvalidHeader {
            header: HEADER_EVENT_INDEX,
            reason: e.to_string(),
        })?;

    let raw_timestamp = required(headers, HEADER_TIMESTAMP)?;
    let occurred_at =
        common::time::parse_nanos(&raw_timestamp).map_err(|e| EventStoreError::InvalidHeader {
            header: HEADER_TIMESTAMP,
            reason: e.to_string(),
        })?;

    let event = new_event_from_request(headers, body)?;
    Ok(StoredEvent::from_new(event, event_index, occurred_at))
}

fn required(headers: &HeaderMap, name: &'static str) -> Result<String> {
    let value = headers
        .get(name)
        .ok_or(EventStoreError::MissingHeader(name))?
        .to_str()
        .map_err(|e| EventStoreError::InvalidHeader {
            header: name,
            reason: e.to_string(),
        })?;
    if value.is_empty() {
        return Err(EventStoreError::MissingHeader(name));
    }
    Ok(value.to_string())
}

fn insert(headers: &mut HeaderMap, name: &'static str, value: &str) -> Result<()> {
    let value = HeaderValue::from_str(value).map_err(|e| EventStoreError::InvalidHeader {
        header: name,
        reason: e.to_string(),
    })?;
    headers.insert(name, value);
    Ok(())
}
