//! Event store endpoints: append and history.

use axum::Json;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use chrono::{DateTime, Utc};
use event_store::{EventLog, HistoryFilter, InMemoryEventLog, StoredEvent, wire};
use serde::Deserialize;

use crate::error::ApiError;

/// Query parameters accepted by `GET /history`.
///
/// `eventType` takes a comma-separated list. `from` and `to` are inclusive
/// RFC 3339 timestamps.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryParams {
    pub aggregate_type: Option<String>,
    pub aggregate_id: Option<String>,
    pub event_type: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

impl HistoryParams {
    fn into_filter(self) -> Result<HistoryFilter, ApiError> {
        let mut filter = HistoryFilter::new();
        if let Some(aggregate_type) = non_empty(self.aggregate_type) {
            filter = filter.aggregate_type(aggregate_type);
        }
        if let Some(aggregate_id) = non_empty(self.aggregate_id) {
            filter = filter.aggregate_id(aggregate_id);
        }
        if let Some(raw) = non_empty(self.event_type) {
            let types = raw
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect();
            filter = filter.event_types(types);
        }
        if let Some(from) = non_empty(self.from) {
            filter = filter.from(parse_bound("from", &from)?);
        }
        if let Some(to) = non_empty(self.to) {
            filter = filter.to(parse_bound("to", &to)?);
        }
        Ok(filter)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_bound(name: &str, raw: &str) -> Result<DateTime<Utc>, ApiError> {
    super::parse_timestamp(raw.trim())
        .map_err(|e| ApiError::BadRequest(format!("invalid {name} timestamp {raw:?}: {e}")))
}

/// POST /event: appends a producer's event. The store assigns index and
/// timestamp and broadcasts it after this returns.
pub async fn append(
    State(log): State<InMemoryEventLog>,
    headers: HeaderMap,
    body: String,
) -> Result<StatusCode, ApiError> {
    let event = wire::new_event_from_request(&headers, body)?;
    let stored = log.append(event).await?;
    tracing::info!(
        event_index = %stored.event_index,
        event_type = %stored.event_type,
        aggregate_id = %stored.aggregate_id,
        "event stored"
    );
    Ok(StatusCode::CREATED)
}

/// GET /history: events matching the filter, in index order.
pub async fn history(
    State(log): State<InMemoryEventLog>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<Vec<StoredEvent>>, ApiError> {
    let filter = params.into_filter()?;
    let events = log.history(&filter).await?;
    tracing::debug!(count = events.len(), "history served");
    Ok(Json(events))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_params_match_everything() {
        let filter = HistoryParams::default().into_filter().unwrap();
        assert_eq!(filter, HistoryFilter::new());
    }

    #[test]
    fn test_event_types_split_on_commas() {
        let params = HistoryParams {
            event_type: Some("TransactionAdded, TransactionDeleted,".to_string()),
            ..HistoryParams::default()
        };
        let expected = HistoryFilter::new().event_types(vec![
            "TransactionAdded".to_string(),
            "TransactionDeleted".to_string(),
        ]);
        assert_eq!(params.into_filter().unwrap(), expected);
    }

    #[test]
    fn test_bad_timestamp_is_rejected() {
        let params = HistoryParams {
            from: Some("yesterday".to_string()),
            ..HistoryParams::default()
        };
        assert!(matches!(
            params.into_filter(),
            Err(ApiError::BadRequest(_))
        ));
    }
}
