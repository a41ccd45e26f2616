//! HTTP client for a remote event store.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;

use crate::{
    EventPublisher, EventStoreError, HistoryFilter, HistorySource, NewEvent, Result, StoredEvent,
    wire,
};

/// Builds the shared HTTP client used for every outbound call.
///
/// The timeout covers the whole request, so a stalled subscriber or store
/// cannot hold a caller forever.
pub fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder().timeout(timeout).build()?)
}

/// Talks to the event store service over HTTP.
///
/// `POST /event` publishes; `GET /history` fetches the whole filtered history
/// from the beginning of the log.
#[derive(Debug, Clone)]
pub struct EventStoreClient {
    base_url: String,
    client: reqwest::Client,
}

impl EventStoreClient {
    pub fn new(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn history_params(filter: &HistoryFilter) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(ref aggregate_type) = filter.aggregate_type {
            params.push(("aggregateType", aggregate_type.clone()));
        }
        if let Some(ref aggregate_id) = filter.aggregate_id {
            params.push(("aggregateId", aggregate_id.clone()));
        }
        if let Some(ref event_types) = filter.event_types {
            params.push(("eventType", event_types.join(",")));
        }
        if let Some(from) = filter.from {
            params.push(("from", common::time::format_nanos(&from)));
        }
        if let Some(to) = filter.to {
            params.push(("to", common::time::format_nanos(&to)));
        }
        params
    }
}

#[async_trait]
impl EventPublisher for EventStoreClient {
    #[tracing::instrument(skip(self, event), fields(event_id = %event.event_id, event_type = %event.event_type))]
    async fn publish(&self, event: NewEvent) -> Result<()> {
        let url = format!("{}/event", self.base_url);
        let response = self
            .client
            .post(&url)
            .headers(wire::publish_headers(&event)?)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(event.payload)
            .send()
            .await?;

        if response.status() != StatusCode::CREATED {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(EventStoreError::Rejected {
                endpoint: url,
                status,
                body,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl HistorySource for EventStoreClient {
    #[tracing::instrument(skip(self))]
    async fn fetch_history(&self, filter: &HistoryFilter) -> Result<Vec<StoredEvent>> {
        let url = format!("{}/history", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&Self::history_params(filter))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if status != StatusCode::OK {
            return Err(EventStoreError::Rejected {
                endpoint: url,
                status: status.as_u16(),
                body,
            });
        }

        let events: Vec<StoredEvent> = serde_json::from_str(&body)?;
        tracing::info!(count = events.len(), "events received from event store");
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let client = EventStoreClient::new("http://localhost:50100/", reqwest::Client::new());
        assert_eq!(client.base_url(), "http://localhost:50100");
    }

    #[test]
    fn test_history_params_only_include_set_fields() {
        let filter = HistoryFilter::for_aggregate_type("Transaction");
        assert_eq!(
            EventStoreClient::history_params(&filter),
            vec![("aggregateType", "Transaction".to_string())]
        );

        let filter = HistoryFilter::new()
            .event_types(vec!["A".to_string(), "B".to_string()])
            .to(Utc.timestamp_opt(1_700_000_000, 0).unwrap());
        assert_eq!(
            EventStoreClient::history_params(&filter),
            vec![
                ("eventType", "A,B".to_string()),
                ("to", "2023-11-14T22:13:20Z".to_string()),
            ]
        );
    }
}
