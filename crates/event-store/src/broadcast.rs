//! Fan-out of appended events to subscriber endpoints.
//!
//! Delivery is at-most-once and best-effort: a failed delivery is logged and
//! counted, never retried, and never reported to whoever appended the event.
//! Subscribers that miss events catch up by replaying history on restart.

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::join_all;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;

use crate::{EventStoreError, Result, StoredEvent, wire};

/// A destination for broadcast events.
#[async_trait]
pub trait Subscriber: Send + Sync {
    /// Human-readable endpoint name used in logs.
    fn endpoint(&self) -> &str;

    /// Delivers one event. Errors are collected by the broadcaster.
    async fn deliver(&self, event: &StoredEvent) -> Result<()>;
}

/// A subscriber reached by `POST <url>` with the event in headers and body.
#[derive(Debug, Clone)]
pub struct HttpSubscriber {
    url: String,
    client: reqwest::Client,
}

impl HttpSubscriber {
    pub fn new(url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            url: url.into(),
            client,
        }
    }
}

#[async_trait]
impl Subscriber for HttpSubscriber {
    fn endpoint(&self) -> &str {
        &self.url
    }

    async fn deliver(&self, event: &StoredEvent) -> Result<()> {
        let response = self
            .client
            .post(&self.url)
            .headers(wire::broadcast_headers(event)?)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(event.payload.clone())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EventStoreError::Rejected {
                endpoint: self.url.clone(),
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}

/// One subscriber that did not accept an event.
#[derive(Debug)]
pub struct BroadcastFailure {
    pub endpoint: String,
    pub error: EventStoreError,
}

/// Delivers each event to a fixed set of subscribers.
#[derive(Clone, Default)]
pub struct Broadcaster {
    subscribers: Vec<Arc<dyn Subscriber>>,
}

impl Broadcaster {
    /// Creates a broadcaster for the given subscribers.
    pub fn new(subscribers: Vec<Arc<dyn Subscriber>>) -> Self {
        Self { subscribers }
    }

    /// Creates a broadcaster posting to each URL with a shared client.
    pub fn http(urls: impl IntoIterator<Item = String>, client: reqwest::Client) -> Self {
        let subscribers = urls
            .into_iter()
            .map(|url| Arc::new(HttpSubscriber::new(url, client.clone())) as Arc<dyn Subscriber>)
            .collect();
        Self::new(subscribers)
    }

    /// Returns the number of registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Delivers an event to every subscriber independently.
    ///
    /// A failing subscriber does not delay or prevent delivery to the others.
    /// Failures are logged and returned for inspection.
    #[tracing::instrument(skip(self, event), fields(event_index = %event.event_index))]
    pub async fn broadcast(&self, event: &StoredEvent) -> Vec<BroadcastFailure> {
        let deliveries = self.subscribers.iter().map(|subscriber| async move {
            subscriber
                .deliver(event)
                .await
                .err()
                .map(|error| BroadcastFailure {
                    endpoint: subscriber.endpoint().to_string(),
                    error,
                })
        });

        let failures: Vec<BroadcastFailure> =
            join_all(deliveries).await.into_iter().flatten().collect();

        if !failures.is_empty() {
            metrics::counter!("broadcast_failures_total").increment(failures.len() as u64);
            let summary: Vec<String> = failures
                .iter()
                .map(|f| format!("{}: {}", f.endpoint, f.error))
                .collect();
            tracing::warn!(
                event_id = %event.event_id,
                errors = %summary.join(", "),
                "errors broadcasting event"
            );
        }

        failures
    }

    /// Runs the broadcaster against a live feed until the feed closes.
    ///
    /// Events are delivered one at a time in feed order, so every subscriber
    /// receives events in index order.
    pub fn spawn(self, mut feed: broadcast::Receiver<StoredEvent>) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                match feed.recv().await {
                    Ok(event) => {
                        self.broadcast(&event).await;
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        metrics::counter!("broadcast_failures_total").increment(skipped);
                        tracing::warn!(skipped, "broadcaster lagged behind the log, events dropped");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            tracing::info!("broadcaster stopped");
        })
    }
}
