//! Bootstrap from history while absorbing live events.
//!
//! A subscriber starts listening for live events before it asks the store
//! for history, so the two overlap. The coordinator queues live events while
//! history loads, then drains the queue in index order, discarding anything
//! the history already covered.

use std::time::{Duration, Instant};

use event_store::{EventIndex, HistoryFilter, HistorySource, StoredEvent};
use tokio::sync::{mpsc, watch};

use crate::projection::Projection;
use crate::{ProjectionError, Result};

/// Default number of attempts to load history.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 20;

/// Default pause between attempts to load history.
pub const DEFAULT_BACKOFF: Duration = Duration::from_secs(3);

/// Where a coordinator is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayPhase {
    /// History is being fetched and applied; live events are queued.
    Loading,
    /// Queued live events are being applied.
    Draining,
    /// Live events are applied as they arrive.
    Live,
}

impl std::fmt::Display for ReplayPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ReplayPhase::Loading => "loading",
            ReplayPhase::Draining => "draining",
            ReplayPhase::Live => "live",
        };
        f.write_str(name)
    }
}

/// Fixed-backoff retry budget for loading history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts,
            backoff,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, DEFAULT_BACKOFF)
    }
}

/// Counters describing what the coordinator has done so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayStats {
    /// Events applied from history.
    pub replayed: u64,
    /// Queued live events applied during draining.
    pub drained: u64,
    /// Live events applied after draining.
    pub live: u64,
    /// Live events dropped because history already covered them.
    pub discarded: u64,
    /// Live events that failed to apply.
    pub failed: u64,
}

/// What happened to one live event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    /// Held until history has been applied.
    Queued,
    /// Applied to the projection.
    Applied,
    /// Already covered by history.
    Discarded,
}

/// Fetches history, retrying with a fixed backoff.
///
/// Exhausting the budget is a [`ProjectionError::Bootstrap`] carrying the
/// last failure.
pub async fn fetch_history<H>(
    source: &H,
    filter: &HistoryFilter,
    policy: &RetryPolicy,
) -> Result<Vec<StoredEvent>>
where
    H: HistorySource + ?Sized,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;
    loop {
        attempt += 1;
        match source.fetch_history(filter).await {
            Ok(events) => return Ok(events),
            Err(source) if attempt >= max_attempts => {
                return Err(ProjectionError::Bootstrap {
                    attempts: attempt,
                    source,
                });
            }
            Err(e) => {
                tracing::warn!(
                    attempt,
                    max_attempts,
                    error = %e,
                    "error loading history, retrying"
                );
                tokio::time::sleep(policy.backoff).await;
            }
        }
    }
}

/// Drives one projection from startup through to live operation.
pub struct ReplayCoordinator<P> {
    projection: P,
    aggregate_type: String,
    phase: watch::Sender<ReplayPhase>,
    high_water: EventIndex,
    pending: Vec<StoredEvent>,
    stats: ReplayStats,
}

impl<P: Projection> ReplayCoordinator<P> {
    /// Creates a coordinator in the `Loading` phase for events of one
    /// aggregate type.
    pub fn new(projection: P, aggregate_type: impl Into<String>) -> Self {
        let (phase, _) = watch::channel(ReplayPhase::Loading);
        Self {
            projection,
            aggregate_type: aggregate_type.into(),
            phase,
            high_water: EventIndex::initial(),
            pending: Vec::new(),
            stats: ReplayStats::default(),
        }
    }

    pub fn projection(&self) -> &P {
        &self.projection
    }

    pub fn phase(&self) -> ReplayPhase {
        *self.phase.borrow()
    }

    /// Returns a receiver that observes phase changes.
    pub fn watch_phase(&self) -> watch::Receiver<ReplayPhase> {
        self.phase.subscribe()
    }

    /// Index of the last event applied from history.
    pub fn high_water_mark(&self) -> EventIndex {
        self.high_water
    }

    pub fn stats(&self) -> ReplayStats {
        self.stats
    }

    /// Loads history and brings the projection live.
    ///
    /// While history is being fetched, events arriving on `live` are queued.
    /// A fetch that exhausts the retry budget or a history event that fails
    /// to apply is returned as an error and the coordinator stays in
    /// `Loading`.
    #[tracing::instrument(skip_all, fields(projection = self.projection.name()))]
    pub async fn bootstrap<H>(
        &mut self,
        source: &H,
        policy: &RetryPolicy,
        live: &mut mpsc::Receiver<StoredEvent>,
    ) -> Result<ReplayStats>
    where
        H: HistorySource + ?Sized,
    {
        let started = Instant::now();
        let filter = HistoryFilter::for_aggregate_type(self.aggregate_type.clone());

        let history = {
            let fetch = fetch_history(source, &filter, policy);
            tokio::pin!(fetch);
            loop {
                tokio::select! {
                    result = &mut fetch => break result?,
                    Some(event) = live.recv() => {
                        self.handle(event).await?;
                    }
                }
            }
        };

        self.replay(history).await?;
        self.drain().await;

        metrics::histogram!("bootstrap_duration_seconds").record(started.elapsed().as_secs_f64());
        tracing::info!(
            replayed = self.stats.replayed,
            drained = self.stats.drained,
            discarded = self.stats.discarded,
            high_water_mark = %self.high_water,
            "projection is live"
        );
        Ok(self.stats)
    }

    /// Applies history in ascending index order.
    ///
    /// Only valid while `Loading`; any failure is fatal to startup.
    pub async fn replay(&mut self, mut history: Vec<StoredEvent>) -> Result<()> {
        if self.phase() != ReplayPhase::Loading {
            return Err(ProjectionError::Projection(format!(
                "cannot replay history while {}",
                self.phase()
            )));
        }

        history.sort_by_key(|e| e.event_index);
        for event in &history {
            self.projection.apply(event).await.inspect_err(|e| {
                tracing::error!(
                    event_index = %event.event_index,
                    error = %e,
                    "error replaying event"
                );
            })?;
            self.high_water = self.high_water.max(event.event_index);
            self.stats.replayed += 1;
        }
        Ok(())
    }

    /// Applies the queued live events and switches to `Live`.
    ///
    /// Queued events covered by history, or repeated within the queue, are
    /// discarded.
    pub async fn drain(&mut self) {
        self.phase.send_replace(ReplayPhase::Draining);

        let mut pending = std::mem::take(&mut self.pending);
        pending.sort_by_key(|e| e.event_index);

        let mut applied_through = self.high_water;
        for event in pending {
            if event.event_index <= applied_through {
                self.discard(&event);
                continue;
            }
            applied_through = event.event_index;
            match self.projection.apply(&event).await {
                Ok(()) => self.stats.drained += 1,
                Err(e) => self.fail(&event, &e),
            }
        }

        self.phase.send_replace(ReplayPhase::Live);
    }

    /// Handles one live event according to the current phase.
    ///
    /// In `Live`, an apply failure is returned to the caller and counted;
    /// the projection is unchanged and later events still apply.
    pub async fn handle(&mut self, event: StoredEvent) -> Result<EventOutcome> {
        match self.phase() {
            ReplayPhase::Loading | ReplayPhase::Draining => {
                tracing::debug!(event_index = %event.event_index, "queued live event");
                self.pending.push(event);
                Ok(EventOutcome::Queued)
            }
            ReplayPhase::Live => {
                if event.event_index <= self.high_water {
                    self.discard(&event);
                    return Ok(EventOutcome::Discarded);
                }
                match self.projection.apply(&event).await {
                    Ok(()) => {
                        self.stats.live += 1;
                        Ok(EventOutcome::Applied)
                    }
                    Err(e) => {
                        self.fail(&event, &e);
                        Err(e)
                    }
                }
            }
        }
    }

    fn discard(&mut self, event: &StoredEvent) {
        self.stats.discarded += 1;
        metrics::counter!("events_discarded_total", "projection" => self.projection.name())
            .increment(1);
        tracing::debug!(
            event_index = %event.event_index,
            high_water_mark = %self.high_water,
            "discarded duplicate event"
        );
    }

    fn fail(&mut self, event: &StoredEvent, error: &ProjectionError) {
        self.stats.failed += 1;
        metrics::counter!("events_apply_failures_total", "projection" => self.projection.name())
            .increment(1);
        tracing::warn!(
            event_index = %event.event_index,
            event_id = %event.event_id,
            error = %error,
            "error applying event"
        );
    }
}
