//! In-memory ledger projection with point-in-time snapshots.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::TransactionId;
use domain::{Aggregate, Ledger, Transaction, TransactionEvent};
use event_store::StoredEvent;
use tokio::sync::Mutex;

use crate::Result;
use crate::projection::{Projection, ProjectionPosition};
use crate::query::{LedgerQuery, QueryResponse};

/// An applied event kept for snapshot replay.
#[derive(Debug, Clone)]
struct JournalEntry {
    occurred_at: DateTime<Utc>,
    event: TransactionEvent,
}

#[derive(Debug, Default)]
struct ProjectionState {
    ledger: Ledger,
    journal: Vec<JournalEntry>,
    position: ProjectionPosition,
}

/// The ledger as seen by one service.
///
/// Every operation takes the same mutex, so applies, local writes and
/// queries on one store never interleave.
#[derive(Clone)]
pub struct ProjectionStore {
    name: &'static str,
    state: Arc<Mutex<ProjectionState>>,
}

impl ProjectionStore {
    /// Creates an empty projection.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            state: Arc::new(Mutex::new(ProjectionState::default())),
        }
    }

    /// Answers a query from live state, or from a snapshot when a cutoff is
    /// given.
    ///
    /// A snapshot is a fresh ledger built by replaying every applied event
    /// whose store timestamp is at or before the cutoff. It is discarded once
    /// the query is answered.
    #[tracing::instrument(skip(self), fields(projection = self.name))]
    pub async fn query(
        &self,
        query: LedgerQuery,
        cutoff: Option<DateTime<Utc>>,
    ) -> Result<QueryResponse> {
        let state = self.state.lock().await;
        let Some(cutoff) = cutoff else {
            return Ok(query.answer(&state.ledger));
        };

        let mut snapshot = Ledger::new();
        snapshot.apply_events(
            state
                .journal
                .iter()
                .filter(|e| e.occurred_at <= cutoff)
                .map(|e| e.event.clone()),
        )?;
        tracing::debug!(
            transactions = snapshot.len(),
            cutoff = %common::time::format_nanos(&cutoff),
            "built snapshot"
        );
        Ok(query.answer(&snapshot))
    }

    /// Returns a copy of the live transactions.
    pub async fn transactions(&self) -> Vec<Transaction> {
        self.state.lock().await.ledger.transactions().to_vec()
    }

    /// Returns the live balance.
    pub async fn balance(&self) -> i64 {
        self.state.lock().await.ledger.balance()
    }

    /// Records a transaction ahead of publishing its event.
    pub async fn insert_local(&self, tx: Transaction) -> Result<()> {
        Ok(self.state.lock().await.ledger.insert(tx)?)
    }

    /// Removes a transaction ahead of publishing its event.
    ///
    /// Returns where it was so [`ProjectionStore::restore_local`] can undo
    /// the removal.
    pub async fn remove_local(&self, id: TransactionId) -> Result<(usize, Transaction)> {
        Ok(self.state.lock().await.ledger.remove(id)?)
    }

    /// Puts a removed transaction back at its original position.
    pub async fn restore_local(&self, position: usize, tx: Transaction) -> Result<()> {
        Ok(self.state.lock().await.ledger.restore(position, tx)?)
    }
}

#[async_trait]
impl Projection for ProjectionStore {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn apply(&self, event: &StoredEvent) -> Result<()> {
        let decoded = TransactionEvent::from_stored(event)?;

        let mut state = self.state.lock().await;
        state.ledger.apply(decoded.clone())?;
        state.journal.push(JournalEntry {
            occurred_at: event.occurred_at,
            event: decoded,
        });
        state.position = state.position.advance(event.event_index);
        drop(state);

        metrics::counter!("events_applied_total", "projection" => self.name).increment(1);
        tracing::debug!(
            projection = self.name,
            event_index = %event.event_index,
            event_type = %event.event_type,
            "applied event"
        );
        Ok(())
    }

    async fn position(&self) -> ProjectionPosition {
        self.state.lock().await.position
    }
}
