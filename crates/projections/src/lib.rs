//! Projections for both sides of the accounting ledger.
//!
//! - [`Projection`] trait for folding log events into state
//! - [`ProjectionStore`], the mutex-guarded ledger with snapshot queries
//! - [`ReplayCoordinator`], which bootstraps a projection from history while
//!   absorbing live events

pub mod error;
pub mod projection;
pub mod query;
pub mod replay;
pub mod store;

pub use error::{ProjectionError, Result};
pub use projection::{Projection, ProjectionPosition};
pub use query::{BalanceView, LedgerQuery, QueryResponse};
pub use replay::{
    EventOutcome, ReplayCoordinator, ReplayPhase, ReplayStats, RetryPolicy, fetch_history,
};
pub use store::ProjectionStore;
