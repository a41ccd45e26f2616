//! Query API of the read side.

use axum::Json;
use axum::extract::{Query, State};
use projections::{LedgerQuery, ProjectionStore, QueryResponse};
use serde::Deserialize;

use crate::error::ApiError;

/// `?snapshot=<RFC 3339>` answers the query as of that store time.
#[derive(Debug, Default, Deserialize)]
pub struct SnapshotParams {
    pub snapshot: Option<String>,
}

impl SnapshotParams {
    fn cutoff(&self) -> Result<Option<chrono::DateTime<chrono::Utc>>, ApiError> {
        match self.snapshot.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => super::parse_timestamp(raw)
                .map(Some)
                .map_err(|e| ApiError::BadRequest(format!("invalid snapshot {raw:?}: {e}"))),
        }
    }
}

/// GET /transaction
pub async fn list(
    State(store): State<ProjectionStore>,
    Query(params): Query<SnapshotParams>,
) -> Result<Json<QueryResponse>, ApiError> {
    answer(&store, LedgerQuery::ListTransactions, &params).await
}

/// GET /balance
pub async fn balance(
    State(store): State<ProjectionStore>,
    Query(params): Query<SnapshotParams>,
) -> Result<Json<QueryResponse>, ApiError> {
    answer(&store, LedgerQuery::GetBalance, &params).await
}

async fn answer(
    store: &ProjectionStore,
    query: LedgerQuery,
    params: &SnapshotParams,
) -> Result<Json<QueryResponse>, ApiError> {
    let response = store.query(query, params.cutoff()?).await?;
    Ok(Json(response))
}
