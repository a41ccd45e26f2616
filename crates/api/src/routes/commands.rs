//! Command API of the write side.
//!
//! Commands are validated here and then queued; the response only says the
//! command was accepted. Outcomes show up on the query side once the event
//! store has broadcast them.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use common::TransactionId;
use domain::{AddTransaction, DeleteTransaction, LedgerCommand};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::worker::WorkQueue;

/// When a transaction happened: RFC 3339 text or whole Unix seconds.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Occurred {
    UnixSeconds(i64),
    Rfc3339(String),
}

impl Occurred {
    fn into_datetime(self) -> Result<DateTime<Utc>, ApiError> {
        match self {
            Occurred::UnixSeconds(secs) => DateTime::from_timestamp(secs, 0)
                .ok_or_else(|| ApiError::BadRequest(format!("occurred out of range: {secs}"))),
            Occurred::Rfc3339(raw) => common::time::parse_nanos(&raw)
                .map_err(|e| ApiError::BadRequest(format!("invalid occurred {raw:?}: {e}"))),
        }
    }
}

/// Request body for `POST /transaction`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddTransactionRequest {
    pub debit_account: String,
    pub credit_account: String,
    pub amount: i64,
    #[serde(default)]
    pub description: String,
    pub occurred: Occurred,
}

impl TryFrom<AddTransactionRequest> for AddTransaction {
    type Error = ApiError;

    fn try_from(req: AddTransactionRequest) -> Result<Self, Self::Error> {
        Ok(AddTransaction {
            debit_account: req.debit_account,
            credit_account: req.credit_account,
            amount: req.amount,
            description: req.description,
            occurred: req.occurred.into_datetime()?,
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptedResponse {
    pub command_type: &'static str,
}

/// POST /transaction
pub async fn add(
    State(queue): State<WorkQueue>,
    body: Result<Json<AddTransactionRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AcceptedResponse>), ApiError> {
    let Json(req) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let command = LedgerCommand::AddTransaction(req.try_into()?);
    accept(&queue, command).await
}

/// DELETE /transaction/{id}
pub async fn delete(
    State(queue): State<WorkQueue>,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<AcceptedResponse>), ApiError> {
    let transaction_id: TransactionId = id
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("couldn't parse transaction ID {id:?}")))?;
    let command = LedgerCommand::DeleteTransaction(DeleteTransaction { transaction_id });
    accept(&queue, command).await
}

async fn accept(
    queue: &WorkQueue,
    command: LedgerCommand,
) -> Result<(StatusCode, Json<AcceptedResponse>), ApiError> {
    command.validate()?;
    let command_type = command.command_type();
    queue.submit_command(command).await?;
    metrics::counter!("commands_accepted_total", "command" => command_type).increment(1);
    tracing::info!(command_type, "command accepted");
    Ok((StatusCode::ACCEPTED, Json(AcceptedResponse { command_type })))
}
