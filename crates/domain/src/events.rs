//! Ledger events and their wire encoding.
//!
//! On the wire the event type travels in a header and the payload is the
//! bare data object, so encoding and decoding go through the type name
//! rather than a serde tag.

use chrono::{DateTime, Utc};
use common::TransactionId;
use event_store::{EventId, NewEvent, StoredEvent};
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;
use crate::error::DomainError;
use crate::transaction::Transaction;

/// Aggregate type of every ledger event.
pub const AGGREGATE_TYPE: &str = "Transaction";

pub const TRANSACTION_ADDED: &str = "TransactionAdded";
pub const TRANSACTION_DELETED: &str = "TransactionDeleted";

/// Events that can occur on the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionEvent {
    /// A transaction was recorded.
    TransactionAdded(TransactionAddedData),

    /// A transaction was removed.
    TransactionDeleted(TransactionDeletedData),
}

/// Data for the TransactionAdded event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionAddedData {
    pub transaction_id: TransactionId,
    pub debit_account: String,
    pub credit_account: String,
    pub amount: i64,
    pub description: String,
    #[serde(with = "common::time::rfc3339_nanos")]
    pub occurred: DateTime<Utc>,
}

/// Data for the TransactionDeleted event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDeletedData {
    pub transaction_id: TransactionId,
}

impl From<&Transaction> for TransactionAddedData {
    fn from(tx: &Transaction) -> Self {
        Self {
            transaction_id: tx.id,
            debit_account: tx.debit_account.clone(),
            credit_account: tx.credit_account.clone(),
            amount: tx.amount,
            description: tx.description.clone(),
            occurred: tx.occurred,
        }
    }
}

impl From<TransactionAddedData> for Transaction {
    fn from(data: TransactionAddedData) -> Self {
        Self {
            id: data.transaction_id,
            debit_account: data.debit_account,
            credit_account: data.credit_account,
            amount: data.amount,
            description: data.description,
            occurred: data.occurred,
        }
    }
}

impl DomainEvent for TransactionEvent {
    fn event_type(&self) -> &'static str {
        match self {
            TransactionEvent::TransactionAdded(_) => TRANSACTION_ADDED,
            TransactionEvent::TransactionDeleted(_) => TRANSACTION_DELETED,
        }
    }

    fn aggregate_id(&self) -> String {
        self.transaction_id().to_string()
    }
}

impl TransactionEvent {
    /// Returns the id of the transaction the event refers to.
    pub fn transaction_id(&self) -> TransactionId {
        match self {
            TransactionEvent::TransactionAdded(data) => data.transaction_id,
            TransactionEvent::TransactionDeleted(data) => data.transaction_id,
        }
    }

    /// Decodes an event from its type name and JSON payload.
    pub fn decode(event_type: &str, payload: &str) -> Result<Self, DomainError> {
        match event_type {
            TRANSACTION_ADDED => Ok(TransactionEvent::TransactionAdded(serde_json::from_str(
                payload,
            )?)),
            TRANSACTION_DELETED => Ok(TransactionEvent::TransactionDeleted(
                serde_json::from_str(payload)?,
            )),
            other => Err(DomainError::UnknownEventType(other.to_string())),
        }
    }

    /// Decodes an event as stored in the log.
    pub fn from_stored(event: &StoredEvent) -> Result<Self, DomainError> {
        Self::decode(&event.event_type, &event.payload)
    }

    /// Encodes the event for publishing under a fresh event id.
    pub fn to_new_event(&self) -> Result<NewEvent, DomainError> {
        let payload = match self {
            TransactionEvent::TransactionAdded(data) => serde_json::to_string(data)?,
            TransactionEvent::TransactionDeleted(data) => serde_json::to_string(data)?,
        };

        Ok(NewEvent {
            event_id: EventId::new(),
            event_type: self.event_type().to_string(),
            aggregate_id: self.aggregate_id(),
            aggregate_type: AGGREGATE_TYPE.to_string(),
            payload,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use event_store::EventIndex;

    fn added() -> TransactionEvent {
        TransactionEvent::TransactionAdded(TransactionAddedData {
            transaction_id: TransactionId::new(),
            debit_account: "cash".to_string(),
            credit_account: "revenue".to_string(),
            amount: 100,
            description: "sale".to_string(),
            occurred: Utc.timestamp_opt(1_700_000_000, 5).unwrap(),
        })
    }

    #[test]
    fn test_new_event_carries_headers_and_bare_payload() {
        let event = added();
        let new = event.to_new_event().unwrap();

        assert_eq!(new.event_type, "TransactionAdded");
        assert_eq!(new.aggregate_type, "Transaction");
        assert_eq!(new.aggregate_id, event.transaction_id().to_string());

        let json: serde_json::Value = serde_json::from_str(&new.payload).unwrap();
        assert_eq!(json["amount"], 100);
        assert_eq!(json["debitAccount"], "cash");
        assert_eq!(json["occurred"], "2023-11-14T22:13:20.000000005Z");
        assert!(json.get("type").is_none());
    }

    #[test]
    fn test_decodes_stored_event() {
        let event = added();
        let stored = StoredEvent::from_new(
            event.to_new_event().unwrap(),
            EventIndex::first(),
            Utc::now(),
        );
        assert_eq!(TransactionEvent::from_stored(&stored).unwrap(), event);
    }

    #[test]
    fn test_decodes_deleted_payload() {
        let id = TransactionId::new();
        let payload = format!(r#"{{"transactionId":"{id}"}}"#);
        let event = TransactionEvent::decode("TransactionDeleted", &payload).unwrap();
        assert_eq!(
            event,
            TransactionEvent::TransactionDeleted(TransactionDeletedData { transaction_id: id })
        );
    }

    #[test]
    fn test_unknown_event_type_is_rejected() {
        let err = TransactionEvent::decode("AccountOpened", "{}").unwrap_err();
        assert!(matches!(err, DomainError::UnknownEventType(t) if t == "AccountOpened"));
    }

    #[test]
    fn test_malformed_payload_is_rejected() {
        let err = TransactionEvent::decode("TransactionAdded", r#"{"amount":"ten"}"#).unwrap_err();
        assert!(matches!(err, DomainError::InvalidPayload(_)));
    }
}
