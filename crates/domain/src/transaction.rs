use chrono::{DateTime, Utc};
use common::TransactionId;
use serde::{Deserialize, Serialize};

/// A double-entry ledger transaction.
///
/// `amount` is a signed integer in minor units and is never scaled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: TransactionId,
    pub debit_account: String,
    pub credit_account: String,
    pub amount: i64,
    pub description: String,
    #[serde(with = "common::time::rfc3339_nanos")]
    pub occurred: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use uuid::Uuid;

    #[test]
    fn test_serializes_in_camel_case() {
        let tx = Transaction {
            id: TransactionId::from_uuid(Uuid::nil()),
            debit_account: "cash".to_string(),
            credit_account: "revenue".to_string(),
            amount: -30,
            description: "refund".to_string(),
            occurred: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
        };

        let json = serde_json::to_value(&tx).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": "00000000-0000-0000-0000-000000000000",
                "debitAccount": "cash",
                "creditAccount": "revenue",
                "amount": -30,
                "description": "refund",
                "occurred": "2023-11-14T22:13:20Z"
            })
        );
    }
}
