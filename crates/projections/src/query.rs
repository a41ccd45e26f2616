//! Read-side queries and their responses.

use domain::{Ledger, Transaction};
use serde::Serialize;

/// The questions the read side can answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerQuery {
    ListTransactions,
    GetBalance,
}

/// Balance response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BalanceView {
    pub balance: i64,
}

/// Result of a [`LedgerQuery`], serialized as the bare response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum QueryResponse {
    Transactions(Vec<Transaction>),
    Balance(BalanceView),
}

impl LedgerQuery {
    /// Answers the query from a ledger.
    pub fn answer(&self, ledger: &Ledger) -> QueryResponse {
        match self {
            LedgerQuery::ListTransactions => {
                QueryResponse::Transactions(ledger.transactions().to_vec())
            }
            LedgerQuery::GetBalance => QueryResponse::Balance(BalanceView {
                balance: ledger.balance(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_balance_serializes_as_object() {
        let response = LedgerQuery::GetBalance.answer(&Ledger::new());
        assert_eq!(
            serde_json::to_value(response).unwrap(),
            serde_json::json!({"balance": 0})
        );
    }

    #[test]
    fn test_transactions_serialize_as_array() {
        let response = LedgerQuery::ListTransactions.answer(&Ledger::new());
        assert_eq!(
            serde_json::to_value(response).unwrap(),
            serde_json::json!([])
        );
    }
}
