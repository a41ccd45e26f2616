//! The ledger aggregate: live transactions and their running balance.

use common::TransactionId;

use crate::aggregate::Aggregate;
use crate::error::DomainError;
use crate::events::{AGGREGATE_TYPE, TransactionEvent};
use crate::transaction::Transaction;

/// Insertion-ordered transactions plus the sum of their amounts.
///
/// The balance is only changed by the same call that inserts or removes a
/// transaction, so `balance == sum(amount)` holds after every operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    transactions: Vec<Transaction>,
    balance: i64,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn balance(&self) -> i64 {
        self.balance
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// Appends a transaction.
    ///
    /// Fails without changing anything if the balance would leave the `i64`
    /// range.
    pub fn insert(&mut self, tx: Transaction) -> Result<(), DomainError> {
        self.balance = self.checked_balance(self.balance.checked_add(tx.amount))?;
        self.transactions.push(tx);
        Ok(())
    }

    /// Removes the most recently inserted transaction with the given id.
    ///
    /// Returns the position it was removed from so the removal can be undone
    /// with [`Ledger::restore`].
    pub fn remove(&mut self, id: TransactionId) -> Result<(usize, Transaction), DomainError> {
        let position = self
            .transactions
            .iter()
            .rposition(|tx| tx.id == id)
            .ok_or(DomainError::TransactionNotFound(id))?;

        let balance = self.checked_balance(
            self.balance
                .checked_sub(self.transactions[position].amount),
        )?;
        let tx = self.transactions.remove(position);
        self.balance = balance;
        Ok((position, tx))
    }

    /// Re-inserts a removed transaction at its original position.
    ///
    /// A position past the end appends.
    pub fn restore(&mut self, position: usize, tx: Transaction) -> Result<(), DomainError> {
        let position = position.min(self.transactions.len());
        self.balance = self.checked_balance(self.balance.checked_add(tx.amount))?;
        self.transactions.insert(position, tx);
        Ok(())
    }

    fn checked_balance(&self, next: Option<i64>) -> Result<i64, DomainError> {
        next.ok_or(DomainError::BalanceOverflow {
            balance: self.balance,
        })
    }
}

impl Aggregate for Ledger {
    type Event = TransactionEvent;
    type Error = DomainError;

    fn aggregate_type() -> &'static str {
        AGGREGATE_TYPE
    }

    fn apply(&mut self, event: Self::Event) -> Result<(), Self::Error> {
        match event {
            TransactionEvent::TransactionAdded(data) => self.insert(data.into()),
            TransactionEvent::TransactionDeleted(data) => {
                self.remove(data.transaction_id).map(|_| ())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{TransactionAddedData, TransactionDeletedData};
    use chrono::Utc;

    fn tx(amount: i64) -> Transaction {
        Transaction {
            id: TransactionId::new(),
            debit_account: "cash".to_string(),
            credit_account: "revenue".to_string(),
            amount,
            description: String::new(),
            occurred: Utc::now(),
        }
    }

    fn sum(ledger: &Ledger) -> i64 {
        ledger.transactions().iter().map(|t| t.amount).sum()
    }

    fn added(tx: &Transaction) -> TransactionEvent {
        TransactionEvent::TransactionAdded(TransactionAddedData::from(tx))
    }

    fn deleted(id: TransactionId) -> TransactionEvent {
        TransactionEvent::TransactionDeleted(TransactionDeletedData { transaction_id: id })
    }

    #[test]
    fn test_add_two_then_delete_first() {
        let a = tx(100);
        let b = tx(-30);
        let mut ledger = Ledger::new();

        ledger.apply(added(&a)).unwrap();
        ledger.apply(added(&b)).unwrap();
        assert_eq!(ledger.balance(), 70);

        ledger.apply(deleted(a.id)).unwrap();
        assert_eq!(ledger.balance(), -30);
        assert_eq!(ledger.transactions(), &[b]);
    }

    #[test]
    fn test_second_delete_is_not_found() {
        let a = tx(5);
        let mut ledger = Ledger::new();
        ledger.apply(added(&a)).unwrap();
        ledger.apply(deleted(a.id)).unwrap();

        let err = ledger.apply(deleted(a.id)).unwrap_err();
        assert!(matches!(err, DomainError::TransactionNotFound(id) if id == a.id));
        assert_eq!(ledger.balance(), 0);
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_remove_takes_newest_duplicate() {
        let first = tx(1);
        let mut second = tx(2);
        second.id = first.id;

        let mut ledger = Ledger::new();
        ledger.insert(first.clone()).unwrap();
        ledger.insert(tx(10)).unwrap();
        ledger.insert(second.clone()).unwrap();

        let (position, removed) = ledger.remove(first.id).unwrap();
        assert_eq!(position, 2);
        assert_eq!(removed, second);
        assert_eq!(ledger.transactions()[0], first);
    }

    #[test]
    fn test_restore_puts_transaction_back_in_place() {
        let txs: Vec<Transaction> = [1, 2, 3].into_iter().map(tx).collect();
        let mut ledger = Ledger::new();
        for t in &txs {
            ledger.insert(t.clone()).unwrap();
        }
        let before = ledger.clone();

        let (position, removed) = ledger.remove(txs[1].id).unwrap();
        ledger.restore(position, removed).unwrap();

        assert_eq!(ledger, before);
    }

    #[test]
    fn test_balance_matches_sum_after_every_step() {
        let txs: Vec<Transaction> = [100, -30, 45, 0, -7].into_iter().map(tx).collect();
        let mut ledger = Ledger::new();

        for t in &txs {
            ledger.apply(added(t)).unwrap();
            assert_eq!(ledger.balance(), sum(&ledger));
        }
        for t in txs.iter().rev().step_by(2) {
            ledger.apply(deleted(t.id)).unwrap();
            assert_eq!(ledger.balance(), sum(&ledger));
        }
        assert_eq!(ledger.len(), 2);
    }

    #[test]
    fn test_insert_past_i64_max_is_rejected() {
        let mut ledger = Ledger::new();
        ledger.apply(added(&tx(i64::MAX))).unwrap();

        let err = ledger.apply(added(&tx(1))).unwrap_err();
        assert!(matches!(err, DomainError::BalanceOverflow { balance } if balance == i64::MAX));
        assert_eq!(ledger.balance(), i64::MAX);
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_remove_that_would_overflow_is_rejected() {
        let minus = tx(-1);
        let mut ledger = Ledger::new();
        ledger.insert(tx(i64::MAX)).unwrap();
        ledger.insert(minus.clone()).unwrap();
        ledger.insert(tx(1)).unwrap();
        assert_eq!(ledger.balance(), i64::MAX);

        let err = ledger.remove(minus.id).unwrap_err();
        assert!(matches!(err, DomainError::BalanceOverflow { .. }));
        assert_eq!(ledger.balance(), i64::MAX);
        assert_eq!(ledger.len(), 3);
    }

    #[test]
    fn test_aggregate_type_matches_event_header() {
        let event = added(&tx(1)).to_new_event().unwrap();
        assert_eq!(Ledger::aggregate_type(), event.aggregate_type);
    }
}
