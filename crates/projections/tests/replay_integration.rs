//! Integration tests: event log feed → replay coordinator → projection store.

use std::time::Duration;

use chrono::Utc;
use common::TransactionId;
use domain::{Transaction, TransactionAddedData, TransactionEvent};
use event_store::{EventLog, HistoryFilter, InMemoryEventLog, StoredEvent};
use projections::{
    LedgerQuery, ProjectionStore, QueryResponse, ReplayCoordinator, ReplayPhase, RetryPolicy,
};
use tokio::sync::mpsc;

fn add_event(amount: i64) -> TransactionEvent {
    TransactionEvent::TransactionAdded(TransactionAddedData::from(&Transaction {
        id: TransactionId::new(),
        debit_account: "cash".to_string(),
        credit_account: "revenue".to_string(),
        amount,
        description: String::new(),
        occurred: Utc::now(),
    }))
}

/// Forwards the log's live feed into an mpsc queue, the way subscriber
/// ingress does.
fn forward_feed(log: &InMemoryEventLog) -> mpsc::Receiver<StoredEvent> {
    let mut feed = log.subscribe();
    let (tx, rx) = mpsc::channel(1024);
    tokio::spawn(async move {
        while let Ok(event) = feed.recv().await {
            if tx.send(event).await.is_err() {
                break;
            }
        }
    });
    rx
}

async fn transactions(store: &ProjectionStore) -> Vec<Transaction> {
    match store
        .query(LedgerQuery::ListTransactions, None)
        .await
        .unwrap()
    {
        QueryResponse::Transactions(list) => list,
        other => panic!("unexpected response {other:?}"),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_bootstrap_during_concurrent_appends_converges() {
    let log = InMemoryEventLog::new();
    for amount in 1..=20 {
        log.append(add_event(amount).to_new_event().unwrap())
            .await
            .unwrap();
    }

    let mut live = forward_feed(&log);

    // Keep appending while the coordinator bootstraps.
    let writer = {
        let log = log.clone();
        tokio::spawn(async move {
            for amount in 21..=60 {
                log.append(add_event(amount).to_new_event().unwrap())
                    .await
                    .unwrap();
                tokio::task::yield_now().await;
            }
        })
    };

    let store = ProjectionStore::new("query");
    let mut coordinator = ReplayCoordinator::new(store.clone(), "Transaction");
    let policy = RetryPolicy::new(1, Duration::from_millis(1));
    coordinator
        .bootstrap(&log, &policy, &mut live)
        .await
        .unwrap();
    assert_eq!(coordinator.phase(), ReplayPhase::Live);

    writer.await.unwrap();

    // Everything still in the queue is applied live.
    while store.balance().await != (1..=60).sum::<i64>() {
        let event = tokio::time::timeout(Duration::from_secs(5), live.recv())
            .await
            .expect("live event")
            .expect("feed open");
        coordinator.handle(event).await.unwrap();
    }

    let expected: Vec<i64> = log
        .history(&HistoryFilter::new())
        .await
        .unwrap()
        .iter()
        .map(|e| match TransactionEvent::from_stored(e).unwrap() {
            TransactionEvent::TransactionAdded(data) => data.amount,
            TransactionEvent::TransactionDeleted(_) => unreachable!(),
        })
        .collect();
    let amounts: Vec<i64> = transactions(&store).await.iter().map(|t| t.amount).collect();
    assert_eq!(amounts, expected);
    assert_eq!(amounts, (1..=60).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_two_subscribers_converge_on_the_same_state() {
    let log = InMemoryEventLog::new();
    for amount in [100, -30, 7] {
        log.append(add_event(amount).to_new_event().unwrap())
            .await
            .unwrap();
    }

    let policy = RetryPolicy::default();
    let first = ProjectionStore::new("first");
    let second = ProjectionStore::new("second");

    for store in [&first, &second] {
        let (_tx, mut rx) = mpsc::channel(1);
        ReplayCoordinator::new(store.clone(), "Transaction")
            .bootstrap(&log, &policy, &mut rx)
            .await
            .unwrap();
    }

    assert_eq!(transactions(&first).await, transactions(&second).await);
    assert_eq!(first.balance().await, 77);
    assert_eq!(second.balance().await, 77);
}
