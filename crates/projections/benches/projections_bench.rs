use chrono::{TimeZone, Utc};
use common::TransactionId;
use criterion::{Criterion, criterion_group, criterion_main};
use domain::{Transaction, TransactionAddedData, TransactionDeletedData, TransactionEvent};
use event_store::{EventIndex, StoredEvent};
use projections::{LedgerQuery, Projection, ProjectionStore, ReplayCoordinator};

/// Builds N events: every third one deletes the transaction added just before it.
fn make_history(n: i64) -> Vec<StoredEvent> {
    let mut events = Vec::new();
    let mut last_id = TransactionId::new();
    for i in 1..=n {
        let event = if i % 3 == 0 {
            TransactionEvent::TransactionDeleted(TransactionDeletedData {
                transaction_id: last_id,
            })
        } else {
            let tx = Transaction {
                id: TransactionId::new(),
                debit_account: "cash".to_string(),
                credit_account: "revenue".to_string(),
                amount: i,
                description: "bench".to_string(),
                occurred: Utc.timestamp_opt(i, 0).unwrap(),
            };
            last_id = tx.id;
            TransactionEvent::TransactionAdded(TransactionAddedData::from(&tx))
        };
        events.push(StoredEvent::from_new(
            event.to_new_event().unwrap(),
            EventIndex::new(i),
            Utc.timestamp_opt(i, 0).unwrap(),
        ));
    }
    events
}

fn bench_replay_3000_events(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let history = make_history(3000);

    c.bench_function("projections/replay_3000_events", |b| {
        b.iter(|| {
            rt.block_on(async {
                let mut coordinator =
                    ReplayCoordinator::new(ProjectionStore::new("bench"), "Transaction");
                coordinator.replay(history.clone()).await.unwrap();
                coordinator.drain().await;
            });
        });
    });
}

fn bench_apply_single_event(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let history = make_history(1);

    c.bench_function("projections/apply_single_event", |b| {
        b.iter(|| {
            rt.block_on(async {
                let store = ProjectionStore::new("bench");
                store.apply(&history[0]).await.unwrap();
            });
        });
    });
}

fn bench_snapshot_query(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = ProjectionStore::new("bench");
    rt.block_on(async {
        for event in make_history(3000) {
            store.apply(&event).await.unwrap();
        }
    });
    let cutoff = Utc.timestamp_opt(1500, 0).unwrap();

    c.bench_function("projections/snapshot_balance_3000_events", |b| {
        b.iter(|| {
            rt.block_on(async {
                store
                    .query(LedgerQuery::GetBalance, Some(cutoff))
                    .await
                    .unwrap();
            });
        });
    });
}

criterion_group!(
    benches,
    bench_replay_3000_events,
    bench_apply_single_event,
    bench_snapshot_query,
);
criterion_main!(benches);
