//! Several workers draining one outbox, and the background worker thread.

use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use leaderboard_sync::{
    InMemoryRecords, LeaderboardScope, LeaderboardUpdater, NewOutboxEvent, NewScoreLog,
    OutboxWorker, OutboxWorkerThread, WorkerConfig,
};

use crate::support::{scores, users, CountingRefresher, FlakyRepository, FlakyStore};
use crate::{setup, wait_until, worker};

#[test]
fn concurrent_workers_never_share_a_row() {
    let records = InMemoryRecords::new();
    for i in 0..200 {
        records
            .enqueue(NewOutboxEvent::refresh_contest_score(1, format!("user-{}", i)))
            .unwrap();
    }
    let store = FlakyStore::new();
    let repository = FlakyRepository::new(records.clone());
    let counter = Arc::new(CountingRefresher::new(LeaderboardUpdater::new(
        store.clone(),
        repository.clone(),
    )));
    let barrier = Arc::new(Barrier::new(4));

    let handles: Vec<_> = (0..4)
        .map(|n| {
            let worker = OutboxWorker::new(records.clone(), Arc::clone(&counter))
                .with_worker_id(format!("w{}", n))
                .with_batch_size(7);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                let mut claimed = 0;
                loop {
                    let report = worker.tick().unwrap();
                    if report.is_idle() {
                        break claimed;
                    }
                    claimed += report.claimed;
                }
            })
        })
        .collect();

    let claimed: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();

    assert_eq!(claimed, 200);
    let per_target = counter.per_target();
    assert_eq!(per_target.len(), 200);
    assert!(per_target.values().all(|&n| n == 1));
    assert!(records.pending_events().unwrap().is_empty());
}

#[test]
fn worker_thread_drains_the_outbox() {
    let (records, store, repository) = setup();
    let config = WorkerConfig::new().with_poll_interval(Duration::from_millis(10));
    let thread =
        OutboxWorkerThread::spawn(worker(&records, &store, &repository).with_config(config));

    for (user, score) in [("alice", 30.0), ("bob", 20.0), ("carol", 10.0)] {
        records
            .create_log(NewScoreLog::new(user, 2024, score).in_contest(3))
            .unwrap();
    }

    wait_until(|| records.pending_events().unwrap().is_empty());
    let stats = thread.stop();

    assert!(stats.ticks >= 1);
    assert_eq!(stats.events_claimed, 6);
    assert_eq!(stats.events_processed, 6);
    assert_eq!(stats.claim_failures, 0);
    assert_eq!(
        users(&store.inner.snapshot(&LeaderboardScope::Contest(3)).unwrap().unwrap()),
        users(&scores(&[("alice", 30.0), ("bob", 20.0), ("carol", 10.0)]))
    );
}

#[test]
fn worker_thread_sweeps_old_processed_rows() {
    let (records, store, repository) = setup();
    records.create_log(NewScoreLog::new("alice", 2024, 1.0)).unwrap();
    let config = WorkerConfig::new()
        .with_poll_interval(Duration::from_millis(10))
        .with_cleanup_interval(Duration::ZERO)
        .with_retention(Duration::ZERO);
    let thread =
        OutboxWorkerThread::spawn(worker(&records, &store, &repository).with_config(config));

    wait_until(|| records.outbox_rows().unwrap().is_empty());
    let stats = thread.stop();

    assert!(stats.cleanups >= 1);
    assert_eq!(stats.rows_deleted, 1);
}
