//! End-to-end sync tests: score writes flow through the outbox into the
//! leaderboard store.

#[path = "../support/mod.rs"]
mod support;

mod threaded;
mod worker;

use std::thread;
use std::time::{Duration, Instant};

use leaderboard_sync::{
    InMemoryRecords, LeaderboardScope, LeaderboardScore, LeaderboardUpdater, OutboxWorker,
};
use support::{CountingRefresher, FlakyRepository, FlakyStore};

type Updater = LeaderboardUpdater<FlakyStore, FlakyRepository>;

fn setup() -> (InMemoryRecords, FlakyStore, FlakyRepository) {
    let records = InMemoryRecords::new();
    let store = FlakyStore::new();
    let repository = FlakyRepository::new(records.clone());
    (records, store, repository)
}

fn worker(
    records: &InMemoryRecords,
    store: &FlakyStore,
    repository: &FlakyRepository,
) -> OutboxWorker<InMemoryRecords, CountingRefresher<Updater>> {
    let updater = LeaderboardUpdater::new(store.clone(), repository.clone());
    OutboxWorker::new(records.clone(), CountingRefresher::new(updater)).with_worker_id("test")
}

fn truth(scores: &[LeaderboardScore]) -> Vec<(String, f64)> {
    scores
        .iter()
        .map(|s| (s.user_id.clone(), s.score))
        .collect()
}

fn snapshot(store: &FlakyStore, scope: LeaderboardScope) -> Option<Vec<(String, f64)>> {
    store
        .inner
        .snapshot(&scope)
        .unwrap()
        .map(|scores| truth(&scores))
}

fn wait_until(mut done: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !done() {
        assert!(Instant::now() < deadline, "condition not reached in time");
        thread::sleep(Duration::from_millis(5));
    }
}
