//! Outbox worker tick behaviour against the in-memory system of record.

use leaderboard_sync::{LeaderboardScope, NewOutboxEvent, NewScoreLog, RefreshTarget};

use crate::{setup, snapshot, worker};

#[test]
fn empty_outbox_tick_calls_nothing_and_marks_nothing() {
    let (records, store, repository) = setup();
    let worker = worker(&records, &store, &repository);

    let report = worker.tick().unwrap();

    assert_eq!(report.claimed, 0);
    assert_eq!(report.processed, 0);
    assert_eq!(worker.refresher().total(), 0);
    assert!(records.outbox_rows().unwrap().is_empty());
}

#[test]
fn first_tick_builds_cold_scopes_from_truth() {
    let (records, store, repository) = setup();
    records
        .create_log(NewScoreLog::new("alice", 2024, 120.0).in_contest(7))
        .unwrap();
    records
        .create_log(NewScoreLog::new("bob", 2024, 80.0).in_contest(7))
        .unwrap();
    records.create_log(NewScoreLog::new("bob", 2023, 50.0)).unwrap();

    let report = worker(&records, &store, &repository).tick().unwrap();

    assert_eq!(report.claimed, 5);
    assert_eq!(report.processed, 5);
    assert_eq!(
        snapshot(&store, LeaderboardScope::Contest(7)),
        Some(vec![("alice".into(), 120.0), ("bob".into(), 80.0)])
    );
    assert_eq!(
        snapshot(&store, LeaderboardScope::Yearly(2024)),
        Some(vec![("alice".into(), 120.0), ("bob".into(), 80.0)])
    );
    assert_eq!(
        snapshot(&store, LeaderboardScope::Global),
        Some(vec![("bob".into(), 130.0), ("alice".into(), 120.0)])
    );
    assert!(records.pending_events().unwrap().is_empty());
}

#[test]
fn duplicate_events_make_one_call_but_all_rows_are_retired() {
    let (records, store, repository) = setup();
    let log_id = records
        .create_log(NewScoreLog::new("alice", 2024, 10.0).in_contest(7))
        .unwrap();
    for score in [20.0, 30.0, 40.0, 50.0] {
        records.update_log(log_id, score).unwrap();
    }
    let ids: Vec<_> = records.pending_events().unwrap().iter().map(|r| r.id).collect();
    assert_eq!(ids.len(), 10);

    let worker = worker(&records, &store, &repository);
    let report = worker.tick().unwrap();

    assert_eq!(report.refreshes, 2);
    assert_eq!(report.processed, 10);
    let per_target = worker.refresher().per_target();
    assert_eq!(per_target.len(), 2);
    assert!(per_target.values().all(|&n| n == 1));
    for id in ids {
        assert!(records
            .outbox_rows()
            .unwrap()
            .iter()
            .any(|row| row.id == id && row.is_processed()));
    }
    assert_eq!(
        snapshot(&store, LeaderboardScope::Contest(7)),
        Some(vec![("alice".into(), 50.0)])
    );
}

#[test]
fn redelivered_batch_leaves_store_unchanged() {
    let (records, store, repository) = setup();
    records
        .create_log(NewScoreLog::new("alice", 2024, 10.0).in_contest(7))
        .unwrap();
    records
        .create_log(NewScoreLog::new("bob", 2024, 15.0).in_contest(7))
        .unwrap();
    let worker = worker(&records, &store, &repository);
    worker.tick().unwrap();

    let scopes = [
        LeaderboardScope::Contest(7),
        LeaderboardScope::Yearly(2024),
        LeaderboardScope::Global,
    ];
    let before: Vec<_> = scopes.iter().map(|s| snapshot(&store, s.clone())).collect();

    for row in records.outbox_rows().unwrap() {
        let target = row.target().unwrap();
        records.enqueue(NewOutboxEvent::from(target)).unwrap();
    }
    let report = worker.tick().unwrap();

    assert_eq!(report.claimed, 4);
    let after: Vec<_> = scopes.iter().map(|s| snapshot(&store, s.clone())).collect();
    assert_eq!(before, after);
}

#[test]
fn unknown_event_types_are_skipped_and_retired() {
    let (records, store, repository) = setup();
    records
        .enqueue(NewOutboxEvent::raw("refresh_badges", "alice", None, None))
        .unwrap();
    records
        .enqueue(NewOutboxEvent::refresh_contest_score(7, "alice"))
        .unwrap();

    let worker = worker(&records, &store, &repository);
    let report = worker.tick().unwrap();

    assert_eq!(report.unsupported, 1);
    assert_eq!(report.processed, 2);
    assert_eq!(
        worker.refresher().calls(),
        vec![RefreshTarget::Contest {
            contest_id: 7,
            user_id: "alice".into()
        }]
    );
}
