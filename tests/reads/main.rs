//! Read path: paging, cache fallback and rebuild-on-miss.

#[path = "../support/mod.rs"]
mod support;

use leaderboard_sync::{
    InMemoryRecords, LeaderboardQuery, LeaderboardScope, LeaderboardStore, NewScoreLog,
    PageToken, QueryError,
};
use support::{scores, FlakyRepository, FlakyStore};

fn seeded(n: usize) -> InMemoryRecords {
    let records = InMemoryRecords::new();
    for i in 0..n {
        // Every score appears twice so ties cross page boundaries.
        let score = ((n - i) / 2) as f64 * 10.0;
        records
            .create_log(NewScoreLog::new(format!("user-{:02}", i), 2024, score).in_contest(1))
            .unwrap();
        records
            .set_display_name(format!("user-{:02}", i), format!("User {}", i))
            .unwrap();
    }
    records
}

fn query(
    records: &InMemoryRecords,
    store: &FlakyStore,
) -> LeaderboardQuery<FlakyStore, FlakyRepository, InMemoryRecords> {
    LeaderboardQuery::new(
        store.clone(),
        FlakyRepository::new(records.clone()),
        records.clone(),
    )
}

#[test]
fn pages_cover_exactly_their_window() {
    let records = seeded(23);
    let store = FlakyStore::new();
    let q = query(&records, &store);
    let scope = LeaderboardScope::Contest(1);
    let full = records_snapshot(&q, &scope);

    for page_size in [1, 4, 5, 23, 30] {
        let mut page = 0;
        let mut seen = Vec::new();
        loop {
            let result = q.fetch_page(&scope, page, page_size).unwrap();
            assert_eq!(result.total_count, 23);

            let start = (page * page_size).min(23);
            let end = ((page + 1) * page_size).min(23);
            let expected: Vec<_> = full[start..end].to_vec();
            let got: Vec<_> = result.entries.iter().map(|e| e.user_id.clone()).collect();
            assert_eq!(got, expected, "page {} size {}", page, page_size);
            assert_eq!(result.next_page_token.is_some(), (page + 1) * page_size < 23);

            seen.extend(got);
            match result.next_page_token {
                Some(token) => page = PageToken::decode(&token).unwrap().page,
                None => break,
            }
        }
        assert_eq!(seen, full);
    }
}

fn records_snapshot(
    q: &LeaderboardQuery<FlakyStore, FlakyRepository, InMemoryRecords>,
    scope: &LeaderboardScope,
) -> Vec<String> {
    q.fetch_page(scope, 0, 1000)
        .unwrap()
        .entries
        .into_iter()
        .map(|e| e.user_id)
        .collect()
}

#[test]
fn ranks_follow_the_whole_board_within_a_page() {
    let records = seeded(6);
    let store = FlakyStore::new();
    let page = query(&records, &store)
        .fetch_page(&LeaderboardScope::Contest(1), 0, 6)
        .unwrap();

    // Scores: 30, 20, 20, 10, 10, 0
    let ranks: Vec<u64> = page.entries.iter().map(|e| e.rank).collect();
    let ties: Vec<bool> = page.entries.iter().map(|e| e.is_tie).collect();
    assert_eq!(ranks, vec![1, 2, 2, 4, 4, 6]);
    assert_eq!(ties, vec![false, true, true, true, true, false]);
    assert_eq!(page.entries[0].display_name, "User 0");
}

#[test]
fn cold_read_rebuilds_and_warm_read_uses_the_cache() {
    let records = seeded(4);
    let store = FlakyStore::new();
    let q = query(&records, &store);
    let scope = LeaderboardScope::Contest(1);

    q.fetch_page(&scope, 0, 2).unwrap();
    assert_eq!(store.rebuilds(), 1);

    q.fetch_page(&scope, 1, 2).unwrap();
    assert_eq!(store.rebuilds(), 1);

    // The cache answers even after truth moves on, until the worker catches up.
    records
        .create_log(NewScoreLog::new("late", 2024, 999.0).in_contest(1))
        .unwrap();
    let page = q.fetch_page(&scope, 0, 10).unwrap();
    assert_eq!(page.total_count, 4);
}

#[test]
fn store_read_failure_falls_back_without_rebuilding() {
    let records = seeded(4);
    let store = FlakyStore::new();
    store.fail_reads(true);

    let page = query(&records, &store)
        .fetch_page(&LeaderboardScope::Yearly(2024), 0, 10)
        .unwrap();

    assert_eq!(page.total_count, 4);
    assert_eq!(store.rebuilds(), 0);
}

#[test]
fn failed_rebuild_still_serves_the_read() {
    let records = seeded(3);
    let store = FlakyStore::new();
    store.fail_writes(true);

    let page = query(&records, &store)
        .fetch_page(&LeaderboardScope::Contest(1), 0, 10)
        .unwrap();

    assert_eq!(page.entries.len(), 3);
    assert!(!store.inner.contains(&LeaderboardScope::Contest(1)).unwrap());
}

#[test]
fn repository_failure_on_a_cold_read_is_an_error() {
    let records = seeded(3);
    let store = FlakyStore::new();
    let repository = FlakyRepository::new(records.clone());
    repository.fail(true);
    let q = LeaderboardQuery::new(store.clone(), repository, records.clone());

    let err = q.fetch_page(&LeaderboardScope::Global, 0, 10).unwrap_err();
    assert!(matches!(err, QueryError::Repository(_)));
}

#[test]
fn empty_scope_reads_as_empty_page() {
    let records = InMemoryRecords::new();
    let store = FlakyStore::new();
    store
        .rebuild_contest_leaderboard(9, &scores(&[]))
        .unwrap();

    let page = query(&records, &store)
        .fetch_page(&LeaderboardScope::Contest(9), 0, 10)
        .unwrap();

    assert!(page.entries.is_empty());
    assert_eq!(page.total_count, 0);
    assert_eq!(page.next_page_token, None);
}
