use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use leaderboard_sync::{
    ContestId, InMemoryLeaderboardStore, LeaderboardScope, LeaderboardScore, LeaderboardStore,
    OfficialUpdate, StoreError, StorePage, Year,
};

/// An in-memory store that can be told to fail, and counts rebuilds.
#[derive(Clone, Default)]
pub struct FlakyStore {
    pub inner: InMemoryLeaderboardStore,
    fail_writes: Arc<AtomicBool>,
    fail_reads: Arc<AtomicBool>,
    rebuilds: Arc<AtomicUsize>,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn rebuilds(&self) -> usize {
        self.rebuilds.load(Ordering::SeqCst)
    }

    fn check_write(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("store down".into()));
        }
        Ok(())
    }
}

impl LeaderboardStore for FlakyStore {
    fn update_contest_score(
        &self,
        contest_id: ContestId,
        user_id: &str,
        score: Option<f64>,
    ) -> Result<bool, StoreError> {
        self.check_write()?;
        self.inner.update_contest_score(contest_id, user_id, score)
    }

    fn update_official_scores(
        &self,
        year: Year,
        user_id: &str,
        yearly_score: Option<f64>,
        global_score: Option<f64>,
    ) -> Result<OfficialUpdate, StoreError> {
        self.check_write()?;
        self.inner
            .update_official_scores(year, user_id, yearly_score, global_score)
    }

    fn rebuild_contest_leaderboard(
        &self,
        contest_id: ContestId,
        scores: &[LeaderboardScore],
    ) -> Result<(), StoreError> {
        self.check_write()?;
        self.rebuilds.fetch_add(1, Ordering::SeqCst);
        self.inner.rebuild_contest_leaderboard(contest_id, scores)
    }

    fn rebuild_official_leaderboards(
        &self,
        year: Year,
        yearly_scores: &[LeaderboardScore],
        global_scores: &[LeaderboardScore],
    ) -> Result<(), StoreError> {
        self.check_write()?;
        self.rebuilds.fetch_add(1, Ordering::SeqCst);
        self.inner
            .rebuild_official_leaderboards(year, yearly_scores, global_scores)
    }

    fn fetch_page(
        &self,
        scope: &LeaderboardScope,
        page: usize,
        page_size: usize,
    ) -> Result<StorePage, StoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("store down".into()));
        }
        self.inner.fetch_page(scope, page, page_size)
    }
}
