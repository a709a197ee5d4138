use std::sync::Arc;

use crate::scope::{ContestId, LeaderboardScope, LeaderboardScore, Year};

use super::StoreError;

/// Existence report for a paired yearly/global point update.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct OfficialUpdate {
    pub yearly_existed: bool,
    pub global_existed: bool,
}

impl OfficialUpdate {
    /// True when both halves were applied.
    pub fn both_existed(&self) -> bool {
        self.yearly_existed && self.global_existed
    }
}

/// One page of cached scores.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct StorePage {
    /// Scores on the requested page, sorted descending.
    pub scores: Vec<LeaderboardScore>,
    /// Size of the whole scope, not just the page.
    pub total_count: usize,
    /// Whether the scope is cached at all.
    pub exists: bool,
}

/// A ranked-set cache keyed by leaderboard scope.
///
/// Point updates are existence-gated: they only write into a scope that is
/// already cached and report `false` otherwise. A `None` score removes the
/// member, so a user whose activity is gone leaves the set the same way a
/// rebuild would drop them. Rebuilds replace a scope (or
/// the yearly/global pair) atomically, so readers never see a half-written set.
pub trait LeaderboardStore: Send + Sync {
    /// Set (or with `None`, remove) a user's contest score if the contest set
    /// exists. Returns whether it existed.
    fn update_contest_score(
        &self,
        contest_id: ContestId,
        user_id: &str,
        score: Option<f64>,
    ) -> Result<bool, StoreError>;

    /// Atomically attempt both official writes. Each half may independently
    /// report non-existence.
    fn update_official_scores(
        &self,
        year: Year,
        user_id: &str,
        yearly_score: Option<f64>,
        global_score: Option<f64>,
    ) -> Result<OfficialUpdate, StoreError>;

    /// Atomically replace the whole contest set.
    fn rebuild_contest_leaderboard(
        &self,
        contest_id: ContestId,
        scores: &[LeaderboardScore],
    ) -> Result<(), StoreError>;

    /// Atomically replace the yearly and global sets together.
    fn rebuild_official_leaderboards(
        &self,
        year: Year,
        yearly_scores: &[LeaderboardScore],
        global_scores: &[LeaderboardScore],
    ) -> Result<(), StoreError>;

    /// Fetch one zero-indexed page of a scope.
    fn fetch_page(
        &self,
        scope: &LeaderboardScope,
        page: usize,
        page_size: usize,
    ) -> Result<StorePage, StoreError>;
}

impl<S: LeaderboardStore + ?Sized> LeaderboardStore for Arc<S> {
    fn update_contest_score(
        &self,
        contest_id: ContestId,
        user_id: &str,
        score: Option<f64>,
    ) -> Result<bool, StoreError> {
        (**self).update_contest_score(contest_id, user_id, score)
    }

    fn update_official_scores(
        &self,
        year: Year,
        user_id: &str,
        yearly_score: Option<f64>,
        global_score: Option<f64>,
    ) -> Result<OfficialUpdate, StoreError> {
        (**self).update_official_scores(year, user_id, yearly_score, global_score)
    }

    fn rebuild_contest_leaderboard(
        &self,
        contest_id: ContestId,
        scores: &[LeaderboardScore],
    ) -> Result<(), StoreError> {
        (**self).rebuild_contest_leaderboard(contest_id, scores)
    }

    fn rebuild_official_leaderboards(
        &self,
        year: Year,
        yearly_scores: &[LeaderboardScore],
        global_scores: &[LeaderboardScore],
    ) -> Result<(), StoreError> {
        (**self).rebuild_official_leaderboards(year, yearly_scores, global_scores)
    }

    fn fetch_page(
        &self,
        scope: &LeaderboardScope,
        page: usize,
        page_size: usize,
    ) -> Result<StorePage, StoreError> {
        (**self).fetch_page(scope, page, page_size)
    }
}
