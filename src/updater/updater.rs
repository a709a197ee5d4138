use tracing::{debug, error, info};

use super::{RefreshFailure, RefreshOutcome, ScoreRefresher};
use crate::scope::{ContestId, LeaderboardScore, Year};
use crate::scores::ScoreRepository;
use crate::store::LeaderboardStore;

/// Keeps the leaderboard store in step with the score repository.
///
/// Point updates keep a warm scope current. A cold scope is rebuilt lazily,
/// on the first refresh that touches it, so inactive leaderboards cost
/// nothing until someone reports activity against them.
pub struct LeaderboardUpdater<S, R> {
    store: S,
    repository: R,
}

impl<S, R> LeaderboardUpdater<S, R> {
    pub fn new(store: S, repository: R) -> Self {
        Self { store, repository }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }
}

impl<S: LeaderboardStore, R: ScoreRepository> LeaderboardUpdater<S, R> {
    /// Replace the contest set with a fresh snapshot. Returns the snapshot.
    pub fn rebuild_contest(
        &self,
        contest_id: ContestId,
    ) -> Result<Vec<LeaderboardScore>, RefreshFailure> {
        let scores = self
            .repository
            .fetch_all_contest_leaderboard_scores(contest_id)?;
        self.store.rebuild_contest_leaderboard(contest_id, &scores)?;
        info!(contest_id, entries = scores.len(), "rebuilt contest leaderboard");
        Ok(scores)
    }

    /// Replace the yearly and global sets together. Returns `(yearly, global)`.
    pub fn rebuild_official(
        &self,
        year: Year,
    ) -> Result<(Vec<LeaderboardScore>, Vec<LeaderboardScore>), RefreshFailure> {
        let yearly = self.repository.fetch_all_yearly_leaderboard_scores(year)?;
        let global = self.repository.fetch_all_global_leaderboard_scores()?;
        self.store
            .rebuild_official_leaderboards(year, &yearly, &global)?;
        info!(
            year,
            yearly_entries = yearly.len(),
            global_entries = global.len(),
            "rebuilt official leaderboards"
        );
        Ok((yearly, global))
    }

    fn try_refresh_contest(
        &self,
        contest_id: ContestId,
        user_id: &str,
    ) -> Result<RefreshOutcome, RefreshFailure> {
        let score = self
            .repository
            .fetch_user_contest_score(contest_id, user_id)?;

        if self.store.update_contest_score(contest_id, user_id, score)? {
            debug!(contest_id, user_id, score = ?score, "updated contest score");
            return Ok(RefreshOutcome::Updated);
        }

        self.rebuild_contest(contest_id)?;
        Ok(RefreshOutcome::Rebuilt)
    }

    fn try_refresh_official(
        &self,
        year: Year,
        user_id: &str,
    ) -> Result<RefreshOutcome, RefreshFailure> {
        let yearly_score = self.repository.fetch_user_yearly_score(year, user_id)?;
        let global_score = self.repository.fetch_user_global_score(user_id)?;

        let update = self
            .store
            .update_official_scores(year, user_id, yearly_score, global_score)?;
        if update.both_existed() {
            debug!(
                year,
                user_id,
                yearly_score = ?yearly_score,
                global_score = ?global_score,
                "updated official scores"
            );
            return Ok(RefreshOutcome::Updated);
        }

        debug!(
            year,
            yearly_existed = update.yearly_existed,
            global_existed = update.global_existed,
            "official pair incomplete, rebuilding both"
        );
        self.rebuild_official(year)?;
        Ok(RefreshOutcome::Rebuilt)
    }
}

impl<S: LeaderboardStore, R: ScoreRepository> ScoreRefresher for LeaderboardUpdater<S, R> {
    fn refresh_contest_score(&self, contest_id: ContestId, user_id: &str) -> RefreshOutcome {
        self.try_refresh_contest(contest_id, user_id)
            .unwrap_or_else(|err| {
                error!(contest_id, user_id, error = %err, "contest score refresh failed");
                RefreshOutcome::Failed(err)
            })
    }

    fn refresh_official_scores(&self, year: Year, user_id: &str) -> RefreshOutcome {
        self.try_refresh_official(year, user_id)
            .unwrap_or_else(|err| {
                error!(year, user_id, error = %err, "official scores refresh failed");
                RefreshOutcome::Failed(err)
            })
    }
}
