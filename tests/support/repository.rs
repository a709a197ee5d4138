use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use leaderboard_sync::{
    ContestId, InMemoryRecords, LeaderboardScore, ScoreRepository, ScoreRepositoryError, Year,
};

/// Reads through to `InMemoryRecords` unless told to fail.
#[derive(Clone, Default)]
pub struct FlakyRepository {
    pub records: InMemoryRecords,
    fail: Arc<AtomicBool>,
}

impl FlakyRepository {
    pub fn new(records: InMemoryRecords) -> Self {
        Self {
            records,
            fail: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), ScoreRepositoryError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(ScoreRepositoryError::Unavailable("database down".into()));
        }
        Ok(())
    }
}

impl ScoreRepository for FlakyRepository {
    fn fetch_user_contest_score(
        &self,
        contest_id: ContestId,
        user_id: &str,
    ) -> Result<Option<f64>, ScoreRepositoryError> {
        self.check()?;
        self.records.fetch_user_contest_score(contest_id, user_id)
    }

    fn fetch_user_yearly_score(
        &self,
        year: Year,
        user_id: &str,
    ) -> Result<Option<f64>, ScoreRepositoryError> {
        self.check()?;
        self.records.fetch_user_yearly_score(year, user_id)
    }

    fn fetch_user_global_score(
        &self,
        user_id: &str,
    ) -> Result<Option<f64>, ScoreRepositoryError> {
        self.check()?;
        self.records.fetch_user_global_score(user_id)
    }

    fn fetch_all_contest_leaderboard_scores(
        &self,
        contest_id: ContestId,
    ) -> Result<Vec<LeaderboardScore>, ScoreRepositoryError> {
        self.check()?;
        self.records.fetch_all_contest_leaderboard_scores(contest_id)
    }

    fn fetch_all_yearly_leaderboard_scores(
        &self,
        year: Year,
    ) -> Result<Vec<LeaderboardScore>, ScoreRepositoryError> {
        self.check()?;
        self.records.fetch_all_yearly_leaderboard_scores(year)
    }

    fn fetch_all_global_leaderboard_scores(
        &self,
    ) -> Result<Vec<LeaderboardScore>, ScoreRepositoryError> {
        self.check()?;
        self.records.fetch_all_global_leaderboard_scores()
    }
}
