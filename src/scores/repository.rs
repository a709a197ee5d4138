use std::collections::HashMap;
use std::sync::Arc;

use super::ScoreRepositoryError;
use crate::scope::{ContestId, LeaderboardScore, UserId, Year};

/// Read-only access to authoritative scores in the system of record.
///
/// Every call reflects currently committed state. Two calls may observe
/// different snapshots; callers tolerate that skew because the next refresh
/// re-reads everything anyway.
///
/// The single-user fetches return `None` when the user has no activity in
/// the scope, which is exactly when the matching full snapshot has no row
/// for them.
pub trait ScoreRepository: Send + Sync {
    /// Current total for one user within a contest.
    fn fetch_user_contest_score(
        &self,
        contest_id: ContestId,
        user_id: &str,
    ) -> Result<Option<f64>, ScoreRepositoryError>;

    /// Current yearly total for one user.
    fn fetch_user_yearly_score(
        &self,
        year: Year,
        user_id: &str,
    ) -> Result<Option<f64>, ScoreRepositoryError>;

    /// Current all-time total for one user.
    fn fetch_user_global_score(&self, user_id: &str) -> Result<Option<f64>, ScoreRepositoryError>;

    /// Full contest snapshot, sorted descending by score.
    fn fetch_all_contest_leaderboard_scores(
        &self,
        contest_id: ContestId,
    ) -> Result<Vec<LeaderboardScore>, ScoreRepositoryError>;

    /// Full yearly snapshot, sorted descending by score.
    fn fetch_all_yearly_leaderboard_scores(
        &self,
        year: Year,
    ) -> Result<Vec<LeaderboardScore>, ScoreRepositoryError>;

    /// Full global snapshot, sorted descending by score.
    fn fetch_all_global_leaderboard_scores(
        &self,
    ) -> Result<Vec<LeaderboardScore>, ScoreRepositoryError>;
}

/// Display-name lookup for ranked entries.
pub trait DisplayNames: Send + Sync {
    /// Names for the given users. Users without a name are simply absent from the map.
    fn display_names(
        &self,
        user_ids: &[UserId],
    ) -> Result<HashMap<UserId, String>, ScoreRepositoryError>;
}

impl<R: ScoreRepository + ?Sized> ScoreRepository for Arc<R> {
    fn fetch_user_contest_score(
        &self,
        contest_id: ContestId,
        user_id: &str,
    ) -> Result<Option<f64>, ScoreRepositoryError> {
        (**self).fetch_user_contest_score(contest_id, user_id)
    }

    fn fetch_user_yearly_score(
        &self,
        year: Year,
        user_id: &str,
    ) -> Result<Option<f64>, ScoreRepositoryError> {
        (**self).fetch_user_yearly_score(year, user_id)
    }

    fn fetch_user_global_score(
        &self,
        user_id: &str,
    ) -> Result<Option<f64>, ScoreRepositoryError> {
        (**self).fetch_user_global_score(user_id)
    }

    fn fetch_all_contest_leaderboard_scores(
        &self,
        contest_id: ContestId,
    ) -> Result<Vec<LeaderboardScore>, ScoreRepositoryError> {
        (**self).fetch_all_contest_leaderboard_scores(contest_id)
    }

    fn fetch_all_yearly_leaderboard_scores(
        &self,
        year: Year,
    ) -> Result<Vec<LeaderboardScore>, ScoreRepositoryError> {
        (**self).fetch_all_yearly_leaderboard_scores(year)
    }

    fn fetch_all_global_leaderboard_scores(
        &self,
    ) -> Result<Vec<LeaderboardScore>, ScoreRepositoryError> {
        (**self).fetch_all_global_leaderboard_scores()
    }
}

impl<N: DisplayNames + ?Sized> DisplayNames for Arc<N> {
    fn display_names(
        &self,
        user_ids: &[UserId],
    ) -> Result<HashMap<UserId, String>, ScoreRepositoryError> {
        (**self).display_names(user_ids)
    }
}
