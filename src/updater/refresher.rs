use std::sync::Arc;

use thiserror::Error;

use crate::scope::{ContestId, Year};
use crate::scores::ScoreRepositoryError;
use crate::store::StoreError;

/// Why a single refresh did not complete.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RefreshFailure {
    /// Reading current truth failed; nothing was written.
    #[error("score read failed: {0}")]
    Repository(#[from] ScoreRepositoryError),
    /// The cache rejected a write. Never treated as a cold scope.
    #[error("store write failed: {0}")]
    Store(#[from] StoreError),
}

/// What a refresh did to the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// A point update landed in an already cached scope.
    Updated,
    /// The scope was cold and has been rebuilt from a full snapshot.
    Rebuilt,
    /// The refresh was abandoned. Already logged.
    Failed(RefreshFailure),
}

impl RefreshOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, RefreshOutcome::Failed(_))
    }
}

/// Refreshes one user's standing from current truth.
///
/// Implementations must be idempotent: they take identities only and re-read
/// everything, so applying the same refresh twice equals applying it once.
/// Failures are reported as a value, never raised to the caller.
pub trait ScoreRefresher: Send + Sync {
    fn refresh_contest_score(&self, contest_id: ContestId, user_id: &str) -> RefreshOutcome;

    fn refresh_official_scores(&self, year: Year, user_id: &str) -> RefreshOutcome;
}

impl<T: ScoreRefresher + ?Sized> ScoreRefresher for Arc<T> {
    fn refresh_contest_score(&self, contest_id: ContestId, user_id: &str) -> RefreshOutcome {
        (**self).refresh_contest_score(contest_id, user_id)
    }

    fn refresh_official_scores(&self, year: Year, user_id: &str) -> RefreshOutcome {
        (**self).refresh_official_scores(year, user_id)
    }
}
