//! System of record - score logs and their outbox, committed together.
//!
//! Any write that changes a score-affecting fact inserts the matching outbox
//! rows under the same guard as the change itself, so a refresh request can
//! never be lost between "score changed" and "cache told".
//!
//! ## Example
//!
//! ```ignore
//! use leaderboard_sync::{InMemoryRecords, NewScoreLog};
//!
//! let records = InMemoryRecords::new();
//! let log_id = records.create_log(NewScoreLog::new("alice", 2024, 120.0).in_contest(7))?;
//! // outbox now holds refresh_contest_score(7, alice) and refresh_official_scores(2024, alice)
//! records.detach_from_contest(log_id)?;
//! ```

mod in_memory;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::scope::{ContestId, UserId, Year};

pub use in_memory::{InMemoryClaim, InMemoryRecords};

pub type LogId = u64;

/// One recorded activity contributing to a user's totals.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoreLog {
    pub id: LogId,
    pub user_id: UserId,
    pub contest_id: Option<ContestId>,
    pub year: Year,
    pub score: f64,
}

/// A log to create.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewScoreLog {
    pub user_id: UserId,
    pub contest_id: Option<ContestId>,
    pub year: Year,
    pub score: f64,
}

impl NewScoreLog {
    pub fn new(user_id: impl Into<UserId>, year: Year, score: f64) -> Self {
        Self {
            user_id: user_id.into(),
            contest_id: None,
            year,
            score,
        }
    }

    /// Count this log toward a contest as well.
    pub fn in_contest(mut self, contest_id: ContestId) -> Self {
        self.contest_id = Some(contest_id);
        self
    }
}

/// Error type for system-of-record writes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("records lock poisoned during {0}")]
    LockPoisoned(&'static str),
    #[error("score log {0} not found")]
    LogNotFound(LogId),
}
