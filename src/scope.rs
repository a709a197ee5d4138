use std::fmt;

use serde::{Deserialize, Serialize};

pub type UserId = String;
pub type ContestId = i64;
pub type Year = i32;

/// Which ranked set a score belongs to.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaderboardScope {
    Contest(ContestId),
    Yearly(Year),
    Global,
}

impl LeaderboardScope {
    /// Yearly and global boards are always refreshed and rebuilt as a pair.
    pub fn is_official(&self) -> bool {
        matches!(self, LeaderboardScope::Yearly(_) | LeaderboardScope::Global)
    }
}

impl fmt::Display for LeaderboardScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LeaderboardScope::Contest(id) => write!(f, "contest:{}", id),
            LeaderboardScope::Yearly(year) => write!(f, "yearly:{}", year),
            LeaderboardScope::Global => write!(f, "global"),
        }
    }
}

/// An authoritative per-user total, as returned by the score repository.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardScore {
    pub user_id: UserId,
    pub score: f64,
}

impl LeaderboardScore {
    pub fn new(user_id: impl Into<UserId>, score: f64) -> Self {
        Self {
            user_id: user_id.into(),
            score,
        }
    }
}

/// Sort scores descending, breaking ties by user id so pages are stable.
pub(crate) fn sort_scores_desc(scores: &mut [LeaderboardScore]) {
    scores.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.user_id.cmp(&b.user_id))
    });
}
