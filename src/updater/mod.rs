//! Leaderboard Updater - "refresh this user's score" against the store.
//!
//! A refresh first tries a cheap existence-gated point update. When the scope
//! is not cached it falls back to a full rebuild from the repository. The
//! yearly and global boards move together: if either half is cold, both are
//! rebuilt.

mod refresher;
mod updater;

pub use refresher::{RefreshFailure, RefreshOutcome, ScoreRefresher};
pub use updater::LeaderboardUpdater;
