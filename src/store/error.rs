use thiserror::Error;

/// Error type for leaderboard store operations.
///
/// A store error never means "the scope does not exist". Non-existence is
/// reported through return values so callers can tell a cold cache apart
/// from an unavailable one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The cache could not be reached.
    #[error("leaderboard store unavailable: {0}")]
    Unavailable(String),
    /// The in-process lock was poisoned.
    #[error("leaderboard store lock poisoned during {0}")]
    LockPoisoned(&'static str),
    /// The backend rejected or failed the command.
    #[error("leaderboard store backend error: {0}")]
    Backend(String),
}
