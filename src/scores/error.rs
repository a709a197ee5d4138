use thiserror::Error;

/// Error type for score repository reads.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScoreRepositoryError {
    /// The backing lock was poisoned (a writer panicked while holding it).
    #[error("score repository lock poisoned during {0}")]
    LockPoisoned(&'static str),
    /// The system of record could not be reached.
    #[error("score repository unavailable: {0}")]
    Unavailable(String),
    /// Any other query failure.
    #[error("score query failed: {0}")]
    Query(String),
}
