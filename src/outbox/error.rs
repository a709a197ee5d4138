use thiserror::Error;

use super::EventId;

/// Error type for event log operations (claiming, retiring, sweeping).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventLogError {
    #[error("event log lock poisoned during {0}")]
    LockPoisoned(&'static str),
    #[error("event log backend error: {0}")]
    Backend(String),
}

/// A row the worker cannot act on. Logged and skipped, never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnsupportedEvent {
    #[error("event {id}: unknown event type {event_type:?}")]
    UnknownType { id: EventId, event_type: String },
    #[error("event {id}: refresh_contest_score without contest_id")]
    MissingContestId { id: EventId },
    #[error("event {id}: refresh_official_scores without year")]
    MissingYear { id: EventId },
}
