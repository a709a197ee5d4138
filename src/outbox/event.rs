use std::fmt;
use std::str::FromStr;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use super::UnsupportedEvent;
use crate::scope::{ContestId, UserId, Year};

pub type EventId = u64;

/// The kinds of refresh a write path can request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    RefreshContestScore,
    RefreshOfficialScores,
}

impl EventType {
    /// Name stored in the `event_type` column.
    pub const fn as_str(&self) -> &'static str {
        match self {
            EventType::RefreshContestScore => "refresh_contest_score",
            EventType::RefreshOfficialScores => "refresh_official_scores",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "refresh_contest_score" => Ok(EventType::RefreshContestScore),
            "refresh_official_scores" => Ok(EventType::RefreshOfficialScores),
            other => Err(other.to_string()),
        }
    }
}

/// What a refresh is about. Also the dedup key within a batch.
///
/// Carries identities only. The updater re-reads current totals, so two rows
/// with the same target are interchangeable.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RefreshTarget {
    Contest { contest_id: ContestId, user_id: UserId },
    Official { year: Year, user_id: UserId },
}

impl RefreshTarget {
    pub fn event_type(&self) -> EventType {
        match self {
            RefreshTarget::Contest { .. } => EventType::RefreshContestScore,
            RefreshTarget::Official { .. } => EventType::RefreshOfficialScores,
        }
    }

    pub fn user_id(&self) -> &str {
        match self {
            RefreshTarget::Contest { user_id, .. } | RefreshTarget::Official { user_id, .. } => {
                user_id
            }
        }
    }
}

/// A row to insert, built by a write path.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOutboxEvent {
    pub event_type: String,
    pub user_id: UserId,
    pub contest_id: Option<ContestId>,
    pub year: Option<Year>,
}

impl NewOutboxEvent {
    pub fn refresh_contest_score(contest_id: ContestId, user_id: impl Into<UserId>) -> Self {
        RefreshTarget::Contest {
            contest_id,
            user_id: user_id.into(),
        }
        .into()
    }

    pub fn refresh_official_scores(year: Year, user_id: impl Into<UserId>) -> Self {
        RefreshTarget::Official {
            year,
            user_id: user_id.into(),
        }
        .into()
    }

    /// A row with an arbitrary type name, e.g. written by a newer release.
    pub fn raw(
        event_type: impl Into<String>,
        user_id: impl Into<UserId>,
        contest_id: Option<ContestId>,
        year: Option<Year>,
    ) -> Self {
        Self {
            event_type: event_type.into(),
            user_id: user_id.into(),
            contest_id,
            year,
        }
    }
}

impl From<RefreshTarget> for NewOutboxEvent {
    fn from(target: RefreshTarget) -> Self {
        let event_type = target.event_type().as_str().to_string();
        match target {
            RefreshTarget::Contest {
                contest_id,
                user_id,
            } => Self {
                event_type,
                user_id,
                contest_id: Some(contest_id),
                year: None,
            },
            RefreshTarget::Official { year, user_id } => Self {
                event_type,
                user_id,
                contest_id: None,
                year: Some(year),
            },
        }
    }
}

/// A stored outbox row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboxRow {
    pub id: EventId,
    pub event_type: String,
    pub user_id: UserId,
    pub contest_id: Option<ContestId>,
    pub year: Option<Year>,
    pub created_at: SystemTime,
    pub processed_at: Option<SystemTime>,
}

impl OutboxRow {
    pub fn is_processed(&self) -> bool {
        self.processed_at.is_some()
    }

    /// Interpret the row. Unknown types and rows missing the column their
    /// type requires are unsupported.
    pub fn target(&self) -> Result<RefreshTarget, UnsupportedEvent> {
        let event_type =
            self.event_type
                .parse::<EventType>()
                .map_err(|event_type| UnsupportedEvent::UnknownType {
                    id: self.id,
                    event_type,
                })?;

        match event_type {
            EventType::RefreshContestScore => {
                let contest_id = self
                    .contest_id
                    .ok_or(UnsupportedEvent::MissingContestId { id: self.id })?;
                Ok(RefreshTarget::Contest {
                    contest_id,
                    user_id: self.user_id.clone(),
                })
            }
            EventType::RefreshOfficialScores => {
                let year = self
                    .year
                    .ok_or(UnsupportedEvent::MissingYear { id: self.id })?;
                Ok(RefreshTarget::Official {
                    year,
                    user_id: self.user_id.clone(),
                })
            }
        }
    }
}
