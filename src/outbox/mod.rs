//! Outbox Event Log - durable "this user's score may have changed" rows.
//!
//! Write paths insert rows in the same transaction as the change they
//! describe. The outbox worker claims them, refreshes the leaderboards, and
//! retires them. A row only carries identities: the refresh always re-reads
//! current truth, so duplicates and reordering are harmless.
//!
//! - `OutboxRow` / `RefreshTarget` - stored rows and what they ask for
//! - `EventLog` / `EventClaim` - lease-based claim abstraction
//! - `OutboxTable` - in-process table for embedding next to other state
//! - `SqliteEventLog` - relational table (requires the `sqlite` feature)

mod error;
mod event;
mod log;
#[cfg(feature = "sqlite")]
mod sqlite;
mod table;

pub use error::{EventLogError, UnsupportedEvent};
pub use event::{EventId, EventType, NewOutboxEvent, OutboxRow, RefreshTarget};
pub use log::{EventClaim, EventLog};
#[cfg(feature = "sqlite")]
pub use sqlite::{SqliteClaim, SqliteEventLog};
pub use table::OutboxTable;
