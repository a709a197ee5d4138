use std::time::{Duration, SystemTime};

use super::{EventId, EventLogError, OutboxRow};

/// A durable queue of outbox rows that can be split across workers.
///
/// Claiming reserves rows for a bounded lease. Until the claim ends (or the
/// lease runs out) no other claimant sees them. Relational backends can do
/// this with row locks, queues with visibility timeouts.
pub trait EventLog: Send + Sync {
    type Claim: EventClaim;

    /// Reserve up to `max` unprocessed rows, oldest first.
    fn claim_batch(
        &self,
        worker_id: &str,
        max: usize,
        lease: Duration,
    ) -> Result<Self::Claim, EventLogError>;

    /// Delete processed rows whose `processed_at` is older than the cutoff.
    /// Returns the number of rows deleted.
    fn cleanup(&self, processed_before: SystemTime) -> Result<usize, EventLogError>;
}

/// Rows held by one claimant.
///
/// Dropping an unfinished claim releases it.
pub trait EventClaim {
    /// The claimed rows, in id order.
    fn events(&self) -> &[OutboxRow];

    /// Mark the given ids processed and release every other claimed row.
    /// Returns how many rows were marked.
    fn commit(self, processed: &[EventId]) -> Result<usize, EventLogError>;

    /// Release every claimed row untouched.
    fn rollback(self) -> Result<(), EventLogError>;

    fn is_empty(&self) -> bool {
        self.events().is_empty()
    }
}
