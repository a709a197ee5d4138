use std::collections::{BTreeMap, HashSet};
use std::time::{Duration, SystemTime};

use super::{EventId, NewOutboxEvent, OutboxRow};

#[derive(Debug, Clone)]
struct Lease {
    token: String,
    until: SystemTime,
}

#[derive(Debug, Clone)]
struct StoredRow {
    row: OutboxRow,
    lease: Option<Lease>,
}

impl StoredRow {
    fn is_claimable(&self, now: SystemTime) -> bool {
        if self.row.is_processed() {
            return false;
        }
        match &self.lease {
            Some(lease) => lease.until <= now,
            None => true,
        }
    }

    fn is_held_by(&self, token: &str) -> bool {
        matches!(&self.lease, Some(lease) if lease.token == token)
    }
}

/// The outbox table as an in-process data structure.
///
/// Holds no lock of its own: owners embed it next to the data it describes
/// so a write and its outbox rows land under the same guard.
#[derive(Debug, Default, Clone)]
pub struct OutboxTable {
    rows: BTreeMap<EventId, StoredRow>,
    last_id: EventId,
    claims: u64,
}

impl OutboxTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a row, returning its monotonic id.
    pub fn insert(&mut self, event: NewOutboxEvent, now: SystemTime) -> EventId {
        self.last_id += 1;
        let id = self.last_id;
        self.rows.insert(
            id,
            StoredRow {
                row: OutboxRow {
                    id,
                    event_type: event.event_type,
                    user_id: event.user_id,
                    contest_id: event.contest_id,
                    year: event.year,
                    created_at: now,
                    processed_at: None,
                },
                lease: None,
            },
        );
        id
    }

    /// Lease up to `max` claimable rows. Returns the claim token and the rows.
    pub fn claim(
        &mut self,
        worker_id: &str,
        max: usize,
        lease: Duration,
        now: SystemTime,
    ) -> (String, Vec<OutboxRow>) {
        self.claims += 1;
        let token = format!("{}:{}", worker_id, self.claims);
        let until = now + lease;

        let mut claimed = Vec::new();
        for stored in self.rows.values_mut() {
            if claimed.len() >= max {
                break;
            }
            if !stored.is_claimable(now) {
                continue;
            }
            stored.lease = Some(Lease {
                token: token.clone(),
                until,
            });
            claimed.push(stored.row.clone());
        }

        (token, claimed)
    }

    /// Mark `processed` ids still held by `token` as processed and release
    /// the rest of the claim. Rows whose lease was lost are left alone.
    pub fn commit(&mut self, token: &str, processed: &[EventId], now: SystemTime) -> usize {
        let processed: HashSet<EventId> = processed.iter().copied().collect();
        let mut marked = 0;
        for stored in self.rows.values_mut() {
            if !stored.is_held_by(token) {
                continue;
            }
            stored.lease = None;
            if processed.contains(&stored.row.id) {
                stored.row.processed_at = Some(now);
                marked += 1;
            }
        }
        marked
    }

    /// Release every row held by `token`.
    pub fn release(&mut self, token: &str) {
        for stored in self.rows.values_mut() {
            if stored.is_held_by(token) {
                stored.lease = None;
            }
        }
    }

    /// Delete processed rows older than the cutoff.
    pub fn cleanup(&mut self, processed_before: SystemTime) -> usize {
        let before = self.rows.len();
        self.rows.retain(|_, stored| match stored.row.processed_at {
            Some(at) => at >= processed_before,
            None => true,
        });
        before - self.rows.len()
    }

    pub fn get(&self, id: EventId) -> Option<&OutboxRow> {
        self.rows.get(&id).map(|stored| &stored.row)
    }

    pub fn rows(&self) -> Vec<OutboxRow> {
        self.rows.values().map(|stored| stored.row.clone()).collect()
    }

    pub fn pending(&self) -> Vec<OutboxRow> {
        self.rows
            .values()
            .filter(|stored| !stored.row.is_processed())
            .map(|stored| stored.row.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
