//! SqliteEventLog - the outbox table in SQLite.
//!
//! SQLite has no row locks, so claims are leases: a claim stamps rows with
//! its token and a `claimed_until` deadline inside a `BEGIN IMMEDIATE`
//! transaction, which serializes concurrent claimants. Rows whose lease ran
//! out become claimable again.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};
use tracing::warn;
use uuid::Uuid;

use super::{EventClaim, EventId, EventLog, EventLogError, NewOutboxEvent, OutboxRow};

const SCHEMA: &str = include_str!("schema.sql");

const SELECT_CLAIMABLE: &str = "\
    SELECT id, event_type, user_id, contest_id, year, created_at, processed_at \
    FROM leaderboard_outbox \
    WHERE processed_at IS NULL AND (claimed_until IS NULL OR claimed_until <= ?1) \
    ORDER BY id LIMIT ?2";

impl From<rusqlite::Error> for EventLogError {
    fn from(err: rusqlite::Error) -> Self {
        EventLogError::Backend(err.to_string())
    }
}

fn to_millis(at: SystemTime) -> i64 {
    at.duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

fn from_millis(ms: i64) -> SystemTime {
    UNIX_EPOCH + Duration::from_millis(u64::try_from(ms).unwrap_or(0))
}

fn read_row(row: &Row<'_>) -> rusqlite::Result<OutboxRow> {
    let id: i64 = row.get(0)?;
    let processed_at: Option<i64> = row.get(6)?;
    Ok(OutboxRow {
        id: id as EventId,
        event_type: row.get(1)?,
        user_id: row.get(2)?,
        contest_id: row.get(3)?,
        year: row.get(4)?,
        created_at: from_millis(row.get(5)?),
        processed_at: processed_at.map(from_millis),
    })
}

/// Outbox table backed by a single SQLite connection.
///
/// Claim tokens carry a fresh UUID, so handles in different processes that
/// share a worker id never release each other's leases.
#[derive(Clone)]
pub struct SqliteEventLog {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteEventLog {
    pub fn open(path: &str) -> Result<Self, EventLogError> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA busy_timeout=5000;")?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, EventLogError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    /// Use an existing connection, creating the outbox table if needed.
    pub fn with_connection(conn: Connection) -> Result<Self, EventLogError> {
        let log = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        log.migrate()?;
        Ok(log)
    }

    /// Create the outbox table and its index if they do not exist yet.
    pub fn migrate(&self) -> Result<(), EventLogError> {
        self.lock()?.execute_batch(SCHEMA)?;
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, EventLogError> {
        self.conn
            .lock()
            .map_err(|_| EventLogError::LockPoisoned("connection"))
    }

    /// Run `f` in one write transaction. Write paths use this so their row
    /// changes and their outbox rows commit together.
    pub fn transaction<F, T>(&self, f: F) -> Result<T, EventLogError>
    where
        F: FnOnce(&Transaction<'_>) -> rusqlite::Result<T>,
    {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }

    /// Insert an outbox row on `conn`, usually the caller's open transaction.
    pub fn enqueue(
        conn: &Connection,
        event: &NewOutboxEvent,
        now: SystemTime,
    ) -> rusqlite::Result<EventId> {
        conn.execute(
            "INSERT INTO leaderboard_outbox (event_type, user_id, contest_id, year, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                event.event_type,
                event.user_id,
                event.contest_id,
                event.year,
                to_millis(now)
            ],
        )?;
        Ok(conn.last_insert_rowid() as EventId)
    }

    /// Look up a row by id.
    pub fn get(&self, id: EventId) -> Result<Option<OutboxRow>, EventLogError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, event_type, user_id, contest_id, year, created_at, processed_at \
             FROM leaderboard_outbox WHERE id = ?1",
        )?;
        let mut rows = stmt.query_map(params![id as i64], read_row)?;
        let row = rows.next().transpose()?;
        Ok(row)
    }

    /// Number of rows not yet processed.
    pub fn pending_count(&self) -> Result<usize, EventLogError> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM leaderboard_outbox WHERE processed_at IS NULL",
            [],
            |row| row.get(0),
        )?;
        Ok(usize::try_from(count).unwrap_or(0))
    }
}

impl EventLog for SqliteEventLog {
    type Claim = SqliteClaim;

    fn claim_batch(
        &self,
        worker_id: &str,
        max: usize,
        lease: Duration,
    ) -> Result<SqliteClaim, EventLogError> {
        let now = SystemTime::now();
        let token = format!("{}:{}", worker_id, Uuid::new_v4());

        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let events = {
            let mut select = tx.prepare(SELECT_CLAIMABLE)?;
            let rows = select
                .query_map(
                    params![to_millis(now), i64::try_from(max).unwrap_or(i64::MAX)],
                    read_row,
                )?
                .collect::<Result<Vec<_>, _>>()?;

            let mut stamp = tx.prepare(
                "UPDATE leaderboard_outbox SET claim_token = ?1, claimed_until = ?2 WHERE id = ?3",
            )?;
            for row in &rows {
                stamp.execute(params![token, to_millis(now + lease), row.id as i64])?;
            }
            rows
        };
        tx.commit()?;
        drop(conn);

        Ok(SqliteClaim {
            conn: Arc::clone(&self.conn),
            token,
            events,
            finished: false,
        })
    }

    fn cleanup(&self, processed_before: SystemTime) -> Result<usize, EventLogError> {
        let conn = self.lock()?;
        let deleted = conn.execute(
            "DELETE FROM leaderboard_outbox WHERE processed_at IS NOT NULL AND processed_at < ?1",
            params![to_millis(processed_before)],
        )?;
        Ok(deleted)
    }
}

/// Rows leased by one `SqliteEventLog::claim_batch` call.
pub struct SqliteClaim {
    conn: Arc<Mutex<Connection>>,
    token: String,
    events: Vec<OutboxRow>,
    finished: bool,
}

impl SqliteClaim {
    fn finish(&mut self, processed: &[EventId]) -> Result<usize, EventLogError> {
        let mut conn = self
            .conn
            .lock()
            .map_err(|_| EventLogError::LockPoisoned("connection"))?;
        let now = to_millis(SystemTime::now());
        let tx = conn.transaction()?;
        let mut marked = 0;
        {
            let mut mark = tx.prepare(
                "UPDATE leaderboard_outbox \
                 SET processed_at = ?1, claim_token = NULL, claimed_until = NULL \
                 WHERE id = ?2 AND claim_token = ?3",
            )?;
            for id in processed {
                marked += mark.execute(params![now, *id as i64, self.token])?;
            }
        }
        tx.execute(
            "UPDATE leaderboard_outbox SET claim_token = NULL, claimed_until = NULL \
             WHERE claim_token = ?1",
            params![self.token],
        )?;
        tx.commit()?;
        self.finished = true;
        Ok(marked)
    }
}

impl EventClaim for SqliteClaim {
    fn events(&self) -> &[OutboxRow] {
        &self.events
    }

    fn commit(mut self, processed: &[EventId]) -> Result<usize, EventLogError> {
        self.finish(processed)
    }

    fn rollback(mut self) -> Result<(), EventLogError> {
        self.finish(&[]).map(|_| ())
    }
}

impl Drop for SqliteClaim {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        if let Err(err) = self.finish(&[]) {
            warn!(token = %self.token, error = %err, "failed to release outbox claim");
        }
    }
}
