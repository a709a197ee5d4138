use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, SystemTime};

use tracing::warn;

use super::{LogId, NewScoreLog, RecordError, ScoreLog};
use crate::outbox::{
    EventClaim, EventId, EventLog, EventLogError, NewOutboxEvent, OutboxRow, OutboxTable,
};
use crate::scope::{sort_scores_desc, ContestId, LeaderboardScore, UserId, Year};
use crate::scores::{DisplayNames, ScoreRepository, ScoreRepositoryError};

#[derive(Default)]
struct State {
    logs: BTreeMap<LogId, ScoreLog>,
    last_log_id: LogId,
    names: HashMap<UserId, String>,
    outbox: OutboxTable,
}

impl State {
    /// Queue the refreshes a change to `log` calls for.
    fn enqueue_for(&mut self, log: &ScoreLog, now: SystemTime) {
        if let Some(contest_id) = log.contest_id {
            self.outbox.insert(
                NewOutboxEvent::refresh_contest_score(contest_id, log.user_id.clone()),
                now,
            );
        }
        self.outbox.insert(
            NewOutboxEvent::refresh_official_scores(log.year, log.user_id.clone()),
            now,
        );
    }

    fn totals<F>(&self, include: F) -> Vec<LeaderboardScore>
    where
        F: Fn(&ScoreLog) -> bool,
    {
        let mut totals: HashMap<&str, f64> = HashMap::new();
        for log in self.logs.values().filter(|log| include(*log)) {
            *totals.entry(log.user_id.as_str()).or_insert(0.0) += log.score;
        }
        let mut scores: Vec<LeaderboardScore> = totals
            .into_iter()
            .map(|(user_id, score)| LeaderboardScore::new(user_id, score))
            .collect();
        sort_scores_desc(&mut scores);
        scores
    }

    /// `None` when no log matches, mirroring the user's absence from `totals`.
    fn user_total<F>(&self, user_id: &str, include: F) -> Option<f64>
    where
        F: Fn(&ScoreLog) -> bool,
    {
        self.logs
            .values()
            .filter(|log| log.user_id == user_id && include(*log))
            .fold(None, |total, log| Some(total.unwrap_or(0.0) + log.score))
    }
}

/// In-memory system of record.
///
/// Score logs, display names and the outbox table share one `RwLock`, the
/// in-process equivalent of a single database transaction. Clone-friendly via Arc.
#[derive(Clone, Default)]
pub struct InMemoryRecords {
    state: Arc<RwLock<State>>,
}

impl InMemoryRecords {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, State>, RecordError> {
        self.state
            .read()
            .map_err(|_| RecordError::LockPoisoned("read"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, State>, RecordError> {
        self.state
            .write()
            .map_err(|_| RecordError::LockPoisoned("write"))
    }

    /// Record a new log and queue its refreshes.
    pub fn create_log(&self, new: NewScoreLog) -> Result<LogId, RecordError> {
        let now = SystemTime::now();
        let mut state = self.write()?;
        state.last_log_id += 1;
        let log = ScoreLog {
            id: state.last_log_id,
            user_id: new.user_id,
            contest_id: new.contest_id,
            year: new.year,
            score: new.score,
        };
        state.enqueue_for(&log, now);
        let id = log.id;
        state.logs.insert(id, log);
        Ok(id)
    }

    /// Change a log's score.
    pub fn update_log(&self, log_id: LogId, score: f64) -> Result<(), RecordError> {
        let now = SystemTime::now();
        let mut state = self.write()?;
        let log = state
            .logs
            .get_mut(&log_id)
            .ok_or(RecordError::LogNotFound(log_id))?;
        log.score = score;
        let log = log.clone();
        state.enqueue_for(&log, now);
        Ok(())
    }

    /// Remove a log entirely.
    pub fn delete_log(&self, log_id: LogId) -> Result<(), RecordError> {
        let now = SystemTime::now();
        let mut state = self.write()?;
        let log = state
            .logs
            .remove(&log_id)
            .ok_or(RecordError::LogNotFound(log_id))?;
        state.enqueue_for(&log, now);
        Ok(())
    }

    /// Stop counting a log toward its contest. Official totals are unchanged.
    pub fn detach_from_contest(&self, log_id: LogId) -> Result<(), RecordError> {
        let now = SystemTime::now();
        let mut state = self.write()?;
        let log = state
            .logs
            .get_mut(&log_id)
            .ok_or(RecordError::LogNotFound(log_id))?;
        let Some(contest_id) = log.contest_id.take() else {
            return Ok(());
        };
        let user_id = log.user_id.clone();
        state
            .outbox
            .insert(NewOutboxEvent::refresh_contest_score(contest_id, user_id), now);
        Ok(())
    }

    pub fn set_display_name(
        &self,
        user_id: impl Into<UserId>,
        name: impl Into<String>,
    ) -> Result<(), RecordError> {
        let mut state = self.write()?;
        state.names.insert(user_id.into(), name.into());
        Ok(())
    }

    /// Insert an outbox row for a write path that lives elsewhere.
    pub fn enqueue(&self, event: NewOutboxEvent) -> Result<EventId, RecordError> {
        let mut state = self.write()?;
        Ok(state.outbox.insert(event, SystemTime::now()))
    }

    pub fn log(&self, log_id: LogId) -> Result<Option<ScoreLog>, RecordError> {
        Ok(self.read()?.logs.get(&log_id).cloned())
    }

    /// Every outbox row, processed or not, in id order.
    pub fn outbox_rows(&self) -> Result<Vec<OutboxRow>, RecordError> {
        Ok(self.read()?.outbox.rows())
    }

    /// Outbox rows not yet processed, in id order.
    pub fn pending_events(&self) -> Result<Vec<OutboxRow>, RecordError> {
        Ok(self.read()?.outbox.pending())
    }

    fn read_scores(&self) -> Result<RwLockReadGuard<'_, State>, ScoreRepositoryError> {
        self.state
            .read()
            .map_err(|_| ScoreRepositoryError::LockPoisoned("read"))
    }

    fn write_outbox(&self) -> Result<RwLockWriteGuard<'_, State>, EventLogError> {
        self.state
            .write()
            .map_err(|_| EventLogError::LockPoisoned("outbox write"))
    }
}

impl ScoreRepository for InMemoryRecords {
    fn fetch_user_contest_score(
        &self,
        contest_id: ContestId,
        user_id: &str,
    ) -> Result<Option<f64>, ScoreRepositoryError> {
        let state = self.read_scores()?;
        Ok(state.user_total(user_id, |log| log.contest_id == Some(contest_id)))
    }

    fn fetch_user_yearly_score(
        &self,
        year: Year,
        user_id: &str,
    ) -> Result<Option<f64>, ScoreRepositoryError> {
        let state = self.read_scores()?;
        Ok(state.user_total(user_id, |log| log.year == year))
    }

    fn fetch_user_global_score(
        &self,
        user_id: &str,
    ) -> Result<Option<f64>, ScoreRepositoryError> {
        let state = self.read_scores()?;
        Ok(state.user_total(user_id, |_| true))
    }

    fn fetch_all_contest_leaderboard_scores(
        &self,
        contest_id: ContestId,
    ) -> Result<Vec<LeaderboardScore>, ScoreRepositoryError> {
        let state = self.read_scores()?;
        Ok(state.totals(|log| log.contest_id == Some(contest_id)))
    }

    fn fetch_all_yearly_leaderboard_scores(
        &self,
        year: Year,
    ) -> Result<Vec<LeaderboardScore>, ScoreRepositoryError> {
        let state = self.read_scores()?;
        Ok(state.totals(|log| log.year == year))
    }

    fn fetch_all_global_leaderboard_scores(
        &self,
    ) -> Result<Vec<LeaderboardScore>, ScoreRepositoryError> {
        let state = self.read_scores()?;
        Ok(state.totals(|_| true))
    }
}

impl DisplayNames for InMemoryRecords {
    fn display_names(
        &self,
        user_ids: &[UserId],
    ) -> Result<HashMap<UserId, String>, ScoreRepositoryError> {
        let state = self.read_scores()?;
        Ok(user_ids
            .iter()
            .filter_map(|id| state.names.get(id).map(|name| (id.clone(), name.clone())))
            .collect())
    }
}

impl EventLog for InMemoryRecords {
    type Claim = InMemoryClaim;

    fn claim_batch(
        &self,
        worker_id: &str,
        max: usize,
        lease: Duration,
    ) -> Result<InMemoryClaim, EventLogError> {
        let mut state = self.write_outbox()?;
        let (token, events) = state.outbox.claim(worker_id, max, lease, SystemTime::now());
        Ok(InMemoryClaim {
            state: Arc::clone(&self.state),
            token,
            events,
            finished: false,
        })
    }

    fn cleanup(&self, processed_before: SystemTime) -> Result<usize, EventLogError> {
        let mut state = self.write_outbox()?;
        Ok(state.outbox.cleanup(processed_before))
    }
}

/// Rows leased by one `InMemoryRecords::claim_batch` call.
pub struct InMemoryClaim {
    state: Arc<RwLock<State>>,
    token: String,
    events: Vec<OutboxRow>,
    finished: bool,
}

impl InMemoryClaim {
    fn finish(&mut self, processed: &[EventId]) -> Result<usize, EventLogError> {
        let mut state = self
            .state
            .write()
            .map_err(|_| EventLogError::LockPoisoned("outbox write"))?;
        let marked = state
            .outbox
            .commit(&self.token, processed, SystemTime::now());
        self.finished = true;
        Ok(marked)
    }
}

impl EventClaim for InMemoryClaim {
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

impl Drop for InMemoryClaim {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        if let Err(err) = self.finish(&[]) {
            warn!(token = %self.token, error = %err, "failed to release outbox claim");
        }
    }
}
