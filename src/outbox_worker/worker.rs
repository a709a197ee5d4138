use std::collections::HashMap;
use std::time::SystemTime;

use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::{FailurePolicy, WorkerConfig};
use crate::outbox::{EventClaim, EventId, EventLog, EventLogError, RefreshTarget};
use crate::updater::{RefreshOutcome, ScoreRefresher};

/// Result of one tick.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    /// Rows claimed this tick.
    pub claimed: usize,
    /// Updater calls made, one per unique target.
    pub refreshes: usize,
    /// Updater calls that reported a failure.
    pub refresh_failures: usize,
    /// Rows skipped because the worker cannot act on them.
    pub unsupported: usize,
    /// Rows marked processed.
    pub processed: usize,
    /// Rows handed back for a later tick.
    pub released: usize,
}

impl TickReport {
    pub fn is_idle(&self) -> bool {
        self.claimed == 0
    }
}

/// Drains the outbox into a `ScoreRefresher`.
///
/// Holds no state between ticks; every tick claims, refreshes, and retires
/// its own batch.
pub struct OutboxWorker<L, U> {
    log: L,
    refresher: U,
    worker_id: String,
    config: WorkerConfig,
}

impl<L, U> OutboxWorker<L, U> {
    pub fn new(log: L, refresher: U) -> Self {
        Self {
            log,
            refresher,
            worker_id: format!("worker-{}", Uuid::new_v4().simple()),
            config: WorkerConfig::default(),
        }
    }

    /// Set the worker ID (used in claim tokens).
    pub fn with_worker_id(mut self, id: impl Into<String>) -> Self {
        self.worker_id = id.into();
        self
    }

    pub fn with_config(mut self, config: WorkerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.config.batch_size = size;
        self
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.config.failure_policy = policy;
        self
    }

    pub fn worker_id(&self) -> &str {
        &self.worker_id
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    pub fn log(&self) -> &L {
        &self.log
    }

    pub fn refresher(&self) -> &U {
        &self.refresher
    }
}

impl<L: EventLog, U: ScoreRefresher> OutboxWorker<L, U> {
    /// Run one claim / refresh / retire cycle.
    ///
    /// A claim failure aborts the tick. Everything after the claim is
    /// per-target and never aborts the batch.
    pub fn tick(&self) -> Result<TickReport, EventLogError> {
        let claim =
            self.log
                .claim_batch(&self.worker_id, self.config.batch_size, self.config.lease)?;

        if claim.is_empty() {
            claim.rollback()?;
            debug!(worker_id = %self.worker_id, "no pending outbox events");
            return Ok(TickReport::default());
        }

        let mut report = TickReport {
            claimed: claim.events().len(),
            ..Default::default()
        };
        let mut processed: Vec<EventId> = Vec::with_capacity(report.claimed);

        // Unique targets in first-seen order, each with every id that asked for it.
        let mut index: HashMap<RefreshTarget, usize> = HashMap::new();
        let mut groups: Vec<(RefreshTarget, Vec<EventId>)> = Vec::new();
        for row in claim.events() {
            match row.target() {
                Ok(target) => match index.get(&target) {
                    Some(&i) => groups[i].1.push(row.id),
                    None => {
                        index.insert(target.clone(), groups.len());
                        groups.push((target, vec![row.id]));
                    }
                },
                Err(err) => {
                    warn!(event_id = row.id, error = %err, "skipping unsupported outbox event");
                    report.unsupported += 1;
                    processed.push(row.id);
                }
            }
        }

        for (target, ids) in groups {
            report.refreshes += 1;
            if self.refresh(&target).is_failed() {
                report.refresh_failures += 1;
                if self.config.failure_policy == FailurePolicy::Retry {
                    report.released += ids.len();
                    continue;
                }
            }
            processed.extend(ids);
        }

        report.processed = claim.commit(&processed)?;
        debug!(
            worker_id = %self.worker_id,
            claimed = report.claimed,
            refreshes = report.refreshes,
            processed = report.processed,
            "outbox tick complete"
        );
        Ok(report)
    }

    /// Delete processed rows older than the retention window, measured from `now`.
    pub fn cleanup(&self, now: SystemTime) -> Result<usize, EventLogError> {
        let cutoff = now
            .checked_sub(self.config.retention)
            .unwrap_or(SystemTime::UNIX_EPOCH);
        let deleted = self.log.cleanup(cutoff)?;
        info!(worker_id = %self.worker_id, deleted, "outbox cleanup");
        Ok(deleted)
    }

    fn refresh(&self, target: &RefreshTarget) -> RefreshOutcome {
        let outcome = match target {
            RefreshTarget::Contest {
                contest_id,
                user_id,
            } => self.refresher.refresh_contest_score(*contest_id, user_id),
            RefreshTarget::Official { year, user_id } => {
                self.refresher.refresh_official_scores(*year, user_id)
            }
        };
        if let RefreshOutcome::Failed(err) = &outcome {
            error!(
                event_type = %target.event_type(),
                user_id = target.user_id(),
                error = %err,
                "refresh failed"
            );
        }
        outcome
    }
}
