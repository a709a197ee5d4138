//! Threaded outbox worker for background processing.
//!
//! One ticker loop per worker on a dedicated thread. The stop signal is
//! observed between ticks; a tick that has started always runs to its commit
//! or rollback.

use std::sync::mpsc::{channel, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Instant, SystemTime};

use tracing::{error, info};

use super::{OutboxWorker, TickReport};
use crate::outbox::EventLog;
use crate::updater::ScoreRefresher;

/// Statistics from the outbox worker thread.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WorkerStats {
    pub ticks: usize,
    pub events_claimed: usize,
    pub events_processed: usize,
    pub refreshes: usize,
    pub refresh_failures: usize,
    pub claim_failures: usize,
    pub cleanups: usize,
    pub rows_deleted: usize,
}

impl WorkerStats {
    fn record(&mut self, report: &TickReport) {
        self.events_claimed += report.claimed;
        self.events_processed += report.processed;
        self.refreshes += report.refreshes;
        self.refresh_failures += report.refresh_failures;
    }
}

/// A background thread that ticks an `OutboxWorker`.
///
/// ## Example
///
/// ```ignore
/// use leaderboard_sync::{InMemoryLeaderboardStore, InMemoryRecords, LeaderboardUpdater};
/// use leaderboard_sync::{OutboxWorker, OutboxWorkerThread, WorkerConfig};
/// use std::time::Duration;
///
/// let records = InMemoryRecords::new();
/// let updater = LeaderboardUpdater::new(InMemoryLeaderboardStore::new(), records.clone());
/// let worker = OutboxWorker::new(records.clone(), updater)
///     .with_config(WorkerConfig::new().with_poll_interval(Duration::from_millis(50)));
///
/// let thread = OutboxWorkerThread::spawn(worker);
/// // ... write score logs ...
/// let stats = thread.stop();
/// println!("processed {} events", stats.events_processed);
/// ```
pub struct OutboxWorkerThread {
    stop_tx: Sender<()>,
    handle: Option<JoinHandle<WorkerStats>>,
}

impl OutboxWorkerThread {
    /// Spawn the ticker loop. Poll and cleanup intervals come from the
    /// worker's config. The first tick runs immediately.
    pub fn spawn<L, U>(worker: OutboxWorker<L, U>) -> Self
    where
        L: EventLog + 'static,
        U: ScoreRefresher + 'static,
    {
        let (stop_tx, stop_rx) = channel();

        let handle = thread::spawn(move || {
            let mut stats = WorkerStats::default();
            let poll_interval = worker.config().poll_interval;
            let cleanup_interval = worker.config().cleanup_interval;
            let mut last_cleanup = Instant::now();

            loop {
                stats.ticks += 1;
                match worker.tick() {
                    Ok(report) => stats.record(&report),
                    Err(err) => {
                        stats.claim_failures += 1;
                        error!(worker_id = worker.worker_id(), error = %err, "outbox claim failed");
                    }
                }

                if last_cleanup.elapsed() >= cleanup_interval {
                    last_cleanup = Instant::now();
                    match worker.cleanup(SystemTime::now()) {
                        Ok(deleted) => {
                            stats.cleanups += 1;
                            stats.rows_deleted += deleted;
                        }
                        Err(err) => {
                            error!(
                                worker_id = worker.worker_id(),
                                error = %err,
                                "outbox cleanup failed"
                            );
                        }
                    }
                }

                match stop_rx.recv_timeout(poll_interval) {
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    Err(RecvTimeoutError::Timeout) => {}
                }
            }

            info!(worker_id = worker.worker_id(), ticks = stats.ticks, "outbox worker stopped");
            stats
        });

        Self {
            stop_tx,
            handle: Some(handle),
        }
    }

    /// Signal the worker to stop and wait for it to finish.
    /// Returns the worker statistics.
    pub fn stop(mut self) -> WorkerStats {
        let _ = self.stop_tx.send(());
        if let Some(handle) = self.handle.take() {
            handle.join().unwrap_or_default()
        } else {
            WorkerStats::default()
        }
    }

    /// Signal the worker to stop without waiting.
    pub fn signal_stop(&self) {
        let _ = self.stop_tx.send(());
    }
}

impl Drop for OutboxWorkerThread {
    fn drop(&mut self) {
        let _ = self.stop_tx.send(());
    }
}
