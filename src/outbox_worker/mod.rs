//! Outbox Worker - drains the outbox into the leaderboard updater.
//!
//! - `OutboxWorker` - one synchronous claim / dedup / refresh / retire tick
//! - `OutboxWorkerThread` - background ticker loop with periodic cleanup
//!
//! ## Separation of Concerns
//!
//! 1. **Enqueue phase** (see `record` and `outbox`) - a write path commits its
//!    change and its outbox rows together
//! 2. **Worker phase** (this module) - claim rows, refresh each unique target
//!    once, mark the rows processed
//!
//! ## Example
//!
//! ```ignore
//! use leaderboard_sync::{FailurePolicy, OutboxWorker};
//!
//! let worker = OutboxWorker::new(records.clone(), updater)
//!     .with_worker_id("worker-1")
//!     .with_failure_policy(FailurePolicy::Retry);
//!
//! let report = worker.tick()?;
//! println!("{} claimed, {} refreshed", report.claimed, report.refreshes);
//! ```

mod thread;
mod worker;

pub use thread::{OutboxWorkerThread, WorkerStats};
pub use worker::{OutboxWorker, TickReport};
