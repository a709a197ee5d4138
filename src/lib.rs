mod config;
mod outbox;
mod outbox_worker;
mod query;
mod ranking;
mod record;
mod scope;
mod scores;
mod store;
mod updater;

pub use config::{ConfigError, FailurePolicy, WorkerConfig};
pub use outbox::{
    EventClaim, EventId, EventLog, EventLogError, EventType, NewOutboxEvent, OutboxRow,
    OutboxTable, RefreshTarget, UnsupportedEvent,
};
#[cfg(feature = "sqlite")]
pub use outbox::{SqliteClaim, SqliteEventLog};
pub use outbox_worker::{OutboxWorker, OutboxWorkerThread, TickReport, WorkerStats};
pub use query::{LeaderboardPage, LeaderboardQuery, QueryError};
pub use ranking::{next_page_token, rank_scores, LeaderboardEntry, PageToken, RankingError};
pub use record::{InMemoryClaim, InMemoryRecords, LogId, NewScoreLog, RecordError, ScoreLog};
pub use scope::{ContestId, LeaderboardScope, LeaderboardScore, UserId, Year};
pub use scores::{DisplayNames, ScoreRepository, ScoreRepositoryError};
#[cfg(feature = "redis")]
pub use store::RedisLeaderboardStore;
pub use store::{InMemoryLeaderboardStore, LeaderboardStore, OfficialUpdate, StoreError, StorePage};
pub use updater::{LeaderboardUpdater, RefreshFailure, RefreshOutcome, ScoreRefresher};
