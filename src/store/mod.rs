//! Leaderboard Store - the fast ranked cache that reads are served from.
//!
//! `InMemoryLeaderboardStore` backs tests and single-process deployments.
//! `RedisLeaderboardStore` (feature `redis`) keeps each scope in a sorted set.

mod error;
mod in_memory;
#[cfg(feature = "redis")]
mod redis_store;
mod store;

pub use error::StoreError;
pub use in_memory::InMemoryLeaderboardStore;
#[cfg(feature = "redis")]
pub use redis_store::RedisLeaderboardStore;
pub use store::{LeaderboardStore, OfficialUpdate, StorePage};
