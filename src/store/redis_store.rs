//! RedisLeaderboardStore - one sorted set per leaderboard scope.
//!
//! Existence-gated writes run as Lua scripts so the `EXISTS` check and the
//! `ZADD` (or `ZREM`, for an empty score argument) happen atomically.
//! Rebuilds populate a shadow key and `RENAME` it over the live key inside
//! `MULTI/EXEC`.
//!
//! Redis removes empty sorted sets, so rebuilding from an empty snapshot
//! leaves the scope cold and the next refresh rebuilds it again.

use std::sync::Mutex;

use redis::{Client, Connection, RedisError, Script};

use super::{LeaderboardStore, OfficialUpdate, StoreError, StorePage};
use crate::scope::{ContestId, LeaderboardScope, LeaderboardScore, Year};

const UPDATE_IF_EXISTS: &str = r#"
if redis.call('EXISTS', KEYS[1]) == 1 then
  if ARGV[2] == '' then
    redis.call('ZREM', KEYS[1], ARGV[1])
  else
    redis.call('ZADD', KEYS[1], ARGV[2], ARGV[1])
  end
  return 1
end
return 0
"#;

const UPDATE_PAIR_IF_EXISTS: &str = r#"
local function apply(key, score)
  if redis.call('EXISTS', key) == 0 then
    return 0
  end
  if score == '' then
    redis.call('ZREM', key, ARGV[1])
  else
    redis.call('ZADD', key, score, ARGV[1])
  end
  return 1
end
return {apply(KEYS[1], ARGV[2]), apply(KEYS[2], ARGV[3])}
"#;

/// Script argument for a point update; empty means remove the member.
fn score_arg(score: Option<f64>) -> String {
    score.map(|score| score.to_string()).unwrap_or_default()
}

impl From<RedisError> for StoreError {
    fn from(err: RedisError) -> Self {
        if err.is_io_error() || err.is_connection_dropped() || err.is_timeout() {
            StoreError::Unavailable(err.to_string())
        } else {
            StoreError::Backend(err.to_string())
        }
    }
}

fn scope_key(prefix: &str, scope: &LeaderboardScope) -> String {
    format!("{}:{}", prefix, scope)
}

/// Leaderboard store backed by Redis sorted sets.
pub struct RedisLeaderboardStore {
    conn: Mutex<Connection>,
    prefix: String,
    update_one: Script,
    update_pair: Script,
}

impl RedisLeaderboardStore {
    /// Connect to `redis_url` using the default `leaderboard` key prefix.
    pub fn open(redis_url: &str) -> Result<Self, StoreError> {
        let client = Client::open(redis_url)?;
        let conn = client.get_connection()?;
        Ok(Self::with_connection(conn))
    }

    /// Wrap an existing connection.
    pub fn with_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
            prefix: "leaderboard".to_string(),
            update_one: Script::new(UPDATE_IF_EXISTS),
            update_pair: Script::new(UPDATE_PAIR_IF_EXISTS),
        }
    }

    /// Set the key prefix (useful for sharing one Redis between environments).
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Sorted-set key for a scope.
    pub fn key(&self, scope: &LeaderboardScope) -> String {
        scope_key(&self.prefix, scope)
    }

    fn shadow_key(&self, scope: &LeaderboardScope) -> String {
        format!("{}:rebuild", self.key(scope))
    }

    fn with_conn<F, T>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut Connection) -> Result<T, RedisError>,
    {
        let mut conn = self
            .conn
            .lock()
            .map_err(|_| StoreError::LockPoisoned("connection"))?;
        Ok(f(&mut *conn)?)
    }

    /// Queue a shadow-write-then-rename replacement of `scope` on `pipe`.
    fn queue_replace(
        &self,
        pipe: &mut redis::Pipeline,
        scope: &LeaderboardScope,
        scores: &[LeaderboardScore],
    ) {
        let key = self.key(scope);
        if scores.is_empty() {
            pipe.del(&key).ignore();
            return;
        }

        let shadow = self.shadow_key(scope);
        let members: Vec<(f64, &str)> = scores
            .iter()
            .map(|s| (s.score, s.user_id.as_str()))
            .collect();
        pipe.del(&shadow).ignore();
        pipe.zadd_multiple(&shadow, &members).ignore();
        pipe.rename(&shadow, &key).ignore();
    }
}

impl LeaderboardStore for RedisLeaderboardStore {
    fn update_contest_score(
        &self,
        contest_id: ContestId,
        user_id: &str,
        score: Option<f64>,
    ) -> Result<bool, StoreError> {
        let key = self.key(&LeaderboardScope::Contest(contest_id));
        let applied: i64 = self.with_conn(|conn| {
            self.update_one
                .key(&key)
                .arg(user_id)
                .arg(score_arg(score))
                .invoke(conn)
        })?;
        Ok(applied == 1)
    }

    fn update_official_scores(
        &self,
        year: Year,
        user_id: &str,
        yearly_score: Option<f64>,
        global_score: Option<f64>,
    ) -> Result<OfficialUpdate, StoreError> {
        let yearly_key = self.key(&LeaderboardScope::Yearly(year));
        let global_key = self.key(&LeaderboardScope::Global);
        let (yearly, global): (i64, i64) = self.with_conn(|conn| {
            self.update_pair
                .key(&yearly_key)
                .key(&global_key)
                .arg(user_id)
                .arg(score_arg(yearly_score))
                .arg(score_arg(global_score))
                .invoke(conn)
        })?;
        Ok(OfficialUpdate {
            yearly_existed: yearly == 1,
            global_existed: global == 1,
        })
    }

    fn rebuild_contest_leaderboard(
        &self,
        contest_id: ContestId,
        scores: &[LeaderboardScore],
    ) -> Result<(), StoreError> {
        let mut pipe = redis::pipe();
        pipe.atomic();
        self.queue_replace(&mut pipe, &LeaderboardScope::Contest(contest_id), scores);
        self.with_conn(|conn| pipe.query::<()>(conn))
    }

    fn rebuild_official_leaderboards(
        &self,
        year: Year,
        yearly_scores: &[LeaderboardScore],
        global_scores: &[LeaderboardScore],
    ) -> Result<(), StoreError> {
        let mut pipe = redis::pipe();
        pipe.atomic();
        self.queue_replace(&mut pipe, &LeaderboardScope::Yearly(year), yearly_scores);
        self.queue_replace(&mut pipe, &LeaderboardScope::Global, global_scores);
        self.with_conn(|conn| pipe.query::<()>(conn))
    }

    fn fetch_page(
        &self,
        scope: &LeaderboardScope,
        page: usize,
        page_size: usize,
    ) -> Result<StorePage, StoreError> {
        if page_size == 0 {
            return Ok(StorePage::default());
        }

        let key = self.key(scope);
        let start = page.saturating_mul(page_size);
        let stop = start.saturating_add(page_size - 1);
        let start = isize::try_from(start).unwrap_or(isize::MAX);
        let stop = isize::try_from(stop).unwrap_or(isize::MAX);

        let (exists, total_count, members): (bool, usize, Vec<(String, f64)>) =
            self.with_conn(|conn| {
                redis::pipe()
                    .atomic()
                    .exists(&key)
                    .zcard(&key)
                    .zrevrange_withscores(&key, start, stop)
                    .query(conn)
            })?;

        Ok(StorePage {
            scores: members
                .into_iter()
                .map(|(user_id, score)| LeaderboardScore { user_id, score })
                .collect(),
            total_count,
            exists,
        })
    }
}
