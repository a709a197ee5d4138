//! Leaderboard reads - cache first, repository on a miss.
//!
//! A cold contest or yearly scope is rebuilt as a side effect of reading it
//! (the yearly set together with the global set). A cold global scope is
//! served from the repository without populating the cache, since the
//! official pair can only be rebuilt for a known year.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::ranking::{next_page_token, rank_scores, LeaderboardEntry, PageToken, RankingError};
use crate::scope::{sort_scores_desc, LeaderboardScope, LeaderboardScore, UserId, Year};
use crate::scores::{DisplayNames, ScoreRepository, ScoreRepositoryError};
use crate::store::LeaderboardStore;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("page size must be positive")]
    InvalidPageSize,
    #[error(transparent)]
    Ranking(#[from] RankingError),
    #[error("score read failed: {0}")]
    Repository(#[from] ScoreRepositoryError),
}

/// One ranked page, ready to render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardPage {
    pub entries: Vec<LeaderboardEntry>,
    pub total_count: usize,
    pub next_page_token: Option<String>,
}

pub struct LeaderboardQuery<S, R, N> {
    store: S,
    repository: R,
    names: N,
}

impl<S, R, N> LeaderboardQuery<S, R, N> {
    pub fn new(store: S, repository: R, names: N) -> Self {
        Self {
            store,
            repository,
            names,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S, R, N> LeaderboardQuery<S, R, N>
where
    S: LeaderboardStore,
    R: ScoreRepository,
    N: DisplayNames,
{
    /// Fetch the zero-indexed `page` of `scope`.
    pub fn fetch_page(
        &self,
        scope: &LeaderboardScope,
        page: usize,
        page_size: usize,
    ) -> Result<LeaderboardPage, QueryError> {
        if page_size == 0 {
            return Err(QueryError::InvalidPageSize);
        }

        let (scores, total_count) = match self.store.fetch_page(scope, page, page_size) {
            Ok(cached) if cached.exists => (cached.scores, cached.total_count),
            Ok(_) => {
                debug!(scope = %scope, "leaderboard cache miss");
                let snapshot = self.snapshot(scope, true)?;
                slice_page(snapshot, page, page_size)
            }
            Err(err) => {
                warn!(
                    scope = %scope,
                    error = %err,
                    "leaderboard store read failed, serving from repository"
                );
                let snapshot = self.snapshot(scope, false)?;
                slice_page(snapshot, page, page_size)
            }
        };

        let user_ids: Vec<UserId> = scores.iter().map(|s| s.user_id.clone()).collect();
        let names = self.names.display_names(&user_ids).unwrap_or_else(|err| {
            warn!(scope = %scope, error = %err, "display names unavailable");
            Default::default()
        });

        let page_offset = page.saturating_mul(page_size) as u64;
        Ok(LeaderboardPage {
            entries: rank_scores(&scores, &names, page_offset),
            total_count,
            next_page_token: next_page_token(page, page_size, total_count),
        })
    }

    /// Like `fetch_page`, taking the opaque token from a previous page.
    /// `None` starts at the first page.
    pub fn fetch_page_after(
        &self,
        scope: &LeaderboardScope,
        token: Option<&str>,
        page_size: usize,
    ) -> Result<LeaderboardPage, QueryError> {
        let page = match token {
            Some(token) => PageToken::decode(token)?.page,
            None => 0,
        };
        self.fetch_page(scope, page, page_size)
    }

    fn snapshot(
        &self,
        scope: &LeaderboardScope,
        rebuild: bool,
    ) -> Result<Vec<LeaderboardScore>, QueryError> {
        let mut scores = match *scope {
            LeaderboardScope::Contest(contest_id) => {
                let scores = self
                    .repository
                    .fetch_all_contest_leaderboard_scores(contest_id)?;
                if rebuild {
                    match self.store.rebuild_contest_leaderboard(contest_id, &scores) {
                        Ok(()) => info!(
                            contest_id,
                            entries = scores.len(),
                            "rebuilt contest leaderboard on read"
                        ),
                        Err(err) => {
                            warn!(contest_id, error = %err, "contest rebuild on read failed")
                        }
                    }
                }
                scores
            }
            LeaderboardScope::Yearly(year) => {
                let yearly = self.repository.fetch_all_yearly_leaderboard_scores(year)?;
                if rebuild {
                    self.rebuild_official(year, &yearly);
                }
                yearly
            }
            LeaderboardScope::Global => self.repository.fetch_all_global_leaderboard_scores()?,
        };
        sort_scores_desc(&mut scores);
        Ok(scores)
    }

    fn rebuild_official(&self, year: Year, yearly: &[LeaderboardScore]) {
        let global = match self.repository.fetch_all_global_leaderboard_scores() {
            Ok(global) => global,
            Err(err) => {
                warn!(year, error = %err, "official rebuild on read skipped");
                return;
            }
        };
        match self.store.rebuild_official_leaderboards(year, yearly, &global) {
            Ok(()) => info!(
                year,
                yearly_entries = yearly.len(),
                global_entries = global.len(),
                "rebuilt official leaderboards on read"
            ),
            Err(err) => warn!(year, error = %err, "official rebuild on read failed"),
        }
    }
}

fn slice_page(
    scores: Vec<LeaderboardScore>,
    page: usize,
    page_size: usize,
) -> (Vec<LeaderboardScore>, usize) {
    let total = scores.len();
    let start = page.saturating_mul(page_size).min(total);
    let end = start.saturating_add(page_size).min(total);
    let page_scores = scores.into_iter().skip(start).take(end - start).collect();
    (page_scores, total)
}
