//! InMemoryLeaderboardStore - ordered in-memory leaderboard cache for testing and development.

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, RwLock};

use super::{LeaderboardStore, OfficialUpdate, StoreError, StorePage};
use crate::scope::{ContestId, LeaderboardScope, LeaderboardScore, UserId, Year};

/// Score key that sorts highest first, using the IEEE total order.
#[derive(Debug, Clone, Copy)]
struct Desc(f64);

impl PartialEq for Desc {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Desc {}

impl PartialOrd for Desc {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Desc {
    fn cmp(&self, other: &Self) -> Ordering {
        other.0.total_cmp(&self.0)
    }
}

/// One cached scope: a member lookup plus an index kept in rank order
/// (score descending, then user id ascending).
#[derive(Debug, Default)]
struct RankedSet {
    scores: HashMap<UserId, f64>,
    order: BTreeSet<(Desc, UserId)>,
}

impl RankedSet {
    fn from_scores(scores: &[LeaderboardScore]) -> Self {
        let mut set = Self::default();
        for entry in scores {
            set.set(&entry.user_id, Some(entry.score));
        }
        set
    }

    fn len(&self) -> usize {
        self.scores.len()
    }

    /// Insert, move or (with `None`) remove a member.
    fn set(&mut self, user_id: &str, score: Option<f64>) {
        if let Some(old) = self.scores.remove(user_id) {
            self.order.remove(&(Desc(old), user_id.to_string()));
        }
        if let Some(score) = score {
            self.scores.insert(user_id.to_string(), score);
            self.order.insert((Desc(score), user_id.to_string()));
        }
    }

    fn page(&self, skip: usize, take: usize) -> Vec<LeaderboardScore> {
        self.order
            .iter()
            .skip(skip)
            .take(take)
            .map(|(Desc(score), user_id)| LeaderboardScore::new(user_id.clone(), *score))
            .collect()
    }

    fn all(&self) -> Vec<LeaderboardScore> {
        self.page(0, self.len())
    }
}

/// In-memory leaderboard store.
///
/// Every operation runs under a single guard, so paired writes and rebuilds
/// are atomic with respect to readers. Clone-friendly via Arc.
#[derive(Clone, Default)]
pub struct InMemoryLeaderboardStore {
    sets: Arc<RwLock<HashMap<LeaderboardScope, RankedSet>>>,
}

impl InMemoryLeaderboardStore {
    /// Create an empty (fully cold) store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the scope is cached.
    pub fn contains(&self, scope: &LeaderboardScope) -> Result<bool, StoreError> {
        let sets = self
            .sets
            .read()
            .map_err(|_| StoreError::LockPoisoned("read"))?;
        Ok(sets.contains_key(scope))
    }

    /// The full cached set for a scope, sorted descending. `None` when cold.
    pub fn snapshot(
        &self,
        scope: &LeaderboardScope,
    ) -> Result<Option<Vec<LeaderboardScore>>, StoreError> {
        let sets = self
            .sets
            .read()
            .map_err(|_| StoreError::LockPoisoned("read"))?;
        Ok(sets.get(scope).map(RankedSet::all))
    }

    /// Drop a scope from the cache, as an eviction would.
    pub fn evict(&self, scope: &LeaderboardScope) -> Result<bool, StoreError> {
        let mut sets = self
            .sets
            .write()
            .map_err(|_| StoreError::LockPoisoned("write"))?;
        Ok(sets.remove(scope).is_some())
    }
}

/// Set or remove `user_id` in `scope` only when the scope exists.
fn set_if_exists(
    sets: &mut HashMap<LeaderboardScope, RankedSet>,
    scope: &LeaderboardScope,
    user_id: &str,
    score: Option<f64>,
) -> bool {
    match sets.get_mut(scope) {
        Some(set) => {
            set.set(user_id, score);
            true
        }
        None => false,
    }
}

impl LeaderboardStore for InMemoryLeaderboardStore {
    fn update_contest_score(
        &self,
        contest_id: ContestId,
        user_id: &str,
        score: Option<f64>,
    ) -> Result<bool, StoreError> {
        let mut sets = self
            .sets
            .write()
            .map_err(|_| StoreError::LockPoisoned("write"))?;
        Ok(set_if_exists(
            &mut sets,
            &LeaderboardScope::Contest(contest_id),
            user_id,
            score,
        ))
    }

    fn update_official_scores(
        &self,
        year: Year,
        user_id: &str,
        yearly_score: Option<f64>,
        global_score: Option<f64>,
    ) -> Result<OfficialUpdate, StoreError> {
        let mut sets = self
            .sets
            .write()
            .map_err(|_| StoreError::LockPoisoned("write"))?;
        let yearly_existed = set_if_exists(
            &mut sets,
            &LeaderboardScope::Yearly(year),
            user_id,
            yearly_score,
        );
        let global_existed =
            set_if_exists(&mut sets, &LeaderboardScope::Global, user_id, global_score);
        Ok(OfficialUpdate {
            yearly_existed,
            global_existed,
        })
    }

    fn rebuild_contest_leaderboard(
        &self,
        contest_id: ContestId,
        scores: &[LeaderboardScore],
    ) -> Result<(), StoreError> {
        let fresh = RankedSet::from_scores(scores);
        let mut sets = self
            .sets
            .write()
            .map_err(|_| StoreError::LockPoisoned("write"))?;
        sets.insert(LeaderboardScope::Contest(contest_id), fresh);
        Ok(())
    }

    fn rebuild_official_leaderboards(
        &self,
        year: Year,
        yearly_scores: &[LeaderboardScore],
        global_scores: &[LeaderboardScore],
    ) -> Result<(), StoreError> {
        let yearly = RankedSet::from_scores(yearly_scores);
        let global = RankedSet::from_scores(global_scores);
        let mut sets = self
            .sets
            .write()
            .map_err(|_| StoreError::LockPoisoned("write"))?;
        sets.insert(LeaderboardScope::Yearly(year), yearly);
        sets.insert(LeaderboardScope::Global, global);
        Ok(())
    }

    fn fetch_page(
        &self,
        scope: &LeaderboardScope,
        page: usize,
        page_size: usize,
    ) -> Result<StorePage, StoreError> {
        let sets = self
            .sets
            .read()
            .map_err(|_| StoreError::LockPoisoned("read"))?;

        let Some(set) = sets.get(scope) else {
            return Ok(StorePage::default());
        };

        Ok(StorePage {
            scores: set.page(page.saturating_mul(page_size), page_size),
            total_count: set.len(),
            exists: true,
        })
    }
}
