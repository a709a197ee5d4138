use std::collections::HashMap;
use std::sync::Mutex;

use leaderboard_sync::{ContestId, RefreshOutcome, RefreshTarget, ScoreRefresher, Year};

/// Wraps a refresher and records every call it forwards.
pub struct CountingRefresher<U> {
    inner: U,
    calls: Mutex<Vec<RefreshTarget>>,
}

impl<U> CountingRefresher<U> {
    pub fn new(inner: U) -> Self {
        Self {
            inner,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn inner(&self) -> &U {
        &self.inner
    }

    pub fn calls(&self) -> Vec<RefreshTarget> {
        self.calls.lock().unwrap().clone()
    }

    pub fn total(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn per_target(&self) -> HashMap<RefreshTarget, usize> {
        let mut counts = HashMap::new();
        for call in self.calls() {
            *counts.entry(call).or_insert(0) += 1;
        }
        counts
    }
}

impl<U: ScoreRefresher> ScoreRefresher for CountingRefresher<U> {
    fn refresh_contest_score(&self, contest_id: ContestId, user_id: &str) -> RefreshOutcome {
        self.calls.lock().unwrap().push(RefreshTarget::Contest {
            contest_id,
            user_id: user_id.to_string(),
        });
        self.inner.refresh_contest_score(contest_id, user_id)
    }

    fn refresh_official_scores(&self, year: Year, user_id: &str) -> RefreshOutcome {
        self.calls.lock().unwrap().push(RefreshTarget::Official {
            year,
            user_id: user_id.to_string(),
        });
        self.inner.refresh_official_scores(year, user_id)
    }
}
