//! Ranking / Pagination - turns a sorted score slice into ranked entries.
//!
//! Uses competition ranking: tied scores share the lowest position among
//! them and the next distinct score takes its own 1-indexed position, so
//! `300, 200, 200, 100` ranks as `1, 2, 2, 4`.

mod token;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::scope::{LeaderboardScore, UserId};

pub use token::{next_page_token, PageToken, RankingError};

/// A display-ready leaderboard row.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub rank: u64,
    pub user_id: UserId,
    pub display_name: String,
    pub score: f64,
    pub is_tie: bool,
}

/// Rank one page of descending scores.
///
/// `page_offset` is the number of entries on strictly earlier pages. Ties are
/// only detected within the slice, so a tie that straddles a page boundary
/// starts the next page at its own position. Missing names become `""`.
pub fn rank_scores(
    scores: &[LeaderboardScore],
    names: &HashMap<UserId, String>,
    page_offset: u64,
) -> Vec<LeaderboardEntry> {
    let mut ranks: Vec<u64> = Vec::with_capacity(scores.len());
    for (i, score) in scores.iter().enumerate() {
        let rank = match ranks.last() {
            Some(&prev) if scores[i - 1].score == score.score => prev,
            _ => page_offset + i as u64 + 1,
        };
        ranks.push(rank);
    }

    scores
        .iter()
        .enumerate()
        .map(|(i, score)| {
            let rank = ranks[i];
            let tied_before = i > 0 && ranks[i - 1] == rank;
            let tied_after = ranks.get(i + 1) == Some(&rank);
            LeaderboardEntry {
                rank,
                user_id: score.user_id.clone(),
                display_name: names.get(&score.user_id).cloned().unwrap_or_default(),
                score: score.score,
                is_tie: tied_before || tied_after,
            }
        })
        .collect()
}
