use std::cmp::Reverse;
use std::collections::HashMap;

use super::models::LeaderboardEntry;

/// Current ranking: members with positive total credit, descending by total
/// credit. Ties break ascending by member id so repeated computations over
/// identical input produce identical orderings.
pub fn rank_by_total(entries: &HashMap<String, LeaderboardEntry>) -> Vec<LeaderboardEntry> {
    rank_by(entries, |entry| entry.total_credit())
}

/// Trend ranking: the same filtered set, descending by trend-adjusted credit
/// (total minus recent joins), same tie-break. Computed alongside the
/// current ranking so the caller can derive position changes.
pub fn rank_by_trend(entries: &HashMap<String, LeaderboardEntry>) -> Vec<LeaderboardEntry> {
    rank_by(entries, |entry| entry.trend_credit())
}

fn rank_by(
    entries: &HashMap<String, LeaderboardEntry>,
    key: impl Fn(&LeaderboardEntry) -> i64,
) -> Vec<LeaderboardEntry> {
    let mut ranked: Vec<LeaderboardEntry> = entries
        .values()
        .filter(|entry| entry.total_credit() > 0)
        .cloned()
        .collect();
    ranked.sort_by_key(|entry| (Reverse(key(entry)), entry.member_id.clone()));
    ranked
}
