use std::collections::HashMap;

use tracing::debug;

use super::models::{LeaderboardEntry, RecentJoinTally};

/// Applies the recent-join tallies to entries already in the merged map.
///
/// Trend is a modifier on existing leaderboard members, not a discovery
/// mechanism: a tally for an inviter with no entry (recent joins but zero
/// net current credit) is dropped.
pub fn apply_recent_joins(
    entries: &mut HashMap<String, LeaderboardEntry>,
    tallies: &[RecentJoinTally],
) {
    for tally in tallies {
        match entries.get_mut(&tally.inviter_id) {
            Some(entry) => entry.recent_joins = tally.total_joins,
            None => {
                debug!(
                    inviter_id = %tally.inviter_id,
                    total_joins = tally.total_joins,
                    "Dropping recent joins for inviter outside the leaderboard"
                );
            }
        }
    }
}
