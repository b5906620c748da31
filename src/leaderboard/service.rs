use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, instrument};

use super::errors::LeaderboardError;
use super::merge::merge_tallies;
use super::models::{Leaderboard, LeaderboardEntry, RankedEntry, Scope};
use super::ranking::{rank_by_total, rank_by_trend};
use super::repository::InviteRepository;
use super::trend::apply_recent_joins;

/// Maximum number of entries delivered per ranking unless the caller asks
/// for fewer.
pub const DEFAULT_LIMIT: usize = 50;

/// Trailing window behind "now" used for the trend ranking.
pub fn default_trend_window() -> Duration {
    Duration::hours(24)
}

/// Longest trend window a caller may request, in hours.
pub const MAX_WINDOW_HOURS: i64 = 24 * 365;

/// Validates a caller-supplied trend window. Rejects non-positive and
/// oversized values so arithmetic on the window can never overflow.
pub fn trend_window_from_hours(hours: i64) -> Result<Duration, LeaderboardError> {
    if !(1..=MAX_WINDOW_HOURS).contains(&hours) {
        return Err(LeaderboardError::InvalidScope(format!(
            "window_hours must be between 1 and {MAX_WINDOW_HOURS}, got {hours}"
        )));
    }
    Ok(Duration::hours(hours))
}

/// Computes invite leaderboards over an [`InviteRepository`].
///
/// Every computation is a pure function of the three reads at call time:
/// nothing is cached across calls and concurrent computations share no
/// state, so a single service instance can serve any number of guilds.
pub struct LeaderboardService {
    repository: Arc<dyn InviteRepository>,
}

impl LeaderboardService {
    pub fn new(repository: Arc<dyn InviteRepository>) -> Self {
        Self { repository }
    }

    /// Computes the leaderboard for one scope: read, merge, apply recent
    /// joins, rank twice, truncate.
    ///
    /// The three reads are independent and issued concurrently; if any of
    /// them fails the whole computation fails and no partial leaderboard is
    /// returned. Retrying is the caller's decision.
    #[instrument(skip(self))]
    pub async fn compute(
        &self,
        scope: Scope,
        limit: usize,
        trend_window: Duration,
    ) -> Result<Leaderboard, LeaderboardError> {
        let window_start = Utc::now() - trend_window;

        let (code_tallies, bonus_tallies, join_tallies) = tokio::try_join!(
            self.repository.code_invite_tallies(&scope),
            self.repository.bonus_invite_tallies(&scope),
            self.repository.recent_join_tallies(&scope, window_start),
        )?;

        debug!(
            guild_id = %scope.guild_id,
            code_tallies = code_tallies.len(),
            bonus_tallies = bonus_tallies.len(),
            join_tallies = join_tallies.len(),
            "Merging invite tallies"
        );

        let mut entries = merge_tallies(&code_tallies, &bonus_tallies)?;
        apply_recent_joins(&mut entries, &join_tallies);

        Ok(build_leaderboard(scope, window_start, &entries, limit))
    }

    /// [`compute`](Self::compute) with the default limit and trend window.
    pub async fn compute_with_defaults(
        &self,
        scope: Scope,
    ) -> Result<Leaderboard, LeaderboardError> {
        self.compute(scope, DEFAULT_LIMIT, default_trend_window())
            .await
    }
}

/// Assembles the final bounded result from the merged entry map: both
/// orderings, each truncated to `limit`, with 1-based positions.
fn build_leaderboard(
    scope: Scope,
    window_start: DateTime<Utc>,
    entries: &HashMap<String, LeaderboardEntry>,
    limit: usize,
) -> Leaderboard {
    let current = truncate_ranked(rank_by_total(entries), limit);
    let trend = truncate_ranked(rank_by_trend(entries), limit);

    Leaderboard {
        scope,
        window_start,
        entries: current,
        trend,
    }
}

fn truncate_ranked(ranked: Vec<LeaderboardEntry>, limit: usize) -> Vec<RankedEntry> {
    ranked
        .iter()
        .take(limit)
        .enumerate()
        .map(|(index, entry)| RankedEntry::from_entry(index as u32 + 1, entry))
        .collect()
}
