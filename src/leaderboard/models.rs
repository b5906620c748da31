use chrono::{DateTime, Utc};
use serde::Serialize;

use super::errors::LeaderboardError;

/// Query scope applied uniformly to all three dataset reads in one
/// computation. No channel means guild-wide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Scope {
    pub guild_id: String,
    pub channel_id: Option<String>,
}

impl Scope {
    pub fn new(
        guild_id: impl Into<String>,
        channel_id: Option<String>,
    ) -> Result<Self, LeaderboardError> {
        let guild_id = guild_id.into();
        if guild_id.trim().is_empty() {
            return Err(LeaderboardError::InvalidScope(
                "guild id is required".to_string(),
            ));
        }
        if let Some(channel) = &channel_id {
            if channel.trim().is_empty() {
                return Err(LeaderboardError::InvalidScope(
                    "channel id must not be blank".to_string(),
                ));
            }
        }
        Ok(Self {
            guild_id,
            channel_id,
        })
    }

    pub fn guild_wide(guild_id: impl Into<String>) -> Result<Self, LeaderboardError> {
        Self::new(guild_id, None)
    }
}

/// Sum of uses across all invite codes created by one inviter, within scope.
#[derive(Debug, Clone)]
pub struct CodeInviteTally {
    pub inviter_id: String,
    pub inviter_name: String,
    pub total_uses: u32,
}

/// Sum of manually granted (or revoked, hence signed) bonus invites for one
/// member. The name is whatever the storage layer could resolve; a missing
/// name is an integrity fault if the merger needs it.
#[derive(Debug, Clone)]
pub struct BonusInviteTally {
    pub member_id: String,
    pub member_name: Option<String>,
    pub total_amount: i32,
}

/// Count of joins inside the trend window attributed to one inviter's codes.
#[derive(Debug, Clone)]
pub struct RecentJoinTally {
    pub inviter_id: String,
    pub total_joins: u32,
}

/// Per-member merged record for one computation. Totals are derived on
/// demand so they can never drift from their components.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardEntry {
    pub member_id: String,
    pub name: String,
    pub code_credit: i64,
    pub bonus_credit: i64,
    pub recent_joins: u32,
}

impl LeaderboardEntry {
    pub fn total_credit(&self) -> i64 {
        self.code_credit + self.bonus_credit
    }

    /// Credit as of the start of the trend window: current total minus the
    /// joins that arrived inside the window.
    pub fn trend_credit(&self) -> i64 {
        self.total_credit() - i64::from(self.recent_joins)
    }
}

/// One row of a finished ranking, with totals materialized for delivery.
#[derive(Debug, Clone, Serialize)]
pub struct RankedEntry {
    pub position: u32,
    pub member_id: String,
    pub name: String,
    pub code_credit: i64,
    pub bonus_credit: i64,
    pub recent_joins: u32,
    pub total_credit: i64,
    pub trend_credit: i64,
}

impl RankedEntry {
    pub fn from_entry(position: u32, entry: &LeaderboardEntry) -> Self {
        Self {
            position,
            member_id: entry.member_id.clone(),
            name: entry.name.clone(),
            code_credit: entry.code_credit,
            bonus_credit: entry.bonus_credit,
            recent_joins: entry.recent_joins,
            total_credit: entry.total_credit(),
            trend_credit: entry.trend_credit(),
        }
    }
}

/// Final ordered result handed to the presentation layer. An existing value
/// with empty `entries` is the explicit "no invites yet" state; "not yet
/// computed" is the absence of the value.
#[derive(Debug, Clone, Serialize)]
pub struct Leaderboard {
    pub scope: Scope,
    pub window_start: DateTime<Utc>,
    /// Current ranking, descending by total credit, truncated to the limit.
    pub entries: Vec<RankedEntry>,
    /// Parallel ordering by trend-adjusted credit. Callers that only want
    /// the current ranking ignore this.
    pub trend: Vec<RankedEntry>,
}

impl Leaderboard {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
