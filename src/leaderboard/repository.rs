use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use std::collections::BTreeMap;
use std::sync::Mutex;
use tracing::{debug, instrument, warn};

use super::errors::LeaderboardError;
use super::models::{BonusInviteTally, CodeInviteTally, RecentJoinTally, Scope};

/// Trait for the three aggregate invite reads backing a leaderboard
/// computation. Each read takes the same scope; empty results are not
/// errors. Any storage failure maps to `StorageUnavailable` and aborts the
/// whole computation.
#[async_trait]
pub trait InviteRepository: Send + Sync {
    /// Sum of uses per inviter over invite codes in scope. A set channel
    /// restricts to codes recorded against that channel.
    async fn code_invite_tallies(
        &self,
        scope: &Scope,
    ) -> Result<Vec<CodeInviteTally>, LeaderboardError>;

    /// Sum of bonus amounts per member. Guild-scoped only: bonus invites are
    /// not tied to a channel, so the scope's channel is ignored here.
    async fn bonus_invite_tallies(
        &self,
        scope: &Scope,
    ) -> Result<Vec<BonusInviteTally>, LeaderboardError>;

    /// Count of joins at or after `window_start` that resolved to an exact
    /// invite-code match, grouped by that code's inviter. Channel-scoped
    /// like the code read.
    async fn recent_join_tallies(
        &self,
        scope: &Scope,
        window_start: DateTime<Utc>,
    ) -> Result<Vec<RecentJoinTally>, LeaderboardError>;
}

/// One trackable invite code and its accumulated use count.
#[derive(Debug, Clone)]
pub struct InviteCodeRecord {
    pub code: String,
    pub guild_id: String,
    pub channel_id: Option<String>,
    pub inviter_id: String,
    pub inviter_name: String,
    pub uses: u32,
}

/// One manual bonus grant or deduction.
#[derive(Debug, Clone)]
pub struct BonusInviteRecord {
    pub guild_id: String,
    pub member_id: String,
    pub member_name: Option<String>,
    pub amount: i32,
}

/// One join event. `exact_match_code` is the invite code the join was
/// attributed to, when tracking could resolve one.
#[derive(Debug, Clone)]
pub struct JoinRecord {
    pub guild_id: String,
    pub channel_id: Option<String>,
    pub exact_match_code: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// In-memory implementation of InviteRepository for development and testing
///
/// Holds raw invite-code, bonus and join records and performs the grouping
/// in memory. Data is lost when the application restarts.
#[derive(Default)]
pub struct InMemoryInviteRepository {
    codes: Mutex<Vec<InviteCodeRecord>>,
    bonuses: Mutex<Vec<BonusInviteRecord>>,
    joins: Mutex<Vec<JoinRecord>>,
}

impl InMemoryInviteRepository {
    /// Creates a new empty in-memory repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an in-memory repository pre-populated with raw records
    pub fn with_records(
        codes: Vec<InviteCodeRecord>,
        bonuses: Vec<BonusInviteRecord>,
        joins: Vec<JoinRecord>,
    ) -> Self {
        Self {
            codes: Mutex::new(codes),
            bonuses: Mutex::new(bonuses),
            joins: Mutex::new(joins),
        }
    }

    pub fn record_invite_code(&self, record: InviteCodeRecord) {
        self.codes.lock().unwrap().push(record);
    }

    pub fn record_bonus(&self, record: BonusInviteRecord) {
        self.bonuses.lock().unwrap().push(record);
    }

    pub fn record_join(&self, record: JoinRecord) {
        self.joins.lock().unwrap().push(record);
    }

    fn code_in_scope(record: &InviteCodeRecord, scope: &Scope) -> bool {
        record.guild_id == scope.guild_id
            && scope
                .channel_id
                .as_ref()
                .map_or(true, |channel| record.channel_id.as_ref() == Some(channel))
    }

    fn join_in_scope(record: &JoinRecord, scope: &Scope) -> bool {
        record.guild_id == scope.guild_id
            && scope
                .channel_id
                .as_ref()
                .map_or(true, |channel| record.channel_id.as_ref() == Some(channel))
    }
}

#[async_trait]
impl InviteRepository for InMemoryInviteRepository {
    #[instrument(skip(self))]
    async fn code_invite_tallies(
        &self,
        scope: &Scope,
    ) -> Result<Vec<CodeInviteTally>, LeaderboardError> {
        let codes = self.codes.lock().unwrap();

        // Sums accumulate in i64 and narrow through the same checked
        // conversions as the database path.
        let mut grouped: BTreeMap<String, (String, i64)> = BTreeMap::new();
        for record in codes.iter().filter(|r| Self::code_in_scope(r, scope)) {
            let slot = grouped
                .entry(record.inviter_id.clone())
                .or_insert_with(|| (record.inviter_name.clone(), 0));
            slot.1 += i64::from(record.uses);
        }

        debug!(
            guild_id = %scope.guild_id,
            inviters = grouped.len(),
            "Grouped invite code uses in memory"
        );

        grouped
            .into_iter()
            .map(|(inviter_id, (inviter_name, total_uses))| {
                Ok(CodeInviteTally {
                    inviter_id,
                    inviter_name,
                    total_uses: count_from(total_uses, "total_uses")?,
                })
            })
            .collect()
    }

    #[instrument(skip(self))]
    async fn bonus_invite_tallies(
        &self,
        scope: &Scope,
    ) -> Result<Vec<BonusInviteTally>, LeaderboardError> {
        let bonuses = self.bonuses.lock().unwrap();

        let mut grouped: BTreeMap<String, (Option<String>, i64)> = BTreeMap::new();
        for record in bonuses.iter().filter(|r| r.guild_id == scope.guild_id) {
            let slot = grouped
                .entry(record.member_id.clone())
                .or_insert_with(|| (None, 0));
            if slot.0.is_none() {
                slot.0 = record.member_name.clone();
            }
            slot.1 += i64::from(record.amount);
        }

        debug!(
            guild_id = %scope.guild_id,
            members = grouped.len(),
            "Grouped bonus invites in memory"
        );

        grouped
            .into_iter()
            .map(|(member_id, (member_name, total_amount))| {
                Ok(BonusInviteTally {
                    member_id,
                    member_name,
                    total_amount: amount_from(total_amount)?,
                })
            })
            .collect()
    }

    #[instrument(skip(self))]
    async fn recent_join_tallies(
        &self,
        scope: &Scope,
        window_start: DateTime<Utc>,
    ) -> Result<Vec<RecentJoinTally>, LeaderboardError> {
        let joins = self.joins.lock().unwrap();
        let codes = self.codes.lock().unwrap();

        let mut grouped: BTreeMap<String, u32> = BTreeMap::new();
        for join in joins
            .iter()
            .filter(|j| Self::join_in_scope(j, scope) && j.created_at >= window_start)
        {
            // Joins only count when they resolved to an exact code match;
            // the tally accrues to that code's inviter.
            let Some(matched) = &join.exact_match_code else {
                continue;
            };
            let Some(code) = codes
                .iter()
                .find(|c| c.guild_id == scope.guild_id && &c.code == matched)
            else {
                warn!(code = %matched, "Join references an unknown invite code");
                continue;
            };
            *grouped.entry(code.inviter_id.clone()).or_insert(0) += 1;
        }

        debug!(
            guild_id = %scope.guild_id,
            inviters = grouped.len(),
            "Grouped recent joins in memory"
        );

        Ok(grouped
            .into_iter()
            .map(|(inviter_id, total_joins)| RecentJoinTally {
                inviter_id,
                total_joins,
            })
            .collect())
    }
}

/// PostgreSQL implementation of InviteRepository
pub struct PostgresInviteRepository {
    pool: PgPool,
}

impl PostgresInviteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn storage_error(context: &str, err: impl std::fmt::Display) -> LeaderboardError {
    warn!(error = %err, "{context}");
    LeaderboardError::StorageUnavailable(err.to_string())
}

fn count_from(value: i64, field: &str) -> Result<u32, LeaderboardError> {
    u32::try_from(value).map_err(|_| {
        LeaderboardError::StorageUnavailable(format!("{field} out of range: {value}"))
    })
}

fn amount_from(value: i64) -> Result<i32, LeaderboardError> {
    i32::try_from(value).map_err(|_| {
        LeaderboardError::StorageUnavailable(format!("total_amount out of range: {value}"))
    })
}

#[async_trait]
impl InviteRepository for PostgresInviteRepository {
    #[instrument(skip(self))]
    async fn code_invite_tallies(
        &self,
        scope: &Scope,
    ) -> Result<Vec<CodeInviteTally>, LeaderboardError> {
        debug!(guild_id = %scope.guild_id, "Fetching invite code tallies from database");

        let rows = match &scope.channel_id {
            Some(channel_id) => {
                sqlx::query(
                    "SELECT ic.inviter_id, m.name AS inviter_name, SUM(ic.uses)::BIGINT AS total_uses \
                     FROM invite_codes ic \
                     JOIN members m ON m.id = ic.inviter_id AND m.guild_id = ic.guild_id \
                     WHERE ic.guild_id = $1 AND ic.channel_id = $2 \
                     GROUP BY ic.inviter_id, m.name",
                )
                .bind(&scope.guild_id)
                .bind(channel_id)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query(
                    "SELECT ic.inviter_id, m.name AS inviter_name, SUM(ic.uses)::BIGINT AS total_uses \
                     FROM invite_codes ic \
                     JOIN members m ON m.id = ic.inviter_id AND m.guild_id = ic.guild_id \
                     WHERE ic.guild_id = $1 \
                     GROUP BY ic.inviter_id, m.name",
                )
                .bind(&scope.guild_id)
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(|e| storage_error("Failed to fetch invite code tallies", e))?;

        rows.into_iter()
            .map(|row| {
                let total_uses: i64 = row
                    .try_get("total_uses")
                    .map_err(|e| storage_error("Invite code tally missing total_uses", e))?;
                Ok(CodeInviteTally {
                    inviter_id: row
                        .try_get("inviter_id")
                        .map_err(|e| storage_error("Invite code tally missing inviter_id", e))?,
                    inviter_name: row
                        .try_get("inviter_name")
                        .map_err(|e| storage_error("Invite code tally missing inviter_name", e))?,
                    total_uses: count_from(total_uses, "total_uses")?,
                })
            })
            .collect()
    }

    #[instrument(skip(self))]
    async fn bonus_invite_tallies(
        &self,
        scope: &Scope,
    ) -> Result<Vec<BonusInviteTally>, LeaderboardError> {
        debug!(guild_id = %scope.guild_id, "Fetching bonus invite tallies from database");

        // Bonus invites are guild-wide; the scope's channel is ignored.
        let rows = sqlx::query(
            "SELECT b.member_id, m.name AS member_name, SUM(b.amount)::BIGINT AS total_amount \
             FROM bonus_invites b \
             LEFT JOIN members m ON m.id = b.member_id AND m.guild_id = b.guild_id \
             WHERE b.guild_id = $1 \
             GROUP BY b.member_id, m.name",
        )
        .bind(&scope.guild_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to fetch bonus invite tallies", e))?;

        rows.into_iter()
            .map(|row| {
                let total_amount: i64 = row
                    .try_get("total_amount")
                    .map_err(|e| storage_error("Bonus tally missing total_amount", e))?;
                let total_amount = amount_from(total_amount)?;
                Ok(BonusInviteTally {
                    member_id: row
                        .try_get("member_id")
                        .map_err(|e| storage_error("Bonus tally missing member_id", e))?,
                    member_name: row
                        .try_get("member_name")
                        .map_err(|e| storage_error("Bonus tally has malformed member_name", e))?,
                    total_amount,
                })
            })
            .collect()
    }

    #[instrument(skip(self))]
    async fn recent_join_tallies(
        &self,
        scope: &Scope,
        window_start: DateTime<Utc>,
    ) -> Result<Vec<RecentJoinTally>, LeaderboardError> {
        debug!(
            guild_id = %scope.guild_id,
            %window_start,
            "Fetching recent join tallies from database"
        );

        let rows = match &scope.channel_id {
            Some(channel_id) => {
                sqlx::query(
                    "SELECT ic.inviter_id, COUNT(*)::BIGINT AS total_joins \
                     FROM joins j \
                     JOIN invite_codes ic ON ic.code = j.exact_match_code AND ic.guild_id = j.guild_id \
                     WHERE j.guild_id = $1 AND j.created_at >= $2 AND j.channel_id = $3 \
                     GROUP BY ic.inviter_id",
                )
                .bind(&scope.guild_id)
                .bind(window_start)
                .bind(channel_id)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query(
                    "SELECT ic.inviter_id, COUNT(*)::BIGINT AS total_joins \
                     FROM joins j \
                     JOIN invite_codes ic ON ic.code = j.exact_match_code AND ic.guild_id = j.guild_id \
                     WHERE j.guild_id = $1 AND j.created_at >= $2 \
                     GROUP BY ic.inviter_id",
                )
                .bind(&scope.guild_id)
                .bind(window_start)
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(|e| storage_error("Failed to fetch recent join tallies", e))?;

        rows.into_iter()
            .map(|row| {
                let total_joins: i64 = row
                    .try_get("total_joins")
                    .map_err(|e| storage_error("Join tally missing total_joins", e))?;
                Ok(RecentJoinTally {
                    inviter_id: row
                        .try_get("inviter_id")
                        .map_err(|e| storage_error("Join tally missing inviter_id", e))?,
                    total_joins: count_from(total_joins, "total_joins")?,
                })
            })
            .collect()
    }
}
