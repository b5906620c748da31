use thiserror::Error;

#[derive(Debug, Error)]
pub enum LeaderboardError {
    /// Missing or malformed scope input. Caller fault, not retryable.
    #[error("Invalid scope: {0}")]
    InvalidScope(String),

    /// The underlying data source failed or timed out. Transient; the whole
    /// computation is idempotent and safe to retry.
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// A tally references a member the storage layer could not resolve to a
    /// name. Surfaced instead of degrading the ranking.
    #[error("Member {member_id} has bonus invites but no resolvable name")]
    OrphanMember { member_id: String },
}
