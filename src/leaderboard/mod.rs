pub mod handlers;
pub mod merge;
pub mod models;
pub mod ranking;
pub mod repository;
pub mod service;
pub mod trend;

mod errors;

pub use errors::LeaderboardError;
pub use models::{
    BonusInviteTally, CodeInviteTally, Leaderboard, LeaderboardEntry, RankedEntry,
    RecentJoinTally, Scope,
};
pub use repository::{InMemoryInviteRepository, InviteRepository, PostgresInviteRepository};
pub use service::{
    default_trend_window, trend_window_from_hours, LeaderboardService, DEFAULT_LIMIT,
    MAX_WINDOW_HOURS,
};
