// Library crate for the invite leaderboard service
// This file exposes the public API for integration tests

pub mod leaderboard;
pub mod shared;

use axum::{routing::get, Router};
use shared::AppState;

// Re-export commonly used types for easier access in tests
pub use leaderboard::{
    BonusInviteTally, CodeInviteTally, InMemoryInviteRepository, InviteRepository, Leaderboard,
    LeaderboardEntry, LeaderboardError, LeaderboardService, RankedEntry, RecentJoinTally, Scope,
};
pub use shared::AppError;

/// Builds the application router. Shared by `main` and the router tests.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/guilds/:guild_id/leaderboard",
            get(leaderboard::handlers::get_leaderboard),
        )
        .with_state(state)
}
