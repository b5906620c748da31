use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};

use super::models::{Leaderboard, Scope};
use super::service::{
    default_trend_window, trend_window_from_hours, LeaderboardService, DEFAULT_LIMIT,
};
use crate::shared::{AppError, AppState};

#[derive(Debug, Deserialize)]
pub struct LeaderboardQuery {
    pub channel_id: Option<String>,
    pub limit: Option<usize>,
    pub window_hours: Option<i64>,
}

/// HTTP handler for computing a guild's invite leaderboard
///
/// GET /guilds/{guild_id}/leaderboard?channel_id=&limit=&window_hours=
/// Returns both orderings; an empty `entries` array means "no invites yet".
#[instrument(name = "get_leaderboard", skip(state))]
pub async fn get_leaderboard(
    State(state): State<AppState>,
    Path(guild_id): Path<String>,
    Query(query): Query<LeaderboardQuery>,
) -> Result<Json<Leaderboard>, AppError> {
    info!(
        guild_id = %guild_id,
        channel_id = ?query.channel_id,
        "Computing invite leaderboard"
    );

    let scope = Scope::new(guild_id, query.channel_id)?;
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT);
    let trend_window = match query.window_hours {
        Some(hours) => trend_window_from_hours(hours)?,
        None => default_trend_window(),
    };

    // Use injected repository from app state
    let service = LeaderboardService::new(Arc::clone(&state.invite_repository));
    let leaderboard = service.compute(scope, limit, trend_window).await?;

    info!(
        entry_count = leaderboard.entries.len(),
        "Leaderboard computed successfully"
    );

    Ok(Json(leaderboard))
}
