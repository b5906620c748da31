use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

use crate::leaderboard::repository::InviteRepository;
use crate::leaderboard::LeaderboardError;

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub invite_repository: Arc<dyn InviteRepository>,
}

impl AppState {
    pub fn new(invite_repository: Arc<dyn InviteRepository>) -> Self {
        Self { invite_repository }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Data integrity error: {0}")]
    DataIntegrity(String),
}

impl From<LeaderboardError> for AppError {
    fn from(err: LeaderboardError) -> Self {
        match err {
            LeaderboardError::InvalidScope(msg) => AppError::BadRequest(msg),
            LeaderboardError::StorageUnavailable(msg) => AppError::StorageUnavailable(msg),
            orphan @ LeaderboardError::OrphanMember { .. } => {
                AppError::DataIntegrity(orphan.to_string())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::StorageUnavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                format!("Storage unavailable: {}", msg),
            ),
            AppError::DataIntegrity(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(json!({
            "error": error_message
        }));

        (status, body).into_response()
    }
}

pub mod test_utils {
    use super::*;
    use crate::leaderboard::{BonusInviteTally, CodeInviteTally, RecentJoinTally, Scope};
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};

    /// Repository double whose every read fails, for exercising the
    /// no-partial-leaderboard rule in tests.
    pub struct FailingInviteRepository;

    #[async_trait]
    impl InviteRepository for FailingInviteRepository {
        async fn code_invite_tallies(
            &self,
            _scope: &Scope,
        ) -> Result<Vec<CodeInviteTally>, LeaderboardError> {
            Err(LeaderboardError::StorageUnavailable(
                "connection refused".to_string(),
            ))
        }

        async fn bonus_invite_tallies(
            &self,
            _scope: &Scope,
        ) -> Result<Vec<BonusInviteTally>, LeaderboardError> {
            Err(LeaderboardError::StorageUnavailable(
                "connection refused".to_string(),
            ))
        }

        async fn recent_join_tallies(
            &self,
            _scope: &Scope,
            _window_start: DateTime<Utc>,
        ) -> Result<Vec<RecentJoinTally>, LeaderboardError> {
            Err(LeaderboardError::StorageUnavailable(
                "connection refused".to_string(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_failures_map_to_service_unavailable() {
        let err: AppError = LeaderboardError::StorageUnavailable("timeout".to_string()).into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn invalid_scope_maps_to_bad_request() {
        let err: AppError = LeaderboardError::InvalidScope("guild id is required".into()).into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn orphan_member_maps_to_internal_error() {
        let err: AppError = LeaderboardError::OrphanMember {
            member_id: "carol".to_string(),
        }
        .into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
