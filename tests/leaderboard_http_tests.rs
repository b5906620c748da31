use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use inviteboard::leaderboard::repository::{
    BonusInviteRecord, InMemoryInviteRepository, InviteCodeRecord, JoinRecord,
};
use inviteboard::shared::test_utils::FailingInviteRepository;
use inviteboard::shared::AppState;
use inviteboard::InviteRepository;
use tower::ServiceExt; // for `oneshot`

fn app(repository: Arc<dyn InviteRepository>) -> Router {
    inviteboard::router(AppState::new(repository))
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should be readable");
    serde_json::from_slice(&bytes).expect("body should be JSON")
}

#[tokio::test]
async fn leaderboard_endpoint_returns_ranked_entries() {
    let repo = InMemoryInviteRepository::new();
    repo.record_bonus(BonusInviteRecord {
        guild_id: "guild-1".to_string(),
        member_id: "alice".to_string(),
        member_name: Some("Alice".to_string()),
        amount: 12,
    });
    repo.record_bonus(BonusInviteRecord {
        guild_id: "guild-1".to_string(),
        member_id: "bob".to_string(),
        member_name: Some("Bob".to_string()),
        amount: 3,
    });

    let response = app(Arc::new(repo))
        .oneshot(
            Request::builder()
                .uri("/guilds/guild-1/leaderboard")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["scope"]["guild_id"], "guild-1");
    assert_eq!(json["entries"][0]["member_id"], "alice");
    assert_eq!(json["entries"][0]["position"], 1);
    assert_eq!(json["entries"][0]["total_credit"], 12);
    assert_eq!(json["entries"][1]["member_id"], "bob");
}

#[tokio::test]
async fn respects_limit_and_channel_query_parameters() {
    let repo = InMemoryInviteRepository::new();
    for i in 0..5 {
        repo.record_bonus(BonusInviteRecord {
            guild_id: "guild-1".to_string(),
            member_id: format!("member-{i}"),
            member_name: Some(format!("Member {i}")),
            amount: (i + 1) as i32,
        });
    }

    let response = app(Arc::new(repo))
        .oneshot(
            Request::builder()
                .uri("/guilds/guild-1/leaderboard?channel_id=general&limit=2")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["scope"]["channel_id"], "general");
    assert_eq!(json["entries"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn empty_guild_renders_the_distinct_empty_state() {
    let response = app(Arc::new(InMemoryInviteRepository::new()))
        .oneshot(
            Request::builder()
                .uri("/guilds/guild-1/leaderboard")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["entries"].as_array().unwrap().len(), 0);
    assert_eq!(json["trend"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn blank_guild_id_is_a_bad_request() {
    let response = app(Arc::new(InMemoryInviteRepository::new()))
        .oneshot(
            Request::builder()
                .uri("/guilds/%20/leaderboard")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("guild id"));
}

#[tokio::test]
async fn window_hours_widens_the_trend_window() {
    let repo = InMemoryInviteRepository::new();
    repo.record_invite_code(InviteCodeRecord {
        code: "aaa".to_string(),
        guild_id: "guild-1".to_string(),
        channel_id: None,
        inviter_id: "alice".to_string(),
        inviter_name: "Alice".to_string(),
        uses: 10,
    });
    // A join older than the default window but inside a 48h one.
    repo.record_join(JoinRecord {
        guild_id: "guild-1".to_string(),
        channel_id: None,
        exact_match_code: Some("aaa".to_string()),
        created_at: Utc::now() - Duration::hours(30),
    });
    let repo = Arc::new(repo);

    let response = app(repo.clone())
        .oneshot(
            Request::builder()
                .uri("/guilds/guild-1/leaderboard")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let json = body_json(response).await;
    assert_eq!(json["entries"][0]["recent_joins"], 0);
    assert_eq!(json["entries"][0]["trend_credit"], 10);

    let response = app(repo)
        .oneshot(
            Request::builder()
                .uri("/guilds/guild-1/leaderboard?window_hours=48")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let json = body_json(response).await;
    assert_eq!(json["entries"][0]["recent_joins"], 1);
    assert_eq!(json["entries"][0]["trend_credit"], 9);
}

#[tokio::test]
async fn out_of_range_window_hours_is_a_bad_request() {
    for window in ["9223372036854775807", "0", "-24"] {
        let response = app(Arc::new(InMemoryInviteRepository::new()))
            .oneshot(
                Request::builder()
                    .uri(format!("/guilds/guild-1/leaderboard?window_hours={window}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            response.status(),
            StatusCode::BAD_REQUEST,
            "window_hours={window} should be rejected"
        );

        let json = body_json(response).await;
        assert!(json["error"].as_str().unwrap().contains("window_hours"));
    }
}

#[tokio::test]
async fn storage_failure_surfaces_as_service_unavailable() {
    let response = app(Arc::new(FailingInviteRepository))
        .oneshot(
            Request::builder()
                .uri("/guilds/guild-1/leaderboard")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}
