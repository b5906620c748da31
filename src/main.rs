use std::sync::Arc;

use inviteboard::leaderboard::InMemoryInviteRepository;
// use inviteboard::leaderboard::PostgresInviteRepository; // For production
use inviteboard::shared::AppState;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "inviteboard=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting invite leaderboard service");

    // Create shared application state with dependency injection
    // Easy to switch between implementations:
    let invite_repository = Arc::new(InMemoryInviteRepository::new());

    // For production with PostgreSQL:
    // let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    // let pool = sqlx::PgPool::connect(&database_url).await.expect("Failed to connect to database");
    // let invite_repository = Arc::new(PostgresInviteRepository::new(pool));

    let app_state = AppState::new(invite_repository);

    let app = inviteboard::router(app_state).layer(TraceLayer::new_for_http());

    // run our app with hyper, listening globally on port 3000
    let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await.unwrap();
    info!("Server running on http://localhost:3000");
    axum::serve(listener, app).await.unwrap();
}
