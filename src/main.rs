use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gatehouse::routes::router;
use gatehouse::session::{password::PasswordHasher, token::TokenConfig};
use gatehouse::shared::AppState;
use gatehouse::store::repository::{
    CredentialStore, InMemoryCredentialStore, PostgresCredentialStore,
};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gatehouse=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting gatehouse credential service");

    // The store is injected: Postgres when DATABASE_URL is set, in-memory
    // otherwise (development and tests)
    let store: Arc<dyn CredentialStore + Send + Sync> = match std::env::var("DATABASE_URL") {
        Ok(database_url) => {
            let pool = sqlx::PgPool::connect(&database_url)
                .await
                .expect("Failed to connect to database");
            info!("Connected to Postgres credential store");
            Arc::new(PostgresCredentialStore::new(pool))
        }
        Err(_) => {
            info!("DATABASE_URL not set, using in-memory credential store");
            Arc::new(InMemoryCredentialStore::new())
        }
    };

    let app_state = AppState::new(store, TokenConfig::new(), PasswordHasher::new());
    let app = router(app_state);

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8001);
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
        .await
        .expect("Failed to bind server port");
    info!("Server running on http://localhost:{port}");
    axum::serve(listener, app).await.expect("Server error");
}
