use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lessonhub::api::router;
use lessonhub::config::AppConfig;
use lessonhub::db;
use lessonhub::state::AppState;
use lessonhub::store::SqliteProgressStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "lessonhub=debug".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::new_from_env()?;

    let pool = db::connect(&config.database_url).await?;
    db::migrate(&pool).await?;

    let state = AppState {
        db: pool.clone(),
        progress: Arc::new(SqliteProgressStore::new(pool.clone())),
        auth: config.auth.clone(),
        allow_admin_setup: config.allow_admin_setup,
    };

    let app = router(state);

    info!("listening on http://{}", config.bind_address);

    let listener = tokio::net::TcpListener::bind(config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
