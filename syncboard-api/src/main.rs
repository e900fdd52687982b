//! # SyncBoard API Server
//!
//! This is the main HTTP/WebSocket server for SyncBoard, serving the
//! project, task, comment, and notification endpoints.
//!
//! ## Architecture
//!
//! The API server is built with Axum and provides:
//! - JWT authentication (register, login, refresh, logout)
//! - Project CRUD with membership roles and progress summaries
//! - Task CRUD with assignee-gated status updates
//! - Threaded comments on projects and tasks
//! - Notification inbox plus WebSocket live updates
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p syncboard-api
//! ```

use syncboard_api::{
    app::{build_router, AppState},
    config::Config,
};
use syncboard_shared::db::{migrations, pool};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "syncboard_api=debug,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "SyncBoard API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;
    let bind_address = config.bind_address();

    let db = pool::create_pool(pool::DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        ..Default::default()
    })
    .await?;

    migrations::run_migrations(&db).await?;

    let state = AppState::new(db.clone(), config);
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutdown signal received, exiting...");
    pool::close_pool(db).await;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %error, "Failed to listen for shutdown signal");
    }
}
