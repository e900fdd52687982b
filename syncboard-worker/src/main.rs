//! # SyncBoard Worker
//!
//! Background worker for SyncBoard. It runs the deadline sweeper, which
//! periodically reminds assignees about open tasks coming due within the
//! next few days, in the inbox and by email.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p syncboard-worker
//! ```

use std::sync::Arc;
use syncboard_shared::db::{migrations, pool};
use syncboard_shared::notify::broadcast::BroadcastHub;
use syncboard_shared::notify::fanout::NotificationFanout;
use syncboard_shared::notify::mailer::{LogMailer, Mailer};
use syncboard_worker::sweeper::{DeadlineSweeper, SweeperConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "syncboard_worker=debug".into());
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("SyncBoard Worker v{} starting...", env!("CARGO_PKG_VERSION"));

    let database_url = std::env::var("DATABASE_URL")
        .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?;

    let db = pool::create_pool(pool::DatabaseConfig {
        url: database_url,
        ..Default::default()
    })
    .await?;
    migrations::run_migrations(&db).await?;

    let from = std::env::var("SMTP_FROM").unwrap_or_else(|_| "noreply@syncboard.dev".to_string());
    let mailer: Arc<dyn Mailer> = Arc::new(LogMailer::new(from));

    // This hub only reaches sockets held by this process; reminder rows
    // still land in the inbox and surface on the next API fetch.
    let hub = Arc::new(BroadcastHub::new());
    let fanout = NotificationFanout::new(db.clone(), mailer.clone(), hub);

    let sweeper = DeadlineSweeper::with_config(
        db.clone(),
        fanout,
        mailer,
        SweeperConfig::from_env()?,
    );

    let shutdown = sweeper.shutdown_token();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for shutdown signal");
            return;
        }
        tracing::info!("Shutdown signal received");
        shutdown.cancel();
    });

    sweeper.run().await?;

    pool::close_pool(db).await;
    tracing::info!("Worker stopped");

    Ok(())
}
