/// Database migration runner
///
/// Migrations live in the `migrations/` directory at the workspace root and
/// are embedded into the binary at compile time, so a deployed server can
/// bring its own schema up to date at startup.
///
/// # Example
///
/// ```no_run
/// use syncboard_shared::db::migrations::run_migrations;
/// use syncboard_shared::db::pool::{create_pool, DatabaseConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let url = std::env::var("DATABASE_URL")?;
///     let pool = create_pool(DatabaseConfig { url, ..Default::default() }).await?;
///     run_migrations(&pool).await?;
///     Ok(())
/// }
/// ```

use sqlx::postgres::PgPool;
use tracing::{info, warn};

/// Runs all pending database migrations
///
/// Migrations that have already been applied (tracked in `_sqlx_migrations`)
/// are skipped; the rest run in order.
///
/// # Errors
///
/// Returns an error if a migration fails to execute or the database
/// connection is lost during migration.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    info!("Starting database migrations");

    // Path is relative to this crate's manifest; the SQL lives at the
    // workspace root.
    if let Err(e) = sqlx::migrate!("../migrations").run(pool).await {
        warn!(error = %e, "Database migration failed");
        return Err(e);
    }

    info!("Database schema is up to date");
    Ok(())
}
