/// Database layer for SyncBoard
///
/// Connection pooling lives in `pool`, the embedded migration runner in
/// `migrations`. Row types and their queries are in the crate-level
/// `models` module.
///
/// # Example
///
/// ```no_run
/// use syncboard_shared::db::pool::{create_pool, DatabaseConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let url = std::env::var("DATABASE_URL")?;
///     let pool = create_pool(DatabaseConfig { url, ..Default::default() }).await?;
///     Ok(())
/// }
/// ```

pub mod pool;
pub mod migrations;
