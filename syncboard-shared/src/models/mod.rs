/// Database models for SyncBoard
///
/// This module contains all database models and their CRUD operations.
///
/// # Models
///
/// - `user`: User accounts
/// - `project`: Collaboration spaces with a single owner
/// - `membership`: User-project relationships with roles
/// - `task`: Units of work with assignment and board status
/// - `comment`: Threaded discussions on projects and tasks
/// - `notification`: In-app notifications
///
/// # Example
///
/// ```no_run
/// use syncboard_shared::models::user::{User, CreateUser};
/// use syncboard_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let new_user = CreateUser {
///     name: "Ada Lovelace".to_string(),
///     email: "ada@example.com".to_string(),
///     password_hash: "$argon2id$...".to_string(),
/// };
///
/// let user = User::create(&pool, new_user).await?;
/// # Ok(())
/// # }
/// ```

pub mod comment;
pub mod membership;
pub mod notification;
pub mod project;
pub mod task;
pub mod user;
