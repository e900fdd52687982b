//! User account model and database operations

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// User model representing a registered account
///
/// Passwords are stored as Argon2id hashes, never in plaintext.
/// API responses must map this to a response type that omits
/// `password_hash`; the model itself round-trips the full row.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL,
///     email VARCHAR(255) NOT NULL UNIQUE,
///     password_hash TEXT NOT NULL,
///     role user_role NOT NULL DEFAULT 'user',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID (UUID v4)
    pub id: Uuid,

    /// Display name shown to other project members
    pub name: String,

    /// Email address
    ///
    /// Must be unique across all users; stored lowercase
    pub email: String,

    /// Argon2id password hash
    ///
    /// Never store plaintext passwords!
    /// Use `crate::auth::password` for hashing/verification
    pub password_hash: String,

    /// Platform-wide role (admin or regular user)
    pub role: UserRole,

    /// When the account was created
    pub created_at: DateTime<Utc>,
}

/// Platform-wide role of a user account
///
/// Distinct from [`MembershipRole`](crate::models::membership::MembershipRole),
/// which is scoped to a single project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Platform administrator
    Admin,
    /// Regular user (default)
    User,
}

impl UserRole {
    /// Returns the role as a lowercase string matching the database enum
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::User => "user",
        }
    }
}

/// Input for creating a new user
///
/// The platform role defaults to `user` at the database level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    /// Display name
    pub name: String,

    /// Email address (stored lowercase)
    pub email: String,

    /// Pre-hashed password (use `crate::auth::password::hash_password`)
    pub password_hash: String,
}

impl User {
    /// Creates a new user account
    ///
    /// # Arguments
    ///
    /// * `pool` - Database connection pool
    /// * `data` - User creation data with pre-hashed password
    ///
    /// # Returns
    ///
    /// The created user with generated ID and timestamp
    ///
    /// # Errors
    ///
    /// Returns an error if the email already exists (unique constraint)
    /// or if the database operation fails
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use syncboard_shared::models::user::{User, CreateUser};
    /// # use sqlx::PgPool;
    /// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
    /// let user = User::create(&pool, CreateUser {
    ///     name: "Ada".to_string(),
    ///     email: "ada@example.com".to_string(),
    ///     password_hash: "$argon2id$...".to_string(),
    /// }).await?;
    /// println!("Created user {}", user.id);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<User, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, password_hash)
            VALUES ($1, LOWER($2), $3)
            RETURNING id, name, email, password_hash, role, created_at
            "#,
        )
        .bind(data.name)
        .bind(data.email)
        .bind(data.password_hash)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by ID
    ///
    /// # Returns
    ///
    /// `Some(User)` if found, `None` otherwise
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, role, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Finds a user by email address
    ///
    /// The lookup is case-insensitive; emails are stored lowercase.
    ///
    /// # Returns
    ///
    /// `Some(User)` if found, `None` otherwise
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use syncboard_shared::models::user::User;
    /// # use sqlx::PgPool;
    /// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
    /// if let Some(user) = User::find_by_email(&pool, "ada@example.com").await? {
    ///     println!("Found {}", user.name);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, role, created_at
            FROM users
            WHERE email = LOWER($1)
            "#,
        )
        .bind(email)
        .fetch_optional(pool)
        .await
    }

    /// Checks whether an email address is already registered
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn email_exists(pool: &PgPool, email: &str) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = LOWER($1))")
            .bind(email)
            .fetch_one(pool)
            .await
    }
}
