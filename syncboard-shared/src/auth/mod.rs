/// Security primitives for SyncBoard
///
/// # Modules
///
/// - [`password`]: Argon2id hashing and verification
/// - [`jwt`]: token issuance and validation (HS256)
/// - [`middleware`]: Axum layer extracting the authenticated user
/// - [`access`]: project-level access and admin checks
///
/// # Example
///
/// ```no_run
/// use syncboard_shared::auth::jwt::{create_token, Claims, TokenType};
/// use syncboard_shared::auth::password::{hash_password, verify_password};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password")?;
/// assert!(verify_password("user_password", &hash)?);
///
/// let claims = Claims::new(Uuid::new_v4(), "ada@example.com".to_string(), TokenType::Access);
/// let token = create_token(&claims, "secret-key")?;
/// # Ok(())
/// # }
/// ```

pub mod access;
pub mod jwt;
pub mod middleware;
pub mod password;
