/// Session token signing and validation
///
/// Sessions are JWTs signed with HS256, carrying the user's identity in
/// their claims. Validation checks signature, expiration, not-before,
/// and the issuer. Access tokens default to 30 minutes and refresh
/// tokens to 7 days; signing secrets must be at least 32 bytes, which
/// the API enforces at configuration time.
///
/// # Token Types
///
/// - **Access Token**: Short-lived, sent as `Authorization: Bearer` on API calls
/// - **Refresh Token**: Long-lived, exchanged for new access tokens
///
/// # Example
///
/// ```
/// use syncboard_shared::auth::jwt::{create_token, validate_token, Claims, TokenType};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let user_id = Uuid::new_v4();
///
/// let claims = Claims::new(user_id, "ada@example.com".to_string(), TokenType::Access);
/// let token = create_token(&claims, "your-secret-key")?;
///
/// let validated = validate_token(&token, "your-secret-key")?;
/// assert_eq!(validated.sub, user_id);
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Failures from token creation and validation
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to encode a token
    #[error("failed to create token: {0}")]
    CreateError(String),

    /// Token failed signature or format validation
    #[error("failed to validate token: {0}")]
    ValidationError(String),

    /// Token has expired
    #[error("token has expired")]
    Expired,

    /// Token is the wrong type for the operation
    #[error("expected {expected} token, got {actual}")]
    WrongTokenType {
        expected: &'static str,
        actual: &'static str,
    },

    /// Issuer claim does not match
    #[error("invalid token issuer")]
    InvalidIssuer,
}

/// Which kind of token a claim set represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    /// Access token (short-lived, 30 minutes)
    Access,

    /// Refresh token (long-lived, 7 days)
    Refresh,
}

impl TokenType {
    /// Default lifetime for this token type
    pub fn default_expiration(&self) -> Duration {
        match self {
            TokenType::Access => Duration::minutes(30),
            TokenType::Refresh => Duration::days(7),
        }
    }

    /// Wire name of this token type, matching the `token_type` claim
    pub fn as_str(self) -> &'static str {
        match self {
            TokenType::Access => "access",
            TokenType::Refresh => "refresh",
        }
    }
}

/// JWT claims structure
///
/// Standard claims `sub`, `iss`, `iat`, `exp`, and `nbf` carry their usual
/// meanings; `email` and `token_type` are custom claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject, the user's ID
    pub sub: Uuid,

    /// Issuer, always "syncboard"
    pub iss: String,

    /// Issue time as a Unix timestamp
    pub iat: i64,

    /// Expiry as a Unix timestamp
    pub exp: i64,

    /// Earliest valid time as a Unix timestamp
    pub nbf: i64,

    /// The user's email at issue time
    pub email: String,

    /// Access or refresh
    pub token_type: TokenType,
}

impl Claims {
    /// Creates new claims with the default expiration for the token type
    ///
    /// # Example
    ///
    /// ```
    /// use syncboard_shared::auth::jwt::{Claims, TokenType};
    /// use uuid::Uuid;
    ///
    /// let claims = Claims::new(
    ///     Uuid::new_v4(),
    ///     "ada@example.com".to_string(),
    ///     TokenType::Access,
    /// );
    /// ```
    pub fn new(user_id: Uuid, email: String, token_type: TokenType) -> Self {
        Self::with_expiration(user_id, email, token_type, token_type.default_expiration())
    }

    /// Creates claims with a custom expiration
    ///
    /// Used by the API to honor the configured access token lifetime.
    ///
    /// # Example
    ///
    /// ```
    /// use syncboard_shared::auth::jwt::{Claims, TokenType};
    /// use chrono::Duration;
    /// use uuid::Uuid;
    ///
    /// let claims = Claims::with_expiration(
    ///     Uuid::new_v4(),
    ///     "ada@example.com".to_string(),
    ///     TokenType::Access,
    ///     Duration::minutes(60),
    /// );
    /// ```
    pub fn with_expiration(
        user_id: Uuid,
        email: String,
        token_type: TokenType,
        expires_in: Duration,
    ) -> Self {
        let issued_at = Utc::now().timestamp();

        Self {
            sub: user_id,
            iss: "syncboard".to_string(),
            iat: issued_at,
            exp: issued_at + expires_in.num_seconds(),
            nbf: issued_at,
            email,
            token_type,
        }
    }

    /// Checks if the token has expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }

    /// Gets time until expiration, `None` if already expired
    pub fn time_until_expiration(&self) -> Option<Duration> {
        let remaining = self.exp - Utc::now().timestamp();
        (remaining > 0).then(|| Duration::seconds(remaining))
    }

    /// Seconds between issue and expiry, for `expires_in` response fields
    pub fn lifetime_seconds(&self) -> i64 {
        self.exp - self.iat
    }
}

/// Signs a claim set into a compact JWT
///
/// Uses HS256 with the provided secret.
///
/// # Errors
///
/// Returns `JwtError::CreateError` if encoding fails
///
/// # Example
///
/// ```
/// use syncboard_shared::auth::jwt::{create_token, Claims, TokenType};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let claims = Claims::new(Uuid::new_v4(), "ada@example.com".to_string(), TokenType::Access);
/// let token = create_token(&claims, "your-secret-key-at-least-32-bytes")?;
/// assert!(!token.is_empty());
/// # Ok(())
/// # }
/// ```
pub fn create_token(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| JwtError::CreateError(e.to_string()))
}

/// Checks a token and extracts its claims
///
/// Verifies the signature, that the token has not expired and is not
/// used before its nbf time, and that the issuer is "syncboard".
///
/// # Errors
///
/// Returns `JwtError::Expired` for expired tokens,
/// `JwtError::InvalidIssuer` for a wrong issuer, and
/// `JwtError::ValidationError` for anything else
///
/// # Example
///
/// ```
/// use syncboard_shared::auth::jwt::{create_token, validate_token, Claims, TokenType};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let user_id = Uuid::new_v4();
/// let secret = "your-secret-key-at-least-32-bytes";
///
/// let claims = Claims::new(user_id, "ada@example.com".to_string(), TokenType::Access);
/// let token = create_token(&claims, secret)?;
///
/// let validated = validate_token(&token, secret)?;
/// assert_eq!(validated.sub, user_id);
/// assert_eq!(validated.email, "ada@example.com");
/// # Ok(())
/// # }
/// ```
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&["syncboard"]);
    validation.validate_exp = true;
    validation.validate_nbf = true;

    let token_data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
        jsonwebtoken::errors::ErrorKind::InvalidIssuer => JwtError::InvalidIssuer,
        _ => JwtError::ValidationError(e.to_string()),
    })?;

    Ok(token_data.claims)
}

/// Validates a token and checks it is an access token
///
/// # Errors
///
/// Returns `JwtError::WrongTokenType` when handed a refresh token
pub fn validate_access_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let claims = validate_token(token, secret)?;

    if claims.token_type != TokenType::Access {
        return Err(JwtError::WrongTokenType {
            expected: "access",
            actual: claims.token_type.as_str(),
        });
    }

    Ok(claims)
}

/// Validates a token and checks it is a refresh token
///
/// # Errors
///
/// Returns `JwtError::WrongTokenType` when handed an access token
pub fn validate_refresh_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let claims = validate_token(token, secret)?;

    if claims.token_type != TokenType::Refresh {
        return Err(JwtError::WrongTokenType {
            expected: "refresh",
            actual: claims.token_type.as_str(),
        });
    }

    Ok(claims)
}

/// Exchanges a valid refresh token for a new access token
///
/// The new token carries the same user identity; its lifetime is
/// `expires_in`, which the API takes from configuration.
///
/// # Errors
///
/// Returns an error if the refresh token is invalid, expired, or the
/// wrong type
///
/// # Example
///
/// ```
/// use syncboard_shared::auth::jwt::{create_token, refresh_access_token, Claims, TokenType};
/// use chrono::Duration;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let secret = "secret";
/// let refresh_claims = Claims::new(Uuid::new_v4(), "ada@example.com".to_string(), TokenType::Refresh);
/// let refresh_token = create_token(&refresh_claims, secret)?;
///
/// let access_token = refresh_access_token(&refresh_token, secret, Duration::minutes(30))?;
/// assert!(!access_token.is_empty());
/// # Ok(())
/// # }
/// ```
pub fn refresh_access_token(
    refresh_token: &str,
    secret: &str,
    expires_in: Duration,
) -> Result<String, JwtError> {
    let refresh_claims = validate_refresh_token(refresh_token, secret)?;

    let access_claims = Claims::with_expiration(
        refresh_claims.sub,
        refresh_claims.email,
        TokenType::Access,
        expires_in,
    );

    create_token(&access_claims, secret)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn email() -> String {
        "test@example.com".to_string()
    }

    #[test]
    fn test_token_type_expiration() {
        assert_eq!(TokenType::Access.default_expiration(), Duration::minutes(30));
        assert_eq!(TokenType::Refresh.default_expiration(), Duration::days(7));
    }

    #[test]
    fn test_claims_creation() {
        let user_id = Uuid::new_v4();
        let claims = Claims::new(user_id, email(), TokenType::Access);

        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.email, "test@example.com");
        assert_eq!(claims.iss, "syncboard");
        assert_eq!(claims.token_type, TokenType::Access);
        assert!(!claims.is_expired());
        assert_eq!(claims.lifetime_seconds(), 30 * 60);
    }

    #[test]
    fn test_claims_with_custom_expiration() {
        let claims =
            Claims::with_expiration(Uuid::new_v4(), email(), TokenType::Access, Duration::hours(1));

        let time_left = claims.time_until_expiration().unwrap();
        assert!(time_left.num_seconds() > 3500);
        assert!(time_left.num_seconds() <= 3600);
    }

    #[test]
    fn test_create_and_validate_token() {
        let user_id = Uuid::new_v4();
        let secret = "test-secret-key-at-least-32-bytes-long";

        let claims = Claims::new(user_id, email(), TokenType::Access);
        let token = create_token(&claims, secret).expect("should create token");

        let validated = validate_token(&token, secret).expect("should validate token");
        assert_eq!(validated.sub, user_id);
        assert_eq!(validated.email, "test@example.com");
        assert_eq!(validated.token_type, TokenType::Access);
        assert_eq!(validated.iss, "syncboard");
    }

    #[test]
    fn test_validate_with_wrong_secret() {
        let claims = Claims::new(Uuid::new_v4(), email(), TokenType::Access);
        let token = create_token(&claims, "secret1").expect("should create token");

        assert!(validate_token(&token, "wrong-secret").is_err());
    }

    #[test]
    fn test_validate_expired_token() {
        let secret = "test-secret";

        // Expired an hour ago
        let claims = Claims::with_expiration(
            Uuid::new_v4(),
            email(),
            TokenType::Access,
            Duration::seconds(-3600),
        );

        assert!(claims.is_expired());
        assert!(claims.time_until_expiration().is_none());

        let token = create_token(&claims, secret).expect("should create token");
        let result = validate_token(&token, secret);

        assert!(matches!(result, Err(JwtError::Expired)));
    }

    #[test]
    fn test_validate_access_token_rejects_refresh() {
        let secret = "secret";

        let access_claims = Claims::new(Uuid::new_v4(), email(), TokenType::Access);
        let access_token = create_token(&access_claims, secret).unwrap();
        assert!(validate_access_token(&access_token, secret).is_ok());

        let refresh_claims = Claims::new(Uuid::new_v4(), email(), TokenType::Refresh);
        let refresh_token = create_token(&refresh_claims, secret).unwrap();
        let result = validate_access_token(&refresh_token, secret);
        assert!(matches!(result, Err(JwtError::WrongTokenType { .. })));
    }

    #[test]
    fn test_validate_refresh_token_rejects_access() {
        let secret = "secret";

        let refresh_claims = Claims::new(Uuid::new_v4(), email(), TokenType::Refresh);
        let refresh_token = create_token(&refresh_claims, secret).unwrap();
        assert!(validate_refresh_token(&refresh_token, secret).is_ok());

        let access_claims = Claims::new(Uuid::new_v4(), email(), TokenType::Access);
        let access_token = create_token(&access_claims, secret).unwrap();
        assert!(validate_refresh_token(&access_token, secret).is_err());
    }

    #[test]
    fn test_refresh_access_token_keeps_identity() {
        let user_id = Uuid::new_v4();
        let secret = "secret";

        let refresh_claims = Claims::new(user_id, email(), TokenType::Refresh);
        let refresh_token = create_token(&refresh_claims, secret).unwrap();

        let new_access =
            refresh_access_token(&refresh_token, secret, Duration::minutes(30)).unwrap();

        let validated = validate_access_token(&new_access, secret).unwrap();
        assert_eq!(validated.sub, user_id);
        assert_eq!(validated.email, "test@example.com");
        assert_eq!(validated.token_type, TokenType::Access);
    }

    #[test]
    fn test_refresh_with_access_token_fails() {
        let secret = "secret";

        let access_claims = Claims::new(Uuid::new_v4(), email(), TokenType::Access);
        let access_token = create_token(&access_claims, secret).unwrap();

        assert!(refresh_access_token(&access_token, secret, Duration::minutes(30)).is_err());
    }
}
