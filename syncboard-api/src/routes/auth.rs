/// Authentication endpoints
///
/// This module provides user authentication endpoints:
/// - Registration
/// - Login
/// - Token refresh
/// - Session introspection (me, verify-token, logout)
///
/// # Endpoints
///
/// - `POST /api/v1/auth/register` - Register new user
/// - `POST /api/v1/auth/login` - Login and get tokens
/// - `POST /api/v1/auth/refresh` - Refresh access token
/// - `POST /api/v1/auth/logout` - Stateless logout confirmation
/// - `GET /api/v1/auth/me` - Current user profile
/// - `POST /api/v1/auth/verify-token` - Validate the presented token

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use syncboard_shared::{
    auth::{jwt, middleware::AuthContext, password},
    models::user::{CreateUser, User},
};
use uuid::Uuid;
use validator::Validate;

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Display name
    #[validate(length(min = 2, max = 255, message = "Name must be 2 to 255 characters"))]
    pub name: String,

    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

/// Login request
///
/// No length rule on the password; whatever was registered is accepted
/// for comparison.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Registered email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Plaintext password to check
    pub password: String,
}

/// Refresh token request
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    /// Refresh token issued at registration or login
    pub refresh_token: String,
}

/// Public user profile
///
/// The password hash never leaves the server; responses carry this
/// projection instead of the model row.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    /// User ID
    pub id: Uuid,

    /// Display name
    pub name: String,

    /// Email address
    pub email: String,

    /// Account creation timestamp
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            created_at: user.created_at,
        }
    }
}

/// Response for register and login
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    /// Authenticated user
    pub user: UserResponse,

    /// Access token
    pub access_token: String,

    /// Refresh token (7d)
    pub refresh_token: String,

    /// Token scheme, always `bearer`
    pub token_type: String,

    /// Access token lifetime in seconds
    pub expires_in: i64,
}

/// Refresh token response
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    /// New access token
    pub access_token: String,

    /// Token scheme, always `bearer`
    pub token_type: String,

    /// Access token lifetime in seconds
    pub expires_in: i64,
}

/// Token verification response
#[derive(Debug, Serialize)]
pub struct VerifyTokenResponse {
    /// Whether the presented token is valid
    pub valid: bool,

    /// Token subject
    pub user_id: Uuid,

    /// Email carried in the token
    pub email: String,
}

/// Logout confirmation
#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    /// Confirmation message
    pub message: String,
}

/// Issues an access/refresh token pair for a user
fn issue_tokens(state: &AppState, user: User) -> ApiResult<AuthResponse> {
    let expires_in = state.config.jwt.access_token_duration();

    let access_claims = jwt::Claims::with_expiration(
        user.id,
        user.email.clone(),
        jwt::TokenType::Access,
        expires_in,
    );
    let refresh_claims = jwt::Claims::new(user.id, user.email.clone(), jwt::TokenType::Refresh);

    let access_token = jwt::create_token(&access_claims, state.jwt_secret())?;
    let refresh_token = jwt::create_token(&refresh_claims, state.jwt_secret())?;

    Ok(AuthResponse {
        user: user.into(),
        access_token,
        refresh_token,
        token_type: "bearer".to_string(),
        expires_in: expires_in.num_seconds(),
    })
}

/// Register a new user
///
/// # Endpoint
///
/// ```text
/// POST /api/v1/auth/register
/// Content-Type: application/json
///
/// {
///   "name": "Ada Lovelace",
///   "email": "ada@example.com",
///   "password": "hunter2!"
/// }
/// ```
///
/// # Response
///
/// `201 Created` with the user and both tokens:
///
/// ```json
/// {
///   "user": { "id": "uuid", "name": "Ada Lovelace", "email": "ada@example.com", "created_at": "..." },
///   "access_token": "eyJ...",
///   "refresh_token": "eyJ...",
///   "token_type": "bearer",
///   "expires_in": 1800
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed
/// - `409 Conflict`: Email already registered
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    req.validate()?;

    if User::email_exists(&state.db, &req.email).await? {
        return Err(ApiError::Conflict("Email already registered".to_string()));
    }

    let password_hash = password::hash_password(&req.password)?;

    // The unique index on email backstops a concurrent registration,
    // surfacing as 409 through the constraint mapping.
    let user = User::create(
        &state.db,
        CreateUser {
            name: req.name,
            email: req.email,
            password_hash,
        },
    )
    .await?;

    let response = issue_tokens(&state, user)?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Login with email and password
///
/// # Endpoint
///
/// ```text
/// POST /api/v1/auth/login
/// Content-Type: application/json
///
/// {
///   "email": "ada@example.com",
///   "password": "hunter2!"
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed
/// - `401 Unauthorized`: Invalid credentials
///
/// The same 401 covers unknown email and wrong password, the response
/// never reveals which one failed.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    req.validate()?;

    let user = User::find_by_email(&state.db, &req.email)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid email or password".to_string()))?;

    let valid = password::verify_password(&req.password, &user.password_hash)?;
    if !valid {
        return Err(ApiError::Unauthorized(
            "Invalid email or password".to_string(),
        ));
    }

    let response = issue_tokens(&state, user)?;
    Ok(Json(response))
}

/// Exchange a refresh token for a new access token
///
/// # Endpoint
///
/// ```text
/// POST /api/v1/auth/refresh
/// Content-Type: application/json
///
/// {
///   "refresh_token": "eyJ..."
/// }
/// ```
///
/// # Errors
///
/// - `401 Unauthorized`: Invalid, expired, or non-refresh token
pub async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> ApiResult<Json<RefreshResponse>> {
    let expires_in = state.config.jwt.access_token_duration();
    let access_token =
        jwt::refresh_access_token(&req.refresh_token, state.jwt_secret(), expires_in)?;

    Ok(Json(RefreshResponse {
        access_token,
        token_type: "bearer".to_string(),
        expires_in: expires_in.num_seconds(),
    }))
}

/// Stateless logout confirmation
///
/// Tokens are not stored server-side, so there is nothing to revoke;
/// clients discard their copies. The endpoint exists so clients get a
/// definitive confirmation and invalid tokens still fail with 401.
pub async fn logout(Extension(_ctx): Extension<AuthContext>) -> Json<LogoutResponse> {
    Json(LogoutResponse {
        message: "Successfully logged out".to_string(),
    })
}

/// Current user profile
///
/// # Errors
///
/// - `404 Not Found`: Account was deleted after the token was issued
pub async fn me(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
) -> ApiResult<Json<UserResponse>> {
    let user = User::find_by_id(&state.db, ctx.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(user.into()))
}

/// Validate the presented access token
///
/// Reaching this handler means the auth middleware already accepted
/// the token, so the response always reports validity with the
/// token's subject.
pub async fn verify_token(Extension(ctx): Extension<AuthContext>) -> Json<VerifyTokenResponse> {
    Json(VerifyTokenResponse {
        valid: true,
        user_id: ctx.user_id,
        email: ctx.email,
    })
}
