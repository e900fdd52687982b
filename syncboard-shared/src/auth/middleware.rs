/// Bearer-token middleware for Axum
///
/// Extracts the Bearer token from the `Authorization` header, validates
/// it as an access token, and inserts an [`AuthContext`] into request
/// extensions for handlers to pick up.
///
/// WebSocket upgrades cannot set headers from browsers, so the socket
/// routes validate a `?token=` query parameter themselves instead of
/// using this middleware.
///
/// # Example
///
/// ```no_run
/// use axum::{middleware, routing::get, Extension, Router};
/// use syncboard_shared::auth::middleware::{create_jwt_middleware, AuthContext};
///
/// async fn protected_handler(Extension(auth): Extension<AuthContext>) -> String {
///     format!("Hello, {}!", auth.email)
/// }
///
/// let app: Router = Router::new()
///     .route("/protected", get(protected_handler))
///     .layer(middleware::from_fn(create_jwt_middleware("your-jwt-secret")));
/// ```

use axum::{
    extract::Request,
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::jwt::{validate_access_token, Claims, JwtError};

/// Identity of the authenticated caller
///
/// Present in the extensions of every request that passed the JWT
/// middleware. Handlers pick it up with Axum's `Extension` extractor.
///
/// # Example
///
/// ```
/// use axum::Extension;
/// use syncboard_shared::auth::middleware::AuthContext;
///
/// async fn handler(Extension(auth): Extension<AuthContext>) -> String {
///     format!("User: {}", auth.user_id)
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthContext {
    /// Authenticated user ID
    pub user_id: Uuid,

    /// Email from the token claims
    pub email: String,
}

impl AuthContext {
    /// Creates auth context from validated token claims
    pub fn from_claims(claims: &Claims) -> Self {
        Self {
            user_id: claims.sub,
            email: claims.email.clone(),
        }
    }
}

/// Ways a request can fail authentication
///
/// Every variant maps to 401; failing to present credentials, presenting
/// them in the wrong shape, and presenting a bad token are all the same
/// authentication failure class to the client.
#[derive(Debug)]
pub enum AuthError {
    /// Missing Authorization header
    MissingCredentials,

    /// Authorization header is not a Bearer token
    InvalidFormat(String),

    /// Token validation failed
    InvalidToken(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let message = match self {
            AuthError::MissingCredentials => "Missing credentials".to_string(),
            AuthError::InvalidFormat(msg) => msg,
            AuthError::InvalidToken(msg) => msg,
        };

        let body = Json(serde_json::json!({
            "error": "unauthorized",
            "message": message,
        }));

        (StatusCode::UNAUTHORIZED, body).into_response()
    }
}

/// Validates the access token and stamps the request with its identity
///
/// Reads `Authorization: Bearer <token>` and adds an [`AuthContext`]
/// extension on success.
///
/// # Errors
///
/// Returns 401 Unauthorized if the header is missing, is not a Bearer
/// token, or the token fails validation (bad signature, expired, wrong
/// type, wrong issuer)
pub async fn jwt_auth_middleware(
    secret: String,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingCredentials)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AuthError::InvalidFormat("Expected Bearer token".to_string()))?;

    let claims = validate_access_token(token, &secret).map_err(|e| match e {
        JwtError::Expired => AuthError::InvalidToken("Token expired".to_string()),
        JwtError::InvalidIssuer => AuthError::InvalidToken("Invalid token issuer".to_string()),
        JwtError::WrongTokenType { .. } => {
            AuthError::InvalidToken("Refresh tokens cannot be used for API access".to_string())
        }
        _ => AuthError::InvalidToken(format!("Invalid token: {}", e)),
    })?;

    req.extensions_mut().insert(AuthContext::from_claims(&claims));

    Ok(next.run(req).await)
}

/// Wraps [`jwt_auth_middleware`] in a closure owning the secret
///
/// The closure shape is what `middleware::from_fn` expects.
///
/// # Example
///
/// ```no_run
/// use axum::{middleware, routing::get, Router};
/// use syncboard_shared::auth::middleware::create_jwt_middleware;
///
/// let app: Router = Router::new()
///     .route("/protected", get(|| async { "OK" }))
///     .layer(middleware::from_fn(create_jwt_middleware("secret")));
/// ```
pub fn create_jwt_middleware(
    secret: impl Into<String>,
) -> impl Fn(
    Request,
    Next,
) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<Response, AuthError>> + Send>>
       + Clone {
    let secret = secret.into();
    move |req, next| {
        let secret = secret.clone();
        Box::pin(jwt_auth_middleware(secret, req, next))
    }
}
