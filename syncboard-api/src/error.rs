/// Error handling for the API server
///
/// One error enum covers every failure a handler can produce; axum turns
/// it into a JSON body of the form `{"error", "message", "details"}` via
/// `IntoResponse`. Handlers return `ApiResult<T>` and use `?` on any of
/// the shared-crate error types.
///
/// Authentication and authorization failures stay distinct: a valid
/// token on a project you cannot touch is 403, never 401.
///
/// # Example
///
/// ```
/// use syncboard_api::error::{ApiError, ApiResult};
/// use axum::Json;
///
/// async fn handler() -> ApiResult<Json<serde_json::Value>> {
///     Err(ApiError::NotFound("Project not found".to_string()))
/// }
/// ```

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::fmt;

use syncboard_shared::auth::access::AuthzError;
use syncboard_shared::auth::jwt::JwtError;
use syncboard_shared::auth::middleware::AuthError;
use syncboard_shared::auth::password::PasswordError;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
///
/// Variants map one-to-one onto HTTP status codes; see [`ApiError::status`].
#[derive(Debug)]
pub enum ApiError {
    /// Malformed or contradictory request (400)
    BadRequest(String),

    /// Missing or bad credentials (401)
    Unauthorized(String),

    /// Authenticated but not allowed (403)
    Forbidden(String),

    /// Resource absent or hidden from this user (404)
    NotFound(String),

    /// Duplicate email or membership (409)
    Conflict(String),

    /// Per-field request validation failures (400)
    ValidationError(Vec<ValidationErrorDetail>),

    /// Unexpected server-side failure (500)
    InternalError(String),

    /// A dependency such as the database is down (503)
    ServiceUnavailable(String),
}

/// A single failed field from request validation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    /// Name of the offending field
    pub field: String,

    /// What was wrong with it
    pub message: String,
}

/// Wire format for error bodies
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Stable machine-readable code, e.g. "not_found"
    pub error: String,

    /// Human-readable description
    pub message: String,

    /// Field-level details, present only for validation failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationErrorDetail>>,
}

impl ApiError {
    /// HTTP status code for this error
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::ValidationError(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Machine-readable code carried in the response body
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "bad_request",
            ApiError::Unauthorized(_) => "unauthorized",
            ApiError::Forbidden(_) => "forbidden",
            ApiError::NotFound(_) => "not_found",
            ApiError::Conflict(_) => "conflict",
            ApiError::ValidationError(_) => "validation_error",
            ApiError::InternalError(_) => "internal_error",
            ApiError::ServiceUnavailable(_) => "service_unavailable",
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::ValidationError(errors) => {
                write!(f, "validation failed on {} field(s)", errors.len())
            }
            ApiError::BadRequest(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::Conflict(msg)
            | ApiError::InternalError(msg)
            | ApiError::ServiceUnavailable(msg) => write!(f, "{}: {}", self.code(), msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();

        let (message, details) = match self {
            ApiError::ValidationError(errors) => {
                ("Request validation failed".to_string(), Some(errors))
            }
            // Internal details go to the log, never to the client
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                ("An internal error occurred".to_string(), None)
            }
            ApiError::BadRequest(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::Conflict(msg)
            | ApiError::ServiceUnavailable(msg) => (msg, None),
        };

        let body = Json(ErrorResponse {
            error: code.to_string(),
            message,
            details,
        });

        (status, body).into_response()
    }
}

/// Maps database constraint names onto user-facing errors
fn constraint_error(constraint: &str) -> ApiError {
    if constraint.contains("email") {
        return ApiError::Conflict("Email already registered".to_string());
    }
    match constraint {
        "memberships_pkey" => {
            ApiError::Conflict("User is already a member of this project".to_string())
        }
        "comments_attachment_check" => ApiError::BadRequest(
            "Comment must reference exactly one of project or task".to_string(),
        ),
        other => ApiError::Conflict(format!("Constraint violation: {}", other)),
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".to_string()),
            sqlx::Error::Database(db_err) => match db_err.constraint() {
                Some(constraint) => constraint_error(constraint),
                None => ApiError::InternalError(format!("Database error: {}", db_err)),
            },
            _ => ApiError::InternalError(format!("Database error: {}", err)),
        }
    }
}

/// Every authentication failure is 401, including a malformed
/// Authorization header.
impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        let message = match err {
            AuthError::MissingCredentials => "Missing credentials".to_string(),
            AuthError::InvalidFormat(msg) | AuthError::InvalidToken(msg) => msg,
        };
        ApiError::Unauthorized(message)
    }
}

impl From<AuthzError> for ApiError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::NotMember(_) => {
                ApiError::Forbidden("You don't have access to this project".to_string())
            }
            AuthzError::NotAdmin(_) => {
                ApiError::Forbidden("Admin access required for this project".to_string())
            }
            AuthzError::NotAssignee => ApiError::Forbidden(
                "Only the assigned user can update the task status".to_string(),
            ),
            AuthzError::Database(err) => {
                ApiError::InternalError(format!("Database error: {}", err))
            }
        }
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::InternalError(format!("Password operation failed: {}", err))
    }
}

impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => ApiError::Unauthorized("Token expired".to_string()),
            JwtError::InvalidIssuer => ApiError::Unauthorized("Invalid token issuer".to_string()),
            _ => ApiError::Unauthorized(format!("Invalid token: {}", err)),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let details = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(|err| ValidationErrorDetail {
                    field: field.to_string(),
                    message: err
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| err.code.to_string()),
                })
            })
            .collect();

        ApiError::ValidationError(details)
    }
}
