/// Liveness endpoint with a database probe
///
/// `GET /health` answers without authentication so load balancers and
/// uptime probes can watch the service. A healthy response looks like:
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "database": "connected"
/// }
/// ```
///
/// Database outage turns the response into a 503 with the standard
/// error envelope.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use syncboard_shared::db::pool;

/// Health check response body
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Overall service status, "healthy" when all checks pass
    pub status: String,

    /// Running application version
    pub version: String,

    /// Database reachability, "connected" when the ping succeeds
    pub database: String,
}

/// Health check handler
///
/// Pings the database and reports 503 when it cannot be reached.
pub async fn health_check(State(state): State<AppState>) -> ApiResult<Json<HealthResponse>> {
    if let Err(e) = pool::health_check(&state.db).await {
        tracing::warn!(error = %e, "Health check failed to reach database");
        return Err(ApiError::ServiceUnavailable(
            "Database unavailable".to_string(),
        ));
    }

    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: "connected".to_string(),
    }))
}
