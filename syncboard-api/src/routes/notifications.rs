/// Notification endpoints
///
/// Per-user notification inbox. Rows are written by the fan-out paths
/// and the deadline sweeper; these endpoints only read and acknowledge
/// them, always scoped to the authenticated caller.
///
/// # Endpoints
///
/// - `GET /api/v1/notifications/` - Recent notifications, newest first
/// - `PUT /api/v1/notifications/mark-read` - Acknowledge a batch
/// - `GET /api/v1/notifications/unread-count` - Unread badge count

use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, Extension, Json};
use serde::{Deserialize, Serialize};
use syncboard_shared::{
    auth::middleware::AuthContext,
    models::notification::{Notification, NotificationWithContext},
};
use uuid::Uuid;

/// Page size for the inbox listing
const RECENT_LIMIT: i64 = 50;

/// Mark-read request
#[derive(Debug, Deserialize)]
pub struct MarkReadRequest {
    /// Notifications to acknowledge
    pub notification_ids: Vec<Uuid>,
}

/// Mark-read response
#[derive(Debug, Serialize)]
pub struct MarkReadResponse {
    /// Rows actually updated
    pub updated: u64,
}

/// Unread count response
#[derive(Debug, Serialize)]
pub struct UnreadCountResponse {
    /// Unread rows for the caller
    pub unread_count: i64,
}

/// List the caller's recent notifications
///
/// # Endpoint
///
/// ```text
/// GET /api/v1/notifications/
/// Authorization: Bearer <token>
/// ```
///
/// Returns up to 50 rows, newest first, each joined with the related
/// project name and task title where those still resolve.
pub async fn list_notifications(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
) -> ApiResult<Json<Vec<NotificationWithContext>>> {
    let notifications = Notification::list_recent(&state.db, ctx.user_id, RECENT_LIMIT).await?;
    Ok(Json(notifications))
}

/// Mark a batch of notifications as read
///
/// # Endpoint
///
/// ```text
/// PUT /api/v1/notifications/mark-read
/// Content-Type: application/json
///
/// { "notification_ids": ["uuid", "uuid"] }
/// ```
///
/// Only rows owned by the caller are touched; foreign IDs in the batch
/// are skipped and simply not counted.
pub async fn mark_read(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Json(req): Json<MarkReadRequest>,
) -> ApiResult<Json<MarkReadResponse>> {
    let updated = Notification::mark_read(&state.db, ctx.user_id, &req.notification_ids).await?;
    Ok(Json(MarkReadResponse { updated }))
}

/// Count the caller's unread notifications
///
/// # Endpoint
///
/// ```text
/// GET /api/v1/notifications/unread-count
/// Authorization: Bearer <token>
/// ```
pub async fn unread_count(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
) -> ApiResult<Json<UnreadCountResponse>> {
    let unread_count = Notification::unread_count(&state.db, ctx.user_id).await?;
    Ok(Json(UnreadCountResponse { unread_count }))
}
