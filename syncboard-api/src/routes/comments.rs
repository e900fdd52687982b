/// Comment endpoints
///
/// Threaded comments attached to either a project or a task.
///
/// # Endpoints
///
/// - `GET /api/v1/comments/?project_id=` or `?task_id=` - Reply tree
/// - `POST /api/v1/comments/` - Post a comment or reply
///
/// Every comment belongs to exactly one of a project or a task; both
/// reads and writes reject requests that name neither or both. Rows
/// are stored flat and assembled into a reply tree per response.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use sqlx::PgPool;
use syncboard_shared::{
    auth::{access, middleware::AuthContext},
    models::comment::{build_tree, Comment, CommentNode, CreateComment},
    models::task::Task,
};
use uuid::Uuid;
use validator::Validate;

/// Query for listing comments
#[derive(Debug, Deserialize)]
pub struct ListCommentsQuery {
    /// Project the comments hang on
    pub project_id: Option<Uuid>,

    /// Task the comments hang on
    pub task_id: Option<Uuid>,
}

/// Create comment request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCommentRequest {
    /// Attach to this project
    pub project_id: Option<Uuid>,

    /// Attach to this task
    pub task_id: Option<Uuid>,

    /// Reply to this comment
    pub parent_comment_id: Option<Uuid>,

    /// Comment text
    #[validate(length(min = 1, message = "Content must not be empty"))]
    pub content: String,
}

/// Resolves the project a comment target belongs to
///
/// Rejects targets naming neither or both of project and task, and
/// resolves a task target to its parent project for access checks.
async fn resolve_project(
    db: &PgPool,
    project_id: Option<Uuid>,
    task_id: Option<Uuid>,
) -> ApiResult<Uuid> {
    match (project_id, task_id) {
        (Some(project_id), None) => Ok(project_id),
        (None, Some(task_id)) => {
            let task = Task::find_by_id(db, task_id)
                .await?
                .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;
            Ok(task.project_id)
        }
        _ => Err(ApiError::BadRequest(
            "Exactly one of project_id or task_id is required".to_string(),
        )),
    }
}

/// List comments as a reply tree
///
/// # Endpoint
///
/// ```text
/// GET /api/v1/comments/?task_id=<uuid>
/// ```
///
/// Top-level comments come oldest first with their replies nested;
/// replies whose parent was deleted surface as top-level.
///
/// # Errors
///
/// - `400 Bad Request`: Neither or both of project_id/task_id
/// - `403 Forbidden`: Caller has no access to the project
pub async fn list_comments(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Query(query): Query<ListCommentsQuery>,
) -> ApiResult<Json<Vec<CommentNode>>> {
    let project_id = resolve_project(&state.db, query.project_id, query.task_id).await?;
    access::require_access(&state.db, ctx.user_id, project_id).await?;

    let rows = match query.task_id {
        Some(task_id) => Comment::list_by_task(&state.db, task_id).await?,
        None => Comment::list_by_project(&state.db, project_id).await?,
    };

    Ok(Json(build_tree(rows)))
}

/// Post a comment or a reply
///
/// # Endpoint
///
/// ```text
/// POST /api/v1/comments/
/// Content-Type: application/json
///
/// {
///   "task_id": "uuid",
///   "parent_comment_id": null,
///   "content": "Looks good to me"
/// }
/// ```
///
/// Fires the comment fan-out to the other project members after the
/// row is committed.
///
/// # Errors
///
/// - `400 Bad Request`: Empty content, or neither/both attachment ids
/// - `403 Forbidden`: Caller has no access to the project
pub async fn create_comment(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Json(req): Json<CreateCommentRequest>,
) -> ApiResult<(StatusCode, Json<Comment>)> {
    req.validate()?;

    let project_id = resolve_project(&state.db, req.project_id, req.task_id).await?;
    access::require_access(&state.db, ctx.user_id, project_id).await?;

    let comment = Comment::create(
        &state.db,
        CreateComment {
            project_id: req.project_id,
            task_id: req.task_id,
            parent_comment_id: req.parent_comment_id,
            author_id: ctx.user_id,
            content: req.content,
        },
    )
    .await?;

    tracing::info!(comment_id = %comment.id, project_id = %project_id, "Comment posted");

    state.fanout.comment_posted(&comment, project_id).await;

    Ok((StatusCode::CREATED, Json(comment)))
}
