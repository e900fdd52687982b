/// Task endpoints
///
/// CRUD operations and the status transition.
///
/// # Endpoints
///
/// - `GET /api/v1/tasks/project/:project_id` - Tasks in a project
/// - `POST /api/v1/tasks/project/:project_id` - Create task
/// - `GET /api/v1/tasks/:id` - Task details
/// - `PUT /api/v1/tasks/:id` - Partial update (everything but status)
/// - `DELETE /api/v1/tasks/:id` - Delete task (admin)
/// - `PUT /api/v1/tasks/:id/status` - Status transition (assignee only)
///
/// Status moves through its own endpoint so the assignee-only rule
/// cannot be bypassed by a field update: only the current assignee may
/// change status, and an unassigned task accepts no transition from
/// anyone, its creator and the project owner included.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};
use serde_json::json;
use syncboard_shared::{
    auth::{access, middleware::AuthContext},
    models::task::{CreateTask, Task, TaskStatus, UpdateTask},
    notify::broadcast,
};
use uuid::Uuid;
use validator::Validate;

/// Create task request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    /// Task title
    #[validate(length(min = 1, max = 255, message = "Title must be 1 to 255 characters"))]
    pub title: String,

    /// Optional description
    pub description: Option<String>,

    /// Optional assignee
    pub assignee_id: Option<Uuid>,

    /// Optional due date
    pub due_date: Option<NaiveDate>,
}

/// Update task request
///
/// Absent fields keep their value; `assignee_id` and `due_date`
/// distinguish absent from explicit null, so sending `null` clears
/// them. Status is not accepted here.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateTaskRequest {
    /// New title
    #[validate(length(min = 1, max = 255, message = "Title must be 1 to 255 characters"))]
    pub title: Option<String>,

    /// New description
    pub description: Option<String>,

    /// New assignee, or null to unassign
    #[serde(default, deserialize_with = "double_option")]
    pub assignee_id: Option<Option<Uuid>>,

    /// New due date, or null to clear
    #[serde(default, deserialize_with = "double_option")]
    pub due_date: Option<Option<NaiveDate>>,
}

/// Status transition request
#[derive(Debug, Deserialize)]
pub struct UpdateTaskStatusRequest {
    /// Target status
    pub status: TaskStatus,
}

/// Deserializes a present-but-nullable field
///
/// Absent stays `None` via `#[serde(default)]`; a present value
/// (including null) becomes `Some(...)`.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// List tasks in a project
///
/// Newest first.
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<Vec<Task>>> {
    access::require_access(&state.db, ctx.user_id, project_id).await?;

    let tasks = Task::list_by_project(&state.db, project_id).await?;
    Ok(Json(tasks))
}

/// Create a task in a project
///
/// # Endpoint
///
/// ```text
/// POST /api/v1/tasks/project/:project_id
/// Content-Type: application/json
///
/// {
///   "title": "Ship the beta",
///   "description": "Cut the release branch",
///   "assignee_id": "uuid",
///   "due_date": "2026-09-01"
/// }
/// ```
///
/// When the task is created with an assignee, the assignment fan-out
/// (in-app row + email) fires after the insert.
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed
/// - `403 Forbidden`: Caller has no access to the project
pub async fn create_task(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(project_id): Path<Uuid>,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    req.validate()?;
    access::require_access(&state.db, ctx.user_id, project_id).await?;

    let task = Task::create(
        &state.db,
        CreateTask {
            project_id,
            title: req.title,
            description: req.description,
            assignee_id: req.assignee_id,
            due_date: req.due_date,
            created_by: ctx.user_id,
        },
    )
    .await?;

    tracing::info!(task_id = %task.id, project_id = %project_id, "Task created");

    if task.assignee_id.is_some() {
        state.fanout.task_assigned(&task, ctx.user_id).await;
    }

    Ok((StatusCode::CREATED, Json(task)))
}

/// Get a task
pub async fn get_task(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(task_id): Path<Uuid>,
) -> ApiResult<Json<Task>> {
    let task = Task::find_by_id(&state.db, task_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    access::require_access(&state.db, ctx.user_id, task.project_id).await?;

    Ok(Json(task))
}

/// Update a task's fields other than status
///
/// Reassigning to a new non-null user fires the assignment fan-out
/// for the new assignee.
pub async fn update_task(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(task_id): Path<Uuid>,
    Json(req): Json<UpdateTaskRequest>,
) -> ApiResult<Json<Task>> {
    req.validate()?;

    let task = Task::find_by_id(&state.db, task_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    access::require_access(&state.db, ctx.user_id, task.project_id).await?;

    let previous_assignee = task.assignee_id;
    let updated = Task::update(
        &state.db,
        task_id,
        UpdateTask {
            title: req.title,
            description: req.description,
            assignee_id: req.assignee_id,
            due_date: req.due_date,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    match updated.assignee_id {
        Some(assignee) if previous_assignee != Some(assignee) => {
            state.fanout.task_assigned(&updated, ctx.user_id).await;
        }
        _ => {}
    }

    Ok(Json(updated))
}

/// Delete a task
///
/// Requires the admin or owner role on the task's project.
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(task_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let task = Task::find_by_id(&state.db, task_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    access::require_admin(&state.db, ctx.user_id, task.project_id).await?;

    Task::delete(&state.db, task_id).await?;
    tracing::info!(task_id = %task_id, "Task deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// Transition a task's status
///
/// # Endpoint
///
/// ```text
/// PUT /api/v1/tasks/:id/status
/// Content-Type: application/json
///
/// { "status": "done" }
/// ```
///
/// Any target status is accepted from any current status, the same
/// value included. The row is persisted first; the status fan-out and
/// the project-room broadcast follow and cannot roll it back.
///
/// # Errors
///
/// - `403 Forbidden`: Caller is not the current assignee (always the
///   case for unassigned tasks)
/// - `404 Not Found`: Task does not exist
pub async fn update_task_status(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(task_id): Path<Uuid>,
    Json(req): Json<UpdateTaskStatusRequest>,
) -> ApiResult<Json<Task>> {
    let task = Task::find_by_id(&state.db, task_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    access::require_assignee(&task, ctx.user_id)?;

    let updated = Task::update_status(&state.db, task_id, req.status)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    tracing::info!(task_id = %task_id, status = updated.status.as_str(), "Task status updated");

    state.fanout.status_changed(&updated, ctx.user_id).await;

    let event = json!({
        "type": "task_status_changed",
        "data": &updated,
    });
    if let Ok(message) = serde_json::to_string(&event) {
        state
            .hub
            .publish(&broadcast::project_room(updated.project_id), message)
            .await;
    }

    Ok(Json(updated))
}
