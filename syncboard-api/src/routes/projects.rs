/// Project endpoints
///
/// CRUD operations, member management, and progress statistics.
///
/// # Endpoints
///
/// - `GET /api/v1/projects/` - Projects the caller owns or belongs to
/// - `POST /api/v1/projects/` - Create project (caller becomes owner)
/// - `GET /api/v1/projects/:id` - Project details with members
/// - `PUT /api/v1/projects/:id` - Update name/description (admin)
/// - `DELETE /api/v1/projects/:id` - Delete project (owner only)
/// - `GET /api/v1/projects/:id/members` - Member list
/// - `POST /api/v1/projects/:id/members` - Add member by email (admin)
/// - `GET /api/v1/projects/:id/progress` - Task completion statistics
///
/// Access rules: every route requires membership or ownership of the
/// project (403 otherwise, including for project ids that do not
/// exist); mutating routes additionally require the admin or owner
/// role where noted.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use syncboard_shared::{
    auth::{access, middleware::AuthContext},
    models::{
        membership::{CreateMembership, Membership, MembershipRole, ProjectMember},
        project::{CreateProject, Project, UpdateProject},
        task::{Task, TaskProgress},
        user::User,
    },
};
use uuid::Uuid;
use validator::Validate;

/// Create project request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateProjectRequest {
    /// Project name
    #[validate(length(min = 1, max = 255, message = "Name must be 1 to 255 characters"))]
    pub name: String,

    /// Optional description
    pub description: Option<String>,
}

/// Update project request
///
/// Absent fields keep their current value.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProjectRequest {
    /// New name
    #[validate(length(min = 1, max = 255, message = "Name must be 1 to 255 characters"))]
    pub name: Option<String>,

    /// New description
    pub description: Option<String>,
}

/// Add member request
#[derive(Debug, Deserialize, Validate)]
pub struct AddMemberRequest {
    /// Email of the user to add
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Role for the new member (default: member)
    pub role: Option<MembershipRole>,
}

/// Project with its member list embedded
#[derive(Debug, Serialize)]
pub struct ProjectWithMembers {
    /// Project row
    #[serde(flatten)]
    pub project: Project,

    /// Current members, owner included
    pub members: Vec<ProjectMember>,
}

/// Loads a project's members and embeds them in the response shape
async fn with_members(state: &AppState, project: Project) -> ApiResult<ProjectWithMembers> {
    let members = Membership::list_members(&state.db, project.id).await?;
    Ok(ProjectWithMembers { project, members })
}

/// List the caller's projects
///
/// Returns every project the caller owns or belongs to, newest first,
/// each with its member list embedded.
pub async fn list_projects(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
) -> ApiResult<Json<Vec<ProjectWithMembers>>> {
    let projects = Project::list_for_user(&state.db, ctx.user_id).await?;

    let mut response = Vec::with_capacity(projects.len());
    for project in projects {
        response.push(with_members(&state, project).await?);
    }

    Ok(Json(response))
}

/// Create a project
///
/// The caller becomes the owner; the owner membership row is inserted
/// in the same transaction as the project itself.
///
/// # Endpoint
///
/// ```text
/// POST /api/v1/projects/
/// Content-Type: application/json
///
/// {
///   "name": "Apollo",
///   "description": "Q3 launch work"
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed
pub async fn create_project(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Json(req): Json<CreateProjectRequest>,
) -> ApiResult<(StatusCode, Json<ProjectWithMembers>)> {
    req.validate()?;

    let project = Project::create(
        &state.db,
        CreateProject {
            name: req.name,
            description: req.description,
            owner_id: ctx.user_id,
        },
    )
    .await?;

    tracing::info!(project_id = %project.id, owner_id = %ctx.user_id, "Project created");

    let response = with_members(&state, project).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Get project details with members
pub async fn get_project(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<ProjectWithMembers>> {
    access::require_access(&state.db, ctx.user_id, project_id).await?;

    let project = Project::find_by_id(&state.db, project_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    Ok(Json(with_members(&state, project).await?))
}

/// Update a project's name or description
///
/// # Errors
///
/// - `403 Forbidden`: Caller is not an admin or the owner
/// - `404 Not Found`: Project was deleted concurrently
pub async fn update_project(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(project_id): Path<Uuid>,
    Json(req): Json<UpdateProjectRequest>,
) -> ApiResult<Json<ProjectWithMembers>> {
    req.validate()?;
    access::require_admin(&state.db, ctx.user_id, project_id).await?;

    let project = Project::update(
        &state.db,
        project_id,
        UpdateProject {
            name: req.name,
            description: req.description,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    Ok(Json(with_members(&state, project).await?))
}

/// Delete a project
///
/// Owner only; memberships, tasks, comments, and notifications
/// referencing the project cascade away with it.
pub async fn delete_project(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    access::require_access(&state.db, ctx.user_id, project_id).await?;

    let project = Project::find_by_id(&state.db, project_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    if project.owner_id != ctx.user_id {
        return Err(ApiError::Forbidden(
            "Only the project owner can delete the project".to_string(),
        ));
    }

    Project::delete(&state.db, project_id).await?;
    tracing::info!(project_id = %project_id, "Project deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// List project members
pub async fn list_members(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<Vec<ProjectMember>>> {
    access::require_access(&state.db, ctx.user_id, project_id).await?;

    let members = Membership::list_members(&state.db, project_id).await?;
    Ok(Json(members))
}

/// Add a member to a project
///
/// # Endpoint
///
/// ```text
/// POST /api/v1/projects/:id/members
/// Content-Type: application/json
///
/// {
///   "email": "linus@example.com",
///   "role": "member"
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Invalid email or a role other than admin/member
/// - `403 Forbidden`: Caller is not an admin or the owner
/// - `404 Not Found`: No account with that email
/// - `409 Conflict`: User is already a member
pub async fn add_member(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(project_id): Path<Uuid>,
    Json(req): Json<AddMemberRequest>,
) -> ApiResult<(StatusCode, Json<Membership>)> {
    req.validate()?;
    access::require_admin(&state.db, ctx.user_id, project_id).await?;

    let role = req.role.unwrap_or(MembershipRole::Member);
    if role == MembershipRole::Owner {
        return Err(ApiError::BadRequest(
            "Role must be admin or member".to_string(),
        ));
    }

    let user = User::find_by_email(&state.db, &req.email)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found with this email".to_string()))?;

    if Membership::exists(&state.db, project_id, user.id).await? {
        return Err(ApiError::Conflict(
            "User is already a member of this project".to_string(),
        ));
    }

    let membership = Membership::create(
        &state.db,
        CreateMembership {
            project_id,
            user_id: user.id,
            role,
        },
    )
    .await?;

    tracing::info!(project_id = %project_id, user_id = %user.id, "Member added");

    // Fan-out runs after the membership is committed.
    state
        .fanout
        .member_added(project_id, user.id, ctx.user_id)
        .await;

    Ok((StatusCode::CREATED, Json(membership)))
}

/// Project progress statistics
///
/// Task counts grouped by status plus a completion percentage rounded
/// to two decimals; an empty project reports 0.0.
pub async fn project_progress(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<TaskProgress>> {
    access::require_access(&state.db, ctx.user_id, project_id).await?;

    let progress = Task::progress(&state.db, project_id).await?;
    Ok(Json(progress))
}
