/// Project access control
///
/// This module answers the two authorization questions every project,
/// task, and comment operation asks:
///
/// 1. **Access**: is the user the project owner or a member (any role)?
/// 2. **Admin**: is the user the owner or do they hold an `admin` or
///    `owner` membership role?
///
/// Both checks return `false` for a project that does not exist; callers
/// that want a 404 instead of a 403 must check existence separately.
///
/// Task status changes use a third, stricter rule that is deliberately
/// not project-scoped: only the current assignee may move a task, see
/// [`require_assignee`]. When a task has no assignee, nobody may move it
/// through that path.
///
/// # Example
///
/// ```no_run
/// use syncboard_shared::auth::access::{require_access, require_admin};
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// async fn open_project(pool: &PgPool, user_id: Uuid, project_id: Uuid) -> Result<(), String> {
///     // Any member may view
///     require_access(pool, user_id, project_id).await.map_err(|e| e.to_string())?;
///     Ok(())
/// }
/// ```

use sqlx::PgPool;
use uuid::Uuid;

use crate::models::task::Task;

/// Error type for authorization checks
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    /// User is neither owner nor member of the project
    #[error("access denied to project {0}")]
    NotMember(Uuid),

    /// User lacks an admin-level role in the project
    #[error("admin access required for project {0}")]
    NotAdmin(Uuid),

    /// User is not the task's current assignee
    #[error("only the assigned user can update the task status")]
    NotAssignee,

    /// Database error while checking
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Checks whether a user may see a project at all
///
/// True iff the user owns the project or holds any membership in it.
/// False (not an error) when the project does not exist.
///
/// # Errors
///
/// Returns an error only if the database operation fails
pub async fn has_access(
    pool: &PgPool,
    user_id: Uuid,
    project_id: Uuid,
) -> Result<bool, sqlx::Error> {
    let allowed: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS(SELECT 1 FROM projects WHERE id = $1 AND owner_id = $2)
            OR EXISTS(SELECT 1 FROM memberships WHERE project_id = $1 AND user_id = $2)
        "#,
    )
    .bind(project_id)
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    Ok(allowed)
}

/// Checks whether a user may administer a project
///
/// True iff the user owns the project or holds an `admin` or `owner`
/// membership role. False (not an error) when the project does not
/// exist.
///
/// # Errors
///
/// Returns an error only if the database operation fails
pub async fn is_admin(pool: &PgPool, user_id: Uuid, project_id: Uuid) -> Result<bool, sqlx::Error> {
    let allowed: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS(SELECT 1 FROM projects WHERE id = $1 AND owner_id = $2)
            OR EXISTS(
                SELECT 1 FROM memberships
                WHERE project_id = $1 AND user_id = $2 AND role IN ('admin', 'owner')
            )
        "#,
    )
    .bind(project_id)
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    Ok(allowed)
}

/// Requires view access to a project
///
/// # Errors
///
/// Returns `AuthzError::NotMember` if access is denied,
/// `AuthzError::Database` if the check itself fails
///
/// # Example
///
/// ```no_run
/// # use syncboard_shared::auth::access::require_access;
/// # use sqlx::PgPool;
/// # use uuid::Uuid;
/// # async fn example(pool: PgPool, user_id: Uuid, project_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// require_access(&pool, user_id, project_id).await?;
/// # Ok(())
/// # }
/// ```
pub async fn require_access(
    pool: &PgPool,
    user_id: Uuid,
    project_id: Uuid,
) -> Result<(), AuthzError> {
    if !has_access(pool, user_id, project_id).await? {
        return Err(AuthzError::NotMember(project_id));
    }

    Ok(())
}

/// Requires admin access to a project
///
/// # Errors
///
/// Returns `AuthzError::NotAdmin` if the user is not owner/admin,
/// `AuthzError::Database` if the check itself fails
pub async fn require_admin(
    pool: &PgPool,
    user_id: Uuid,
    project_id: Uuid,
) -> Result<(), AuthzError> {
    if !is_admin(pool, user_id, project_id).await? {
        return Err(AuthzError::NotAdmin(project_id));
    }

    Ok(())
}

/// Requires that the user is the task's current assignee
///
/// An unassigned task fails for every user; ownership, admin role, and
/// having created the task grant no exception.
///
/// # Errors
///
/// Returns `AuthzError::NotAssignee` if the user is not the assignee
///
/// # Example
///
/// ```no_run
/// # use syncboard_shared::auth::access::require_assignee;
/// # use syncboard_shared::models::task::Task;
/// # use uuid::Uuid;
/// # fn example(task: &Task, user_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// require_assignee(task, user_id)?;
/// # Ok(())
/// # }
/// ```
pub fn require_assignee(task: &Task, user_id: Uuid) -> Result<(), AuthzError> {
    if task.assignee_id != Some(user_id) {
        return Err(AuthzError::NotAssignee);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::task::TaskStatus;
    use chrono::Utc;

    fn task_with_assignee(assignee_id: Option<Uuid>) -> Task {
        Task {
            id: Uuid::new_v4(),
            project_id: Uuid::new_v4(),
            title: "Test task".to_string(),
            description: None,
            assignee_id,
            due_date: None,
            status: TaskStatus::Todo,
            created_by: Uuid::new_v4(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_require_assignee_allows_assigned_user() {
        let user_id = Uuid::new_v4();
        let task = task_with_assignee(Some(user_id));

        assert!(require_assignee(&task, user_id).is_ok());
    }

    #[test]
    fn test_require_assignee_rejects_other_users() {
        let task = task_with_assignee(Some(Uuid::new_v4()));

        let result = require_assignee(&task, Uuid::new_v4());
        assert!(matches!(result, Err(AuthzError::NotAssignee)));
    }

    #[test]
    fn test_require_assignee_rejects_everyone_when_unassigned() {
        let task = task_with_assignee(None);

        // Not even the creator may move an unassigned task
        let result = require_assignee(&task, task.created_by);
        assert!(matches!(result, Err(AuthzError::NotAssignee)));
    }

    #[test]
    fn test_authz_error_display() {
        let project_id = Uuid::new_v4();

        let err = AuthzError::NotMember(project_id);
        assert!(err.to_string().contains("access denied"));

        let err = AuthzError::NotAdmin(project_id);
        assert!(err.to_string().contains("admin access required"));

        let err = AuthzError::NotAssignee;
        assert!(err.to_string().contains("assigned user"));
    }

    // Integration tests for the database-backed checks are in syncboard-api/tests/
}
