//! Task model and database operations

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Status of a task on the board
///
/// Any status can move to any other in a single transition; `todo` is
/// the creation default. Status changes are restricted to the current
/// assignee at the API layer, not here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Not started (default)
    Todo,
    /// Being worked on
    InProgress,
    /// Finished
    Done,
}

impl TaskStatus {
    /// Returns the status as a snake_case string matching the database enum
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Done => "done",
        }
    }

    /// Human-readable label for emails and UI text
    pub fn display_name(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "To Do",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::Done => "Completed",
        }
    }
}

/// Task model representing a unit of work within a project
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
///     title VARCHAR(255) NOT NULL,
///     description TEXT,
///     assignee_id UUID REFERENCES users(id) ON DELETE SET NULL,
///     due_date DATE,
///     status task_status NOT NULL DEFAULT 'todo',
///     created_by UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    /// Unique task ID (UUID v4)
    pub id: Uuid,

    /// Project this task belongs to
    pub project_id: Uuid,

    /// Short task title
    pub title: String,

    /// Optional longer description
    pub description: Option<String>,

    /// User currently assigned; None means unassigned
    ///
    /// Only this user may change the task status. Set to NULL by the
    /// database if the assignee account is deleted.
    pub assignee_id: Option<Uuid>,

    /// Optional due date (calendar date, no time component)
    pub due_date: Option<NaiveDate>,

    /// Current board status
    pub status: TaskStatus,

    /// User who created the task
    pub created_by: Uuid,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// When the task was last modified
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTask {
    /// Project the task belongs to
    pub project_id: Uuid,

    /// Task title
    pub title: String,

    /// Optional description
    pub description: Option<String>,

    /// Optional initial assignee
    pub assignee_id: Option<Uuid>,

    /// Optional due date
    pub due_date: Option<NaiveDate>,

    /// Creating user
    pub created_by: Uuid,
}

/// Input for updating a task's fields
///
/// Uses double-`Option` for assignee and due date so callers can
/// distinguish "leave unchanged" (`None`) from "clear the value"
/// (`Some(None)`). Status is deliberately absent; status changes go
/// through [`Task::update_status`] with its own authorization rule.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTask {
    /// New title (None = unchanged)
    pub title: Option<String>,

    /// New description (None = unchanged)
    pub description: Option<String>,

    /// New assignee: None = unchanged, Some(None) = unassign
    pub assignee_id: Option<Option<Uuid>>,

    /// New due date: None = unchanged, Some(None) = clear
    pub due_date: Option<Option<NaiveDate>>,
}

/// Aggregate task counts for a project's progress view
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskProgress {
    /// Total number of tasks in the project
    pub total_tasks: i64,

    /// Tasks with status `done`
    pub completed_tasks: i64,

    /// Tasks with status `in_progress`
    pub in_progress_tasks: i64,

    /// Tasks with status `todo`
    pub todo_tasks: i64,

    /// completed / total * 100, rounded to two decimals; 0 when empty
    pub completion_percentage: f64,
}

impl Task {
    /// Creates a new task
    ///
    /// The status starts as `todo` via the database default.
    ///
    /// # Arguments
    ///
    /// * `pool` - Database connection pool
    /// * `data` - Task creation data
    ///
    /// # Returns
    ///
    /// The created task with generated ID and timestamps
    ///
    /// # Errors
    ///
    /// Returns an error if the project, assignee, or creator does not
    /// exist (foreign key) or if the database operation fails
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use syncboard_shared::models::task::{Task, CreateTask};
    /// # use sqlx::PgPool;
    /// # async fn example(pool: PgPool, project_id: uuid::Uuid, user_id: uuid::Uuid) -> Result<(), sqlx::Error> {
    /// let task = Task::create(&pool, CreateTask {
    ///     project_id,
    ///     title: "Write launch checklist".to_string(),
    ///     description: None,
    ///     assignee_id: Some(user_id),
    ///     due_date: None,
    ///     created_by: user_id,
    /// }).await?;
    /// println!("Created task {}", task.id);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn create(pool: &PgPool, data: CreateTask) -> Result<Task, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (project_id, title, description, assignee_id, due_date, created_by)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, project_id, title, description, assignee_id, due_date,
                      status, created_by, created_at, updated_at
            "#,
        )
        .bind(data.project_id)
        .bind(data.title)
        .bind(data.description)
        .bind(data.assignee_id)
        .bind(data.due_date)
        .bind(data.created_by)
        .fetch_one(pool)
        .await?;

        Ok(task)
    }

    /// Finds a task by ID
    ///
    /// # Returns
    ///
    /// `Some(Task)` if found, `None` otherwise
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Task>, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            r#"
            SELECT id, project_id, title, description, assignee_id, due_date,
                   status, created_by, created_at, updated_at
            FROM tasks
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Lists all tasks in a project, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn list_by_project(
        pool: &PgPool,
        project_id: Uuid,
    ) -> Result<Vec<Task>, sqlx::Error> {
        let tasks = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, project_id, title, description, assignee_id, due_date,
                   status, created_by, created_at, updated_at
            FROM tasks
            WHERE project_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(project_id)
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }

    /// Updates a task's editable fields
    ///
    /// Title and description are patched when given; assignee and due
    /// date use the double-`Option` convention of [`UpdateTask`].
    /// `updated_at` is always refreshed.
    ///
    /// # Returns
    ///
    /// The updated task, or `None` if it does not exist
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateTask,
    ) -> Result<Option<Task>, sqlx::Error> {
        let set_assignee = data.assignee_id.is_some();
        let assignee = data.assignee_id.flatten();
        let set_due_date = data.due_date.is_some();
        let due_date = data.due_date.flatten();

        let task = sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                assignee_id = CASE WHEN $4 THEN $5 ELSE assignee_id END,
                due_date = CASE WHEN $6 THEN $7 ELSE due_date END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, project_id, title, description, assignee_id, due_date,
                      status, created_by, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(data.title)
        .bind(data.description)
        .bind(set_assignee)
        .bind(assignee)
        .bind(set_due_date)
        .bind(due_date)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Moves a task to a new status
    ///
    /// Persists the status together with a fresh `updated_at` so that
    /// anyone re-querying immediately after a status notification sees
    /// consistent state. The assignee-only authorization rule is the
    /// caller's responsibility.
    ///
    /// # Returns
    ///
    /// The updated task, or `None` if it does not exist
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use syncboard_shared::models::task::{Task, TaskStatus};
    /// # use sqlx::PgPool;
    /// # async fn example(pool: PgPool, task_id: uuid::Uuid) -> Result<(), sqlx::Error> {
    /// if let Some(task) = Task::update_status(&pool, task_id, TaskStatus::Done).await? {
    ///     println!("Task now {}", task.status.as_str());
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn update_status(
        pool: &PgPool,
        id: Uuid,
        status: TaskStatus,
    ) -> Result<Option<Task>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks
            SET status = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, project_id, title, description, assignee_id, due_date,
                      status, created_by, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(status)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Deletes a task
    ///
    /// # Returns
    ///
    /// `true` if the task existed and was deleted
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let deleted = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?
            .rows_affected();

        Ok(deleted > 0)
    }

    /// Lists tasks due within a date window, for deadline reminders
    ///
    /// Returns tasks with `due_date` between `start` and `end` inclusive
    /// that are not done and have an assignee. Matches the partial index
    /// `idx_tasks_due`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn list_due_between(
        pool: &PgPool,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Task>, sqlx::Error> {
        let tasks = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, project_id, title, description, assignee_id, due_date,
                   status, created_by, created_at, updated_at
            FROM tasks
            WHERE due_date BETWEEN $1 AND $2
              AND status != 'done'
              AND assignee_id IS NOT NULL
            ORDER BY due_date ASC
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }

    /// Computes aggregate progress counts for a project
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use syncboard_shared::models::task::Task;
    /// # use sqlx::PgPool;
    /// # async fn example(pool: PgPool, project_id: uuid::Uuid) -> Result<(), sqlx::Error> {
    /// let progress = Task::progress(&pool, project_id).await?;
    /// println!("{}% complete", progress.completion_percentage);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn progress(pool: &PgPool, project_id: Uuid) -> Result<TaskProgress, sqlx::Error> {
        let (total, done, in_progress, todo): (i64, i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*),
                   COUNT(*) FILTER (WHERE status = 'done'),
                   COUNT(*) FILTER (WHERE status = 'in_progress'),
                   COUNT(*) FILTER (WHERE status = 'todo')
            FROM tasks
            WHERE project_id = $1
            "#,
        )
        .bind(project_id)
        .fetch_one(pool)
        .await?;

        Ok(TaskProgress::from_counts(total, done, in_progress, todo))
    }
}

impl TaskProgress {
    /// Builds a progress summary from raw counts
    pub fn from_counts(total: i64, done: i64, in_progress: i64, todo: i64) -> TaskProgress {
        let completion_percentage = if total > 0 {
            (done as f64 / total as f64 * 100.0 * 100.0).round() / 100.0
        } else {
            0.0
        };

        TaskProgress {
            total_tasks: total,
            completed_tasks: done,
            in_progress_tasks: in_progress,
            todo_tasks: todo,
            completion_percentage,
        }
    }
}
