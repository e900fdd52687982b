//! In-app notification model and database operations

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// In-app notification delivered to a single user
///
/// Rows are created only by the notification fan-out and the deadline
/// sweep, mutated only by mark-read, and never deleted in normal
/// operation. Only the recipient may read or mark their rows.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE notifications (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     project_id UUID REFERENCES projects(id) ON DELETE CASCADE,
///     task_id UUID REFERENCES tasks(id) ON DELETE CASCADE,
///     title VARCHAR(255) NOT NULL,
///     body TEXT NOT NULL,
///     is_read BOOLEAN NOT NULL DEFAULT FALSE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Notification {
    /// Unique notification ID (UUID v4)
    pub id: Uuid,

    /// Recipient user
    pub user_id: Uuid,

    /// Related project, if any
    pub project_id: Option<Uuid>,

    /// Related task, if any
    pub task_id: Option<Uuid>,

    /// Short headline, e.g. "New Task Assigned"
    pub title: String,

    /// Human-readable body text
    pub body: String,

    /// Whether the recipient has marked this read
    pub is_read: bool,

    /// When the notification was created
    pub created_at: DateTime<Utc>,
}

/// Input for creating a notification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateNotification {
    /// Recipient user
    pub user_id: Uuid,

    /// Related project, if any
    pub project_id: Option<Uuid>,

    /// Related task, if any
    pub task_id: Option<Uuid>,

    /// Short headline
    pub title: String,

    /// Body text
    pub body: String,
}

/// A notification joined with the names of its related entities
///
/// The joins are LEFT, so names are `None` when the notification has no
/// context or the related row was deleted after the fact.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct NotificationWithContext {
    /// Unique notification ID
    pub id: Uuid,

    /// Recipient user
    pub user_id: Uuid,

    /// Related project, if any
    pub project_id: Option<Uuid>,

    /// Related task, if any
    pub task_id: Option<Uuid>,

    /// Short headline
    pub title: String,

    /// Body text
    pub body: String,

    /// Whether the recipient has marked this read
    pub is_read: bool,

    /// When the notification was created
    pub created_at: DateTime<Utc>,

    /// Name of the related project, when resolvable
    pub project_name: Option<String>,

    /// Title of the related task, when resolvable
    pub task_title: Option<String>,
}

impl Notification {
    /// Creates a notification row
    ///
    /// # Arguments
    ///
    /// * `pool` - Database connection pool
    /// * `data` - Notification content and recipient
    ///
    /// # Returns
    ///
    /// The created notification with generated ID and timestamp
    ///
    /// # Errors
    ///
    /// Returns an error if the recipient or a referenced entity does not
    /// exist (foreign key) or if the database operation fails
    pub async fn create(
        pool: &PgPool,
        data: CreateNotification,
    ) -> Result<Notification, sqlx::Error> {
        let notification = sqlx::query_as::<_, Notification>(
            r#"
            INSERT INTO notifications (user_id, project_id, task_id, title, body)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, project_id, task_id, title, body, is_read, created_at
            "#,
        )
        .bind(data.user_id)
        .bind(data.project_id)
        .bind(data.task_id)
        .bind(data.title)
        .bind(data.body)
        .fetch_one(pool)
        .await?;

        Ok(notification)
    }

    /// Lists a user's most recent notifications with context names
    ///
    /// Newest first, capped at `limit`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use syncboard_shared::models::notification::Notification;
    /// # use sqlx::PgPool;
    /// # async fn example(pool: PgPool, user_id: uuid::Uuid) -> Result<(), sqlx::Error> {
    /// for n in Notification::list_recent(&pool, user_id, 50).await? {
    ///     println!("[{}] {}", n.title, n.body);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn list_recent(
        pool: &PgPool,
        user_id: Uuid,
        limit: i64,
    ) -> Result<Vec<NotificationWithContext>, sqlx::Error> {
        let notifications = sqlx::query_as::<_, NotificationWithContext>(
            r#"
            SELECT n.id, n.user_id, n.project_id, n.task_id, n.title, n.body,
                   n.is_read, n.created_at,
                   p.name AS project_name, t.title AS task_title
            FROM notifications n
            LEFT JOIN projects p ON p.id = n.project_id
            LEFT JOIN tasks t ON t.id = n.task_id
            WHERE n.user_id = $1
            ORDER BY n.created_at DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(pool)
        .await?;

        Ok(notifications)
    }

    /// Marks a set of the user's notifications as read
    ///
    /// Scoped to `user_id` so one user can never mark another user's
    /// rows; IDs belonging to someone else are silently skipped.
    ///
    /// # Returns
    ///
    /// The number of rows actually updated
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn mark_read(
        pool: &PgPool,
        user_id: Uuid,
        ids: &[Uuid],
    ) -> Result<u64, sqlx::Error> {
        if ids.is_empty() {
            return Ok(0);
        }

        let result = sqlx::query(
            r#"
            UPDATE notifications
            SET is_read = TRUE
            WHERE user_id = $1 AND id = ANY($2)
            "#,
        )
        .bind(user_id)
        .bind(ids)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Counts a user's unread notifications
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn unread_count(pool: &PgPool, user_id: Uuid) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND is_read = FALSE",
        )
        .bind(user_id)
        .fetch_one(pool)
        .await?;

        Ok(count)
    }

    /// Checks whether a titled notification already exists for a task on
    /// a given calendar day
    ///
    /// De-duplication probe for the deadline sweep: the key is
    /// (user, task, title, UTC day). The check and any subsequent insert
    /// are not atomic; overlapping sweeps may rarely double-notify.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn exists_for_day(
        pool: &PgPool,
        user_id: Uuid,
        task_id: Uuid,
        title: &str,
        day: NaiveDate,
    ) -> Result<bool, sqlx::Error> {
        let start = day.and_time(NaiveTime::MIN).and_utc();
        let end = start + Duration::days(1);

        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM notifications
                WHERE user_id = $1 AND task_id = $2 AND title = $3
                  AND created_at >= $4 AND created_at < $5
            )
            "#,
        )
        .bind(user_id)
        .bind(task_id)
        .bind(title)
        .bind(start)
        .bind(end)
        .fetch_one(pool)
        .await?;

        Ok(exists)
    }
}
