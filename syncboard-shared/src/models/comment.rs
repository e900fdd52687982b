//! Comment model, threaded discussion queries, and reply-tree assembly

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Comment model for threaded discussions on projects and tasks
///
/// A comment is attached to exactly one of a project or a task; the
/// database enforces this with a CHECK constraint. Threading is stored
/// flat through `parent_comment_id` and assembled into a reply tree
/// only when rendering a response, see [`build_tree`].
///
/// # Schema
///
/// ```sql
/// CREATE TABLE comments (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     project_id UUID REFERENCES projects(id) ON DELETE CASCADE,
///     task_id UUID REFERENCES tasks(id) ON DELETE CASCADE,
///     parent_comment_id UUID REFERENCES comments(id) ON DELETE CASCADE,
///     author_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     content TEXT NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CONSTRAINT comments_attachment_check
///         CHECK ((project_id IS NULL) != (task_id IS NULL))
/// );
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    /// Unique comment ID (UUID v4)
    pub id: Uuid,

    /// Project attachment; mutually exclusive with `task_id`
    pub project_id: Option<Uuid>,

    /// Task attachment; mutually exclusive with `project_id`
    pub task_id: Option<Uuid>,

    /// Parent comment when this is a reply
    pub parent_comment_id: Option<Uuid>,

    /// Authoring user
    pub author_id: Uuid,

    /// Comment text
    pub content: String,

    /// When the comment was posted
    pub created_at: DateTime<Utc>,
}

/// Input for posting a comment
///
/// Exactly one of `project_id`/`task_id` must be set; callers validate
/// this before insert, the CHECK constraint backs it up.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateComment {
    /// Attach to a project discussion
    pub project_id: Option<Uuid>,

    /// Attach to a task discussion
    pub task_id: Option<Uuid>,

    /// Reply target, if any
    pub parent_comment_id: Option<Uuid>,

    /// Authoring user
    pub author_id: Uuid,

    /// Comment text
    pub content: String,
}

/// A comment row joined with its author's display name
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CommentWithAuthor {
    /// Unique comment ID
    pub id: Uuid,

    /// Project attachment
    pub project_id: Option<Uuid>,

    /// Task attachment
    pub task_id: Option<Uuid>,

    /// Parent comment when this is a reply
    pub parent_comment_id: Option<Uuid>,

    /// Authoring user
    pub author_id: Uuid,

    /// Author display name from the users table
    pub author_name: String,

    /// Comment text
    pub content: String,

    /// When the comment was posted
    pub created_at: DateTime<Utc>,
}

/// One node of an assembled reply tree
///
/// Presentation shape only; storage stays flat. The comment fields are
/// flattened into the node so clients see a comment object with a
/// `replies` array.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentNode {
    /// The comment itself
    #[serde(flatten)]
    pub comment: CommentWithAuthor,

    /// Direct replies, oldest first
    pub replies: Vec<CommentNode>,
}

impl Comment {
    /// Posts a new comment
    ///
    /// # Arguments
    ///
    /// * `pool` - Database connection pool
    /// * `data` - Comment creation data with exactly one attachment set
    ///
    /// # Returns
    ///
    /// The created comment with generated ID and timestamp
    ///
    /// # Errors
    ///
    /// Returns an error if both or neither attachment is set (CHECK
    /// constraint), if a referenced row does not exist (foreign key), or
    /// if the database operation fails
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use syncboard_shared::models::comment::{Comment, CreateComment};
    /// # use sqlx::PgPool;
    /// # async fn example(pool: PgPool, task_id: uuid::Uuid, user_id: uuid::Uuid) -> Result<(), sqlx::Error> {
    /// let comment = Comment::create(&pool, CreateComment {
    ///     project_id: None,
    ///     task_id: Some(task_id),
    ///     parent_comment_id: None,
    ///     author_id: user_id,
    ///     content: "Looks good to me".to_string(),
    /// }).await?;
    /// println!("Posted comment {}", comment.id);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn create(pool: &PgPool, data: CreateComment) -> Result<Comment, sqlx::Error> {
        let comment = sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO comments (project_id, task_id, parent_comment_id, author_id, content)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, project_id, task_id, parent_comment_id, author_id, content, created_at
            "#,
        )
        .bind(data.project_id)
        .bind(data.task_id)
        .bind(data.parent_comment_id)
        .bind(data.author_id)
        .bind(data.content)
        .fetch_one(pool)
        .await?;

        Ok(comment)
    }

    /// Lists a project's discussion comments with author names, oldest first
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn list_by_project(
        pool: &PgPool,
        project_id: Uuid,
    ) -> Result<Vec<CommentWithAuthor>, sqlx::Error> {
        let comments = sqlx::query_as::<_, CommentWithAuthor>(
            r#"
            SELECT c.id, c.project_id, c.task_id, c.parent_comment_id,
                   c.author_id, u.name AS author_name, c.content, c.created_at
            FROM comments c
            JOIN users u ON u.id = c.author_id
            WHERE c.project_id = $1
            ORDER BY c.created_at ASC
            "#,
        )
        .bind(project_id)
        .fetch_all(pool)
        .await?;

        Ok(comments)
    }

    /// Lists a task's comments with author names, oldest first
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn list_by_task(
        pool: &PgPool,
        task_id: Uuid,
    ) -> Result<Vec<CommentWithAuthor>, sqlx::Error> {
        let comments = sqlx::query_as::<_, CommentWithAuthor>(
            r#"
            SELECT c.id, c.project_id, c.task_id, c.parent_comment_id,
                   c.author_id, u.name AS author_name, c.content, c.created_at
            FROM comments c
            JOIN users u ON u.id = c.author_id
            WHERE c.task_id = $1
            ORDER BY c.created_at ASC
            "#,
        )
        .bind(task_id)
        .fetch_all(pool)
        .await?;

        Ok(comments)
    }
}

/// Assembles flat comment rows into a reply tree
///
/// Rows must arrive ordered by `created_at` ascending; the order is
/// preserved among siblings at every level. Replies whose parent is not
/// in the input (e.g. a reply fetched without its parent) are promoted
/// to roots rather than dropped.
///
/// # Example
///
/// ```no_run
/// # use syncboard_shared::models::comment::{Comment, build_tree};
/// # use sqlx::PgPool;
/// # async fn example(pool: PgPool, task_id: uuid::Uuid) -> Result<(), sqlx::Error> {
/// let rows = Comment::list_by_task(&pool, task_id).await?;
/// let thread = build_tree(rows);
/// println!("{} top-level comments", thread.len());
/// # Ok(())
/// # }
/// ```
pub fn build_tree(rows: Vec<CommentWithAuthor>) -> Vec<CommentNode> {
    let ids: HashSet<Uuid> = rows.iter().map(|row| row.id).collect();

    // Index pass: group rows under their parent, keeping arrival order.
    let mut by_parent: HashMap<Option<Uuid>, Vec<CommentWithAuthor>> = HashMap::new();
    for row in rows {
        let key = row.parent_comment_id.filter(|parent| ids.contains(parent));
        by_parent.entry(key).or_default().push(row);
    }

    attach_replies(None, &mut by_parent)
}

fn attach_replies(
    parent: Option<Uuid>,
    by_parent: &mut HashMap<Option<Uuid>, Vec<CommentWithAuthor>>,
) -> Vec<CommentNode> {
    let rows = by_parent.remove(&parent).unwrap_or_default();

    rows.into_iter()
        .map(|row| {
            let replies = attach_replies(Some(row.id), by_parent);
            CommentNode { comment: row, replies }
        })
        .collect()
}
