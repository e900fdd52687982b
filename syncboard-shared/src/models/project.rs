//! Project model and database operations

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Project model representing a collaboration space
///
/// A project is owned by exactly one user and shared with others through
/// the memberships table. The owner always holds a membership row with
/// role `owner`, inserted in the same transaction as the project itself.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE projects (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL,
///     description TEXT,
///     owner_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Project {
    /// Unique project ID (UUID v4)
    pub id: Uuid,

    /// Project name
    pub name: String,

    /// Optional free-form description
    pub description: Option<String>,

    /// User who owns this project
    pub owner_id: Uuid,

    /// When the project was created
    pub created_at: DateTime<Utc>,
}

/// Input for creating a new project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProject {
    /// Project name
    pub name: String,

    /// Optional description
    pub description: Option<String>,

    /// Owning user; also becomes the first member with role `owner`
    pub owner_id: Uuid,
}

/// Input for updating an existing project
///
/// `None` fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProject {
    /// New project name
    pub name: Option<String>,

    /// New description
    pub description: Option<String>,
}

impl Project {
    /// Creates a new project together with its owner membership
    ///
    /// Both inserts run in one transaction so a project can never exist
    /// without its owner appearing in the member list.
    ///
    /// # Arguments
    ///
    /// * `pool` - Database connection pool
    /// * `data` - Project creation data
    ///
    /// # Returns
    ///
    /// The created project with generated ID and timestamp
    ///
    /// # Errors
    ///
    /// Returns an error if the owner does not exist (foreign key) or if
    /// the database operation fails
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use syncboard_shared::models::project::{Project, CreateProject};
    /// # use sqlx::PgPool;
    /// # async fn example(pool: PgPool, owner_id: uuid::Uuid) -> Result<(), sqlx::Error> {
    /// let project = Project::create(&pool, CreateProject {
    ///     name: "Apollo".to_string(),
    ///     description: Some("Launch planning".to_string()),
    ///     owner_id,
    /// }).await?;
    /// println!("Created project {}", project.id);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn create(pool: &PgPool, data: CreateProject) -> Result<Project, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let project = sqlx::query_as::<_, Project>(
            r#"
            INSERT INTO projects (name, description, owner_id)
            VALUES ($1, $2, $3)
            RETURNING id, name, description, owner_id, created_at
            "#,
        )
        .bind(data.name)
        .bind(data.description)
        .bind(data.owner_id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO memberships (project_id, user_id, role)
            VALUES ($1, $2, 'owner')
            "#,
        )
        .bind(project.id)
        .bind(data.owner_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(project)
    }

    /// Finds a project by ID
    ///
    /// # Returns
    ///
    /// `Some(Project)` if found, `None` otherwise
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Project>, sqlx::Error> {
        let project = sqlx::query_as::<_, Project>(
            r#"
            SELECT id, name, description, owner_id, created_at
            FROM projects
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(project)
    }

    /// Lists every project a user can see
    ///
    /// A project is visible when the user owns it or holds any membership
    /// in it. Results are ordered newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use syncboard_shared::models::project::Project;
    /// # use sqlx::PgPool;
    /// # async fn example(pool: PgPool, user_id: uuid::Uuid) -> Result<(), sqlx::Error> {
    /// let projects = Project::list_for_user(&pool, user_id).await?;
    /// println!("{} projects", projects.len());
    /// # Ok(())
    /// # }
    /// ```
    pub async fn list_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Project>, sqlx::Error> {
        let projects = sqlx::query_as::<_, Project>(
            r#"
            SELECT DISTINCT p.id, p.name, p.description, p.owner_id, p.created_at
            FROM projects p
            LEFT JOIN memberships m ON m.project_id = p.id
            WHERE p.owner_id = $1 OR m.user_id = $1
            ORDER BY p.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(projects)
    }

    /// Updates a project's name and/or description
    ///
    /// # Returns
    ///
    /// The updated project, or `None` if it does not exist
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateProject,
    ) -> Result<Option<Project>, sqlx::Error> {
        let project = sqlx::query_as::<_, Project>(
            r#"
            UPDATE projects
            SET name = COALESCE($2, name),
                description = COALESCE($3, description)
            WHERE id = $1
            RETURNING id, name, description, owner_id, created_at
            "#,
        )
        .bind(id)
        .bind(data.name)
        .bind(data.description)
        .fetch_optional(pool)
        .await?;

        Ok(project)
    }

    /// Deletes a project and everything attached to it
    ///
    /// Memberships, tasks, comments, and attached notifications go with it
    /// via ON DELETE CASCADE.
    ///
    /// # Returns
    ///
    /// `true` if the project existed and was deleted
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
