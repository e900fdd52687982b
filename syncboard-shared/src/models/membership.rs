//! Project membership model and database operations

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Role of a member within a single project
///
/// Scoped to one project; unrelated to the platform-wide
/// [`UserRole`](crate::models::user::UserRole).
///
/// # Role capabilities
///
/// | Role | View | Add members | Edit project |
/// |--------|------|-------------|--------------|
/// | owner  | yes  | yes         | yes          |
/// | admin  | yes  | yes         | yes          |
/// | member | yes  | no          | no           |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "membership_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MembershipRole {
    /// Project owner; exactly one per project, set at creation
    Owner,
    /// Can manage members and project settings
    Admin,
    /// Can view and participate
    Member,
}

impl MembershipRole {
    /// Returns the role as a lowercase string matching the database enum
    pub fn as_str(&self) -> &'static str {
        match self {
            MembershipRole::Owner => "owner",
            MembershipRole::Admin => "admin",
            MembershipRole::Member => "member",
        }
    }

    /// Whether this role carries admin-level privileges
    pub fn grants_admin(&self) -> bool {
        matches!(self, MembershipRole::Owner | MembershipRole::Admin)
    }
}

/// Membership model linking a user to a project
///
/// # Schema
///
/// ```sql
/// CREATE TABLE memberships (
///     project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     role membership_role NOT NULL DEFAULT 'member',
///     joined_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     PRIMARY KEY (project_id, user_id)
/// );
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Membership {
    /// Project this membership belongs to
    pub project_id: Uuid,

    /// Member user
    pub user_id: Uuid,

    /// Role within the project
    pub role: MembershipRole,

    /// When the user joined the project
    pub joined_at: DateTime<Utc>,
}

/// Input for adding a member to a project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMembership {
    /// Target project
    pub project_id: Uuid,

    /// User to add
    pub user_id: Uuid,

    /// Role to grant
    pub role: MembershipRole,
}

/// A project member joined with their user profile
///
/// Returned by [`Membership::list_members`] for member lists and for
/// notification fan-out, which needs names and email addresses.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProjectMember {
    /// Member user ID
    pub user_id: Uuid,

    /// Display name from the users table
    pub name: String,

    /// Email address from the users table
    pub email: String,

    /// Role within the project
    pub role: MembershipRole,

    /// When the user joined the project
    pub joined_at: DateTime<Utc>,
}

impl Membership {
    /// Adds a user to a project
    ///
    /// # Arguments
    ///
    /// * `pool` - Database connection pool
    /// * `data` - Membership creation data
    ///
    /// # Returns
    ///
    /// The created membership with its join timestamp
    ///
    /// # Errors
    ///
    /// Returns an error if the user is already a member (primary key
    /// violation), if project or user does not exist (foreign key), or if
    /// the database operation fails
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use syncboard_shared::models::membership::{Membership, CreateMembership, MembershipRole};
    /// # use sqlx::PgPool;
    /// # async fn example(pool: PgPool, project_id: uuid::Uuid, user_id: uuid::Uuid) -> Result<(), sqlx::Error> {
    /// let membership = Membership::create(&pool, CreateMembership {
    ///     project_id,
    ///     user_id,
    ///     role: MembershipRole::Member,
    /// }).await?;
    /// println!("Added with role {}", membership.role.as_str());
    /// # Ok(())
    /// # }
    /// ```
    pub async fn create(pool: &PgPool, data: CreateMembership) -> Result<Membership, sqlx::Error> {
        sqlx::query_as::<_, Membership>(
            r#"
            INSERT INTO memberships (project_id, user_id, role)
            VALUES ($1, $2, $3)
            RETURNING project_id, user_id, role, joined_at
            "#,
        )
        .bind(data.project_id)
        .bind(data.user_id)
        .bind(data.role)
        .fetch_one(pool)
        .await
    }

    /// Finds a specific membership
    ///
    /// # Returns
    ///
    /// `Some(Membership)` if the user is a member, `None` otherwise
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn find(
        pool: &PgPool,
        project_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Membership>, sqlx::Error> {
        let membership = sqlx::query_as::<_, Membership>(
            r#"
            SELECT project_id, user_id, role, joined_at
            FROM memberships
            WHERE project_id = $1 AND user_id = $2
            "#,
        )
        .bind(project_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(membership)
    }

    /// Checks whether a user is a member of a project
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn exists(
        pool: &PgPool,
        project_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM memberships WHERE project_id = $1 AND user_id = $2)",
        )
        .bind(project_id)
        .bind(user_id)
        .fetch_one(pool)
        .await?;

        Ok(exists)
    }

    /// Lists all members of a project with their user profiles
    ///
    /// Ordered by join time, owner first in practice since the owner
    /// membership is created with the project.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use syncboard_shared::models::membership::Membership;
    /// # use sqlx::PgPool;
    /// # async fn example(pool: PgPool, project_id: uuid::Uuid) -> Result<(), sqlx::Error> {
    /// for member in Membership::list_members(&pool, project_id).await? {
    ///     println!("{} <{}> ({})", member.name, member.email, member.role.as_str());
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn list_members(
        pool: &PgPool,
        project_id: Uuid,
    ) -> Result<Vec<ProjectMember>, sqlx::Error> {
        let members = sqlx::query_as::<_, ProjectMember>(
            r#"
            SELECT m.user_id, u.name, u.email, m.role, m.joined_at
            FROM memberships m
            JOIN users u ON u.id = m.user_id
            WHERE m.project_id = $1
            ORDER BY m.joined_at ASC
            "#,
        )
        .bind(project_id)
        .fetch_all(pool)
        .await?;

        Ok(members)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_as_str() {
        assert_eq!(MembershipRole::Owner.as_str(), "owner");
        assert_eq!(MembershipRole::Admin.as_str(), "admin");
        assert_eq!(MembershipRole::Member.as_str(), "member");
    }

    #[test]
    fn test_role_grants_admin() {
        assert!(MembershipRole::Owner.grants_admin());
        assert!(MembershipRole::Admin.grants_admin());
        assert!(!MembershipRole::Member.grants_admin());
    }

    #[test]
    fn test_role_serde_lowercase() {
        let json = serde_json::to_string(&MembershipRole::Owner).unwrap();
        assert_eq!(json, "\"owner\"");

        let role: MembershipRole = serde_json::from_str("\"member\"").unwrap();
        assert_eq!(role, MembershipRole::Member);
    }

    #[test]
    fn test_create_membership_struct() {
        let create = CreateMembership {
            project_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            role: MembershipRole::Admin,
        };

        assert_eq!(create.role, MembershipRole::Admin);
    }

    // Integration tests for database operations are in syncboard-api/tests/
}
