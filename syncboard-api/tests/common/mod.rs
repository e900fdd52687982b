/// Common test utilities for integration tests
///
/// This module provides shared infrastructure for integration tests:
/// - Test database setup and migrations
/// - Seeded owner user and project
/// - JWT token generation
/// - Captured outbound email via the mock mailer
///
/// The tests need a PostgreSQL database; `try_context` skips the test
/// with a notice when `DATABASE_URL` is not set.

use sqlx::PgPool;
use std::sync::{Arc, Mutex};
use syncboard_api::app::{build_router, AppState};
use syncboard_api::config::{ApiConfig, Config, DatabaseConfig, JwtConfig, SmtpConfig};
use syncboard_shared::auth::jwt::{create_token, Claims, TokenType};
use syncboard_shared::auth::password::hash_password;
use syncboard_shared::models::membership::{CreateMembership, Membership, MembershipRole};
use syncboard_shared::models::project::{CreateProject, Project};
use syncboard_shared::models::task::{CreateTask, Task};
use syncboard_shared::models::user::{CreateUser, User};
use syncboard_shared::notify::mailer::{Mailer, MockMailer};
use uuid::Uuid;

/// Test context containing all necessary resources
pub struct TestContext {
    pub db: PgPool,
    pub app: axum::Router,
    pub config: Config,
    pub mailer: Arc<MockMailer>,
    pub user: User,
    pub project: Project,
    pub token: String,
    seeded_users: Mutex<Vec<Uuid>>,
}

/// Builds a test context, or skips the calling test with a notice when
/// `DATABASE_URL` is not set
pub async fn try_context() -> Option<TestContext> {
    match std::env::var("DATABASE_URL") {
        Ok(url) => Some(
            TestContext::new(url)
                .await
                .expect("test context setup failed"),
        ),
        Err(_) => {
            eprintln!("skipping integration test: DATABASE_URL is not set");
            None
        }
    }
}

impl TestContext {
    /// Creates a new test context with a fresh pool and seeded data
    pub async fn new(database_url: String) -> anyhow::Result<Self> {
        let config = test_config(database_url);

        let db = PgPool::connect(&config.database.url).await?;

        // Run migrations (path relative to Cargo.toml, not this file)
        sqlx::migrate!("../migrations").run(&db).await?;

        // Seed an owner and a project; project creation also inserts
        // the owner membership
        let user = User::create(
            &db,
            CreateUser {
                name: "Test Owner".to_string(),
                email: format!("owner-{}@syncboard.test", Uuid::new_v4()),
                password_hash: hash_password("owner-password")?,
            },
        )
        .await?;

        let project = Project::create(
            &db,
            CreateProject {
                name: format!("Test Project {}", Uuid::new_v4()),
                description: Some("Integration test project".to_string()),
                owner_id: user.id,
            },
        )
        .await?;

        // Generate JWT token for the owner
        let claims = Claims::new(user.id, user.email.clone(), TokenType::Access);
        let token = create_token(&claims, &config.jwt.secret)?;

        // Build app with a capturing mailer
        let mailer = Arc::new(MockMailer::new());
        let state = AppState::with_mailer(
            db.clone(),
            config.clone(),
            mailer.clone() as Arc<dyn Mailer>,
        );
        let app = build_router(state);

        let seeded_users = Mutex::new(vec![user.id]);

        Ok(TestContext {
            db,
            app,
            config,
            mailer,
            user,
            project,
            token,
            seeded_users,
        })
    }

    /// Returns authorization header value for the seeded owner
    pub fn auth_header(&self) -> String {
        format!("Bearer {}", self.token)
    }

    /// Mints an access token for an arbitrary user
    pub fn token_for(&self, user: &User) -> String {
        let claims = Claims::new(user.id, user.email.clone(), TokenType::Access);
        create_token(&claims, &self.config.jwt.secret).expect("token creation failed")
    }

    /// Seeds another user with a unique email
    pub async fn create_user(&self, name: &str) -> User {
        let slug = name.to_lowercase().replace(' ', "-");
        let user = User::create(
            &self.db,
            CreateUser {
                name: name.to_string(),
                email: format!("{}-{}@syncboard.test", slug, Uuid::new_v4()),
                password_hash: hash_password("member-password").expect("hashing failed"),
            },
        )
        .await
        .expect("user creation failed");

        self.seeded_users.lock().unwrap().push(user.id);
        user
    }

    /// Adds a user to the seeded project directly, bypassing the API
    pub async fn add_member(&self, user_id: Uuid, role: MembershipRole) -> Membership {
        Membership::create(
            &self.db,
            CreateMembership {
                project_id: self.project.id,
                user_id,
                role,
            },
        )
        .await
        .expect("membership creation failed")
    }

    /// Seeds a task in the seeded project, created by the owner
    pub async fn create_task(&self, title: &str, assignee_id: Option<Uuid>) -> Task {
        Task::create(
            &self.db,
            CreateTask {
                project_id: self.project.id,
                title: title.to_string(),
                description: None,
                assignee_id,
                due_date: None,
                created_by: self.user.id,
            },
        )
        .await
        .expect("task creation failed")
    }

    /// Cleans up test data
    ///
    /// Deleting the seeded users cascades their projects, memberships,
    /// tasks, comments, and notifications.
    pub async fn cleanup(&self) -> anyhow::Result<()> {
        let ids: Vec<Uuid> = self.seeded_users.lock().unwrap().drain(..).collect();
        sqlx::query("DELETE FROM users WHERE id = ANY($1)")
            .bind(&ids)
            .execute(&self.db)
            .await?;
        Ok(())
    }
}

/// Fixed configuration so tests only need `DATABASE_URL` from the
/// environment
fn test_config(database_url: String) -> Config {
    Config {
        api: ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors_origins: Vec::new(),
        },
        database: DatabaseConfig {
            url: database_url,
            max_connections: 5,
        },
        jwt: JwtConfig {
            secret: "integration-test-secret-0123456789abcdef".to_string(),
            expiry_minutes: 30,
        },
        smtp: SmtpConfig {
            from: "noreply@syncboard.dev".to_string(),
        },
    }
}

/// Reads a response body as JSON
pub async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body read failed");
    serde_json::from_slice(&bytes).expect("body was not JSON")
}
