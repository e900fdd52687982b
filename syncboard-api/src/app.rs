/// Application state and router assembly
///
/// `AppState` carries everything handlers need (pool, config, broadcast
/// hub, notification fan-out); `build_router` wires the route groups and
/// the middleware stack around it.
///
/// # Example
///
/// ```no_run
/// use syncboard_api::{app::AppState, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config);
/// let app = syncboard_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::config::Config;
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post, put},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use syncboard_shared::auth::middleware::create_jwt_middleware;
use syncboard_shared::notify::broadcast::BroadcastHub;
use syncboard_shared::notify::fanout::NotificationFanout;
use syncboard_shared::notify::mailer::{LogMailer, Mailer};
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

/// Shared application state
///
/// Cloned into every handler through Axum's `State` extractor; all
/// fields are cheap handles.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Live-update broadcast hub
    pub hub: Arc<BroadcastHub>,

    /// Notification fan-out for committed domain events
    pub fanout: NotificationFanout,
}

impl AppState {
    /// Creates new application state with the log-only mailer
    pub fn new(db: PgPool, config: Config) -> Self {
        let mailer: Arc<dyn Mailer> = Arc::new(LogMailer::new(config.smtp.from.clone()));
        Self::with_mailer(db, config, mailer)
    }

    /// Creates application state with an injected mailer
    ///
    /// Tests pass a recording mailer here to assert on outbound email.
    pub fn with_mailer(db: PgPool, config: Config, mailer: Arc<dyn Mailer>) -> Self {
        let hub = Arc::new(BroadcastHub::new());
        let fanout = NotificationFanout::new(db.clone(), mailer, Arc::clone(&hub));

        Self {
            db,
            config: Arc::new(config),
            hub,
            fanout,
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the CORS layer from the configured origin list
///
/// No origins (or an explicit "*") selects the permissive development
/// policy; anything else becomes an allow-list with credentials.
fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(3600))
}

/// Builds the complete Axum router
///
/// # Route Map
///
/// ```text
/// /
/// ├── /health                       # Health check (public)
/// ├── /api/v1/                      # JSON API (versioned)
/// │   ├── /auth/                    # register, login, refresh (public)
/// │   │                             # logout, me, verify-token (authenticated)
/// │   ├── /projects/                # CRUD, members, progress
/// │   ├── /tasks/                   # CRUD, status transitions
/// │   ├── /comments/                # threaded comments
/// │   └── /notifications/           # in-app notifications
/// └── /ws/                          # WebSocket upgrades (?token= auth)
///     ├── /projects/:project_id     # project room
///     └── /notifications            # personal notification stream
/// ```
///
/// Request logging and CORS wrap the whole tree; JWT authentication is
/// attached per route group so the public auth endpoints stay open.
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let require_auth =
        axum::middleware::from_fn(create_jwt_middleware(state.config.jwt.secret.clone()));

    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    // register/login/refresh are public, the rest need a token
    let auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/refresh", post(routes::auth::refresh))
        .merge(
            Router::new()
                .route("/logout", post(routes::auth::logout))
                .route("/me", get(routes::auth::me))
                .route("/verify-token", post(routes::auth::verify_token))
                .layer(require_auth.clone()),
        );

    let project_routes = Router::new()
        .route(
            "/",
            get(routes::projects::list_projects).post(routes::projects::create_project),
        )
        .route(
            "/:id",
            get(routes::projects::get_project)
                .put(routes::projects::update_project)
                .delete(routes::projects::delete_project),
        )
        .route(
            "/:id/members",
            get(routes::projects::list_members).post(routes::projects::add_member),
        )
        .route("/:id/progress", get(routes::projects::project_progress))
        .layer(require_auth.clone());

    let task_routes = Router::new()
        .route(
            "/project/:project_id",
            get(routes::tasks::list_tasks).post(routes::tasks::create_task),
        )
        .route(
            "/:id",
            get(routes::tasks::get_task)
                .put(routes::tasks::update_task)
                .delete(routes::tasks::delete_task),
        )
        .route("/:id/status", put(routes::tasks::update_task_status))
        .layer(require_auth.clone());

    let comment_routes = Router::new()
        .route(
            "/",
            get(routes::comments::list_comments).post(routes::comments::create_comment),
        )
        .layer(require_auth.clone());

    let notification_routes = Router::new()
        .route("/", get(routes::notifications::list_notifications))
        .route("/mark-read", put(routes::notifications::mark_read))
        .route("/unread-count", get(routes::notifications::unread_count))
        .layer(require_auth);

    let v1_routes = Router::new()
        .nest("/auth", auth_routes)
        .nest("/projects", project_routes)
        .nest("/tasks", task_routes)
        .nest("/comments", comment_routes)
        .nest("/notifications", notification_routes);

    // WebSocket upgrades authenticate via ?token= inside the handlers,
    // browsers cannot set an Authorization header on the upgrade request.
    let ws_routes = Router::new()
        .route("/projects/:project_id", get(routes::ws::project_socket))
        .route("/notifications", get(routes::ws::notifications_socket));

    let trace = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));
    let cors = cors_layer(&state.config.api.cors_origins);

    Router::new()
        .merge(health_routes)
        .nest("/api/v1", v1_routes)
        .nest("/ws", ws_routes)
        .layer(trace)
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ApiConfig, DatabaseConfig, JwtConfig, SmtpConfig};
    use sqlx::postgres::PgPoolOptions;

    fn test_config() -> Config {
        Config {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 8000,
                cors_origins: Vec::new(),
            },
            database: DatabaseConfig {
                url: "postgresql://localhost/syncboard_test".to_string(),
                max_connections: 2,
            },
            jwt: JwtConfig {
                secret: "test-secret-key-at-least-32-bytes-long".to_string(),
                expiry_minutes: 30,
            },
            smtp: SmtpConfig {
                from: "noreply@syncboard.dev".to_string(),
            },
        }
    }

    #[tokio::test]
    async fn test_router_builds_without_connecting() {
        let config = test_config();
        let pool = PgPoolOptions::new()
            .connect_lazy(&config.database.url)
            .unwrap();

        let state = AppState::new(pool, config);
        let _router = build_router(state);
    }
}
