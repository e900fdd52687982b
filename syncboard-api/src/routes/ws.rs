/// WebSocket endpoints
///
/// Live update streams for project rooms and personal notification
/// channels. Browsers cannot attach an `Authorization` header to an
/// upgrade request, so both endpoints take the access token as a
/// `?token=` query parameter and reject the upgrade before the
/// handshake when it is missing or invalid.
///
/// # Endpoints
///
/// - `GET /ws/projects/:project_id?token=` - Project room stream
/// - `GET /ws/notifications?token=` - Personal notification stream
///
/// Delivery is at-most-once: slow consumers that fall behind the
/// channel capacity skip messages rather than stall the room.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, Query, State,
    },
    response::Response,
};
use serde::Deserialize;
use std::sync::Arc;
use syncboard_shared::{
    auth::{access, jwt},
    notify::broadcast::{self, BroadcastHub},
};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::broadcast::Receiver;
use uuid::Uuid;

/// Upgrade-request auth query
#[derive(Debug, Deserialize)]
pub struct WsAuthQuery {
    /// Access token, in place of the Authorization header
    pub token: Option<String>,
}

/// Validates the query-parameter token and returns its claims
fn authenticate(secret: &str, query: &WsAuthQuery) -> ApiResult<jwt::Claims> {
    let token = query
        .token
        .as_deref()
        .ok_or_else(|| ApiError::Unauthorized("Missing authentication token".to_string()))?;
    Ok(jwt::validate_access_token(token, secret)?)
}

/// Rejects plain HTTP requests to the socket endpoints
///
/// The upgrade extractor is optional so auth errors take precedence
/// over handshake errors in the response.
fn require_upgrade(ws: Option<WebSocketUpgrade>) -> ApiResult<WebSocketUpgrade> {
    ws.ok_or_else(|| ApiError::BadRequest("Expected WebSocket upgrade".to_string()))
}

/// Join a project's live update room
///
/// # Endpoint
///
/// ```text
/// GET /ws/projects/:project_id?token=<access_token>
/// ```
///
/// Requires project access. Subscribers receive every event published
/// for the project (task status changes, notification fan-out echoes)
/// and may publish JSON frames of their own, which are relayed to the
/// rest of the room verbatim.
///
/// # Errors
///
/// - `400 Bad Request`: Not a WebSocket upgrade request
/// - `401 Unauthorized`: Missing, expired, or malformed token
/// - `403 Forbidden`: Caller is not a member of the project
pub async fn project_socket(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
    Query(query): Query<WsAuthQuery>,
    ws: Option<WebSocketUpgrade>,
) -> ApiResult<Response> {
    let claims = authenticate(state.jwt_secret(), &query)?;
    access::require_access(&state.db, claims.sub, project_id).await?;
    let ws = require_upgrade(ws)?;

    let room = broadcast::project_room(project_id);
    let rx = state.hub.subscribe(&room).await;
    let hub = state.hub.clone();

    tracing::debug!(user_id = %claims.sub, project_id = %project_id, "Project socket connected");

    Ok(ws.on_upgrade(move |socket| run_project_socket(socket, hub, room, rx)))
}

/// Stream notifications for the authenticated user
///
/// # Endpoint
///
/// ```text
/// GET /ws/notifications?token=<access_token>
/// ```
///
/// Pushes one message per notification row written for the user. The
/// channel is read-only; frames sent by the client are drained and
/// dropped.
///
/// # Errors
///
/// - `400 Bad Request`: Not a WebSocket upgrade request
/// - `401 Unauthorized`: Missing, expired, or malformed token
pub async fn notifications_socket(
    State(state): State<AppState>,
    Query(query): Query<WsAuthQuery>,
    ws: Option<WebSocketUpgrade>,
) -> ApiResult<Response> {
    let claims = authenticate(state.jwt_secret(), &query)?;
    let ws = require_upgrade(ws)?;

    let room = broadcast::user_room(claims.sub);
    let rx = state.hub.subscribe(&room).await;

    tracing::debug!(user_id = %claims.sub, "Notification socket connected");

    Ok(ws.on_upgrade(move |socket| run_notifications_socket(socket, room, rx)))
}

async fn run_project_socket(
    mut socket: WebSocket,
    hub: Arc<BroadcastHub>,
    room: String,
    mut rx: Receiver<String>,
) {
    loop {
        tokio::select! {
            pushed = rx.recv() => match pushed {
                Ok(text) => {
                    if socket.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(room = %room, skipped, "Socket fell behind room broadcasts");
                }
                Err(RecvError::Closed) => break,
            },
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    // Only well-formed JSON is relayed to the room.
                    if serde_json::from_str::<serde_json::Value>(&text).is_ok() {
                        hub.publish(&room, text).await;
                    } else {
                        tracing::debug!(room = %room, "Dropped non-JSON client frame");
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(error)) => {
                    tracing::debug!(room = %room, error = %error, "Socket receive error");
                    break;
                }
            },
        }
    }

    tracing::debug!(room = %room, "Project socket closed");
}

async fn run_notifications_socket(mut socket: WebSocket, room: String, mut rx: Receiver<String>) {
    loop {
        tokio::select! {
            pushed = rx.recv() => match pushed {
                Ok(text) => {
                    if socket.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(room = %room, skipped, "Socket fell behind notification pushes");
                }
                Err(RecvError::Closed) => break,
            },
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(error)) => {
                    tracing::debug!(room = %room, error = %error, "Socket receive error");
                    break;
                }
            },
        }
    }

    tracing::debug!(room = %room, "Notification socket closed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use syncboard_shared::auth::jwt::{create_token, Claims, TokenType};

    const SECRET: &str = "ws-test-secret-with-enough-length!!";

    #[test]
    fn test_authenticate_rejects_missing_token() {
        let query = WsAuthQuery { token: None };
        let err = authenticate(SECRET, &query).unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }

    #[test]
    fn test_authenticate_rejects_garbage_token() {
        let query = WsAuthQuery {
            token: Some("not-a-jwt".to_string()),
        };
        let err = authenticate(SECRET, &query).unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }

    #[test]
    fn test_authenticate_accepts_valid_access_token() {
        let user_id = Uuid::new_v4();
        let claims = Claims::new(user_id, "ws@example.com".to_string(), TokenType::Access);
        let token = create_token(&claims, SECRET).unwrap();

        let query = WsAuthQuery { token: Some(token) };
        let verified = authenticate(SECRET, &query).unwrap();
        assert_eq!(verified.sub, user_id);
        assert_eq!(verified.email, "ws@example.com");
    }

    #[test]
    fn test_authenticate_rejects_refresh_token() {
        let claims = Claims::new(Uuid::new_v4(), "ws@example.com".to_string(), TokenType::Refresh);
        let token = create_token(&claims, SECRET).unwrap();

        let query = WsAuthQuery { token: Some(token) };
        assert!(matches!(
            authenticate(SECRET, &query).unwrap_err(),
            ApiError::Unauthorized(_)
        ));
    }
}
