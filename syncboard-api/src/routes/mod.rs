/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Authentication endpoints (register, login, refresh)
/// - `projects`: Project CRUD, membership, and progress endpoints
/// - `tasks`: Task CRUD and status endpoints
/// - `comments`: Threaded comment endpoints
/// - `notifications`: Notification inbox endpoints
/// - `ws`: WebSocket upgrade endpoints for live updates

pub mod health;
pub mod auth;
pub mod projects;
pub mod tasks;
pub mod comments;
pub mod notifications;
pub mod ws;
