/// Integration tests for the SyncBoard API
///
/// These tests verify the full system works end-to-end:
/// - Registration, login, and token refresh
/// - Project CRUD with owner-by-construction membership
/// - Member management and its notification fan-out
/// - Task lifecycle and the assignee-only status gate
/// - Completion email delivery to the project owner
/// - Threaded comments and their attachment rules
/// - The per-user notification inbox
///
/// All tests need `DATABASE_URL`; they skip with a notice otherwise.

mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use common::{body_json, TestContext};
use serde_json::json;
use syncboard_shared::models::membership::MembershipRole;
use syncboard_shared::models::notification::Notification;
use syncboard_shared::models::task::{Task, TaskStatus};
use tower::ServiceExt as _;
use uuid::Uuid;

fn get(ctx: &TestContext, uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header(header::AUTHORIZATION, ctx.auth_header())
        .body(Body::empty())
        .unwrap()
}

fn json_request(method: &str, uri: &str, token: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Test registration, login, and the authenticated profile endpoint
#[tokio::test]
async fn test_register_login_and_me() {
    let Some(ctx) = common::try_context().await else {
        return;
    };

    let email = format!("register-{}@syncboard.test", Uuid::new_v4());
    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/auth/register")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({
                "name": "Fresh User",
                "email": email,
                "password": "hunter2-but-longer"
            })
            .to_string(),
        ))
        .unwrap();

    let response = ctx.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = body_json(response).await;
    assert_eq!(body["user"]["email"], email);
    assert_eq!(body["token_type"], "bearer");
    assert!(body["access_token"].is_string());
    assert!(body["refresh_token"].is_string());
    // The password hash must never appear in a response
    assert!(body["user"].get("password_hash").is_none());

    // Log in with the same credentials
    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({ "email": email, "password": "hunter2-but-longer" }).to_string(),
        ))
        .unwrap();

    let response = ctx.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let access_token = body["access_token"].as_str().unwrap().to_string();

    // Use the issued token on the profile endpoint
    let request = Request::builder()
        .method("GET")
        .uri("/api/v1/auth/me")
        .header(header::AUTHORIZATION, format!("Bearer {access_token}"))
        .body(Body::empty())
        .unwrap();

    let response = ctx.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["email"], email);

    // Remove the registered user; it was created through the API
    sqlx::query("DELETE FROM users WHERE email = $1")
        .bind(&email)
        .execute(&ctx.db)
        .await
        .unwrap();
    ctx.cleanup().await.unwrap();
}

/// Test that a duplicate email registration is rejected with a conflict
#[tokio::test]
async fn test_register_duplicate_email_conflict() {
    let Some(ctx) = common::try_context().await else {
        return;
    };

    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/auth/register")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({
                "name": "Copycat",
                "email": ctx.user.email,
                "password": "another-password"
            })
            .to_string(),
        ))
        .unwrap();

    let response = ctx.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let body = body_json(response).await;
    assert_eq!(body["message"], "Email already registered");

    ctx.cleanup().await.unwrap();
}

/// Test that a wrong password is rejected without leaking which part failed
#[tokio::test]
async fn test_login_wrong_password_unauthorized() {
    let Some(ctx) = common::try_context().await else {
        return;
    };

    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({ "email": ctx.user.email, "password": "wrong-password" }).to_string(),
        ))
        .unwrap();

    let response = ctx.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = body_json(response).await;
    assert_eq!(body["message"], "Invalid email or password");

    ctx.cleanup().await.unwrap();
}

/// Test the refresh flow and token verification
#[tokio::test]
async fn test_refresh_token_flow() {
    let Some(ctx) = common::try_context().await else {
        return;
    };

    let email = format!("refresh-{}@syncboard.test", Uuid::new_v4());
    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/auth/register")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({
                "name": "Refresh User",
                "email": email,
                "password": "refresh-password"
            })
            .to_string(),
        ))
        .unwrap();

    let response = ctx.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    let refresh_token = body["refresh_token"].as_str().unwrap().to_string();

    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/auth/refresh")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "refresh_token": refresh_token }).to_string()))
        .unwrap();

    let response = ctx.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let access_token = body["access_token"].as_str().unwrap().to_string();
    assert_eq!(body["token_type"], "bearer");

    // An access token cannot be used as a refresh token
    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/auth/refresh")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "refresh_token": access_token.clone() }).to_string()))
        .unwrap();
    let response = ctx.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // The refreshed access token passes verification
    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/auth/verify-token")
        .header(header::AUTHORIZATION, format!("Bearer {access_token}"))
        .body(Body::empty())
        .unwrap();

    let response = ctx.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["valid"], true);
    assert_eq!(body["email"], email);

    sqlx::query("DELETE FROM users WHERE email = $1")
        .bind(&email)
        .execute(&ctx.db)
        .await
        .unwrap();
    ctx.cleanup().await.unwrap();
}

/// Test authentication requirement on protected routes
#[tokio::test]
async fn test_authentication_required() {
    let Some(ctx) = common::try_context().await else {
        return;
    };

    // No authorization header
    let request = Request::builder()
        .method("GET")
        .uri("/api/v1/projects/")
        .body(Body::empty())
        .unwrap();
    let response = ctx.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Malformed header
    let request = Request::builder()
        .method("GET")
        .uri("/api/v1/projects/")
        .header(header::AUTHORIZATION, "Token abcdef")
        .body(Body::empty())
        .unwrap();
    let response = ctx.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    ctx.cleanup().await.unwrap();
}

/// Test the unauthenticated health endpoint
#[tokio::test]
async fn test_health_endpoint() {
    let Some(ctx) = common::try_context().await else {
        return;
    };

    let request = Request::builder()
        .method("GET")
        .uri("/health")
        .body(Body::empty())
        .unwrap();

    let response = ctx.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "connected");

    ctx.cleanup().await.unwrap();
}

/// Test project CRUD and the owner membership created alongside
#[tokio::test]
async fn test_project_crud_and_owner_membership() {
    let Some(ctx) = common::try_context().await else {
        return;
    };

    let request = json_request(
        "POST",
        "/api/v1/projects/",
        &ctx.token,
        json!({ "name": "Launch Plan", "description": "Q3 launch" }),
    );
    let response = ctx.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    let project_id = body["id"].as_str().unwrap().to_string();

    // The creator is the sole member, with the owner role
    let response = ctx
        .app
        .clone()
        .oneshot(get(&ctx, &format!("/api/v1/projects/{project_id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["name"], "Launch Plan");
    let members = body["members"].as_array().unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0]["user_id"], ctx.user.id.to_string());
    assert_eq!(members[0]["role"], "owner");

    // The owner role implies admin, so updates go through
    let request = json_request(
        "PUT",
        &format!("/api/v1/projects/{project_id}"),
        &ctx.token,
        json!({ "name": "Launch Plan v2" }),
    );
    let response = ctx.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["name"], "Launch Plan v2");

    // Listing includes both the seeded and the new project
    let response = ctx
        .app
        .clone()
        .oneshot(get(&ctx, "/api/v1/projects/"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body.as_array().unwrap().len() >= 2);

    // Delete and confirm access is gone
    let request = Request::builder()
        .method("DELETE")
        .uri(format!("/api/v1/projects/{project_id}"))
        .header(header::AUTHORIZATION, ctx.auth_header())
        .body(Body::empty())
        .unwrap();
    let response = ctx.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = ctx
        .app
        .clone()
        .oneshot(get(&ctx, &format!("/api/v1/projects/{project_id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    ctx.cleanup().await.unwrap();
}

/// Test that a non-member can neither read nor delete a project
#[tokio::test]
async fn test_non_member_has_no_access() {
    let Some(ctx) = common::try_context().await else {
        return;
    };

    let outsider = ctx.create_user("Outsider").await;
    let outsider_token = ctx.token_for(&outsider);

    let uri = format!("/api/v1/projects/{}", ctx.project.id);
    let request = Request::builder()
        .method("GET")
        .uri(&uri)
        .header(header::AUTHORIZATION, format!("Bearer {outsider_token}"))
        .body(Body::empty())
        .unwrap();
    let response = ctx.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let request = Request::builder()
        .method("DELETE")
        .uri(&uri)
        .header(header::AUTHORIZATION, format!("Bearer {outsider_token}"))
        .body(Body::empty())
        .unwrap();
    let response = ctx.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    ctx.cleanup().await.unwrap();
}

/// Test that only the owner can delete, even though admins can update
#[tokio::test]
async fn test_only_owner_deletes_project() {
    let Some(ctx) = common::try_context().await else {
        return;
    };

    let admin = ctx.create_user("Admin Member").await;
    ctx.add_member(admin.id, MembershipRole::Admin).await;
    let admin_token = ctx.token_for(&admin);

    let uri = format!("/api/v1/projects/{}", ctx.project.id);

    // Admin update is allowed
    let request = json_request("PUT", &uri, &admin_token, json!({ "name": "Renamed" }));
    let response = ctx.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Admin delete is not
    let request = Request::builder()
        .method("DELETE")
        .uri(&uri)
        .header(header::AUTHORIZATION, format!("Bearer {admin_token}"))
        .body(Body::empty())
        .unwrap();
    let response = ctx.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Only the project owner can delete the project");

    ctx.cleanup().await.unwrap();
}

/// Test member management and the exact notification rows it writes
///
/// With owner X and member Y in place, X adding Z must notify Z once
/// ("Added to Project"), Y once ("New Team Member"), X not at all, and
/// send no email.
#[tokio::test]
async fn test_add_member_notification_fanout() {
    let Some(ctx) = common::try_context().await else {
        return;
    };

    let existing = ctx.create_user("Existing Member").await;
    ctx.add_member(existing.id, MembershipRole::Member).await;
    let newcomer = ctx.create_user("New Colleague").await;

    let uri = format!("/api/v1/projects/{}/members", ctx.project.id);
    let request = json_request(
        "POST",
        &uri,
        &ctx.token,
        json!({ "email": newcomer.email, "role": "member" }),
    );
    let response = ctx.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let newcomer_rows = Notification::list_recent(&ctx.db, newcomer.id, 50).await.unwrap();
    assert_eq!(newcomer_rows.len(), 1);
    assert_eq!(newcomer_rows[0].title, "Added to Project");

    let existing_rows = Notification::list_recent(&ctx.db, existing.id, 50).await.unwrap();
    assert_eq!(existing_rows.len(), 1);
    assert_eq!(existing_rows[0].title, "New Team Member");
    assert!(existing_rows[0].body.contains("New Colleague"));

    let owner_rows = Notification::list_recent(&ctx.db, ctx.user.id, 50).await.unwrap();
    assert!(owner_rows.is_empty());

    // Membership changes never email anyone
    assert_eq!(ctx.mailer.sent_count(), 0);

    // Adding the same member again conflicts
    let request = json_request(
        "POST",
        &uri,
        &ctx.token,
        json!({ "email": newcomer.email }),
    );
    let response = ctx.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // An unknown email is a 404, and the owner role cannot be granted
    let request = json_request(
        "POST",
        &uri,
        &ctx.token,
        json!({ "email": "nobody@syncboard.test" }),
    );
    let response = ctx.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let request = json_request(
        "POST",
        &uri,
        &ctx.token,
        json!({ "email": existing.email, "role": "owner" }),
    );
    let response = ctx.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    ctx.cleanup().await.unwrap();
}

/// Test task creation, assignment notification, update, and delete rules
#[tokio::test]
async fn test_task_lifecycle() {
    let Some(ctx) = common::try_context().await else {
        return;
    };

    let member = ctx.create_user("Task Member").await;
    ctx.add_member(member.id, MembershipRole::Member).await;

    // Create with an assignee: the assignee is notified and emailed
    let uri = format!("/api/v1/tasks/project/{}", ctx.project.id);
    let request = json_request(
        "POST",
        &uri,
        &ctx.token,
        json!({
            "title": "Write onboarding docs",
            "description": "Cover the first-run flow",
            "assignee_id": member.id
        }),
    );
    let response = ctx.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["status"], "todo");
    let task_id = body["id"].as_str().unwrap().to_string();

    let rows = Notification::list_recent(&ctx.db, member.id, 50).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].title, "New Task Assigned");

    let emails = ctx.mailer.sent();
    assert_eq!(emails.len(), 1);
    assert_eq!(emails[0].to, member.email);
    assert_eq!(emails[0].subject, "New Task Assigned: Write onboarding docs");
    assert!(emails[0].is_html);

    // Project task listing includes it
    let response = ctx.app.clone().oneshot(get(&ctx, &uri)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    // Update the title without touching the assignee
    let request = json_request(
        "PUT",
        &format!("/api/v1/tasks/{task_id}"),
        &ctx.token,
        json!({ "title": "Write onboarding guide" }),
    );
    let response = ctx.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["title"], "Write onboarding guide");
    assert_eq!(body["assignee_id"], member.id.to_string());

    // No reassignment happened, so no second assignment notification
    let rows = Notification::list_recent(&ctx.db, member.id, 50).await.unwrap();
    assert_eq!(rows.len(), 1);

    // A plain member cannot delete the task
    let request = Request::builder()
        .method("DELETE")
        .uri(format!("/api/v1/tasks/{task_id}"))
        .header(header::AUTHORIZATION, format!("Bearer {}", ctx.token_for(&member)))
        .body(Body::empty())
        .unwrap();
    let response = ctx.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // The owner (admin by construction) can
    let request = Request::builder()
        .method("DELETE")
        .uri(format!("/api/v1/tasks/{task_id}"))
        .header(header::AUTHORIZATION, ctx.auth_header())
        .body(Body::empty())
        .unwrap();
    let response = ctx.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    ctx.cleanup().await.unwrap();
}

/// Test that reassignment notifies the new assignee exactly once
#[tokio::test]
async fn test_reassignment_notifies_new_assignee() {
    let Some(ctx) = common::try_context().await else {
        return;
    };

    let member = ctx.create_user("Second Assignee").await;
    ctx.add_member(member.id, MembershipRole::Member).await;
    let task = ctx.create_task("Rotate on-call", None).await;

    let request = json_request(
        "PUT",
        &format!("/api/v1/tasks/{}", task.id),
        &ctx.token,
        json!({ "assignee_id": member.id }),
    );
    let response = ctx.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let rows = Notification::list_recent(&ctx.db, member.id, 50).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].title, "New Task Assigned");

    // Clearing the assignee notifies nobody
    let request = json_request(
        "PUT",
        &format!("/api/v1/tasks/{}", task.id),
        &ctx.token,
        json!({ "assignee_id": null }),
    );
    let response = ctx.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body["assignee_id"].is_null());

    let rows = Notification::list_recent(&ctx.db, member.id, 50).await.unwrap();
    assert_eq!(rows.len(), 1);

    ctx.cleanup().await.unwrap();
}

/// Test that only the assignee may change a task's status
#[tokio::test]
async fn test_status_update_assignee_gate() {
    let Some(ctx) = common::try_context().await else {
        return;
    };

    let assignee = ctx.create_user("Assignee").await;
    ctx.add_member(assignee.id, MembershipRole::Member).await;
    let task = ctx.create_task("Fix the flaky test", Some(assignee.id)).await;
    let uri = format!("/api/v1/tasks/{}/status", task.id);

    // The owner is not the assignee, so even they are rejected
    let request = json_request("PUT", &uri, &ctx.token, json!({ "status": "in_progress" }));
    let response = ctx.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response).await;
    assert_eq!(
        body["message"],
        "Only the assigned user can update the task status"
    );

    // The assignee succeeds
    let assignee_token = ctx.token_for(&assignee);
    let request = json_request("PUT", &uri, &assignee_token, json!({ "status": "in_progress" }));
    let response = ctx.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "in_progress");

    // An unassigned task can be updated by nobody
    let unassigned = ctx.create_task("Unowned chore", None).await;
    let request = json_request(
        "PUT",
        &format!("/api/v1/tasks/{}/status", unassigned.id),
        &ctx.token,
        json!({ "status": "done" }),
    );
    let response = ctx.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    ctx.cleanup().await.unwrap();
}

/// Test that any status can move to any other status, including itself
#[tokio::test]
async fn test_status_transitions_are_total() {
    let Some(ctx) = common::try_context().await else {
        return;
    };

    let task = ctx.create_task("Revise the roadmap", Some(ctx.user.id)).await;
    let uri = format!("/api/v1/tasks/{}/status", task.id);

    // The sequence includes a same-value update and a backwards move
    for status in ["done", "done", "todo"] {
        let request = json_request("PUT", &uri, &ctx.token, json!({ "status": status }));
        let response = ctx.app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], status);
    }

    let response = ctx
        .app
        .clone()
        .oneshot(get(&ctx, &format!("/api/v1/tasks/{}", task.id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "todo");

    ctx.cleanup().await.unwrap();
}

/// Test that completing a task emails exactly the project owner
#[tokio::test]
async fn test_completion_emails_owner() {
    let Some(ctx) = common::try_context().await else {
        return;
    };

    let assignee = ctx.create_user("Finisher").await;
    ctx.add_member(assignee.id, MembershipRole::Member).await;
    let task = ctx.create_task("Ship the beta", Some(assignee.id)).await;
    let assignee_token = ctx.token_for(&assignee);
    let uri = format!("/api/v1/tasks/{}/status", task.id);

    // Moving to in_progress notifies members but sends no email
    let request = json_request("PUT", &uri, &assignee_token, json!({ "status": "in_progress" }));
    let response = ctx.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(ctx.mailer.sent_count(), 0);

    // Completion emails the owner
    let request = json_request("PUT", &uri, &assignee_token, json!({ "status": "done" }));
    let response = ctx.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let emails = ctx.mailer.sent();
    assert_eq!(emails.len(), 1);
    assert_eq!(emails[0].to, ctx.user.email);
    assert_eq!(emails[0].subject, "Task Status Update: Ship the beta");

    // The owner also got the in-app rows for both transitions
    let owner_rows = Notification::list_recent(&ctx.db, ctx.user.id, 50).await.unwrap();
    let status_rows: Vec<_> = owner_rows
        .iter()
        .filter(|n| n.title == "Task Status Update")
        .collect();
    assert_eq!(status_rows.len(), 2);
    assert!(status_rows[0].body.contains("completed task"));

    // The updater never notifies themselves
    let assignee_rows = Notification::list_recent(&ctx.db, assignee.id, 50).await.unwrap();
    assert!(assignee_rows.iter().all(|n| n.title != "Task Status Update"));

    ctx.cleanup().await.unwrap();
}

/// Test that an owner completing their own task triggers no email
#[tokio::test]
async fn test_owner_completing_own_task_sends_no_email() {
    let Some(ctx) = common::try_context().await else {
        return;
    };

    let task = ctx.create_task("Solo errand", Some(ctx.user.id)).await;
    let request = json_request(
        "PUT",
        &format!("/api/v1/tasks/{}/status", task.id),
        &ctx.token,
        json!({ "status": "done" }),
    );
    let response = ctx.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    assert_eq!(ctx.mailer.sent_count(), 0);

    ctx.cleanup().await.unwrap();
}

/// Test threaded comments and the one-attachment rule
#[tokio::test]
async fn test_comments_tree_and_attachment_rule() {
    let Some(ctx) = common::try_context().await else {
        return;
    };

    let member = ctx.create_user("Commenter").await;
    ctx.add_member(member.id, MembershipRole::Member).await;
    let task = ctx.create_task("Review the mockups", None).await;

    // Owner posts a top-level comment on the task
    let request = json_request(
        "POST",
        "/api/v1/comments/",
        &ctx.token,
        json!({ "task_id": task.id, "content": "First pass looks good" }),
    );
    let response = ctx.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    let parent_id = body["id"].as_str().unwrap().to_string();

    // Member replies
    let request = json_request(
        "POST",
        "/api/v1/comments/",
        &ctx.token_for(&member),
        json!({
            "task_id": task.id,
            "parent_comment_id": parent_id,
            "content": "Agreed, shipping it"
        }),
    );
    let response = ctx.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    // The listing nests the reply under its parent
    let response = ctx
        .app
        .clone()
        .oneshot(get(&ctx, &format!("/api/v1/comments/?task_id={}", task.id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let tree = body.as_array().unwrap();
    assert_eq!(tree.len(), 1);
    assert_eq!(tree[0]["content"], "First pass looks good");
    assert_eq!(tree[0]["author_name"], ctx.user.name);
    let replies = tree[0]["replies"].as_array().unwrap();
    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0]["content"], "Agreed, shipping it");

    // The owner's comment notified the member, not the author
    let member_rows = Notification::list_recent(&ctx.db, member.id, 50).await.unwrap();
    assert!(member_rows.iter().any(|n| n.title == "New Comment"));

    // Neither or both attachments is a bad request
    let request = json_request(
        "POST",
        "/api/v1/comments/",
        &ctx.token,
        json!({ "content": "floating comment" }),
    );
    let response = ctx.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let request = json_request(
        "POST",
        "/api/v1/comments/",
        &ctx.token,
        json!({
            "project_id": ctx.project.id,
            "task_id": task.id,
            "content": "doubly attached"
        }),
    );
    let response = ctx.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = ctx
        .app
        .clone()
        .oneshot(get(&ctx, "/api/v1/comments/"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    ctx.cleanup().await.unwrap();
}

/// Test the notification inbox, mark-read scoping, and unread counts
#[tokio::test]
async fn test_notification_inbox_and_mark_read() {
    let Some(ctx) = common::try_context().await else {
        return;
    };

    let member = ctx.create_user("Inbox Owner").await;

    // Adding the member through the API seeds their inbox
    let request = json_request(
        "POST",
        &format!("/api/v1/projects/{}/members", ctx.project.id),
        &ctx.token,
        json!({ "email": member.email }),
    );
    let response = ctx.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let member_token = ctx.token_for(&member);
    let request = Request::builder()
        .method("GET")
        .uri("/api/v1/notifications/")
        .header(header::AUTHORIZATION, format!("Bearer {member_token}"))
        .body(Body::empty())
        .unwrap();
    let response = ctx.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let rows = body.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["title"], "Added to Project");
    assert_eq!(rows[0]["project_name"], ctx.project.name);
    assert_eq!(rows[0]["is_read"], false);
    let notification_id = rows[0]["id"].as_str().unwrap().to_string();

    let request = Request::builder()
        .method("GET")
        .uri("/api/v1/notifications/unread-count")
        .header(header::AUTHORIZATION, format!("Bearer {member_token}"))
        .body(Body::empty())
        .unwrap();
    let response = ctx.app.clone().oneshot(request).await.unwrap();
    let body = body_json(response).await;
    assert_eq!(body["unread_count"], 1);

    // Another user cannot mark the member's rows
    let request = json_request(
        "PUT",
        "/api/v1/notifications/mark-read",
        &ctx.token,
        json!({ "notification_ids": [notification_id] }),
    );
    let response = ctx.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["updated"], 0);

    // The recipient can
    let request = json_request(
        "PUT",
        "/api/v1/notifications/mark-read",
        &member_token,
        json!({ "notification_ids": [notification_id] }),
    );
    let response = ctx.app.clone().oneshot(request).await.unwrap();
    let body = body_json(response).await;
    assert_eq!(body["updated"], 1);

    let request = Request::builder()
        .method("GET")
        .uri("/api/v1/notifications/unread-count")
        .header(header::AUTHORIZATION, format!("Bearer {member_token}"))
        .body(Body::empty())
        .unwrap();
    let response = ctx.app.clone().oneshot(request).await.unwrap();
    let body = body_json(response).await;
    assert_eq!(body["unread_count"], 0);

    ctx.cleanup().await.unwrap();
}

/// Test the project progress aggregate endpoint
#[tokio::test]
async fn test_project_progress() {
    let Some(ctx) = common::try_context().await else {
        return;
    };

    let done = ctx.create_task("Finished work", Some(ctx.user.id)).await;
    Task::update_status(&ctx.db, done.id, TaskStatus::Done).await.unwrap();
    ctx.create_task("Pending work", None).await;
    ctx.create_task("More pending work", None).await;

    let response = ctx
        .app
        .clone()
        .oneshot(get(&ctx, &format!("/api/v1/projects/{}/progress", ctx.project.id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["total_tasks"], 3);
    assert_eq!(body["completed_tasks"], 1);
    assert_eq!(body["todo_tasks"], 2);
    assert_eq!(body["completion_percentage"], 33.33);

    ctx.cleanup().await.unwrap();
}

/// Test WebSocket endpoint auth without completing a handshake
///
/// Auth runs before the upgrade, so a plain GET exercises the token and
/// membership checks; once both pass, the only remaining error is the
/// missing upgrade state.
#[tokio::test]
async fn test_websocket_endpoint_auth() {
    let Some(ctx) = common::try_context().await else {
        return;
    };

    let plain_get = |uri: String| {
        Request::builder()
            .method("GET")
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    };

    // Missing token
    let response = ctx
        .app
        .clone()
        .oneshot(plain_get("/ws/notifications".to_string()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Valid token on a project the caller is not a member of
    let outsider = ctx.create_user("Socket Outsider").await;
    let outsider_token = ctx.token_for(&outsider);
    let response = ctx
        .app
        .clone()
        .oneshot(plain_get(format!(
            "/ws/projects/{}?token={outsider_token}",
            ctx.project.id
        )))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Valid token and membership clear auth; only the handshake is missing
    let response = ctx
        .app
        .clone()
        .oneshot(plain_get(format!(
            "/ws/projects/{}?token={}",
            ctx.project.id, ctx.token
        )))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Expected WebSocket upgrade");

    ctx.cleanup().await.unwrap();
}

/// Test request validation surfaces field-level details
#[tokio::test]
async fn test_validation_errors() {
    let Some(ctx) = common::try_context().await else {
        return;
    };

    // Short password on registration
    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/auth/register")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({
                "name": "Shorty",
                "email": format!("short-{}@syncboard.test", Uuid::new_v4()),
                "password": "abc"
            })
            .to_string(),
        ))
        .unwrap();
    let response = ctx.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "validation_error");
    assert!(body["details"].as_array().unwrap().iter().any(|d| d["field"] == "password"));

    // Empty task title
    let request = json_request(
        "POST",
        &format!("/api/v1/tasks/project/{}", ctx.project.id),
        &ctx.token,
        json!({ "title": "" }),
    );
    let response = ctx.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Unknown status value is rejected at deserialization
    let task = ctx.create_task("Status probe", Some(ctx.user.id)).await;
    let request = json_request(
        "PUT",
        &format!("/api/v1/tasks/{}/status", task.id),
        &ctx.token,
        json!({ "status": "blocked" }),
    );
    let response = ctx.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    ctx.cleanup().await.unwrap();
}
