/// Notification fan-out for domain events
///
/// Converts each collaboration event into a deterministic set of in-app
/// notification rows plus at most one email, then delivers them. The
/// recipient computation lives in the pure `plan_*` functions so the
/// rules stay testable without a database; [`NotificationFanout`] loads
/// the context rows, plans, and delivers.
///
/// Every public method is fire-and-forget: it runs after the triggering
/// mutation has committed, failures are logged and swallowed, and a
/// failed row is dropped rather than retried. One failed insert never
/// blocks the remaining recipients, and email failure never affects
/// rows already written.

use std::sync::Arc;

use chrono::NaiveDate;
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::comment::Comment;
use crate::models::membership::{Membership, ProjectMember};
use crate::models::notification::{CreateNotification, Notification};
use crate::models::project::Project;
use crate::models::task::{Task, TaskStatus};
use crate::models::user::User;
use crate::notify::broadcast::{user_room, BroadcastHub};
use crate::notify::mailer::Mailer;

/// One email planned for an event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailDraft {
    /// Recipient address
    pub to: String,

    /// Subject line
    pub subject: String,

    /// Message body
    pub body: String,

    /// Whether the body is HTML
    pub is_html: bool,
}

/// Action verb for a status-change notification body
fn status_action(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Todo => "moved to To Do",
        TaskStatus::InProgress => "started working on",
        TaskStatus::Done => "completed",
    }
}

fn assignment_email_html(
    assignee_name: &str,
    task_title: &str,
    project_name: &str,
    assigner_name: &str,
    due_date: Option<NaiveDate>,
) -> String {
    let due_line = due_date
        .map(|d| format!("<p><strong>Due date:</strong> {d}</p>"))
        .unwrap_or_default();
    format!(
        "<html><body>\
         <h2>New Task Assignment</h2>\
         <p>Hi {assignee_name},</p>\
         <p>You have been assigned a new task in <strong>{project_name}</strong>:</p>\
         <h3>{task_title}</h3>\
         {due_line}\
         <p><strong>Assigned by:</strong> {assigner_name}</p>\
         <p>Log in to SyncBoard to view the full task details.</p>\
         </body></html>"
    )
}

fn status_email_html(
    recipient_name: &str,
    task_title: &str,
    project_name: &str,
    status_display: &str,
    updater_name: &str,
) -> String {
    format!(
        "<html><body>\
         <h2>Task Status Update</h2>\
         <p>Hi {recipient_name},</p>\
         <p>A task in <strong>{project_name}</strong> has been updated:</p>\
         <h3>{task_title}</h3>\
         <p><strong>New status:</strong> {status_display}</p>\
         <p><strong>Updated by:</strong> {updater_name}</p>\
         </body></html>"
    )
}

/// Plans the notifications for a task assignment
///
/// The assignee gets one in-app row and always gets an email, even for
/// self-assignment.
pub fn plan_task_assigned(
    task: &Task,
    assignee: &User,
    assigner: &User,
    project: &Project,
) -> (Vec<CreateNotification>, Option<EmailDraft>) {
    let drafts = vec![CreateNotification {
        user_id: assignee.id,
        project_id: Some(project.id),
        task_id: Some(task.id),
        title: "New Task Assigned".to_string(),
        body: format!(
            "{} assigned you to task \"{}\" in project \"{}\"",
            assigner.name, task.title, project.name
        ),
    }];

    let email = Some(EmailDraft {
        to: assignee.email.clone(),
        subject: format!("New Task Assigned: {}", task.title),
        body: assignment_email_html(
            &assignee.name,
            &task.title,
            &project.name,
            &assigner.name,
            task.due_date,
        ),
        is_html: true,
    });

    (drafts, email)
}

/// Plans the notifications for a task status change
///
/// Every project member except the updater gets an in-app row. The
/// project owner additionally gets an email, but only when the new
/// status is done and the owner is not the updater.
pub fn plan_status_changed(
    task: &Task,
    updater: &User,
    project: &Project,
    members: &[ProjectMember],
) -> (Vec<CreateNotification>, Option<EmailDraft>) {
    let action = status_action(task.status);

    let drafts = members
        .iter()
        .filter(|m| m.user_id != updater.id)
        .map(|m| CreateNotification {
            user_id: m.user_id,
            project_id: Some(project.id),
            task_id: Some(task.id),
            title: "Task Status Update".to_string(),
            body: format!(
                "{} {} task \"{}\" in \"{}\"",
                updater.name, action, task.title, project.name
            ),
        })
        .collect();

    let email = if task.status == TaskStatus::Done {
        members
            .iter()
            .find(|m| m.user_id == project.owner_id && m.user_id != updater.id)
            .map(|owner| EmailDraft {
                to: owner.email.clone(),
                subject: format!("Task Status Update: {}", task.title),
                body: status_email_html(
                    &owner.name,
                    &task.title,
                    &project.name,
                    task.status.display_name(),
                    &updater.name,
                ),
                is_html: true,
            })
    } else {
        None
    };

    (drafts, email)
}

/// Plans the notifications for a membership addition
///
/// The new member gets a personal row; every other member except the
/// adder gets a joined announcement. `members` is the membership list
/// after the insert, so it already contains the new member.
pub fn plan_member_added(
    project: &Project,
    new_member: &User,
    adder: &User,
    members: &[ProjectMember],
) -> (Vec<CreateNotification>, Option<EmailDraft>) {
    let mut drafts = vec![CreateNotification {
        user_id: new_member.id,
        project_id: Some(project.id),
        task_id: None,
        title: "Added to Project".to_string(),
        body: format!(
            "{} added you to project \"{}\"",
            adder.name, project.name
        ),
    }];

    drafts.extend(
        members
            .iter()
            .filter(|m| m.user_id != new_member.id && m.user_id != adder.id)
            .map(|m| CreateNotification {
                user_id: m.user_id,
                project_id: Some(project.id),
                task_id: None,
                title: "New Team Member".to_string(),
                body: format!(
                    "{} joined project \"{}\"",
                    new_member.name, project.name
                ),
            }),
    );

    (drafts, None)
}

/// Plans the notifications for a new comment
///
/// Every project member except the author gets a row pointing at the
/// commented task, or at the project for board-level comments.
pub fn plan_comment_posted(
    comment: &Comment,
    author: &User,
    project: &Project,
    task: Option<&Task>,
    members: &[ProjectMember],
) -> (Vec<CreateNotification>, Option<EmailDraft>) {
    let location = match task {
        Some(task) => format!("task \"{}\"", task.title),
        None => "project".to_string(),
    };

    let drafts = members
        .iter()
        .filter(|m| m.user_id != author.id)
        .map(|m| CreateNotification {
            user_id: m.user_id,
            project_id: Some(project.id),
            task_id: comment.task_id,
            title: "New Comment".to_string(),
            body: format!(
                "{} commented on {} in \"{}\"",
                author.name, location, project.name
            ),
        })
        .collect();

    (drafts, None)
}

/// Plans the reminder row for an approaching deadline
///
/// Only the assignee is notified; an unassigned task plans nothing.
/// The reminder email is not planned here, the sweep sends it on its
/// own so an email failure cannot suppress the in-app row.
pub fn plan_deadline_approaching(
    task: &Task,
    days_until_due: i64,
) -> (Vec<CreateNotification>, Option<EmailDraft>) {
    let Some(assignee_id) = task.assignee_id else {
        return (Vec::new(), None);
    };

    let drafts = vec![CreateNotification {
        user_id: assignee_id,
        project_id: None,
        task_id: Some(task.id),
        title: "Deadline Reminder".to_string(),
        body: format!(
            "Task \"{}\" is due in {} day(s)",
            task.title, days_until_due
        ),
    }];

    (drafts, None)
}

/// Delivers planned notifications for committed domain events
///
/// Cloning is cheap; the pool and collaborators are shared handles.
#[derive(Clone)]
pub struct NotificationFanout {
    db: PgPool,
    mailer: Arc<dyn Mailer>,
    hub: Arc<BroadcastHub>,
}

impl NotificationFanout {
    /// Creates a fan-out over the given pool, mailer, and hub
    pub fn new(db: PgPool, mailer: Arc<dyn Mailer>, hub: Arc<BroadcastHub>) -> Self {
        Self { db, mailer, hub }
    }

    /// Notifies the assignee of a task they were just assigned
    ///
    /// No-op when the task has no assignee.
    pub async fn task_assigned(&self, task: &Task, assigner_id: Uuid) {
        let Some(assignee_id) = task.assignee_id else {
            return;
        };
        let Some(assignee) = self.load_user(assignee_id).await else {
            return;
        };
        let Some(assigner) = self.load_user(assigner_id).await else {
            return;
        };
        let Some(project) = self.load_project(task.project_id).await else {
            return;
        };

        let (drafts, email) = plan_task_assigned(task, &assignee, &assigner, &project);
        self.deliver(drafts, email).await;
        tracing::info!(task_id = %task.id, assignee_id = %assignee_id, "Task assignment notifications sent");
    }

    /// Notifies project members that a task's status changed
    ///
    /// `task` is the row after the update, so its status is the new one.
    pub async fn status_changed(&self, task: &Task, updater_id: Uuid) {
        let Some(updater) = self.load_user(updater_id).await else {
            return;
        };
        let Some(project) = self.load_project(task.project_id).await else {
            return;
        };
        let Some(members) = self.load_members(task.project_id).await else {
            return;
        };

        let (drafts, email) = plan_status_changed(task, &updater, &project, &members);
        self.deliver(drafts, email).await;
        tracing::info!(task_id = %task.id, status = task.status.as_str(), "Task status notifications sent");
    }

    /// Notifies a project that a member was added
    ///
    /// Call after the membership insert so the fetched member list
    /// includes the new member.
    pub async fn member_added(&self, project_id: Uuid, new_member_id: Uuid, added_by: Uuid) {
        let Some(new_member) = self.load_user(new_member_id).await else {
            return;
        };
        let Some(adder) = self.load_user(added_by).await else {
            return;
        };
        let Some(project) = self.load_project(project_id).await else {
            return;
        };
        let Some(members) = self.load_members(project_id).await else {
            return;
        };

        let (drafts, email) = plan_member_added(&project, &new_member, &adder, &members);
        self.deliver(drafts, email).await;
        tracing::info!(project_id = %project_id, new_member_id = %new_member_id, "Member added notifications sent");
    }

    /// Notifies project members about a new comment
    ///
    /// `project_id` is the project the comment belongs to, resolved by
    /// the caller for task comments.
    pub async fn comment_posted(&self, comment: &Comment, project_id: Uuid) {
        let Some(author) = self.load_user(comment.author_id).await else {
            return;
        };
        let Some(project) = self.load_project(project_id).await else {
            return;
        };
        let Some(members) = self.load_members(project_id).await else {
            return;
        };

        let task = match comment.task_id {
            Some(task_id) => match Task::find_by_id(&self.db, task_id).await {
                Ok(task) => task,
                Err(e) => {
                    tracing::error!(task_id = %task_id, error = %e, "Comment fan-out failed to load task");
                    return;
                }
            },
            None => None,
        };

        let (drafts, email) =
            plan_comment_posted(comment, &author, &project, task.as_ref(), &members);
        self.deliver(drafts, email).await;
        tracing::info!(comment_id = %comment.id, project_id = %project_id, "Comment notifications sent");
    }

    /// Reminds a task's assignee about an approaching deadline
    pub async fn deadline_approaching(&self, task: &Task, days_until_due: i64) {
        let (drafts, email) = plan_deadline_approaching(task, days_until_due);
        if drafts.is_empty() {
            return;
        }
        self.deliver(drafts, email).await;
        tracing::info!(task_id = %task.id, days_until_due, "Deadline reminder sent");
    }

    /// Persists drafts, sends the email, then pushes live updates
    ///
    /// Each insert is independent; a failed row is logged and dropped.
    /// The email goes out only after every row was attempted. Hub
    /// pushes carry the written rows and ignore delivery failures.
    async fn deliver(&self, drafts: Vec<CreateNotification>, email: Option<EmailDraft>) {
        let mut written = Vec::with_capacity(drafts.len());

        for draft in drafts {
            let user_id = draft.user_id;
            match Notification::create(&self.db, draft).await {
                Ok(notification) => written.push(notification),
                Err(e) => {
                    tracing::error!(user_id = %user_id, error = %e, "Failed to persist notification");
                }
            }
        }

        if let Some(email) = email {
            if !self
                .mailer
                .send(&email.to, &email.subject, &email.body, email.is_html)
                .await
            {
                tracing::warn!(to = %email.to, subject = %email.subject, "Notification email was not delivered");
            }
        }

        for notification in written {
            let payload = json!({
                "type": "notification",
                "data": notification,
            });
            match serde_json::to_string(&payload) {
                Ok(message) => {
                    self.hub
                        .publish(&user_room(notification.user_id), message)
                        .await;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to serialize notification push");
                }
            }
        }
    }

    async fn load_user(&self, user_id: Uuid) -> Option<User> {
        match User::find_by_id(&self.db, user_id).await {
            Ok(Some(user)) => Some(user),
            Ok(None) => {
                tracing::warn!(user_id = %user_id, "Notification fan-out skipped, user not found");
                None
            }
            Err(e) => {
                tracing::error!(user_id = %user_id, error = %e, "Notification fan-out failed to load user");
                None
            }
        }
    }

    async fn load_project(&self, project_id: Uuid) -> Option<Project> {
        match Project::find_by_id(&self.db, project_id).await {
            Ok(Some(project)) => Some(project),
            Ok(None) => {
                tracing::warn!(project_id = %project_id, "Notification fan-out skipped, project not found");
                None
            }
            Err(e) => {
                tracing::error!(project_id = %project_id, error = %e, "Notification fan-out failed to load project");
                None
            }
        }
    }

    async fn load_members(&self, project_id: Uuid) -> Option<Vec<ProjectMember>> {
        match Membership::list_members(&self.db, project_id).await {
            Ok(members) => Some(members),
            Err(e) => {
                tracing::error!(project_id = %project_id, error = %e, "Notification fan-out failed to load members");
                None
            }
        }
    }
}
