/// Deadline sweeper
///
/// This module implements the periodic job that reminds assignees about
/// tasks coming due. Each run scans for open, assigned tasks with a due
/// date inside the reminder window, writes one in-app reminder per
/// (assignee, task) per calendar day, and follows up with an email.
///
/// # Architecture
///
/// ```text
/// DeadlineSweeper
///   ├─> Task::list_due_between: Open assigned tasks in the window
///   ├─> Notification::exists_for_day: Per-day de-duplication
///   ├─> NotificationFanout: Reminder row plus live push
///   └─> Mailer: Reminder email to the assignee
/// ```
///
/// # Concurrency
///
/// The dedup check and the insert are not atomic; two overlapping runs
/// may rarely double-notify. That window is accepted in exchange for
/// keeping the sweep free of cross-process locks.
///
/// # Example
///
/// ```no_run
/// use syncboard_worker::sweeper::DeadlineSweeper;
/// use syncboard_shared::notify::fanout::NotificationFanout;
/// use syncboard_shared::notify::mailer::{LogMailer, Mailer};
/// use syncboard_shared::notify::broadcast::BroadcastHub;
/// use sqlx::PgPool;
/// use std::sync::Arc;
///
/// # async fn example(pool: PgPool) -> anyhow::Result<()> {
/// let mailer: Arc<dyn Mailer> = Arc::new(LogMailer::default());
/// let hub = Arc::new(BroadcastHub::new());
/// let fanout = NotificationFanout::new(pool.clone(), mailer.clone(), hub);
///
/// let sweeper = DeadlineSweeper::new(pool, fanout, mailer);
/// sweeper.run().await?;
/// # Ok(())
/// # }
/// ```

use chrono::{Duration as ChronoDuration, NaiveDate, Utc};
use sqlx::PgPool;
use std::sync::Arc;
use syncboard_shared::models::notification::Notification;
use syncboard_shared::models::project::Project;
use syncboard_shared::models::task::Task;
use syncboard_shared::models::user::User;
use syncboard_shared::notify::fanout::NotificationFanout;
use syncboard_shared::notify::mailer::Mailer;
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Title of the reminder rows, also the de-duplication key
///
/// Must match the title the deadline fan-out writes.
const REMINDER_TITLE: &str = "Deadline Reminder";

/// Deadline sweeper configuration
#[derive(Debug, Clone)]
pub struct SweeperConfig {
    /// Seconds between sweep runs
    pub interval_secs: u64,

    /// How many days ahead the reminder window reaches
    pub window_days: i64,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        SweeperConfig {
            interval_secs: 3600,
            window_days: 3,
        }
    }
}

impl SweeperConfig {
    /// Loads the configuration from the environment
    ///
    /// Reads `SWEEP_INTERVAL_SECS`; everything else keeps its default.
    ///
    /// # Errors
    ///
    /// Returns an error if `SWEEP_INTERVAL_SECS` is set but not a
    /// positive integer.
    pub fn from_env() -> anyhow::Result<Self> {
        let mut config = SweeperConfig::default();

        if let Ok(raw) = std::env::var("SWEEP_INTERVAL_SECS") {
            let secs: u64 = raw
                .parse()
                .map_err(|_| anyhow::anyhow!("SWEEP_INTERVAL_SECS must be a positive integer"))?;
            if secs == 0 {
                anyhow::bail!("SWEEP_INTERVAL_SECS must be a positive integer");
            }
            config.interval_secs = secs;
        }

        Ok(config)
    }
}

/// Counters for a single sweep run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepSummary {
    /// Tasks inside the reminder window
    pub scanned: usize,

    /// Reminders written this run
    pub reminded: usize,

    /// Tasks skipped because today's reminder already exists
    pub skipped: usize,

    /// Dedup checks, queries, or emails that failed
    pub failed: usize,
}

/// Computes the reminder window for a given day
///
/// The window starts tomorrow; tasks due today are no longer
/// "approaching" and tasks due within `window_days` days are.
fn sweep_window(today: NaiveDate, window_days: i64) -> (NaiveDate, NaiveDate) {
    (
        today + ChronoDuration::days(1),
        today + ChronoDuration::days(window_days),
    )
}

/// Builds the reminder email for an assignee
fn reminder_email(
    assignee_name: &str,
    task_title: &str,
    project_name: &str,
    due_date: NaiveDate,
) -> (String, String) {
    let subject = format!("Deadline Reminder: {}", task_title);
    let body = format!(
        "Hello {},\n\n\
         This is a reminder that your task \"{}\" in project \"{}\" is due on {}.\n\n\
         Please make sure to complete it on time.\n\n\
         Best regards,\n\
         SyncBoard Team",
        assignee_name, task_title, project_name, due_date
    );
    (subject, body)
}

/// Deadline sweeper
///
/// Owns the periodic loop and the per-run sweep body. All store and
/// mailer failures inside a run are logged and counted, never
/// propagated; a bad run must not take the worker down.
pub struct DeadlineSweeper {
    /// Database connection pool
    db: PgPool,

    /// Fan-out used to write reminder rows and live pushes
    fanout: NotificationFanout,

    /// Mailer for the reminder emails
    mailer: Arc<dyn Mailer>,

    /// Configuration
    config: SweeperConfig,

    /// Shutdown token
    shutdown_token: CancellationToken,
}

impl DeadlineSweeper {
    /// Creates a new deadline sweeper with the default configuration
    pub fn new(db: PgPool, fanout: NotificationFanout, mailer: Arc<dyn Mailer>) -> Self {
        Self::with_config(db, fanout, mailer, SweeperConfig::default())
    }

    /// Creates a new deadline sweeper with custom configuration
    pub fn with_config(
        db: PgPool,
        fanout: NotificationFanout,
        mailer: Arc<dyn Mailer>,
        config: SweeperConfig,
    ) -> Self {
        DeadlineSweeper {
            db,
            fanout,
            mailer,
            config,
            shutdown_token: CancellationToken::new(),
        }
    }

    /// Gets the shutdown token
    ///
    /// Used to signal graceful shutdown from external handlers.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown_token.clone()
    }

    /// Runs the sweep loop
    ///
    /// Sweeps once immediately, then on every interval tick, until the
    /// shutdown token is cancelled. Each run logs a summary at info.
    pub async fn run(&self) -> anyhow::Result<()> {
        tracing::info!(
            interval_secs = self.config.interval_secs,
            window_days = self.config.window_days,
            "Deadline sweeper starting"
        );

        let mut ticker = tokio::time::interval(Duration::from_secs(self.config.interval_secs));

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let summary = self.run_once().await;
                    tracing::info!(
                        scanned = summary.scanned,
                        reminded = summary.reminded,
                        skipped = summary.skipped,
                        failed = summary.failed,
                        "Deadline sweep complete"
                    );
                }
                _ = self.shutdown_token.cancelled() => {
                    tracing::info!("Shutdown requested, stopping deadline sweeper");
                    break;
                }
            }
        }

        Ok(())
    }

    /// Executes a single sweep over the reminder window
    ///
    /// Failures are counted in the summary rather than returned; a
    /// task that fails its dedup check neither reminds nor blocks the
    /// rest of the run.
    pub async fn run_once(&self) -> SweepSummary {
        let mut summary = SweepSummary::default();
        let today = Utc::now().date_naive();
        let (start, end) = sweep_window(today, self.config.window_days);

        let tasks = match Task::list_due_between(&self.db, start, end).await {
            Ok(tasks) => tasks,
            Err(e) => {
                tracing::error!(error = %e, "Failed to query tasks for deadline sweep");
                summary.failed += 1;
                return summary;
            }
        };

        summary.scanned = tasks.len();

        for task in tasks {
            // The window query only returns assigned, dated tasks
            let (Some(assignee_id), Some(due_date)) = (task.assignee_id, task.due_date) else {
                continue;
            };

            match Notification::exists_for_day(&self.db, assignee_id, task.id, REMINDER_TITLE, today)
                .await
            {
                Ok(true) => {
                    summary.skipped += 1;
                    continue;
                }
                Ok(false) => {}
                Err(e) => {
                    tracing::error!(task_id = %task.id, error = %e, "Reminder dedup check failed");
                    summary.failed += 1;
                    continue;
                }
            }

            let days_until_due = (due_date - today).num_days();
            self.fanout.deadline_approaching(&task, days_until_due).await;
            summary.reminded += 1;

            if !self.send_reminder_email(&task, assignee_id, due_date).await {
                summary.failed += 1;
            }
        }

        summary
    }

    /// Emails the assignee about the approaching due date
    ///
    /// Sent independently of the in-app row so a mail failure cannot
    /// suppress the reminder itself.
    async fn send_reminder_email(&self, task: &Task, assignee_id: Uuid, due_date: NaiveDate) -> bool {
        let assignee = match User::find_by_id(&self.db, assignee_id).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                tracing::warn!(task_id = %task.id, user_id = %assignee_id, "Assignee no longer exists");
                return false;
            }
            Err(e) => {
                tracing::error!(task_id = %task.id, error = %e, "Failed to load assignee");
                return false;
            }
        };

        let project = match Project::find_by_id(&self.db, task.project_id).await {
            Ok(Some(project)) => project,
            Ok(None) => {
                tracing::warn!(task_id = %task.id, project_id = %task.project_id, "Project no longer exists");
                return false;
            }
            Err(e) => {
                tracing::error!(task_id = %task.id, error = %e, "Failed to load project");
                return false;
            }
        };

        let (subject, body) = reminder_email(&assignee.name, &task.title, &project.name, due_date);
        let sent = self.mailer.send(&assignee.email, &subject, &body, false).await;
        if !sent {
            tracing::warn!(task_id = %task.id, to = %assignee.email, "Reminder email was not sent");
        }
        sent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_sweeper_config_default() {
        let config = SweeperConfig::default();
        assert_eq!(config.interval_secs, 3600);
        assert_eq!(config.window_days, 3);
    }

    #[test]
    fn test_sweep_window_starts_tomorrow() {
        let today = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();
        let (start, end) = sweep_window(today, 3);
        assert_eq!(start, NaiveDate::from_ymd_opt(2024, 5, 11).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2024, 5, 13).unwrap());
    }

    #[test]
    fn test_sweep_window_excludes_today() {
        let today = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        let (start, end) = sweep_window(today, 1);
        // A one-day window covers exactly tomorrow, across the year boundary
        assert_eq!(start, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        assert_eq!(end, start);
    }

    #[test]
    fn test_reminder_email_wording() {
        let due = NaiveDate::from_ymd_opt(2024, 5, 12).unwrap();
        let (subject, body) = reminder_email("Priya", "Ship the beta", "Apollo", due);

        assert_eq!(subject, "Deadline Reminder: Ship the beta");
        assert!(body.starts_with("Hello Priya,"));
        assert!(body.contains("your task \"Ship the beta\" in project \"Apollo\" is due on 2024-05-12"));
        assert!(body.ends_with("SyncBoard Team"));
    }

    #[test]
    fn test_days_until_due_math() {
        let today = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();
        let due = NaiveDate::from_ymd_opt(2024, 5, 12).unwrap();
        assert_eq!((due - today).num_days(), 2);
    }
}
