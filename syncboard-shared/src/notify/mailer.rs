/// Outbound email delivery
///
/// Email is strictly best-effort in SyncBoard: no notification path may
/// fail because mail could not be sent. The [`Mailer`] trait therefore
/// returns a success flag instead of a `Result`; implementations log
/// their own failures.
///
/// The default [`LogMailer`] writes would-be emails to the log and
/// reports success, which is the right behavior for development and for
/// deployments without an SMTP relay. Tests use [`MockMailer`] to
/// assert on what would have been sent.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

/// Delivery interface for outbound email
///
/// `send` never errors; it returns `true` when the message was accepted
/// for delivery and `false` otherwise. Callers treat `false` as a
/// logged, non-fatal condition.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Sends one email
    ///
    /// # Arguments
    ///
    /// * `to` - Recipient address
    /// * `subject` - Subject line
    /// * `body` - Message body
    /// * `is_html` - Whether `body` is HTML rather than plain text
    async fn send(&self, to: &str, subject: &str, body: &str, is_html: bool) -> bool;
}

/// Mailer that logs instead of sending
///
/// Stands in for a real SMTP relay; every message is reported as
/// delivered after being written to the log at info level.
#[derive(Debug, Clone)]
pub struct LogMailer {
    from: String,
}

impl LogMailer {
    /// Creates a log-only mailer announcing the given sender address
    pub fn new(from: impl Into<String>) -> Self {
        Self { from: from.into() }
    }
}

impl Default for LogMailer {
    fn default() -> Self {
        Self::new("noreply@syncboard.dev")
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, to: &str, subject: &str, _body: &str, is_html: bool) -> bool {
        tracing::info!(from = %self.from, to = %to, subject = %subject, is_html, "Email delivery skipped, logging only");
        true
    }
}

/// A message captured by [`MockMailer`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentEmail {
    /// Recipient address
    pub to: String,

    /// Subject line
    pub subject: String,

    /// Message body
    pub body: String,

    /// Whether the body was HTML
    pub is_html: bool,
}

/// Recording mailer for tests
///
/// Captures every message instead of delivering it. Construct with
/// [`MockMailer::failing`] to simulate a relay that rejects everything.
#[derive(Debug, Clone, Default)]
pub struct MockMailer {
    sent: Arc<Mutex<Vec<SentEmail>>>,
    fail: bool,
}

impl MockMailer {
    /// Creates a mock mailer that accepts every message
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mock mailer that reports every send as failed
    ///
    /// Messages are still recorded so tests can assert on attempts.
    pub fn failing() -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            fail: true,
        }
    }

    /// Returns a copy of everything sent so far
    pub fn sent(&self) -> Vec<SentEmail> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// Returns how many messages were sent
    pub fn sent_count(&self) -> usize {
        self.sent.lock().map(|s| s.len()).unwrap_or(0)
    }
}

#[async_trait]
impl Mailer for MockMailer {
    async fn send(&self, to: &str, subject: &str, body: &str, is_html: bool) -> bool {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(SentEmail {
                to: to.to_string(),
                subject: subject.to_string(),
                body: body.to_string(),
                is_html,
            });
        }
        !self.fail
    }
}
