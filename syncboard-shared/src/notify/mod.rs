/// Notification delivery
///
/// Turns committed domain events into in-app notification rows, emails,
/// and live pushes. The fan-out rules live in `fanout`, real-time rooms
/// in `broadcast`, and the email seam in `mailer`. Everything here is
/// best-effort: a notification failure is logged and never surfaces to
/// the request that triggered it.

pub mod broadcast;
pub mod fanout;
pub mod mailer;
