//! User-facing notifications raised by the request gateway.
//!
//! The gateway never talks to a UI directly. It reports through the
//! [`Notifier`] port:
//! - `notify` - transient, non-blocking toast (fire-and-forget)
//! - `confirm_relogin` - blocking "log in again?" prompt, used only by the
//!   confirm auth-failure policy
//!
//! Two channels ship with the crate: [`LogNotifier`] (tracing only, for
//! headless use) and [`ConsoleNotifier`] (stderr/stdin, for the CLI).

mod console;

pub use console::ConsoleNotifier;

use async_trait::async_trait;
use std::fmt;
use std::time::Duration;

/// How long an error toast stays visible.
pub const DEFAULT_NOTICE_DURATION: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl fmt::Display for NoticeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoticeLevel::Info => write!(f, "info"),
            NoticeLevel::Success => write!(f, "success"),
            NoticeLevel::Warning => write!(f, "warning"),
            NoticeLevel::Error => write!(f, "error"),
        }
    }
}

/// A transient message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    pub duration: Duration,
}

impl Notice {
    pub fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            duration: DEFAULT_NOTICE_DURATION,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Error, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Success, message)
    }
}

/// Sink for user-visible feedback.
///
/// `notify` must not block and must not fail: whatever happens to the toast
/// is not the HTTP caller's concern.
#[async_trait]
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);

    /// Ask whether the user wants to log in again after their session
    /// expired. `true` means the stored session should be dropped.
    async fn confirm_relogin(&self, message: &str) -> bool;
}

/// Notifier that only writes to the tracing subscriber.
///
/// With no one to ask, relogin prompts are accepted.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Error => tracing::error!(message = %notice.message, "Notice"),
            NoticeLevel::Warning => tracing::warn!(message = %notice.message, "Notice"),
            NoticeLevel::Info | NoticeLevel::Success => {
                tracing::info!(level = %notice.level, message = %notice.message, "Notice")
            }
        }
    }

    async fn confirm_relogin(&self, message: &str) -> bool {
        tracing::warn!(message = %message, "Session expired, re-login required");
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notice_constructors() {
        let notice = Notice::error("bad request");
        assert_eq!(notice.level, NoticeLevel::Error);
        assert_eq!(notice.message, "bad request");
        assert_eq!(notice.duration, Duration::from_secs(5));

        assert_eq!(Notice::success("ok").level, NoticeLevel::Success);
    }

    #[test]
    fn test_level_display() {
        assert_eq!(NoticeLevel::Error.to_string(), "error");
        assert_eq!(NoticeLevel::Success.to_string(), "success");
    }

    #[tokio::test]
    async fn test_log_notifier_accepts_relogin() {
        let notifier = LogNotifier;
        notifier.notify(Notice::error("ignored"));
        assert!(notifier.confirm_relogin("expired").await);
    }
}
