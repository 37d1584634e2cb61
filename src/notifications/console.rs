use async_trait::async_trait;
use std::io::{BufRead, Write};

use super::{Notice, NoticeLevel, Notifier};

/// Terminal notifier: toasts go to stderr, relogin prompts read `y/N` from
/// stdin.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleNotifier;

impl ConsoleNotifier {
    fn tag(level: NoticeLevel) -> &'static str {
        match level {
            NoticeLevel::Info => "[--]",
            NoticeLevel::Success => "[OK]",
            NoticeLevel::Warning => "[!]",
            NoticeLevel::Error => "[!!]",
        }
    }
}

/// `true` for answers starting with `y` or `Y`.
fn is_affirmative(answer: &str) -> bool {
    answer.trim_start().starts_with(['y', 'Y'])
}

#[async_trait]
impl Notifier for ConsoleNotifier {
    fn notify(&self, notice: Notice) {
        eprintln!("{} {}", Self::tag(notice.level), notice.message);
    }

    async fn confirm_relogin(&self, message: &str) -> bool {
        let prompt = format!("{} {}\nLog in again? [y/N] ", Self::tag(NoticeLevel::Warning), message);
        let answer = tokio::task::spawn_blocking(move || {
            let mut stderr = std::io::stderr();
            let _ = write!(stderr, "{}", prompt);
            let _ = stderr.flush();

            let mut line = String::new();
            std::io::stdin().lock().read_line(&mut line).map(|_| line)
        })
        .await;

        match answer {
            Ok(Ok(line)) => is_affirmative(&line),
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Failed to read relogin answer");
                false
            }
            Err(e) => {
                tracing::warn!(error = %e, "Relogin prompt task failed");
                false
            }
        }
    }
}
