//! Shared helpers for tests that talk to an in-process backend.

use async_trait::async_trait;
use axum::Router;
use parking_lot::Mutex;

use crate::notifications::{Notice, Notifier};

/// Serve `router` on an ephemeral local port and return its base URL.
pub async fn spawn_backend(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Notifier that records everything it is asked to show.
#[derive(Default)]
pub struct RecordingNotifier {
    pub notices: Mutex<Vec<Notice>>,
    pub prompts: Mutex<Vec<String>>,
    pub accept_relogin: bool,
}

impl RecordingNotifier {
    pub fn accepting() -> Self {
        Self {
            accept_relogin: true,
            ..Default::default()
        }
    }

    pub fn messages(&self) -> Vec<String> {
        self.notices.lock().iter().map(|n| n.message.clone()).collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices.lock().push(notice);
    }

    async fn confirm_relogin(&self, message: &str) -> bool {
        self.prompts.lock().push(message.to_string());
        self.accept_relogin
    }
}
