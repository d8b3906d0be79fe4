//! User-facing notification surface.

use crate::effects::{Notice, NoticeKind};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use tracing::{error, info, warn};

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, kind: NoticeKind, message: &str);

    /// Ask before a destructive action. `false` cancels it.
    async fn confirm(&self, prompt: &str) -> bool;
}

/// Writes notices to the tracing subscriber and answers confirmations with a fixed
/// value. For headless use.
pub struct TracingNotifier {
    assume_yes: bool,
}

impl TracingNotifier {
    pub fn new(assume_yes: bool) -> Self {
        Self { assume_yes }
    }
}

#[async_trait]
impl Notifier for TracingNotifier {
    async fn notify(&self, kind: NoticeKind, message: &str) {
        match kind {
            NoticeKind::Success => info!(%message, "notice"),
            NoticeKind::Warning => warn!(%message, "notice"),
            NoticeKind::Error => error!(%message, "notice"),
        }
    }

    async fn confirm(&self, prompt: &str) -> bool {
        info!(%prompt, answer = self.assume_yes, "confirmation");
        self.assume_yes
    }
}

/// Keeps every notice and prompt it receives.
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
    prompts: Mutex<Vec<String>>,
    answer: AtomicBool,
}

impl Default for RecordingNotifier {
    fn default() -> Self {
        Self::new(true)
    }
}

impl RecordingNotifier {
    pub fn new(answer: bool) -> Self {
        Self {
            notices: Mutex::new(Vec::new()),
            prompts: Mutex::new(Vec::new()),
            answer: AtomicBool::new(answer),
        }
    }

    /// Answer future confirmations with `answer`.
    pub fn answer(&self, answer: bool) {
        self.answer.store(answer, Ordering::SeqCst);
    }

    pub async fn notices(&self) -> Vec<Notice> {
        self.notices.lock().await.clone()
    }

    pub async fn kinds(&self) -> Vec<NoticeKind> {
        self.notices.lock().await.iter().map(|n| n.kind).collect()
    }

    pub async fn prompts(&self) -> Vec<String> {
        self.prompts.lock().await.clone()
    }

    pub async fn clear(&self) {
        self.notices.lock().await.clear();
        self.prompts.lock().await.clear();
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, kind: NoticeKind, message: &str) {
        self.notices.lock().await.push(Notice {
            kind,
            message: message.to_string(),
        });
    }

    async fn confirm(&self, prompt: &str) -> bool {
        self.prompts.lock().await.push(prompt.to_string());
        self.answer.load(Ordering::SeqCst)
    }
}
