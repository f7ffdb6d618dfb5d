use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Error,
}

/// One-way, user-facing message (a toast in the UI)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

/// Fire-and-forget notification channel
pub trait Notifier: Send {
    fn notify(&mut self, notice: Notice);

    fn info(&mut self, message: String) {
        self.notify(Notice { level: NoticeLevel::Info, message });
    }

    fn error(&mut self, message: String) {
        self.notify(Notice { level: NoticeLevel::Error, message });
    }
}

/// Gathers notices so handlers can return them with the response
#[derive(Debug, Default)]
pub struct CollectingNotifier {
    notices: Vec<Notice>,
}

impl CollectingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn into_notices(self) -> Vec<Notice> {
        self.notices
    }
}

impl Notifier for CollectingNotifier {
    fn notify(&mut self, notice: Notice) {
        tracing::debug!("Notice ({:?}): {}", notice.level, notice.message);
        self.notices.push(notice);
    }
}
