//! User-facing notices: self-clearing successes and one persistent error.

use std::time::Duration;

use tokio::time::Instant;

/// Which operation a success notice belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Upload,
    Delete,
}

/// A success notice with its expiry on the tokio clock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
    pub expires_at: Instant,
}

/// Current notices.
///
/// At most one success notice per [`NoticeKind`]; raising another replaces it
/// and restarts its timer. The error banner stays until dismissed or replaced.
#[derive(Debug, Clone, Default)]
pub struct Notices {
    successes: Vec<Notice>,
    error: Option<String>,
}

impl Notices {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise a success notice that expires after `ttl`.
    pub fn success(&mut self, kind: NoticeKind, message: impl Into<String>, ttl: Duration) {
        self.successes.retain(|n| n.kind != kind);
        self.successes.push(Notice {
            kind,
            message: message.into(),
            expires_at: Instant::now() + ttl,
        });
    }

    /// Replace the error banner.
    pub fn error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    pub fn current_error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Success notices that have not expired yet.
    pub fn active(&self) -> Vec<&Notice> {
        let now = Instant::now();
        self.successes
            .iter()
            .filter(|n| n.expires_at > now)
            .collect()
    }

    /// Active success notice of one kind.
    pub fn active_of(&self, kind: NoticeKind) -> Option<&Notice> {
        let now = Instant::now();
        self.successes
            .iter()
            .find(|n| n.kind == kind && n.expires_at > now)
    }

    /// Drop expired success notices; returns how many were removed.
    pub fn prune(&mut self) -> usize {
        let now = Instant::now();
        let before = self.successes.len();
        self.successes.retain(|n| n.expires_at > now);
        before - self.successes.len()
    }
}
