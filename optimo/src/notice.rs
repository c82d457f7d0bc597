//! Transient status notices.

use crate::document::{ControlKind, ElementId, HostDocument};
use serde::Serialize;
use std::time::Duration;
use tokio::time::Instant;

/// Notice severity.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    /// Request succeeded.
    Success,
    /// Something was rejected or failed.
    Error,
    /// Anything else.
    Info,
}

impl NoticeKind {
    /// Name used as the `data-kind` attribute.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Info => "info",
        }
    }
}

/// A status message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    /// Severity.
    pub kind: NoticeKind,
    /// Message text.
    pub text: String,
}

impl Notice {
    /// A success notice.
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            text: text.into(),
        }
    }

    /// An error notice.
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            text: text.into(),
        }
    }

    /// An info notice.
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Info,
            text: text.into(),
        }
    }
}

#[derive(Debug)]
struct Shown {
    notice: Notice,
    element: Option<ElementId>,
    expires: Instant,
}

/// Shows at most one notice at a time and expires it after a fixed duration.
#[derive(Debug)]
pub struct NoticeBoard {
    duration: Duration,
    shown: Option<Shown>,
}

impl NoticeBoard {
    /// A board whose notices stay for `duration`.
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            shown: None,
        }
    }

    /// Show a notice, replacing the visible one.
    pub fn show<D: HostDocument + ?Sized>(&mut self, document: &mut D, notice: Notice, now: Instant) {
        self.clear(document);

        let body = document.body();
        let element = document.create_control(body, ControlKind::Notice);
        if let Some(element) = element {
            document.set_attribute(element, "data-kind", notice.kind.as_str());
            document.set_text(element, &notice.text);
        }

        match notice.kind {
            NoticeKind::Error => log::warn!("notice: {}", notice.text),
            _ => log::info!("notice: {}", notice.text),
        }

        self.shown = Some(Shown {
            notice,
            element,
            expires: now + self.duration,
        });
    }

    /// Remove the visible notice.
    pub fn clear<D: HostDocument + ?Sized>(&mut self, document: &mut D) -> Option<Notice> {
        let shown = self.shown.take()?;
        if let Some(element) = shown.element {
            document.remove(element);
        }
        Some(shown.notice)
    }

    /// Remove the notice if it has expired.
    pub fn expire<D: HostDocument + ?Sized>(&mut self, document: &mut D, now: Instant) -> bool {
        match self.deadline() {
            Some(expires) if now >= expires => self.clear(document).is_some(),
            _ => false,
        }
    }

    /// When the visible notice expires.
    pub fn deadline(&self) -> Option<Instant> {
        self.shown.as_ref().map(|s| s.expires)
    }

    /// The visible notice.
    pub fn current(&self) -> Option<&Notice> {
        self.shown.as_ref().map(|s| &s.notice)
    }
}
