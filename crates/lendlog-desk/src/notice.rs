//! Sync-status notices for the presentation layer.

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
  Info,
  Success,
  Warning,
  Error,
}

impl NoticeLevel {
  /// Whether the notice should fade after a few seconds.
  pub fn is_transient(self) -> bool {
    matches!(self, Self::Success | Self::Error)
  }
}

/// The current sync-status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
  pub level:   NoticeLevel,
  pub message: String,
  pub at:      DateTime<Utc>,
}

impl Notice {
  pub fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
    Self { level, message: message.into(), at: Utc::now() }
  }

  pub fn idle() -> Self { Self::new(NoticeLevel::Info, "") }
}
