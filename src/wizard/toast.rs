use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;

pub const DEFAULT_TOAST_DURATION: Duration = Duration::from_millis(2200);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToastLevel {
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Toast {
    pub message: String,
    pub level: ToastLevel,
}

impl Toast {
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            level: ToastLevel::Warning,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            level: ToastLevel::Error,
        }
    }
}

/// Single-slot message holder. A new toast replaces the visible one and
/// restarts the expiry clock.
#[derive(Debug)]
pub struct ToastNotifier {
    duration: Duration,
    slot: Option<(Toast, Instant)>,
    shown: u64,
}

impl Default for ToastNotifier {
    fn default() -> Self {
        Self::new(DEFAULT_TOAST_DURATION)
    }
}

impl ToastNotifier {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            slot: None,
            shown: 0,
        }
    }

    pub fn show(&mut self, toast: Toast) {
        self.slot = Some((toast, Instant::now() + self.duration));
        self.shown += 1;
    }

    pub fn clear(&mut self) {
        self.slot = None;
    }

    /// Visible toast, if it has not expired yet.
    pub fn current(&self) -> Option<&Toast> {
        match &self.slot {
            Some((toast, expires_at)) if Instant::now() < *expires_at => Some(toast),
            _ => None,
        }
    }

    /// Time left before the visible toast disappears.
    pub fn remaining(&self) -> Option<Duration> {
        self.slot
            .as_ref()
            .map(|(_, expires_at)| expires_at.saturating_duration_since(Instant::now()))
            .filter(|left| !left.is_zero())
    }

    /// Number of toasts shown since creation.
    pub fn shown(&self) -> u64 {
        self.shown
    }
}
