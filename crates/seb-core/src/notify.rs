//! Transient one-line notifications ("toasts").
//!
//! The surface holds at most one message. A new message replaces the shown
//! one at once and pushes the hide deadline out to `now + TOAST_DURATION`.

use std::time::{Duration, Instant};

pub const TOAST_DURATION: Duration = Duration::from_millis(3000);

#[derive(Clone, Debug, Default)]
pub struct Notifier {
    message: Option<String>,
    hide_at: Option<Instant>,
    issued: u64,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notify(&mut self, message: impl Into<String>, now: Instant) {
        self.message = Some(message.into());
        self.hide_at = Some(now + TOAST_DURATION);
        self.issued += 1;
    }

    pub fn visible(&self, now: Instant) -> bool {
        self.hide_at.map(|deadline| now < deadline).unwrap_or(false)
    }

    pub fn current(&self, now: Instant) -> Option<&str> {
        if self.visible(now) {
            self.message.as_deref()
        } else {
            None
        }
    }

    /// Message most recently raised, whether or not it is still on screen.
    pub fn last_message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn hide_at(&self) -> Option<Instant> {
        self.hide_at
    }

    /// Total number of notifications raised since creation.
    pub fn issued(&self) -> u64 {
        self.issued
    }
}
