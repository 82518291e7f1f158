//! Short-lived user-facing notifications.
//!
//! Each message schedules its own removal [`DISPLAY_DURATION`] after it is
//! pushed, backed by a [`DelayQueue`] entry. Dismissing a message early
//! cancels its entry, so deadlines are strictly per message rather than a
//! periodic sweep.
//!
//! [`NotificationQueue::push`] arms a timer and must be called from within
//! a Tokio runtime.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use tokio_util::time::{delay_queue, DelayQueue};

use crate::error::CoreError;

/// How long a notification stays visible unless dismissed.
pub const DISPLAY_DURATION: Duration = Duration::from_millis(4000);

/// Visual weight of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Info,
    Success,
    Error,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Success => "success",
            Severity::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifier of a notification, unique for the lifetime of its queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NotificationId(u64);

impl NotificationId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for NotificationId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_start_matches('#');
        trimmed
            .parse::<u64>()
            .map(NotificationId)
            .map_err(|_| CoreError::Validation(format!("Invalid notification id \"{s}\"")))
    }
}

/// A message currently visible to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: NotificationId,
    pub severity: Severity,
    pub text: String,
}

/// Visible notifications in insertion order, each with its own expiry timer.
pub struct NotificationQueue {
    messages: Vec<Notification>,
    timers: DelayQueue<NotificationId>,
    keys: HashMap<NotificationId, delay_queue::Key>,
    next_id: u64,
    display_duration: Duration,
}

impl NotificationQueue {
    /// Create a queue using the standard [`DISPLAY_DURATION`].
    pub fn new() -> Self {
        Self::with_display_duration(DISPLAY_DURATION)
    }

    /// Create a queue whose messages expire after `display_duration`.
    pub fn with_display_duration(display_duration: Duration) -> Self {
        Self {
            messages: Vec::new(),
            timers: DelayQueue::new(),
            keys: HashMap::new(),
            next_id: 1,
            display_duration,
        }
    }

    /// Show a new message and arm its expiry timer.
    pub fn push(&mut self, severity: Severity, text: impl Into<String>) -> NotificationId {
        let id = NotificationId(self.next_id);
        self.next_id += 1;

        let key = self.timers.insert(id, self.display_duration);
        self.keys.insert(id, key);
        self.messages.push(Notification {
            id,
            severity,
            text: text.into(),
        });

        tracing::debug!(id = id.get(), severity = %severity, "Notification shown");
        id
    }

    /// Remove a message before its deadline (user dismissal).
    ///
    /// Returns `true` if the message was visible.
    pub fn expire(&mut self, id: NotificationId) -> bool {
        let Some(key) = self.keys.remove(&id) else {
            return false;
        };
        self.timers.remove(&key);
        self.messages.retain(|m| m.id != id);
        true
    }

    /// Wait for the earliest deadline, remove that message and return its id.
    ///
    /// Resolves to `None` immediately when nothing is visible. Cancel-safe:
    /// dropping the future before it resolves leaves every timer armed.
    pub async fn next_expired(&mut self) -> Option<NotificationId> {
        let expired = std::future::poll_fn(|cx| self.timers.poll_expired(cx)).await?;
        let id = expired.into_inner();
        self.keys.remove(&id);
        self.messages.retain(|m| m.id != id);
        tracing::trace!(id = id.get(), "Notification expired");
        Some(id)
    }

    /// Drop every message and timer.
    pub fn clear(&mut self) {
        self.timers.clear();
        self.keys.clear();
        self.messages.clear();
    }

    pub fn messages(&self) -> &[Notification] {
        &self.messages
    }

    pub fn get(&self, id: NotificationId) -> Option<&Notification> {
        self.messages.iter().find(|m| m.id == id)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl Default for NotificationQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for NotificationQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationQueue")
            .field("messages", &self.messages)
            .field("display_duration", &self.display_duration)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
