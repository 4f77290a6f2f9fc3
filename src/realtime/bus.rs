//! In-process fan-out of pushed notifications, plus the toast hook.
//!
//! Independently mounted consumers (an unread counter, a list view, the CLI)
//! subscribe to [`NotificationBus`] instead of sharing a state store.

use std::time::Duration;

use tokio::sync::broadcast;

use crate::types::Notification;

pub const DEFAULT_BUS_CAPACITY: usize = 64;
pub const TOAST_DURATION: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct NotificationBus {
    tx: broadcast::Sender<Notification>,
}

impl Default for NotificationBus {
    fn default() -> Self {
        Self::new(DEFAULT_BUS_CAPACITY)
    }
}

impl NotificationBus {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.tx.subscribe()
    }

    /// Publish to every current subscriber. Returns how many received it.
    pub fn publish(&self, notification: Notification) -> usize {
        // No subscribers is not an error for a best-effort broadcast.
        self.tx.send(notification).unwrap_or(0)
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub title: String,
    pub description: Option<String>,
    pub duration: Duration,
}

impl Toast {
    #[must_use]
    pub fn for_notification(notification: &Notification) -> Self {
        let title = if notification.message.is_empty() {
            "New notification".to_owned()
        } else {
            notification.message.clone()
        };
        Self {
            title,
            description: notification
                .event_title
                .as_ref()
                .map(|title| format!("Event: {title}")),
            duration: TOAST_DURATION,
        }
    }
}

pub trait Toaster: Send + Sync {
    fn show(&self, toast: &Toast);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LogToaster;

impl Toaster for LogToaster {
    fn show(&self, toast: &Toast) {
        tracing::info!(
            title = %toast.title,
            description = toast.description.as_deref().unwrap_or(""),
            "notification"
        );
    }
}

#[cfg(test)]
#[path = "bus_test.rs"]
mod tests;
