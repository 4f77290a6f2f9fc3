//! The realtime channel's state machine, free of I/O.
//!
//! DESIGN
//! ======
//! The async driver in `mod.rs` owns the socket and the timers; it reports
//! transport events here (`begin_connect`, `on_open`, `on_text`, `on_close`,
//! `on_shutdown`) and acts on what comes back. Keeping the transitions in one
//! place makes the reconnect decision exhaustive and lets tests drive the
//! machine without a network.
//!
//! The keepalive flag mirrors the driver's interval: the driver only creates
//! its interval after `on_open` and drops it on every path that reaches
//! `on_close`/`on_shutdown`.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::watch;

use super::bus::{NotificationBus, Toast, Toaster};
use super::message::{ServerMessage, parse_server_message};
use super::state::{ConnectionState, ReconnectDecision, decide_reconnect};
use crate::types::Notification;

/// Locally held notifications, newest first.
#[derive(Debug, Clone, Default)]
pub struct NotificationList {
    inner: Arc<Mutex<Vec<Notification>>>,
}

impl NotificationList {
    #[must_use]
    pub fn snapshot(&self) -> Vec<Notification> {
        self.lock().clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    #[must_use]
    pub fn unread(&self) -> usize {
        self.lock().iter().filter(|n| !n.read).count()
    }

    pub fn push_front(&self, notification: Notification) {
        self.lock().insert(0, notification);
    }

    /// Optimistically flag a notification as read. Returns whether it was found.
    pub fn mark_read(&self, id: i64) -> bool {
        let mut list = self.lock();
        match list.iter_mut().find(|n| n.id == id) {
            Some(n) => {
                n.read = true;
                true
            }
            None => false,
        }
    }

    pub fn remove(&self, id: i64) -> bool {
        let mut list = self.lock();
        let before = list.len();
        list.retain(|n| n.id != id);
        list.len() != before
    }

    /// Append previously fetched notifications behind the ones already held,
    /// skipping ids that are present. Returns how many were added.
    pub fn merge_older(&self, notifications: Vec<Notification>) -> usize {
        let mut list = self.lock();
        let before = list.len();
        for notification in notifications {
            if !list.iter().any(|n| n.id == notification.id) {
                list.push(notification);
            }
        }
        list.len() - before
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Notification>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutcome {
    Established { username: Option<String> },
    Delivered(Notification),
    EmptyNotification,
    Pong,
    Ignored,
    Malformed,
}

pub struct ChannelCore {
    state_tx: watch::Sender<ConnectionState>,
    keepalive_armed: bool,
    notifications: NotificationList,
    bus: NotificationBus,
    toaster: Arc<dyn Toaster>,
    reconnect_delay: Duration,
}

impl ChannelCore {
    #[must_use]
    pub fn new(bus: NotificationBus, toaster: Arc<dyn Toaster>, reconnect_delay: Duration) -> Self {
        let (state_tx, _) = watch::channel(ConnectionState::Connecting);
        Self {
            state_tx,
            keepalive_armed: false,
            notifications: NotificationList::default(),
            bus,
            toaster,
            reconnect_delay,
        }
    }

    #[must_use]
    pub fn state(&self) -> ConnectionState {
        *self.state_tx.borrow()
    }

    #[must_use]
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.state_tx.subscribe()
    }

    #[must_use]
    pub fn keepalive_armed(&self) -> bool {
        self.keepalive_armed
    }

    #[must_use]
    pub fn notifications(&self) -> NotificationList {
        self.notifications.clone()
    }

    #[must_use]
    pub fn bus(&self) -> &NotificationBus {
        &self.bus
    }

    pub fn begin_connect(&mut self) {
        self.set_state(ConnectionState::Connecting);
    }

    pub fn on_open(&mut self) {
        self.set_state(ConnectionState::Open);
        self.keepalive_armed = true;
        tracing::info!("notification channel open");
    }

    /// Handle one text frame. Never fails; bad frames are logged and dropped.
    pub fn on_text(&mut self, text: &str) -> FrameOutcome {
        let message = match parse_server_message(text) {
            Ok(message) => message,
            Err(error) => {
                tracing::warn!(%error, "dropping malformed realtime frame");
                return FrameOutcome::Malformed;
            }
        };

        match message {
            ServerMessage::ConnectionEstablished { username, .. } => {
                tracing::info!(
                    username = username.as_deref().unwrap_or(""),
                    "realtime session established"
                );
                FrameOutcome::Established { username }
            }
            ServerMessage::Notification { data: Some(notification) } => {
                tracing::debug!(id = notification.id, "notification received");
                self.notifications.push_front(notification.clone());
                self.bus.publish(notification.clone());
                self.toaster.show(&Toast::for_notification(&notification));
                FrameOutcome::Delivered(notification)
            }
            ServerMessage::Notification { data: None } => FrameOutcome::EmptyNotification,
            ServerMessage::Pong { .. } => FrameOutcome::Pong,
            ServerMessage::Unknown => {
                tracing::debug!("ignoring unknown realtime message type");
                FrameOutcome::Ignored
            }
        }
    }

    pub fn on_close(&mut self, code: Option<u16>) -> ReconnectDecision {
        self.set_state(ConnectionState::Closed);
        self.keepalive_armed = false;
        let decision = decide_reconnect(code, self.reconnect_delay);
        tracing::info!(?code, ?decision, "notification channel closed");
        decision
    }

    /// Intentional teardown: closed, no reconnect.
    pub fn on_shutdown(&mut self) {
        self.set_state(ConnectionState::Closed);
        self.keepalive_armed = false;
    }

    fn set_state(&self, next: ConnectionState) {
        self.state_tx.send_replace(next);
    }
}

#[cfg(test)]
#[path = "machine_test.rs"]
mod tests;
