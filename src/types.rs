//! Wire types shared by the REST endpoints and the realtime channel.
//!
//! Field names on the wire are the server's (`tipo`, `mensaje`, ...); the
//! Rust names are the client's.

use serde::{Deserialize, Serialize};

/// Notification category. Unknown server values are preserved verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NotificationKind {
    Reminder,
    Event,
    System,
    Other(String),
}

impl From<String> for NotificationKind {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "recordatorio" => Self::Reminder,
            "evento" => Self::Event,
            "sistema" => Self::System,
            _ => Self::Other(raw),
        }
    }
}

impl From<NotificationKind> for String {
    fn from(kind: NotificationKind) -> Self {
        match kind {
            NotificationKind::Reminder => "recordatorio".to_owned(),
            NotificationKind::Event => "evento".to_owned(),
            NotificationKind::System => "sistema".to_owned(),
            NotificationKind::Other(raw) => raw,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: i64,
    #[serde(rename = "tipo")]
    pub kind: NotificationKind,
    #[serde(rename = "etiqueta", default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(rename = "mensaje", default)]
    pub message: String,
    #[serde(rename = "evento_id", default)]
    pub event_id: Option<i64>,
    #[serde(rename = "evento_titulo", default)]
    pub event_title: Option<String>,
    #[serde(rename = "fecha_envio")]
    pub sent_at: String,
    #[serde(rename = "leida", default)]
    pub read: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationCount {
    pub total: u64,
    #[serde(rename = "no_leidas")]
    pub unread: u64,
    #[serde(rename = "leidas")]
    pub read: u64,
}

/// The server's paginated list envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub count: u64,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    pub results: Vec<T>,
}

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;
