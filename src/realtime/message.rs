//! JSON messages exchanged on the notification socket.

use serde::{Deserialize, Serialize};

use crate::types::Notification;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    ConnectionEstablished {
        #[serde(default)]
        message: Option<String>,
        #[serde(default)]
        user_id: Option<i64>,
        #[serde(default)]
        username: Option<String>,
    },
    Notification {
        #[serde(default)]
        data: Option<Notification>,
    },
    Pong {
        #[serde(default)]
        timestamp: Option<i64>,
    },
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Ping { timestamp: i64 },
}

impl ClientMessage {
    #[must_use]
    pub fn ping_now() -> Self {
        Self::Ping {
            timestamp: now_ms(),
        }
    }

    #[must_use]
    pub fn to_text(&self) -> String {
        // Serializing a plain tagged struct cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Parse one text frame.
///
/// # Errors
///
/// Returns the JSON error for malformed frames; callers drop those.
pub fn parse_server_message(text: &str) -> Result<ServerMessage, serde_json::Error> {
    serde_json::from_str(text)
}

fn now_ms() -> i64 {
    let Ok(duration) = std::time::SystemTime::now().duration_since(std::time::UNIX_EPOCH) else {
        return 0;
    };
    i64::try_from(duration.as_millis()).unwrap_or(0)
}

#[cfg(test)]
#[path = "message_test.rs"]
mod tests;
