//! Connection states and the reconnect-after-close policy.

use std::time::Duration;

pub const CLOSE_NORMAL: u16 = 1000;
/// Reported when the transport ended without a close frame.
pub const CLOSE_ABNORMAL: u16 = 1006;
pub const CLOSE_UNAUTHORIZED: u16 = 4001;
pub const CLOSE_FORBIDDEN: u16 = 4003;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Open,
    Closed,
}

impl ConnectionState {
    #[must_use]
    pub fn is_open(self) -> bool {
        matches!(self, Self::Open)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    NormalClosure,
    AuthRejected(u16),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconnectDecision {
    Stop(StopReason),
    After(Duration),
}

/// Decide what happens after the socket closed with `code`.
///
/// A missing code (transport error, no close frame) counts as abnormal.
#[must_use]
pub fn decide_reconnect(code: Option<u16>, delay: Duration) -> ReconnectDecision {
    match code.unwrap_or(CLOSE_ABNORMAL) {
        CLOSE_NORMAL => ReconnectDecision::Stop(StopReason::NormalClosure),
        code @ (CLOSE_UNAUTHORIZED | CLOSE_FORBIDDEN) => {
            ReconnectDecision::Stop(StopReason::AuthRejected(code))
        }
        _ => ReconnectDecision::After(delay),
    }
}

#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
