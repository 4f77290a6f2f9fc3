//! Decides whether a failed response is eligible for token-refresh recovery.
//!
//! The checks run in a fixed order and the first match wins, so the reason
//! reported for a propagated failure is deterministic.

use reqwest::StatusCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropagateReason {
    NotUnauthorized,
    ExemptEndpoint,
    AlreadyRetried,
    NoRefreshCredential,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryDecision {
    Propagate(PropagateReason),
    Refresh,
}

/// Inputs describing one failed response.
#[derive(Debug, Clone, Copy)]
pub struct FailureContext<'a> {
    pub status: StatusCode,
    pub path: &'a str,
    pub retried: bool,
    pub has_refresh_cookie: bool,
}

#[must_use]
pub fn evaluate_failure(ctx: &FailureContext<'_>, exempt_paths: &[String]) -> RecoveryDecision {
    if ctx.status != StatusCode::UNAUTHORIZED {
        return RecoveryDecision::Propagate(PropagateReason::NotUnauthorized);
    }
    if is_exempt(ctx.path, exempt_paths) {
        return RecoveryDecision::Propagate(PropagateReason::ExemptEndpoint);
    }
    if ctx.retried {
        return RecoveryDecision::Propagate(PropagateReason::AlreadyRetried);
    }
    if !ctx.has_refresh_cookie {
        return RecoveryDecision::Propagate(PropagateReason::NoRefreshCredential);
    }
    RecoveryDecision::Refresh
}

/// Suffix match on the path with any query string stripped.
#[must_use]
pub fn is_exempt(path: &str, exempt_paths: &[String]) -> bool {
    let path = path.split_once('?').map_or(path, |(p, _)| p);
    exempt_paths.iter().any(|exempt| path.ends_with(exempt.as_str()))
}

#[cfg(test)]
#[path = "policy_test.rs"]
mod tests;
