//! Client configuration parsed from environment variables.
//!
//! Every field has a default that matches a local development setup
//! (`http://localhost:8000/api` for REST, a page origin on port 8080), so an
//! empty environment yields a usable config.

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:8000/api";
pub const DEFAULT_PAGE_ORIGIN: &str = "http://localhost:8080";
pub const DEFAULT_SESSION_FILE: &str = ".campus-session.json";
pub const DEFAULT_LOGIN_PAGE: &str = "/login";
pub const DEFAULT_PING_INTERVAL_SECS: u64 = 30;
pub const DEFAULT_RECONNECT_DELAY_MS: u64 = 3000;

/// Paths whose 401 responses must never trigger a token refresh.
///
/// Matched against the end of the request path; the bare `/users-utils/`
/// entry is the registration endpoint.
pub const DEFAULT_EXEMPT_PATHS: &[&str] = &[
    "/users-utils/login/",
    "/users-utils/refresh/",
    "/users-utils/logout/",
    "/users-utils/",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// REST base URL; every API path is appended to it.
    pub api_url: String,
    /// Explicit realtime endpoint. Wins over every derived URL.
    pub ws_url: Option<String>,
    /// Development mode derives the realtime URL from the page origin.
    pub dev_mode: bool,
    /// Origin the client is "served" from.
    pub page_origin: String,
    /// Public API origin used to derive the realtime URL when deployed.
    pub api_origin: Option<String>,
    pub session_file: PathBuf,
    pub login_page: String,
    pub exempt_paths: Vec<String>,
    pub ping_interval: Duration,
    pub reconnect_delay: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_owned(),
            ws_url: None,
            dev_mode: false,
            page_origin: DEFAULT_PAGE_ORIGIN.to_owned(),
            api_origin: None,
            session_file: PathBuf::from(DEFAULT_SESSION_FILE),
            login_page: DEFAULT_LOGIN_PAGE.to_owned(),
            exempt_paths: DEFAULT_EXEMPT_PATHS.iter().map(|p| (*p).to_owned()).collect(),
            ping_interval: Duration::from_secs(DEFAULT_PING_INTERVAL_SECS),
            reconnect_delay: Duration::from_millis(DEFAULT_RECONNECT_DELAY_MS),
        }
    }
}

impl ClientConfig {
    /// Build config from process environment variables.
    ///
    /// Recognised: `CAMPUS_API_URL`, `CAMPUS_WS_URL`, `CAMPUS_DEV`,
    /// `CAMPUS_PAGE_ORIGIN`, `CAMPUS_API_ORIGIN`, `CAMPUS_SESSION_FILE`,
    /// `CAMPUS_LOGIN_PAGE`, `CAMPUS_PING_INTERVAL_SECS`,
    /// `CAMPUS_RECONNECT_DELAY_MS`.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup. Empty values count as unset.
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_owned()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        Self {
            api_url: get("CAMPUS_API_URL").unwrap_or(defaults.api_url),
            ws_url: get("CAMPUS_WS_URL"),
            dev_mode: get("CAMPUS_DEV").and_then(|v| parse_bool(&v)).unwrap_or(false),
            page_origin: get("CAMPUS_PAGE_ORIGIN").unwrap_or(defaults.page_origin),
            api_origin: get("CAMPUS_API_ORIGIN"),
            session_file: get("CAMPUS_SESSION_FILE").map_or(defaults.session_file, PathBuf::from),
            login_page: get("CAMPUS_LOGIN_PAGE").unwrap_or(defaults.login_page),
            exempt_paths: defaults.exempt_paths,
            ping_interval: Duration::from_secs(parse_positive_or(
                get("CAMPUS_PING_INTERVAL_SECS"),
                DEFAULT_PING_INTERVAL_SECS,
            )),
            reconnect_delay: Duration::from_millis(parse_or(
                get("CAMPUS_RECONNECT_DELAY_MS"),
                DEFAULT_RECONNECT_DELAY_MS,
            )),
        }
    }
}

fn parse_or<T>(raw: Option<String>, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    raw.and_then(|v| v.parse::<T>().ok()).unwrap_or(default)
}

/// Like [`parse_or`], but zero also falls back; used for timer periods.
fn parse_positive_or(raw: Option<String>, default: u64) -> u64 {
    raw.and_then(|v| v.parse::<u64>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(default)
}

pub(crate) fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
