//! Resolves the realtime endpoint URL from client configuration.
//!
//! Priority: explicit override, then the page origin in development mode,
//! then the public API origin (falling back to the page origin) when deployed.

use reqwest::Url;

use crate::config::ClientConfig;
use crate::error::RealtimeError;

pub const NOTIFICATIONS_PATH: &str = "/ws/notifications/";

/// # Errors
///
/// Returns [`RealtimeError::InvalidUrl`] when the origin used cannot yield a host.
pub fn resolve_ws_url(config: &ClientConfig) -> Result<String, RealtimeError> {
    if let Some(url) = &config.ws_url {
        return Ok(url.clone());
    }
    if config.dev_mode {
        return from_page_origin(&config.page_origin);
    }
    let origin = config.api_origin.as_deref().unwrap_or(&config.page_origin);
    from_api_origin(origin)
}

fn ws_scheme(origin: &str) -> &'static str {
    if origin.starts_with("https") { "wss" } else { "ws" }
}

/// Same-origin: only scheme, host and port of the page are kept.
fn from_page_origin(origin: &str) -> Result<String, RealtimeError> {
    let url = Url::parse(origin).map_err(|_| RealtimeError::InvalidUrl(origin.to_owned()))?;
    let host = url
        .host_str()
        .ok_or_else(|| RealtimeError::InvalidUrl(origin.to_owned()))?;
    let authority = match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_owned(),
    };
    Ok(format!("{}://{authority}{NOTIFICATIONS_PATH}", ws_scheme(origin)))
}

/// API origin: the scheme is swapped and any path prefix is kept.
fn from_api_origin(origin: &str) -> Result<String, RealtimeError> {
    let rest = origin
        .strip_prefix("https://")
        .or_else(|| origin.strip_prefix("http://"))
        .unwrap_or(origin)
        .trim_end_matches('/');
    if rest.is_empty() {
        return Err(RealtimeError::InvalidUrl(origin.to_owned()));
    }
    Ok(format!("{}://{rest}{NOTIFICATIONS_PATH}", ws_scheme(origin)))
}

#[cfg(test)]
#[path = "endpoint_test.rs"]
mod tests;
