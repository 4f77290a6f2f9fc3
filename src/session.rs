//! Cookie-backed session state.
//!
//! The server owns the session: it sets `access`, `refresh` and `csrftoken`
//! cookies and the client only forwards them. [`SessionCookies`] wraps the
//! shared `reqwest` jar so the request pipeline can read individual cookie
//! values and the realtime channel can forward them on its handshake.
//!
//! A session can be persisted to a small JSON file so separate CLI runs
//! share one login.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use reqwest::Url;
use reqwest::cookie::{CookieStore, Jar};
use serde::{Deserialize, Serialize};

use crate::error::SessionError;

pub const CSRF_COOKIE: &str = "csrftoken";
pub const REFRESH_COOKIE: &str = "refresh";
pub const ACCESS_COOKIE: &str = "access";

#[derive(Clone)]
pub struct SessionCookies {
    jar: Arc<Jar>,
    url: Url,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct SessionFile {
    cookies: BTreeMap<String, String>,
}

impl SessionCookies {
    /// Create an empty session scoped to the API base URL.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidUrl`] if `api_url` cannot be parsed.
    pub fn new(api_url: &str) -> Result<Self, SessionError> {
        let url = Url::parse(api_url).map_err(|_| SessionError::InvalidUrl(api_url.to_owned()))?;
        Ok(Self {
            jar: Arc::new(Jar::default()),
            url,
        })
    }

    /// Jar handed to `reqwest::ClientBuilder::cookie_provider`.
    #[must_use]
    pub fn jar(&self) -> Arc<Jar> {
        Arc::clone(&self.jar)
    }

    /// All cookies currently sent to the API origin, as `name -> value`.
    #[must_use]
    pub fn all(&self) -> BTreeMap<String, String> {
        let Some(header) = self.cookie_header() else {
            return BTreeMap::new();
        };
        parse_cookie_header(&header)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<String> {
        self.all().remove(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Raw `Cookie` header value for the API origin.
    #[must_use]
    pub fn cookie_header(&self) -> Option<String> {
        self.jar
            .cookies(&self.url)
            .and_then(|value| value.to_str().ok().map(ToOwned::to_owned))
    }

    pub fn insert(&self, name: &str, value: &str) {
        self.jar
            .add_cookie_str(&format!("{name}={value}; Path=/"), &self.url);
    }

    /// Load cookies from a session file. A missing file is an empty session.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(&self, path: &Path) -> Result<usize, SessionError> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(error) => return Err(error.into()),
        };
        let file = serde_json::from_str::<SessionFile>(&raw)?;
        for (name, value) in &file.cookies {
            self.insert(name, value);
        }
        tracing::debug!(path = %path.display(), count = file.cookies.len(), "session loaded");
        Ok(file.cookies.len())
    }

    /// Write the current cookies to a session file.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn save(&self, path: &Path) -> Result<(), SessionError> {
        let file = SessionFile { cookies: self.all() };
        let rendered = serde_json::to_string_pretty(&file)?;
        std::fs::write(path, rendered)?;
        tracing::debug!(path = %path.display(), count = file.cookies.len(), "session saved");
        Ok(())
    }
}

impl std::fmt::Debug for SessionCookies {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Cookie values are credentials; only names are printed.
        f.debug_struct("SessionCookies")
            .field("url", &self.url.as_str())
            .field("names", &self.all().keys().collect::<Vec<_>>())
            .finish()
    }
}

fn parse_cookie_header(header: &str) -> BTreeMap<String, String> {
    header
        .split(';')
        .filter_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            Some((name.to_owned(), value.trim().to_owned()))
        })
        .collect()
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
