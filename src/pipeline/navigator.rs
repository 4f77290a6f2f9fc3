//! Hook for the "session expired" path of the request pipeline.
//!
//! A failed refresh is fatal for the session: the pipeline asks the
//! navigator to send the user back to login, unless they are already there.

use std::sync::{Arc, Mutex, PoisonError};

pub trait SessionNavigator: Send + Sync {
    fn is_on_login_page(&self) -> bool;
    fn redirect_to_login(&self);
}

/// Navigator for headless use: logs the expiry and tracks the current location.
#[derive(Debug, Clone)]
pub struct LoggingNavigator {
    login_page: String,
    location: Arc<Mutex<String>>,
}

impl LoggingNavigator {
    #[must_use]
    pub fn new(login_page: impl Into<String>) -> Self {
        Self {
            login_page: login_page.into(),
            location: Arc::new(Mutex::new("/".to_owned())),
        }
    }

    pub fn set_location(&self, path: impl Into<String>) {
        *self.location.lock().unwrap_or_else(PoisonError::into_inner) = path.into();
    }

    #[must_use]
    pub fn location(&self) -> String {
        self.location
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl SessionNavigator for LoggingNavigator {
    fn is_on_login_page(&self) -> bool {
        self.location() == self.login_page
    }

    fn redirect_to_login(&self) {
        tracing::warn!(target_page = %self.login_page, "session expired; login required");
        self.set_location(self.login_page.clone());
    }
}
