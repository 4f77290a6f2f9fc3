//! Typed wrappers over the campus REST API.
//!
//! SYSTEM CONTEXT
//! ==============
//! Each submodule maps one server resource to free async functions taking an
//! [`ApiClient`](crate::pipeline::ApiClient). Everything goes through the
//! request pipeline, so CSRF forwarding and refresh recovery apply uniformly.
//! Resources the client only displays are returned as `serde_json::Value`;
//! notifications, which the client also mutates locally, are typed.

pub mod auth;
pub mod categories;
pub mod events;
pub mod notifications;
pub mod registrations;
pub mod reports;
pub mod reviews;
pub mod users;

/// Ordered query parameters for list endpoints. Setting a key twice keeps
/// the latest value in the original position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListParams {
    pairs: Vec<(String, String)>,
}

impl ListParams {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn set(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        let key = key.into();
        let value = value.to_string();
        match self.pairs.iter_mut().find(|(k, _)| *k == key) {
            Some(pair) => pair.1 = value,
            None => self.pairs.push((key, value)),
        }
        self
    }

    #[must_use]
    pub fn page(self, page: u32) -> Self {
        self.set("page", page)
    }

    #[must_use]
    pub fn page_size(self, size: u32) -> Self {
        self.set("page_size", size)
    }

    #[must_use]
    pub fn search(self, term: impl ToString) -> Self {
        self.set("search", term)
    }

    #[must_use]
    pub fn ordering(self, field: impl ToString) -> Self {
        self.set("ordering", field)
    }

    /// Start from `defaults` and let every key already set here override them.
    #[must_use]
    pub fn with_defaults(self, defaults: &[(&str, &str)]) -> Self {
        let mut merged = Self::new();
        for (key, value) in defaults {
            merged = merged.set(*key, value);
        }
        for (key, value) in self.pairs {
            merged = merged.set(key, value);
        }
        merged
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    #[must_use]
    pub fn into_pairs(self) -> Vec<(String, String)> {
        self.pairs
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
