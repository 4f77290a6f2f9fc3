//! Authenticated request pipeline.
//!
//! SYSTEM CONTEXT
//! ==============
//! Every REST call in the crate goes through [`ApiClient::send`]. On the way
//! out it attaches the anti-forgery token from the `csrftoken` cookie as
//! `X-CSRFToken`. On the way back it recovers from an expired access token:
//! the first eligible 401 triggers exactly one `POST /users-utils/refresh/`,
//! requests that hit a 401 while that refresh is running queue behind it,
//! and every one of them is replayed once the refresh settles.
//!
//! ERROR HANDLING
//! ==============
//! Non-401 failures and ineligible 401s (see [`policy`]) come back unchanged
//! as `ApiError::Status`. A failed refresh fails the whole queued batch with
//! the same `RefreshError` and sends the navigator to the login page.

pub mod navigator;
pub mod policy;
pub mod refresh;

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use reqwest::header::HeaderValue;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::ClientConfig;
use crate::error::{ApiError, RefreshError};
use crate::session::{CSRF_COOKIE, REFRESH_COOKIE, SessionCookies};

use self::navigator::SessionNavigator;
use self::policy::{FailureContext, RecoveryDecision, evaluate_failure};
use self::refresh::{RefreshGate, RefreshOutcome, RefreshTicket};

pub const CSRF_HEADER: &str = "X-CSRFToken";
pub const REFRESH_PATH: &str = "/users-utils/refresh/";

// =============================================================================
// REQUEST / RESPONSE
// =============================================================================

/// A replayable request description. Paths are relative to the API base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    retried: bool,
}

impl ApiRequest {
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            retried: false,
        }
    }

    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    #[must_use]
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    #[must_use]
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    #[must_use]
    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    #[must_use]
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    #[must_use]
    pub fn queries<I, K, V>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.query
            .extend(pairs.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    #[must_use]
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    #[must_use]
    pub fn is_retried(&self) -> bool {
        self.retried
    }
}

#[derive(Debug, Clone)]
pub struct ApiResponse {
    status: StatusCode,
    body: Vec<u8>,
}

impl ApiResponse {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.body
    }

    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.body
    }

    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Decode the body as JSON. An empty body decodes as `null`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Decode`] if the body is not valid JSON for `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        if self.body.is_empty() {
            return Ok(serde_json::from_value(Value::Null)?);
        }
        Ok(serde_json::from_slice(&self.body)?)
    }

    fn into_error(self) -> ApiError {
        ApiError::Status {
            status: self.status,
            body: String::from_utf8_lossy(&self.body).into_owned(),
        }
    }
}

// =============================================================================
// CLIENT
// =============================================================================

#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<Inner>,
}

type CsrfFetch = Shared<BoxFuture<'static, Option<String>>>;

struct Inner {
    http: reqwest::Client,
    base_url: String,
    session: SessionCookies,
    gate: RefreshGate,
    exempt_paths: Vec<String>,
    navigator: Arc<dyn SessionNavigator>,
    csrf_fetch: Mutex<Option<CsrfFetch>>,
}

impl ApiClient {
    /// Build a client whose cookie store is `session`.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(
        config: &ClientConfig,
        session: SessionCookies,
        navigator: Arc<dyn SessionNavigator>,
    ) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .cookie_provider(session.jar())
            .build()?;
        Ok(Self {
            inner: Arc::new(Inner {
                http,
                base_url: config.api_url.trim_end_matches('/').to_owned(),
                session,
                gate: RefreshGate::new(),
                exempt_paths: config.exempt_paths.clone(),
                navigator,
                csrf_fetch: Mutex::new(None),
            }),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    #[must_use]
    pub fn session(&self) -> &SessionCookies {
        &self.inner.session
    }

    #[must_use]
    pub fn refresh_gate(&self) -> &RefreshGate {
        &self.inner.gate
    }

    /// Run `fetch` for the CSRF token unless one is already in flight, in
    /// which case join it. The slot clears once the shared fetch resolves.
    pub async fn join_csrf_fetch<F, Fut>(&self, fetch: F) -> Option<String>
    where
        F: FnOnce(ApiClient) -> Fut,
        Fut: Future<Output = Option<String>> + Send + 'static,
    {
        let flight = {
            let mut slot = self.csrf_slot();
            match slot.as_ref() {
                Some(existing) => existing.clone(),
                None => {
                    let started = fetch(self.clone()).boxed().shared();
                    *slot = Some(started.clone());
                    started
                }
            }
        };

        let token = flight.clone().await;
        let mut slot = self.csrf_slot();
        if slot.as_ref().is_some_and(|current| current.ptr_eq(&flight)) {
            *slot = None;
        }
        token
    }

    fn csrf_slot(&self) -> MutexGuard<'_, Option<CsrfFetch>> {
        self.inner
            .csrf_fetch
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Send a request through the pipeline.
    ///
    /// # Errors
    ///
    /// Returns transport errors, the unchanged failure status for
    /// unrecoverable responses, or the refresh error if recovery failed.
    pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let response = self.dispatch(&request).await?;
        if response.status.is_success() {
            return Ok(response);
        }
        self.recover(request, response).await
    }

    /// Send and decode the JSON response body.
    ///
    /// # Errors
    ///
    /// Same as [`ApiClient::send`], plus [`ApiError::Decode`].
    pub async fn send_json<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        self.send(request).await?.json()
    }

    async fn recover(
        &self,
        mut request: ApiRequest,
        failed: ApiResponse,
    ) -> Result<ApiResponse, ApiError> {
        let ctx = FailureContext {
            status: failed.status,
            path: &request.path,
            retried: request.retried,
            has_refresh_cookie: self.inner.session.contains(REFRESH_COOKIE),
        };
        if let RecoveryDecision::Propagate(reason) = evaluate_failure(&ctx, &self.inner.exempt_paths) {
            tracing::debug!(
                path = %request.path,
                status = failed.status.as_u16(),
                ?reason,
                "propagating failed response"
            );
            return Err(failed.into_error());
        }

        request.retried = true;
        match self.inner.gate.begin() {
            RefreshTicket::Waiter(waiter) => waiter.wait().await?,
            RefreshTicket::Leader(lease) => {
                let outcome = self.refresh_session().await;
                let woken = lease.settle(&outcome);
                if let Err(error) = &outcome {
                    tracing::warn!(%error, woken, "token refresh failed");
                    if !self.inner.navigator.is_on_login_page() {
                        self.inner.navigator.redirect_to_login();
                    }
                } else {
                    tracing::info!(woken, "access token refreshed");
                }
                outcome?;
            }
        }

        self.replay(request).await
    }

    async fn replay(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        tracing::debug!(method = %request.method, path = %request.path, "replaying request");
        let response = self.dispatch(&request).await?;
        if response.status.is_success() {
            return Ok(response);
        }
        // Replays are marked retried; a second failure is never recovered.
        Err(response.into_error())
    }

    async fn refresh_session(&self) -> RefreshOutcome {
        match self.dispatch(&ApiRequest::post(REFRESH_PATH)).await {
            Ok(response) if response.status.is_success() => Ok(()),
            Ok(response) => Err(RefreshError::Rejected {
                status: response.status.as_u16(),
            }),
            Err(error) => Err(RefreshError::Transport(error.to_string())),
        }
    }

    /// One raw round trip: CSRF attached, no recovery.
    async fn dispatch(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError> {
        let url = format!("{}{}", self.inner.base_url, request.path);
        let mut builder = self.inner.http.request(request.method.clone(), &url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = self.inner.session.get(CSRF_COOKIE) {
            builder = builder.header(CSRF_HEADER, HeaderValue::from_str(&token)?);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let body = response.bytes().await?.to_vec();
        Ok(ApiResponse { status, body })
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
