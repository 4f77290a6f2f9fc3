//! Account and session endpoints under `/users-utils/`.
//!
//! Login, logout, refresh and registration are exempt from refresh recovery;
//! a 401 from any of them reaches the caller unchanged.

use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::ApiError;
use crate::pipeline::{ApiClient, ApiRequest, REFRESH_PATH};

pub const REGISTER_PATH: &str = "/users-utils/";
pub const LOGIN_PATH: &str = "/users-utils/login/";
pub const LOGOUT_PATH: &str = "/users-utils/logout/";
pub const VERIFY_PATH: &str = "/users-utils/verify/";
pub const ROLES_PATH: &str = "/users-utils/roles/";
pub const CSRF_PATH: &str = "/users-utils/csrf-token/";

/// # Errors
///
/// Returns the server's validation failure unchanged.
pub async fn register(client: &ApiClient, user: Value) -> Result<Value, ApiError> {
    client.send_json(ApiRequest::post(REGISTER_PATH).json(user)).await
}

/// Log in; the server answers by setting `access`/`refresh` cookies.
///
/// # Errors
///
/// Returns `ApiError::Status` for bad credentials.
pub async fn login(client: &ApiClient, username: &str, password: &str) -> Result<Value, ApiError> {
    let body = json!({ "username": username, "password": password });
    client.send_json(ApiRequest::post(LOGIN_PATH).json(body)).await
}

/// # Errors
///
/// Returns transport or status errors.
pub async fn logout(client: &ApiClient) -> Result<Value, ApiError> {
    client.send_json(ApiRequest::post(LOGOUT_PATH)).await
}

/// Check whether the current access cookie is valid.
///
/// # Errors
///
/// Returns transport or status errors.
pub async fn verify(client: &ApiClient) -> Result<Value, ApiError> {
    client.send_json(ApiRequest::post(VERIFY_PATH)).await
}

/// Explicit refresh, outside the pipeline's automatic recovery.
///
/// # Errors
///
/// Returns `ApiError::Status` if the refresh cookie is missing or expired.
pub async fn refresh(client: &ApiClient) -> Result<Value, ApiError> {
    client.send_json(ApiRequest::post(REFRESH_PATH)).await
}

/// # Errors
///
/// Returns transport or status errors.
pub async fn roles(client: &ApiClient) -> Result<Value, ApiError> {
    client.send_json(ApiRequest::get(ROLES_PATH)).await
}

#[derive(Debug, Deserialize)]
struct CsrfResponse {
    csrf_token: Option<String>,
}

/// Ask the server to (re)issue the `csrftoken` cookie.
///
/// Concurrent callers share one request. Not critical: on failure the
/// pipeline still forwards whatever cookie is already in the jar, so errors
/// are logged and reported as `None`.
pub async fn fetch_csrf_token(client: &ApiClient) -> Option<String> {
    client
        .join_csrf_fetch(|client| async move {
            match client.send_json::<CsrfResponse>(ApiRequest::get(CSRF_PATH)).await {
                Ok(body) => body.csrf_token,
                Err(error) => {
                    tracing::warn!(%error, "could not fetch CSRF token");
                    None
                }
            }
        })
        .await
}
