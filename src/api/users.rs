//! User accounts under `/users-utils/usuarios/`.

use serde_json::Value;

use crate::error::ApiError;
use crate::pipeline::{ApiClient, ApiRequest};

pub const USERS_PATH: &str = "/users-utils/usuarios/";

/// # Errors
///
/// Returns transport or status errors.
pub async fn count(client: &ApiClient) -> Result<Value, ApiError> {
    let path = format!("{USERS_PATH}count_users/");
    client.send_json(ApiRequest::get(path)).await
}

/// # Errors
///
/// Returns transport or status errors.
pub async fn get(client: &ApiClient, id: i64) -> Result<Value, ApiError> {
    client
        .send_json(ApiRequest::get(format!("{USERS_PATH}{id}/")))
        .await
}

/// # Errors
///
/// Returns the server's validation failure unchanged.
pub async fn update(client: &ApiClient, id: i64, user: Value) -> Result<Value, ApiError> {
    client
        .send_json(ApiRequest::put(format!("{USERS_PATH}{id}/")).json(user))
        .await
}
