//! Event categories.

use serde_json::Value;

use crate::error::ApiError;
use crate::pipeline::{ApiClient, ApiRequest};

pub const CATEGORIES_PATH: &str = "/events-utils/categorias/";

/// # Errors
///
/// Returns transport or status errors.
pub async fn list(client: &ApiClient) -> Result<Value, ApiError> {
    client.send_json(ApiRequest::get(CATEGORIES_PATH)).await
}

/// # Errors
///
/// Returns transport or status errors.
pub async fn count(client: &ApiClient) -> Result<Value, ApiError> {
    let path = format!("{CATEGORIES_PATH}count_categories/");
    client.send_json(ApiRequest::get(path)).await
}

/// # Errors
///
/// Returns transport or status errors.
pub async fn get(client: &ApiClient, id: i64) -> Result<Value, ApiError> {
    client
        .send_json(ApiRequest::get(format!("{CATEGORIES_PATH}{id}/")))
        .await
}
