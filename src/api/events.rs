//! Event endpoints under `/events-utils/eventos/`.

use serde_json::Value;

use super::ListParams;
use crate::error::ApiError;
use crate::pipeline::{ApiClient, ApiRequest};

pub const EVENTS_PATH: &str = "/events-utils/eventos/";
pub const DEFAULT_FEATURED_LIMIT: u32 = 3;

fn event_path(id: i64) -> String {
    format!("{EVENTS_PATH}{id}/")
}

/// Parameters for the featured listing: the `limit` most recent by start date.
#[must_use]
pub fn featured_params(limit: u32) -> ListParams {
    ListParams::new().page_size(limit).ordering("-fecha_inicio")
}

/// # Errors
///
/// Returns transport or status errors.
pub async fn list(client: &ApiClient, params: ListParams) -> Result<Value, ApiError> {
    client
        .send_json(ApiRequest::get(EVENTS_PATH).queries(params.into_pairs()))
        .await
}

/// # Errors
///
/// Returns transport or status errors.
pub async fn get(client: &ApiClient, id: i64) -> Result<Value, ApiError> {
    client.send_json(ApiRequest::get(event_path(id))).await
}

/// # Errors
///
/// Returns the server's validation failure unchanged.
pub async fn create(client: &ApiClient, event: Value) -> Result<Value, ApiError> {
    client.send_json(ApiRequest::post(EVENTS_PATH).json(event)).await
}

/// Full replacement (`PUT`).
///
/// # Errors
///
/// Returns the server's validation failure unchanged.
pub async fn update(client: &ApiClient, id: i64, event: Value) -> Result<Value, ApiError> {
    client.send_json(ApiRequest::put(event_path(id)).json(event)).await
}

/// # Errors
///
/// Returns transport or status errors.
pub async fn delete(client: &ApiClient, id: i64) -> Result<(), ApiError> {
    client.send(ApiRequest::delete(event_path(id))).await?;
    Ok(())
}

/// # Errors
///
/// Returns transport or status errors.
pub async fn featured(client: &ApiClient, limit: u32) -> Result<Value, ApiError> {
    list(client, featured_params(limit)).await
}

#[cfg(test)]
#[path = "events_test.rs"]
mod tests;
