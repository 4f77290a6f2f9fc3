//! Event registrations under `/events-utils/inscripciones/`.
//!
//! The server assigns the registering user from the session, so creating a
//! registration only names the event.

use serde_json::{Value, json};

use super::ListParams;
use crate::error::ApiError;
use crate::pipeline::{ApiClient, ApiRequest};

pub const REGISTRATIONS_PATH: &str = "/events-utils/inscripciones/";

fn registration_path(id: i64) -> String {
    format!("{REGISTRATIONS_PATH}{id}/")
}

#[must_use]
pub fn filter_params(event: Option<i64>, user: Option<i64>) -> ListParams {
    let mut params = ListParams::new();
    if let Some(event) = event {
        params = params.set("evento", event);
    }
    if let Some(user) = user {
        params = params.set("usuario", user);
    }
    params
}

/// # Errors
///
/// Returns transport or status errors.
pub async fn list(
    client: &ApiClient,
    event: Option<i64>,
    user: Option<i64>,
) -> Result<Value, ApiError> {
    let request =
        ApiRequest::get(REGISTRATIONS_PATH).queries(filter_params(event, user).into_pairs());
    client.send_json(request).await
}

/// # Errors
///
/// Returns transport or status errors.
pub async fn get(client: &ApiClient, id: i64) -> Result<Value, ApiError> {
    client.send_json(ApiRequest::get(registration_path(id))).await
}

/// Register the current user for `event_id`.
///
/// # Errors
///
/// Returns `ApiError::Status` for duplicate registrations.
pub async fn create(client: &ApiClient, event_id: i64) -> Result<Value, ApiError> {
    let body = json!({ "evento": event_id });
    client
        .send_json(ApiRequest::post(REGISTRATIONS_PATH).json(body))
        .await
}

/// # Errors
///
/// Returns transport or status errors.
pub async fn delete(client: &ApiClient, id: i64) -> Result<(), ApiError> {
    client.send(ApiRequest::delete(registration_path(id))).await?;
    Ok(())
}

#[cfg(test)]
#[path = "registrations_test.rs"]
mod tests;
