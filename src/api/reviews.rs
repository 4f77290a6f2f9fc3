//! Event reviews under `/events-utils/resenas/`.

use serde_json::Value;

use crate::error::ApiError;
use crate::pipeline::{ApiClient, ApiRequest};

pub const REVIEWS_PATH: &str = "/events-utils/resenas/";

fn review_path(id: i64) -> String {
    format!("{REVIEWS_PATH}{id}/")
}

/// # Errors
///
/// Returns transport or status errors.
pub async fn for_event(client: &ApiClient, event_id: i64) -> Result<Value, ApiError> {
    client
        .send_json(ApiRequest::get(REVIEWS_PATH).query("evento", event_id))
        .await
}

/// Reviews written by the current user.
///
/// # Errors
///
/// Returns transport or status errors.
pub async fn mine(client: &ApiClient) -> Result<Value, ApiError> {
    client
        .send_json(ApiRequest::get(REVIEWS_PATH).query("mis_reseñas", "true"))
        .await
}

/// Events the current user attended and has not reviewed yet.
///
/// # Errors
///
/// Returns transport or status errors.
pub async fn rateable_events(client: &ApiClient) -> Result<Value, ApiError> {
    let path = format!("{REVIEWS_PATH}eventos_calificables/");
    client.send_json(ApiRequest::get(path)).await
}

/// # Errors
///
/// Returns the server's validation failure unchanged.
pub async fn create(client: &ApiClient, review: Value) -> Result<Value, ApiError> {
    client.send_json(ApiRequest::post(REVIEWS_PATH).json(review)).await
}

/// Partial update (`PATCH`).
///
/// # Errors
///
/// Returns the server's validation failure unchanged.
pub async fn update(client: &ApiClient, id: i64, changes: Value) -> Result<Value, ApiError> {
    client
        .send_json(ApiRequest::patch(review_path(id)).json(changes))
        .await
}

/// # Errors
///
/// Returns transport or status errors.
pub async fn delete(client: &ApiClient, id: i64) -> Result<(), ApiError> {
    client.send(ApiRequest::delete(review_path(id))).await?;
    Ok(())
}

/// # Errors
///
/// Returns transport or status errors.
pub async fn average_rating(client: &ApiClient, event_id: i64) -> Result<Value, ApiError> {
    let path = format!("{}promedio_calificacion/", review_path(event_id));
    client.send_json(ApiRequest::get(path)).await
}
