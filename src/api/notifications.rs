//! Notification endpoints under `/notifications-utils/notificaciones/`.
//!
//! These complement the realtime channel: the list endpoints backfill what
//! was pushed while the socket was down, and read/delete are the explicit
//! user actions that change a notification's state server-side.

use serde_json::Value;

use super::ListParams;
use crate::error::ApiError;
use crate::pipeline::{ApiClient, ApiRequest};
use crate::types::{Notification, NotificationCount, Page};

pub const NOTIFICATIONS_PATH: &str = "/notifications-utils/notificaciones/";
pub const DEFAULT_LIST_PARAMS: &[(&str, &str)] = &[("page", "1"), ("page_size", "10")];

fn notification_path(id: i64) -> String {
    format!("{NOTIFICATIONS_PATH}{id}/")
}

/// List the current user's notifications, newest first.
///
/// Pagination defaults to page 1 of 10; values in `params` win.
///
/// # Errors
///
/// Returns transport, status, or decode errors.
pub async fn list(client: &ApiClient, params: ListParams) -> Result<Page<Notification>, ApiError> {
    let params = params.with_defaults(DEFAULT_LIST_PARAMS);
    client
        .send_json(ApiRequest::get(NOTIFICATIONS_PATH).queries(params.into_pairs()))
        .await
}

/// # Errors
///
/// Returns transport, status, or decode errors.
pub async fn get(client: &ApiClient, id: i64) -> Result<Notification, ApiError> {
    client.send_json(ApiRequest::get(notification_path(id))).await
}

/// Search by event title or message text.
///
/// # Errors
///
/// Returns transport, status, or decode errors.
pub async fn search(
    client: &ApiClient,
    term: &str,
    params: ListParams,
) -> Result<Page<Notification>, ApiError> {
    let params = params.search(term);
    client
        .send_json(ApiRequest::get(NOTIFICATIONS_PATH).queries(params.into_pairs()))
        .await
}

/// # Errors
///
/// Returns `ApiError::Status` (404) if the notification is not the user's.
pub async fn mark_read(client: &ApiClient, id: i64) -> Result<Value, ApiError> {
    let path = format!("{}leer/", notification_path(id));
    client.send_json(ApiRequest::patch(path)).await
}

/// # Errors
///
/// Returns transport, status, or decode errors.
pub async fn count(client: &ApiClient) -> Result<NotificationCount, ApiError> {
    let path = format!("{NOTIFICATIONS_PATH}conteo/");
    client.send_json(ApiRequest::get(path)).await
}

/// Remove the notification from the user's inbox.
///
/// # Errors
///
/// Returns `ApiError::Status` (404) if the notification is not the user's.
pub async fn delete(client: &ApiClient, id: i64) -> Result<Value, ApiError> {
    let path = format!("{}eliminar/", notification_path(id));
    client.send_json(ApiRequest::delete(path)).await
}
