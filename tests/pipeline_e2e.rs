//! Request pipeline against an in-process server: CSRF forwarding and the
//! single-flight refresh.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures_util::future::join_all;
use serde_json::json;

use campus_events::error::RefreshError;
use campus_events::pipeline::navigator::SessionNavigator;
use campus_events::session::{CSRF_COOKIE, REFRESH_COOKIE};
use campus_events::{ApiClient, ApiError, ApiRequest, ClientConfig, SessionCookies};

#[derive(Default)]
struct Backend {
    refresh_calls: AtomicUsize,
    protected_hits: AtomicUsize,
    refresh_fails: AtomicBool,
    csrf_fetches: AtomicUsize,
    csrf_seen: Mutex<Vec<Option<String>>>,
}

fn has_fresh_access(headers: &HeaderMap) -> bool {
    headers
        .get(header::COOKIE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|cookies| cookies.split("; ").any(|c| c == "access=fresh"))
}

async fn protected(State(backend): State<Arc<Backend>>, headers: HeaderMap) -> Response {
    backend.protected_hits.fetch_add(1, Ordering::SeqCst);
    let csrf = headers
        .get("x-csrftoken")
        .and_then(|value| value.to_str().ok())
        .map(ToOwned::to_owned);
    backend.csrf_seen.lock().unwrap().push(csrf);

    if has_fresh_access(&headers) {
        Json(json!({ "count": 0, "next": null, "previous": null, "results": [] })).into_response()
    } else {
        (StatusCode::UNAUTHORIZED, Json(json!({ "detail": "token expired" }))).into_response()
    }
}

async fn refresh(State(backend): State<Arc<Backend>>) -> Response {
    backend.refresh_calls.fetch_add(1, Ordering::SeqCst);
    // Hold the refresh open so every concurrent 401 queues behind it.
    tokio::time::sleep(Duration::from_millis(200)).await;
    if backend.refresh_fails.load(Ordering::SeqCst) {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "detail": "refresh expired" })))
            .into_response();
    }
    (
        [(header::SET_COOKIE, "access=fresh; Path=/")],
        Json(json!({ "message": "refreshed" })),
    )
        .into_response()
}

async fn login() -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({ "detail": "bad credentials" }))).into_response()
}

async fn always_unauthorized(State(backend): State<Arc<Backend>>) -> Response {
    backend.protected_hits.fetch_add(1, Ordering::SeqCst);
    (StatusCode::UNAUTHORIZED, Json(json!({ "detail": "no access" }))).into_response()
}

async fn csrf_token(State(backend): State<Arc<Backend>>) -> Response {
    let n = backend.csrf_fetches.fetch_add(1, Ordering::SeqCst) + 1;
    tokio::time::sleep(Duration::from_millis(100)).await;
    let token = format!("csrf-{n}");
    (
        [(header::SET_COOKIE, format!("csrftoken={token}; Path=/"))],
        Json(json!({ "csrf_token": token })),
    )
        .into_response()
}

async fn forbidden() -> Response {
    (StatusCode::FORBIDDEN, Json(json!({ "detail": "staff only" }))).into_response()
}

async fn spawn_backend(backend: Arc<Backend>) -> String {
    let app = Router::new()
        .route("/api/events-utils/eventos/", get(protected))
        .route("/api/users-utils/refresh/", post(refresh))
        .route("/api/users-utils/login/", post(login))
        .route("/api/users-utils/csrf-token/", get(csrf_token))
        .route("/api/events-utils/categorias/", get(always_unauthorized))
        .route("/api/reportes/eventos-por-estado/", get(forbidden))
        .with_state(backend);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/api")
}

#[derive(Default)]
struct CountingNavigator {
    on_login: AtomicBool,
    redirects: AtomicUsize,
}

impl SessionNavigator for CountingNavigator {
    fn is_on_login_page(&self) -> bool {
        self.on_login.load(Ordering::SeqCst)
    }

    fn redirect_to_login(&self) {
        self.redirects.fetch_add(1, Ordering::SeqCst);
        self.on_login.store(true, Ordering::SeqCst);
    }
}

struct Harness {
    backend: Arc<Backend>,
    navigator: Arc<CountingNavigator>,
    client: ApiClient,
}

async fn harness(cookies: &[(&str, &str)]) -> Harness {
    let backend = Arc::new(Backend::default());
    let api_url = spawn_backend(backend.clone()).await;
    let config = ClientConfig {
        api_url: api_url.clone(),
        ..ClientConfig::default()
    };
    let session = SessionCookies::new(&api_url).unwrap();
    for (name, value) in cookies {
        session.insert(name, value);
    }
    let navigator = Arc::new(CountingNavigator::default());
    let client = ApiClient::new(&config, session, navigator.clone()).unwrap();
    Harness {
        backend,
        navigator,
        client,
    }
}

fn events_request() -> ApiRequest {
    ApiRequest::get("/events-utils/eventos/")
}

#[tokio::test]
async fn concurrent_401s_share_one_refresh_and_replay_once() {
    let h = harness(&[(REFRESH_COOKIE, "r1"), ("access", "stale")]).await;

    let results = join_all((0..5).map(|_| h.client.send(events_request()))).await;

    for result in &results {
        let response = result.as_ref().expect("request recovers after refresh");
        assert_eq!(response.status(), StatusCode::OK);
    }
    assert_eq!(h.backend.refresh_calls.load(Ordering::SeqCst), 1);
    assert_eq!(h.backend.protected_hits.load(Ordering::SeqCst), 10);
    assert_eq!(h.navigator.redirects.load(Ordering::SeqCst), 0);
    assert!(!h.client.refresh_gate().is_refreshing());
    assert_eq!(h.client.refresh_gate().queued(), 0);
}

#[tokio::test]
async fn failed_refresh_rejects_every_queued_request_and_redirects_once() {
    let h = harness(&[(REFRESH_COOKIE, "r1")]).await;
    h.backend.refresh_fails.store(true, Ordering::SeqCst);

    let results = join_all((0..3).map(|_| h.client.send(events_request()))).await;

    for result in results {
        match result {
            Err(ApiError::Refresh(RefreshError::Rejected { status })) => assert_eq!(status, 401),
            other => panic!("expected refresh rejection, got {other:?}"),
        }
    }
    assert_eq!(h.backend.refresh_calls.load(Ordering::SeqCst), 1);
    assert_eq!(h.backend.protected_hits.load(Ordering::SeqCst), 3);
    assert_eq!(h.navigator.redirects.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn failed_refresh_on_login_page_does_not_redirect() {
    let h = harness(&[(REFRESH_COOKIE, "r1")]).await;
    h.backend.refresh_fails.store(true, Ordering::SeqCst);
    h.navigator.on_login.store(true, Ordering::SeqCst);

    let result = h.client.send(events_request()).await;

    assert!(matches!(result, Err(ApiError::Refresh(_))));
    assert_eq!(h.navigator.redirects.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn missing_refresh_cookie_propagates_401_without_refreshing() {
    let h = harness(&[]).await;

    let error = h.client.send(events_request()).await.unwrap_err();

    assert_eq!(error.status(), Some(StatusCode::UNAUTHORIZED));
    assert_eq!(h.backend.refresh_calls.load(Ordering::SeqCst), 0);
    assert_eq!(h.backend.protected_hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn login_401_is_never_recovered() {
    let h = harness(&[(REFRESH_COOKIE, "r1")]).await;

    let result = campus_events::api::auth::login(&h.client, "ana", "wrong").await;

    match result {
        Err(ApiError::Status { status, body }) => {
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert!(body.contains("bad credentials"));
        }
        other => panic!("expected status error, got {other:?}"),
    }
    assert_eq!(h.backend.refresh_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn non_401_failures_pass_through_unchanged() {
    let h = harness(&[(REFRESH_COOKIE, "r1")]).await;

    let error = h
        .client
        .send(ApiRequest::get("/reportes/eventos-por-estado/"))
        .await
        .unwrap_err();

    assert_eq!(error.status(), Some(StatusCode::FORBIDDEN));
    assert_eq!(h.backend.refresh_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn csrf_cookie_is_forwarded_as_header() {
    let h = harness(&[(CSRF_COOKIE, "tok-123"), ("access", "fresh")]).await;

    h.client.send(events_request()).await.unwrap();

    let seen = h.backend.csrf_seen.lock().unwrap().clone();
    assert_eq!(seen, vec![Some("tok-123".to_owned())]);
}

#[tokio::test]
async fn no_csrf_cookie_sends_no_header() {
    let h = harness(&[("access", "fresh")]).await;

    h.client.send(events_request()).await.unwrap();

    let seen = h.backend.csrf_seen.lock().unwrap().clone();
    assert_eq!(seen, vec![None]);
}

#[tokio::test]
async fn refreshed_cookie_lands_in_the_session() {
    let h = harness(&[(REFRESH_COOKIE, "r1"), ("access", "stale")]).await;

    h.client.send(events_request()).await.unwrap();

    assert_eq!(h.client.session().get("access").as_deref(), Some("fresh"));
}

#[tokio::test]
async fn second_401_after_refresh_is_returned_not_retried() {
    let h = harness(&[(REFRESH_COOKIE, "r1")]).await;

    let error = h
        .client
        .send(ApiRequest::get("/events-utils/categorias/"))
        .await
        .unwrap_err();

    assert_eq!(error.status(), Some(StatusCode::UNAUTHORIZED));
    assert_eq!(h.backend.refresh_calls.load(Ordering::SeqCst), 1);
    assert_eq!(h.backend.protected_hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn concurrent_csrf_fetches_share_one_request() {
    let h = harness(&[]).await;

    let tokens =
        join_all((0..4).map(|_| campus_events::api::auth::fetch_csrf_token(&h.client))).await;

    assert!(tokens.iter().all(|t| t.as_deref() == Some("csrf-1")));
    assert_eq!(h.backend.csrf_fetches.load(Ordering::SeqCst), 1);
    assert_eq!(h.client.session().get(CSRF_COOKIE).as_deref(), Some("csrf-1"));

    let again = campus_events::api::auth::fetch_csrf_token(&h.client).await;
    assert_eq!(again.as_deref(), Some("csrf-2"));
    assert_eq!(h.backend.csrf_fetches.load(Ordering::SeqCst), 2);
}
