use std::time::{SystemTime, UNIX_EPOCH};

use super::*;

fn temp_path(tag: &str) -> std::path::PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    std::env::temp_dir().join(format!("campus-session-{tag}-{}-{nanos}.json", std::process::id()))
}

#[test]
fn new_rejects_invalid_url() {
    assert!(matches!(
        SessionCookies::new("not a url"),
        Err(SessionError::InvalidUrl(_))
    ));
}

#[test]
fn inserted_cookies_are_readable_by_name() {
    let session = SessionCookies::new("http://localhost:8000/api").unwrap();
    assert!(!session.contains(REFRESH_COOKIE));

    session.insert(CSRF_COOKIE, "tok-1");
    session.insert(REFRESH_COOKIE, "r-1");

    assert_eq!(session.get(CSRF_COOKIE).as_deref(), Some("tok-1"));
    assert!(session.contains(REFRESH_COOKIE));
    assert_eq!(session.get(ACCESS_COOKIE), None);
}

#[test]
fn cookie_header_joins_all_pairs() {
    let session = SessionCookies::new("http://localhost:8000/api").unwrap();
    session.insert(ACCESS_COOKIE, "a");
    session.insert(REFRESH_COOKIE, "r");

    let header = session.cookie_header().unwrap();
    assert!(header.contains("access=a"));
    assert!(header.contains("refresh=r"));
}

#[test]
fn parse_cookie_header_skips_garbage() {
    let parsed = parse_cookie_header("a=1; junk; =2; b = 3 ");
    assert_eq!(parsed.len(), 2);
    assert_eq!(parsed["a"], "1");
    assert_eq!(parsed["b"], "3");
}

#[test]
fn save_then_load_restores_cookies() {
    let path = temp_path("roundtrip");
    let session = SessionCookies::new("http://localhost:8000/api").unwrap();
    session.insert(ACCESS_COOKIE, "a-9");
    session.insert(REFRESH_COOKIE, "r-9");
    session.save(&path).unwrap();

    let restored = SessionCookies::new("http://localhost:8000/api").unwrap();
    assert_eq!(restored.load(&path).unwrap(), 2);
    assert_eq!(restored.get(ACCESS_COOKIE).as_deref(), Some("a-9"));
    assert_eq!(restored.get(REFRESH_COOKIE).as_deref(), Some("r-9"));

    let _ = std::fs::remove_file(&path);
}

#[test]
fn load_missing_file_is_empty_session() {
    let session = SessionCookies::new("http://localhost:8000/api").unwrap();
    assert_eq!(session.load(&temp_path("missing")).unwrap(), 0);
}

#[test]
fn debug_output_hides_cookie_values() {
    let session = SessionCookies::new("http://localhost:8000/api").unwrap();
    session.insert(ACCESS_COOKIE, "super-secret");
    let rendered = format!("{session:?}");
    assert!(rendered.contains("access"));
    assert!(!rendered.contains("super-secret"));
}
