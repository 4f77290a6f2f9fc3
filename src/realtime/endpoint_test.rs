use super::*;

#[test]
fn explicit_override_wins() {
    let cfg = ClientConfig {
        ws_url: Some("wss://push.example.edu/custom/".to_owned()),
        dev_mode: true,
        api_origin: Some("https://api.example.edu".to_owned()),
        ..ClientConfig::default()
    };
    assert_eq!(resolve_ws_url(&cfg).unwrap(), "wss://push.example.edu/custom/");
}

#[test]
fn dev_mode_uses_page_host_and_scheme() {
    let cfg = ClientConfig {
        dev_mode: true,
        page_origin: "http://localhost:8080/some/page".to_owned(),
        ..ClientConfig::default()
    };
    assert_eq!(resolve_ws_url(&cfg).unwrap(), "ws://localhost:8080/ws/notifications/");

    let secure = ClientConfig {
        dev_mode: true,
        page_origin: "https://dev.example.edu".to_owned(),
        ..ClientConfig::default()
    };
    assert_eq!(resolve_ws_url(&secure).unwrap(), "wss://dev.example.edu/ws/notifications/");
}

#[test]
fn deployed_mode_derives_from_api_origin() {
    let cfg = ClientConfig {
        api_origin: Some("https://eventos.example.edu/".to_owned()),
        ..ClientConfig::default()
    };
    assert_eq!(
        resolve_ws_url(&cfg).unwrap(),
        "wss://eventos.example.edu/ws/notifications/"
    );
}

#[test]
fn deployed_mode_falls_back_to_page_origin() {
    let cfg = ClientConfig {
        page_origin: "http://campus.local:9000".to_owned(),
        ..ClientConfig::default()
    };
    assert_eq!(resolve_ws_url(&cfg).unwrap(), "ws://campus.local:9000/ws/notifications/");
}

#[test]
fn unusable_origins_are_rejected() {
    let dev = ClientConfig {
        dev_mode: true,
        page_origin: "nonsense".to_owned(),
        ..ClientConfig::default()
    };
    assert!(matches!(resolve_ws_url(&dev), Err(RealtimeError::InvalidUrl(_))));

    let deployed = ClientConfig {
        api_origin: Some("https://".to_owned()),
        ..ClientConfig::default()
    };
    assert!(matches!(resolve_ws_url(&deployed), Err(RealtimeError::InvalidUrl(_))));
}
