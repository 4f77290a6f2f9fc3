use super::*;

#[test]
fn parses_connection_established() {
    let msg = parse_server_message(
        r#"{"type":"connection_established","message":"Conectado exitosamente","user_id":9,"username":"ana"}"#,
    )
    .unwrap();
    assert_eq!(
        msg,
        ServerMessage::ConnectionEstablished {
            message: Some("Conectado exitosamente".to_owned()),
            user_id: Some(9),
            username: Some("ana".to_owned()),
        }
    );
}

#[test]
fn parses_notification_with_payload() {
    let msg = parse_server_message(
        r#"{"type":"notification","data":{"id":1,"tipo":"evento","mensaje":"hola","evento_id":null,"evento_titulo":null,"fecha_envio":"2025-01-01T00:00:00Z","leida":false}}"#,
    )
    .unwrap();
    let ServerMessage::Notification { data: Some(n) } = msg else {
        panic!("expected notification payload");
    };
    assert_eq!(n.id, 1);
    assert_eq!(n.message, "hola");
}

#[test]
fn notification_without_data_parses_as_empty() {
    let msg = parse_server_message(r#"{"type":"notification"}"#).unwrap();
    assert_eq!(msg, ServerMessage::Notification { data: None });
}

#[test]
fn pong_and_unknown_types() {
    assert_eq!(
        parse_server_message(r#"{"type":"pong","timestamp":5}"#).unwrap(),
        ServerMessage::Pong { timestamp: Some(5) }
    );
    assert_eq!(
        parse_server_message(r#"{"type":"prueba_exitosa"}"#).unwrap(),
        ServerMessage::Unknown
    );
}

#[test]
fn malformed_frames_are_errors() {
    assert!(parse_server_message("not json").is_err());
    assert!(parse_server_message(r#"{"no_type":true}"#).is_err());
}

#[test]
fn ping_serializes_with_type_tag() {
    let text = ClientMessage::Ping { timestamp: 42 }.to_text();
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(value, serde_json::json!({"type":"ping","timestamp":42}));
}

#[test]
fn ping_now_uses_wall_clock() {
    let ClientMessage::Ping { timestamp } = ClientMessage::ping_now();
    assert!(timestamp > 1_600_000_000_000);
}
