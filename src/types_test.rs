use super::*;

#[test]
fn notification_decodes_server_push_payload() {
    let raw = serde_json::json!({
        "id": 17,
        "tipo": "recordatorio",
        "mensaje": "Tu evento empieza en 15 minutos",
        "evento_id": 4,
        "evento_titulo": "Feria de Ciencias",
        "fecha_envio": "2025-05-02T10:15:00.123456+00:00",
        "leida": false
    });
    let n: Notification = serde_json::from_value(raw).unwrap();
    assert_eq!(n.id, 17);
    assert_eq!(n.kind, NotificationKind::Reminder);
    assert_eq!(n.event_id, Some(4));
    assert_eq!(n.event_title.as_deref(), Some("Feria de Ciencias"));
    assert!(!n.read);
    assert_eq!(n.label, None);
}

#[test]
fn notification_tolerates_null_event_and_missing_read_flag() {
    let raw = serde_json::json!({
        "id": 2,
        "tipo": "sistema",
        "mensaje": "Mantenimiento",
        "evento_id": null,
        "evento_titulo": null,
        "fecha_envio": "2025-05-02T10:15:00Z"
    });
    let n: Notification = serde_json::from_value(raw).unwrap();
    assert_eq!(n.kind, NotificationKind::System);
    assert_eq!(n.event_id, None);
    assert!(!n.read);
}

#[test]
fn unknown_kind_is_preserved() {
    let kind: NotificationKind = serde_json::from_value(serde_json::json!("encuesta")).unwrap();
    assert_eq!(kind, NotificationKind::Other("encuesta".to_owned()));
    assert_eq!(serde_json::to_value(kind).unwrap(), "encuesta");
    assert_eq!(serde_json::to_value(NotificationKind::Event).unwrap(), "evento");
}

#[test]
fn count_uses_server_field_names() {
    let count: NotificationCount =
        serde_json::from_str(r#"{"total":5,"no_leidas":2,"leidas":3}"#).unwrap();
    assert_eq!(
        count,
        NotificationCount {
            total: 5,
            unread: 2,
            read: 3
        }
    );
}

#[test]
fn page_defaults_missing_links() {
    let page: Page<u32> = serde_json::from_str(r#"{"count":2,"results":[1,2]}"#).unwrap();
    assert_eq!(page.count, 2);
    assert_eq!(page.next, None);
    assert_eq!(page.results, vec![1, 2]);
}
