use super::*;

#[test]
fn event_path_has_trailing_slash() {
    assert_eq!(event_path(12), "/events-utils/eventos/12/");
}

#[test]
fn featured_orders_by_newest_start() {
    let params = featured_params(DEFAULT_FEATURED_LIMIT);
    assert_eq!(params.get("page_size"), Some("3"));
    assert_eq!(params.get("ordering"), Some("-fecha_inicio"));
}
