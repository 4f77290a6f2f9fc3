use super::*;

#[test]
fn set_replaces_in_place() {
    let params = ListParams::new().page(1).search("x").page(3);
    assert_eq!(
        params.pairs(),
        &[
            ("page".to_owned(), "3".to_owned()),
            ("search".to_owned(), "x".to_owned()),
        ]
    );
}

#[test]
fn caller_values_override_defaults() {
    let params = ListParams::new()
        .page_size(25)
        .ordering("leida")
        .with_defaults(&[("page", "1"), ("page_size", "10")]);
    assert_eq!(params.get("page"), Some("1"));
    assert_eq!(params.get("page_size"), Some("25"));
    assert_eq!(params.get("ordering"), Some("leida"));
    assert_eq!(params.pairs()[0].0, "page");
}

#[test]
fn empty_params_take_all_defaults() {
    let params = ListParams::new().with_defaults(&[("page", "1"), ("page_size", "10")]);
    assert_eq!(params.into_pairs().len(), 2);
}
