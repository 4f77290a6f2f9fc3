use super::*;

#[test]
fn filters_only_include_given_ids() {
    assert!(filter_params(None, None).pairs().is_empty());
    let params = filter_params(Some(4), None);
    assert_eq!(params.get("evento"), Some("4"));
    assert_eq!(params.get("usuario"), None);
}
