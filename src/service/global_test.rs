use super::*;
use crate::constants::REGISTRY_SERVICE_NAME;

#[test]
fn seed_includes_configured_names_and_the_registry_itself() {
    let visibility = GlobalVisibility::seed(vec![
        "shared-gateway".to_string(),
        "config-server".to_string(),
    ]);

    assert!(visibility.is_global("shared-gateway"));
    assert!(visibility.is_global("config-server"));
    assert!(visibility.is_global(REGISTRY_SERVICE_NAME));
}

#[test]
fn unseeded_names_resolve_locally() {
    let visibility = GlobalVisibility::seed(vec!["shared-gateway".to_string()]);

    assert!(!visibility.is_global("web"));
    assert!(!visibility.is_global(""));
}

#[test]
fn empty_names_are_ignored() {
    let visibility = GlobalVisibility::new();
    visibility.register(String::new());

    assert!(!visibility.is_global(""));
}

#[test]
fn register_is_idempotent() {
    let visibility = GlobalVisibility::new();
    visibility.register("web".to_string());
    visibility.register("web".to_string());

    assert!(visibility.is_global("web"));
}
