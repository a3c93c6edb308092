use serial_test::serial;
use temp_env::with_vars;

use super::*;

fn cleanup_all_registry_env_vars() {
    for (key, _) in std::env::vars() {
        if key.starts_with("REGISTRY__") || key == "CONFIG_PATH" {
            std::env::remove_var(&key);
        }
    }
}

#[test]
#[serial]
fn default_config_should_initialize_with_hardcoded_values() {
    let config = Settings::default();

    assert_eq!(config.registry.service_name, "DREGISTRY");
    assert_eq!(config.registry.local_source, "local");
    assert_eq!(config.cache.refresh_interval_ms, 30_000);
    assert_eq!(config.cache.find_cache_capacity, 10_000);
    assert_eq!(config.cooldown.cooldown_ms, 30_000);
    assert!(config.registry.global_visible_services().is_empty());
}

#[test]
#[serial]
fn load_should_merge_environment_overrides() {
    cleanup_all_registry_env_vars();
    with_vars(
        vec![("REGISTRY__CACHE__SEARCH_TIMEOUT_MS", Some("1025"))],
        || {
            let config = Settings::load(None).unwrap();

            assert_eq!(config.cache.search_timeout_ms, 1025);
        },
    );
}

#[test]
#[serial]
fn with_override_config_should_merge_file_settings() {
    cleanup_all_registry_env_vars();
    // Create temporary directory and configuration file
    let temp_dir = tempfile::tempdir().unwrap();
    let config_path = temp_dir.path().join("dynamic_config.toml");

    // Dynamically generate TOML configuration content
    std::fs::write(
        &config_path,
        r#"
        [registry]
        db_root_dir = "/tmp/xx/db" # Override default value

        [cache]
        refresh_interval_ms = 1000 # Override default value
        refresh_jitter_ms = 300 # Add new field
        "#,
    )
    .unwrap();

    let empty_vars: Vec<(&str, Option<&str>)> = vec![];
    with_vars(empty_vars, || {
        let base_config = Settings::load(None).expect("success");
        let result = base_config.with_override_config(config_path.to_str().unwrap());

        assert!(result.is_ok());
        let config = result.unwrap();

        assert_eq!(
            config.registry.db_root_dir.as_os_str().to_str(),
            Some("/tmp/xx/db")
        );
        assert_eq!(config.cache.refresh_interval_ms, 1000);
        assert_eq!(config.cache.refresh_jitter_ms, 300);
    });
}

#[test]
fn validation_should_fail_with_empty_service_name() {
    let mut config = Settings::default();
    config.registry.service_name = String::new();

    assert!(config.validate().is_err());
}

#[test]
fn validation_should_detect_jitter_exceeding_interval() {
    let mut config = Settings::default();
    config.cache.refresh_interval_ms = 1000;
    config.cache.refresh_jitter_ms = 1000;

    assert!(config.validate().is_err());
}

#[test]
fn validation_should_reject_zero_cooldown() {
    let mut config = Settings::default();
    config.cooldown.cooldown_ms = 0;

    assert!(config.validate().is_err());
}

#[test]
#[serial]
fn environment_variables_should_have_highest_priority() {
    cleanup_all_registry_env_vars();
    let temp_dir = tempfile::tempdir().unwrap();
    let config_path = temp_dir.path().join("test_config.toml");
    std::fs::write(
        &config_path,
        r#"
        [registry]
        service_name = "from-file"
        global_visible = "SHARED_A,SHARED_B"
        "#,
    )
    .unwrap();

    with_vars(
        vec![
            ("CONFIG_PATH", Some(config_path.to_str().unwrap())),
            ("REGISTRY__REGISTRY__SERVICE_NAME", Some("from-env")),
        ],
        || {
            let config = Settings::load(None).unwrap();

            assert_eq!(config.registry.service_name, "from-env");
            // File values without env overrides still apply
            assert_eq!(
                config.registry.global_visible_services(),
                vec!["SHARED_A".to_string(), "SHARED_B".to_string()]
            );
        },
    );
}

#[test]
fn global_visible_should_split_and_trim_names() {
    let mut config = RegistryConfig::default();
    config.global_visible = " SHARED_A , ,SHARED_B,".to_string();

    assert_eq!(
        config.global_visible_services(),
        vec!["SHARED_A".to_string(), "SHARED_B".to_string()]
    );
}

#[test]
#[serial]
fn config_should_handle_nested_structures_correctly() {
    cleanup_all_registry_env_vars();
    let temp_dir = tempfile::tempdir().unwrap();
    let config_path = temp_dir.path().join("nested.toml");
    std::fs::write(
        &config_path,
        r#"
        [cooldown]
        cooldown_ms = 10000
        [cache]
        search_timeout_ms = 250
        "#,
    )
    .unwrap();

    with_vars(
        vec![("CONFIG_PATH", Some(config_path.to_str().unwrap()))],
        || {
            let config = Settings::load(None).unwrap();
            assert_eq!(config.cooldown.cooldown_ms, 10000);
            assert_eq!(config.cache.search_timeout_ms, 250);
        },
    );
}
