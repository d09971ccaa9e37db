// SPDX-FileCopyrightText: 2026 Armature Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for configuration loading, overrides, and diagnostics.

use armature_config::{
    ArmatureConfig, ConfigError, load_and_validate_str, load_config_from_path,
    load_config_from_str,
};
use serial_test::serial;

#[test]
fn empty_input_yields_defaults() {
    let config = load_config_from_str("").unwrap();
    assert_eq!(config.application.id, "armature");
    assert!(!config.registry.auto_create_extension_points);
    assert!(!config.lifecycle.fail_fast);
    assert_eq!(config.log.level, "info");
}

#[test]
fn toml_sections_override_defaults() {
    let config = load_config_from_str(
        r#"
[application]
id = "acme.workbench"

[registry]
auto_create_extension_points = true

[lifecycle]
fail_fast = true

[log]
level = "debug"
"#,
    )
    .unwrap();

    assert_eq!(config.application.id, "acme.workbench");
    assert!(config.registry.auto_create_extension_points);
    assert!(config.lifecycle.fail_fast);
    assert_eq!(config.log.level, "debug");
}

#[test]
fn partial_sections_keep_remaining_defaults() {
    let config = load_config_from_str(
        r#"
[lifecycle]
fail_fast = true
"#,
    )
    .unwrap();

    assert!(config.lifecycle.fail_fast);
    assert_eq!(config.application.id, "armature");
    assert_eq!(config.log.level, "info");
}

#[test]
fn unknown_key_produces_a_suggestion() {
    let errors = load_and_validate_str(
        r#"
[log]
leve = "debug"
"#,
    )
    .unwrap_err();

    assert!(errors.iter().any(|e| matches!(
        e,
        ConfigError::UnknownKey { key, suggestion, .. }
            if key == "leve" && suggestion.as_deref() == Some("level")
    )));
}

#[test]
fn invalid_log_level_fails_validation() {
    let errors = load_and_validate_str(
        r#"
[log]
level = "shouting"
"#,
    )
    .unwrap_err();

    assert!(errors.iter().any(|e| matches!(
        e,
        ConfigError::Validation { message } if message.contains("log.level")
    )));
}

#[test]
fn wrong_value_type_is_reported() {
    let result = load_config_from_str(
        r#"
[lifecycle]
fail_fast = "yes please"
"#,
    );
    assert!(result.is_err());
}

#[test]
#[serial]
fn file_load_with_env_override() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("armature.toml");
    std::fs::write(
        &path,
        r#"
[application]
id = "from-file"

[log]
level = "warn"
"#,
    )
    .unwrap();

    // Env vars are process-global, hence #[serial].
    unsafe {
        std::env::set_var("ARMATURE_LOG_LEVEL", "error");
    }
    let config = load_config_from_path(&path).unwrap();
    unsafe {
        std::env::remove_var("ARMATURE_LOG_LEVEL");
    }

    assert_eq!(config.application.id, "from-file");
    assert_eq!(config.log.level, "error");
}

#[test]
#[serial]
fn env_override_survives_underscored_keys() {
    unsafe {
        std::env::set_var("ARMATURE_REGISTRY_AUTO_CREATE_EXTENSION_POINTS", "true");
        std::env::set_var("ARMATURE_LIFECYCLE_FAIL_FAST", "true");
    }
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("armature.toml");
    std::fs::write(&path, "").unwrap();
    let config = load_config_from_path(&path).unwrap();
    unsafe {
        std::env::remove_var("ARMATURE_REGISTRY_AUTO_CREATE_EXTENSION_POINTS");
        std::env::remove_var("ARMATURE_LIFECYCLE_FAIL_FAST");
    }

    assert!(config.registry.auto_create_extension_points);
    assert!(config.lifecycle.fail_fast);
}

#[test]
fn config_round_trips_through_toml() {
    let mut config = ArmatureConfig::default();
    config.application.id = "round.trip".to_string();
    config.lifecycle.fail_fast = true;

    let serialized = toml::to_string(&config).unwrap();
    let parsed: ArmatureConfig = toml::from_str(&serialized).unwrap();
    assert_eq!(parsed.application.id, "round.trip");
    assert!(parsed.lifecycle.fail_fast);
}
