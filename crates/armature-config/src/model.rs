// SPDX-FileCopyrightText: 2026 Armature Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Armature plugin runtime.
//!
//! All structs use `#[serde(deny_unknown_fields)]` so unrecognized keys are
//! rejected at startup with actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Armature configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. All sections are optional and default to sensible
/// values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ArmatureConfig {
    /// Application identity settings.
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Registry behavior settings.
    #[serde(default)]
    pub registry: RegistryConfig,

    /// Plugin lifecycle settings.
    #[serde(default)]
    pub lifecycle: LifecycleConfig,

    /// Logging settings.
    #[serde(default)]
    pub log: LogConfig,
}

/// Application identity configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ApplicationConfig {
    /// Globally unique application id; also names the home directory.
    #[serde(default = "default_application_id")]
    pub id: String,

    /// Explicit home directory. Defaults to the platform data directory
    /// joined with the application id.
    #[serde(default)]
    pub home: Option<String>,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            id: default_application_id(),
            home: None,
        }
    }
}

fn default_application_id() -> String {
    "armature".to_string()
}

/// Registry behavior configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RegistryConfig {
    /// Declare an extension point on its first contribution instead of
    /// rejecting the contribution as `UnknownExtensionPoint`.
    #[serde(default)]
    pub auto_create_extension_points: bool,
}

/// Plugin lifecycle configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LifecycleConfig {
    /// Abort startup on the first plugin start failure instead of isolating
    /// it and starting the remaining independent plugins.
    #[serde(default)]
    pub fail_fast: bool,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_stable() {
        let config = ArmatureConfig::default();
        assert_eq!(config.application.id, "armature");
        assert!(config.application.home.is_none());
        assert!(!config.registry.auto_create_extension_points);
        assert!(!config.lifecycle.fail_fast);
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn unknown_section_key_is_rejected() {
        let toml_str = r#"
[application]
id = "demo"
naem = "oops"
"#;
        assert!(toml::from_str::<ArmatureConfig>(toml_str).is_err());
    }
}
