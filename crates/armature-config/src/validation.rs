// SPDX-FileCopyrightText: 2026 Armature Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, such as a usable application id and a known log level.

use crate::diagnostic::ConfigError;
use crate::model::ArmatureConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)`
/// with all collected validation errors (does not fail fast).
pub fn validate_config(config: &ArmatureConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let id = config.application.id.trim();
    if id.is_empty() {
        errors.push(ConfigError::Validation {
            message: "application.id must not be empty".to_string(),
        });
    } else if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_')
    {
        // The id names the home directory, so keep it filesystem-safe.
        errors.push(ConfigError::Validation {
            message: format!(
                "application.id `{id}` may only contain alphanumerics, `.`, `-`, and `_`"
            ),
        });
    }

    if let Some(home) = &config.application.home
        && home.trim().is_empty()
    {
        errors.push(ConfigError::Validation {
            message: "application.home must not be empty when set".to_string(),
        });
    }

    if !LOG_LEVELS.contains(&config.log.level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "log.level `{}` is not one of: {}",
                config.log.level,
                LOG_LEVELS.join(", ")
            ),
        });
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        let config = ArmatureConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn empty_id_fails_validation() {
        let mut config = ArmatureConfig::default();
        config.application.id = "".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(
            |e| matches!(e, ConfigError::Validation { message } if message.contains("application.id"))
        ));
    }

    #[test]
    fn id_with_path_separator_fails_validation() {
        let mut config = ArmatureConfig::default();
        config.application.id = "../escape".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(
            |e| matches!(e, ConfigError::Validation { message } if message.contains("alphanumerics"))
        ));
    }

    #[test]
    fn bogus_log_level_fails_validation() {
        let mut config = ArmatureConfig::default();
        config.log.level = "loud".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(
            |e| matches!(e, ConfigError::Validation { message } if message.contains("log.level"))
        ));
    }

    #[test]
    fn all_errors_are_collected() {
        let mut config = ArmatureConfig::default();
        config.application.id = "".to_string();
        config.log.level = "loud".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
    }
}
