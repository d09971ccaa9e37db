// SPDX-FileCopyrightText: 2026 Armature Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports the XDG hierarchy: `./armature.toml` >
//! `~/.config/armature/armature.toml` > `/etc/armature/armature.toml`,
//! with environment variable overrides via the `ARMATURE_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::ArmatureConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/armature/armature.toml` (system-wide)
/// 3. `~/.config/armature/armature.toml` (user XDG config)
/// 4. `./armature.toml` (local directory)
/// 5. `ARMATURE_*` environment variables
pub fn load_config() -> Result<ArmatureConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ArmatureConfig::default()))
        .merge(Toml::file("/etc/armature/armature.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("armature/armature.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("armature.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env vars).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<ArmatureConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ArmatureConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<ArmatureConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ArmatureConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` instead of `Env::split("_")` so that keys containing
/// underscores survive: `ARMATURE_REGISTRY_AUTO_CREATE_EXTENSION_POINTS`
/// must map to `registry.auto_create_extension_points`, not be split on
/// every underscore.
fn env_provider() -> Env {
    Env::prefixed("ARMATURE_").map(|key| {
        // `key` is the lowercased env var name with the prefix stripped.
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("application_", "application.", 1)
            .replacen("registry_", "registry.", 1)
            .replacen("lifecycle_", "lifecycle.", 1)
            .replacen("log_", "log.", 1);
        mapped.into()
    })
}
