// SPDX-FileCopyrightText: 2026 Armature Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Static plugin metadata.
//!
//! A [`PluginDescriptor`] declares everything the plugin manager needs to
//! know about a plugin before starting it: the extension points it owns,
//! the contributions it offers to other plugins' points, the services it
//! publishes, and the plugins it depends on.

use armature_core::{ArmatureError, ServiceProperties};
use armature_registry::{ExtensionPoint, ServiceProvider};
use serde_json::Value;

/// One value offered to a named extension point.
#[derive(Debug, Clone)]
pub struct Contribution {
    pub point_id: String,
    pub value: Value,
}

/// A service publication: capability name, provider, filter properties.
#[derive(Clone)]
pub struct ServiceOffer {
    pub capability: String,
    pub provider: ServiceProvider,
    pub properties: ServiceProperties,
}

impl std::fmt::Debug for ServiceOffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceOffer")
            .field("capability", &self.capability)
            .field(
                "provider",
                &match self.provider {
                    ServiceProvider::Instance(_) => "instance",
                    ServiceProvider::Factory(_) => "factory",
                },
            )
            .field("properties", &self.properties)
            .finish()
    }
}

/// Static metadata for one plugin.
#[derive(Debug, Clone)]
pub struct PluginDescriptor {
    /// Unique plugin id, conventionally dotted (e.g. `"acme.storage"`).
    pub id: String,
    /// Human-readable name; defaults to the id.
    pub name: String,
    /// Plugin version.
    pub version: semver::Version,
    /// Ids of plugins that must be started before this one.
    pub requires: Vec<String>,
    /// Extension points this plugin owns.
    pub extension_points: Vec<ExtensionPoint>,
    /// Contributions this plugin offers to (usually other plugins')
    /// extension points.
    pub contributions: Vec<Contribution>,
    /// Services this plugin publishes while started.
    pub service_offers: Vec<ServiceOffer>,
}

impl PluginDescriptor {
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            version: semver::Version::new(0, 1, 0),
            requires: Vec::new(),
            extension_points: Vec::new(),
            contributions: Vec::new(),
            service_offers: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_version(mut self, version: semver::Version) -> Self {
        self.version = version;
        self
    }

    /// Declare a dependency on another plugin.
    pub fn requires(mut self, plugin_id: impl Into<String>) -> Self {
        self.requires.push(plugin_id.into());
        self
    }

    /// Declare an extension point owned by this plugin.
    pub fn declares_extension_point(
        mut self,
        id: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        self.extension_points.push(ExtensionPoint::new(id, description));
        self
    }

    /// Offer a contribution to an extension point.
    pub fn contributes(mut self, point_id: impl Into<String>, value: Value) -> Self {
        self.contributions.push(Contribution {
            point_id: point_id.into(),
            value,
        });
        self
    }

    /// Offer a service under a capability name.
    pub fn offers_service(
        mut self,
        capability: impl Into<String>,
        provider: ServiceProvider,
        properties: ServiceProperties,
    ) -> Self {
        self.service_offers.push(ServiceOffer {
            capability: capability.into(),
            provider,
            properties,
        });
        self
    }

    /// Check structural validity of the descriptor.
    pub fn validate(&self) -> Result<(), ArmatureError> {
        if self.id.trim().is_empty() {
            return Err(ArmatureError::Config(
                "plugin descriptor: id must not be empty".to_string(),
            ));
        }
        if self.requires.iter().any(|dep| dep == &self.id) {
            return Err(ArmatureError::Config(format!(
                "plugin descriptor: `{}` must not depend on itself",
                self.id
            )));
        }
        Ok(())
    }
}
