// SPDX-FileCopyrightText: 2026 Armature Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The context handed to plugin lifecycle hooks.
//!
//! There is no global registry state; every plugin receives a
//! [`PluginContext`] scoped to its own id, through which dynamic
//! registrations are automatically tagged so they are removed when the
//! plugin stops.

use std::sync::Arc;

use armature_core::{ArmatureError, ServiceId, ServiceProperties};
use armature_registry::{ExtensionRegistry, ServiceProvider, ServiceRef, ServiceRegistry};
use serde_json::Value;

/// A plugin's view of the shared registries.
#[derive(Clone)]
pub struct PluginContext {
    plugin_id: String,
    extensions: Arc<ExtensionRegistry>,
    services: Arc<ServiceRegistry>,
}

impl PluginContext {
    pub fn new(
        plugin_id: impl Into<String>,
        extensions: Arc<ExtensionRegistry>,
        services: Arc<ServiceRegistry>,
    ) -> Self {
        Self {
            plugin_id: plugin_id.into(),
            extensions,
            services,
        }
    }

    /// The id of the plugin this context belongs to.
    pub fn plugin_id(&self) -> &str {
        &self.plugin_id
    }

    /// The shared extension registry.
    pub fn extensions(&self) -> &Arc<ExtensionRegistry> {
        &self.extensions
    }

    /// The shared service registry.
    pub fn services(&self) -> &Arc<ServiceRegistry> {
        &self.services
    }

    /// Contribute a value to an extension point, tagged with this plugin's
    /// id (removed automatically when the plugin stops).
    pub fn register_contribution(
        &self,
        point_id: &str,
        value: Value,
    ) -> Result<(), ArmatureError> {
        self.extensions
            .register_contribution(point_id, &self.plugin_id, value)
    }

    /// Publish a service owned by this plugin (unregistered automatically
    /// when the plugin stops).
    pub fn register_service(
        &self,
        capability: &str,
        provider: ServiceProvider,
        properties: ServiceProperties,
    ) -> ServiceId {
        self.services
            .register_service_owned(capability, provider, properties, &self.plugin_id)
    }

    /// Convenience pass-through to [`ExtensionRegistry::get_extensions`].
    pub fn get_extensions(&self, point_id: &str) -> Vec<Value> {
        self.extensions.get_extensions(point_id)
    }

    /// Convenience pass-through to [`ServiceRegistry::get_service`].
    pub fn get_service(
        &self,
        capability: &str,
        filter: Option<&str>,
    ) -> Result<ServiceRef, ArmatureError> {
        self.services.get_service(capability, filter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use armature_registry::ExtensionPoint;
    use serde_json::json;

    #[test]
    fn dynamic_registrations_are_tagged_with_the_plugin_id() {
        let extensions = Arc::new(ExtensionRegistry::new());
        let services = Arc::new(ServiceRegistry::new());
        extensions.add_extension_point(ExtensionPoint::new("p", ""));

        let ctx = PluginContext::new("acme.dyn", Arc::clone(&extensions), Arc::clone(&services));
        ctx.register_contribution("p", json!(1)).unwrap();
        ctx.register_service(
            "cap",
            ServiceProvider::instance(Arc::new(String::from("svc"))),
            ServiceProperties::new(),
        );

        extensions.remove_contributions("acme.dyn");
        services.unregister_owned("acme.dyn");

        assert!(extensions.get_extensions("p").is_empty());
        assert!(services.is_empty());
    }
}
