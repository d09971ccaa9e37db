// SPDX-FileCopyrightText: 2026 Armature Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The shared runtime context.
//!
//! One [`RuntimeContext`] owns both registries and the event bus for the
//! lifetime of an application. It is passed explicitly to every component
//! at construction; there is no process-wide registry state.

use std::sync::Arc;

use armature_plugin::PluginContext;
use armature_registry::{ExtensionRegistry, ServiceRegistry};

use crate::events::EventBus;

/// The registries and event bus shared by the manager and all plugins.
#[derive(Clone)]
pub struct RuntimeContext {
    extensions: Arc<ExtensionRegistry>,
    services: Arc<ServiceRegistry>,
    events: Arc<EventBus>,
}

impl RuntimeContext {
    /// Create a fresh context.
    ///
    /// `auto_create_points` configures the extension registry to declare a
    /// point on first contribution instead of rejecting it.
    pub fn new(auto_create_points: bool) -> Self {
        Self {
            extensions: Arc::new(ExtensionRegistry::with_auto_create(auto_create_points)),
            services: Arc::new(ServiceRegistry::new()),
            events: Arc::new(EventBus::new()),
        }
    }

    pub fn extensions(&self) -> &Arc<ExtensionRegistry> {
        &self.extensions
    }

    pub fn services(&self) -> &Arc<ServiceRegistry> {
        &self.services
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    /// Derive the id-scoped context handed to one plugin's hooks.
    pub fn plugin_context(&self, plugin_id: &str) -> PluginContext {
        PluginContext::new(
            plugin_id,
            Arc::clone(&self.extensions),
            Arc::clone(&self.services),
        )
    }
}

impl Default for RuntimeContext {
    fn default() -> Self {
        Self::new(false)
    }
}
