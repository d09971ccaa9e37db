// SPDX-FileCopyrightText: 2026 Armature Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The plugin trait.

use armature_core::ArmatureError;
use async_trait::async_trait;

use crate::context::PluginContext;
use crate::descriptor::PluginDescriptor;

/// A plugin: static metadata plus lifecycle hooks.
///
/// The manager registers the descriptor's extension points, contributions,
/// and service offers when the plugin starts, and removes them when it
/// stops. The hooks exist for work beyond those static declarations:
/// acquiring resources, making dynamic registrations through the context,
/// or looking up services published by dependencies.
///
/// Hooks may block (I/O, resource acquisition); the manager never holds a
/// registry lock while a hook runs.
#[async_trait]
pub trait Plugin: Send + Sync {
    /// The plugin's static metadata.
    fn descriptor(&self) -> PluginDescriptor;

    /// Called while the plugin transitions `Starting -> Started`.
    /// Returning an error leaves the plugin in `StartFailed` and keeps its
    /// dependents from starting.
    async fn start(&self, _ctx: &PluginContext) -> Result<(), ArmatureError> {
        Ok(())
    }

    /// Called while the plugin transitions `Stopping -> Stopped`, after its
    /// contributions and services have been removed from the registries.
    async fn stop(&self, _ctx: &PluginContext) -> Result<(), ArmatureError> {
        Ok(())
    }
}
