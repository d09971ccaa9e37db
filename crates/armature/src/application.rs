// SPDX-FileCopyrightText: 2026 Armature Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The application facade.
//!
//! An [`Application`] owns one [`RuntimeContext`] and one [`PluginManager`]
//! for its lifetime, orchestrates startup and shutdown ordering, and
//! delegates registry queries. Graph errors (duplicate ids, unknown
//! dependencies, cycles) surface at construction time and abort startup
//! entirely; individual plugin start failures are isolated and aggregated
//! into the returned [`StartReport`].

use std::path::PathBuf;
use std::sync::Arc;

use armature_config::ArmatureConfig;
use armature_core::{ArmatureError, PluginState, ServiceId, ServiceProperties, SubscriptionId};
use armature_plugin::Plugin;
use armature_registry::{ExtensionPointChange, ServiceProvider, ServiceRef};
use armature_runtime::{
    PluginManager, RuntimeContext, RuntimeEvent, StartReport, install_signal_handler,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::info;

/// An extensible, pluggable application.
///
/// This handles the common non-interactive case; embedders drive richer
/// lifecycles through [`Application::manager`] directly.
pub struct Application {
    config: ArmatureConfig,
    context: RuntimeContext,
    manager: PluginManager,
}

impl std::fmt::Debug for Application {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Application").finish_non_exhaustive()
    }
}

impl Application {
    /// Build an application over a declaration-ordered plugin set.
    ///
    /// Resolves the dependency graph immediately; configuration errors in
    /// the graph are fatal here and nothing is started.
    pub fn new(
        config: ArmatureConfig,
        plugins: Vec<Arc<dyn Plugin>>,
    ) -> Result<Self, ArmatureError> {
        let context = RuntimeContext::new(config.registry.auto_create_extension_points);
        let manager = PluginManager::new(context.clone(), plugins)?
            .with_fail_fast(config.lifecycle.fail_fast);
        Ok(Self {
            config,
            context,
            manager,
        })
    }

    /// The application's globally unique id.
    pub fn id(&self) -> &str {
        &self.config.application.id
    }

    pub fn config(&self) -> &ArmatureConfig {
        &self.config
    }

    pub fn context(&self) -> &RuntimeContext {
        &self.context
    }

    pub fn manager(&self) -> &PluginManager {
        &self.manager
    }

    /// Directory for application-private data, created on first access.
    ///
    /// Defaults to the platform data directory joined with the application
    /// id; `application.home` in the config overrides it.
    pub fn home(&self) -> Result<PathBuf, ArmatureError> {
        let home = match &self.config.application.home {
            Some(explicit) => PathBuf::from(explicit),
            None => dirs::data_dir()
                .ok_or_else(|| {
                    ArmatureError::Config("no platform data directory available".to_string())
                })?
                .join(self.id()),
        };
        std::fs::create_dir_all(&home)
            .map_err(|e| ArmatureError::Config(format!("cannot create home directory: {e}")))?;
        Ok(home)
    }

    /// Start every plugin in dependency order.
    ///
    /// Fires [`RuntimeEvent::ApplicationStarted`] once every plugin has
    /// reached `Started` or `StartFailed`, then returns the aggregated
    /// report. With `lifecycle.fail_fast` the first failure aborts instead.
    pub async fn start(&self) -> Result<StartReport, ArmatureError> {
        info!(application = self.id(), "application starting");
        let report = self.manager.start_all().await?;

        self.context
            .events()
            .publish(RuntimeEvent::ApplicationStarted {
                started: report.started.len(),
                failed: report.failures.len(),
                timestamp: chrono::Utc::now().to_rfc3339(),
            });
        info!(
            application = self.id(),
            started = report.started.len(),
            failed = report.failures.len(),
            skipped = report.skipped.len(),
            "application started"
        );
        Ok(report)
    }

    /// Stop every started plugin in reverse start order, then fire
    /// [`RuntimeEvent::ApplicationStopped`].
    pub async fn stop(&self) {
        info!(application = self.id(), "application stopping");
        self.manager.stop_all().await;
        self.context
            .events()
            .publish(RuntimeEvent::ApplicationStopped {
                timestamp: chrono::Utc::now().to_rfc3339(),
            });
        info!(application = self.id(), "application stopped");
    }

    /// Start, park until SIGINT/SIGTERM, then stop.
    pub async fn run(&self) -> Result<StartReport, ArmatureError> {
        let report = self.start().await?;
        let shutdown = install_signal_handler();
        shutdown.cancelled().await;
        self.stop().await;
        Ok(report)
    }

    // --- Registry delegation -------------------------------------------
    //
    // Valid at any time after `start()` begins; before startup completes
    // these may observe partial state.

    pub fn get_extensions(&self, point_id: &str) -> Vec<Value> {
        self.context.extensions().get_extensions(point_id)
    }

    pub fn get_extensions_as<T: DeserializeOwned>(
        &self,
        point_id: &str,
    ) -> Result<Vec<T>, ArmatureError> {
        self.context.extensions().get_extensions_as(point_id)
    }

    pub fn get_service(
        &self,
        capability: &str,
        filter: Option<&str>,
    ) -> Result<ServiceRef, ArmatureError> {
        self.context.services().get_service(capability, filter)
    }

    pub fn get_services(
        &self,
        capability: &str,
        filter: Option<&str>,
    ) -> Result<Vec<ServiceRef>, ArmatureError> {
        self.context.services().get_services(capability, filter)
    }

    pub fn get_unique_service(
        &self,
        capability: &str,
        filter: Option<&str>,
    ) -> Result<ServiceRef, ArmatureError> {
        self.context.services().get_unique_service(capability, filter)
    }

    /// Register a service not owned by any plugin (lives until explicitly
    /// unregistered).
    pub fn register_service(
        &self,
        capability: &str,
        provider: ServiceProvider,
        properties: ServiceProperties,
    ) -> ServiceId {
        self.context
            .services()
            .register_service(capability, provider, properties)
    }

    pub fn unregister_service(&self, id: ServiceId) -> Result<(), ArmatureError> {
        self.context.services().unregister_service(id)
    }

    /// Subscribe to contribution changes on one extension point (`Some`)
    /// or all points (`None`).
    pub fn subscribe_extension_point(
        &self,
        point_id: Option<&str>,
        listener: impl Fn(&ExtensionPointChange) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.context.extensions().subscribe(point_id, listener)
    }

    /// Subscribe to application and plugin lifecycle events.
    pub fn events(&self) -> broadcast::Receiver<RuntimeEvent> {
        self.context.events().subscribe()
    }

    // --- Plugin manager delegation -------------------------------------

    pub fn plugin_state(&self, plugin_id: &str) -> Result<PluginState, ArmatureError> {
        self.manager.plugin_state(plugin_id)
    }

    pub async fn start_plugin(&self, plugin_id: &str) -> Result<(), ArmatureError> {
        self.manager.start_plugin(plugin_id).await
    }

    pub async fn stop_plugin(&self, plugin_id: &str) -> Result<(), ArmatureError> {
        self.manager.stop_plugin(plugin_id).await
    }
}
