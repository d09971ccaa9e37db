// SPDX-FileCopyrightText: 2026 Armature Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The plugin manager.
//!
//! Drives the per-plugin state machine
//! `Registered -> Starting -> Started -> Stopping -> Stopped` (with the
//! terminal `StartFailed` branch), populates the shared registries as
//! plugins start, and empties them as plugins stop. Start order is the
//! resolved topological order; stop order is its reverse. A plugin's start
//! failure is isolated: its dependents stay `Registered`, unrelated
//! plugins are unaffected, and failures are aggregated into a
//! [`StartReport`] unless fail-fast is configured.
//!
//! Hooks run without any registry lock held.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use armature_core::{ArmatureError, PluginState};
use armature_plugin::{DependencyGraph, Plugin, PluginDescriptor};
use tracing::{debug, info, warn};

use crate::context::RuntimeContext;
use crate::events::RuntimeEvent;

/// One isolated start failure, as aggregated by [`PluginManager::start_all`].
#[derive(Debug)]
pub struct StartFailure {
    pub plugin_id: String,
    pub error: ArmatureError,
}

/// A plugin left `Registered` because a dependency never started.
#[derive(Debug)]
pub struct SkippedPlugin {
    pub plugin_id: String,
    /// The dependency that was not `Started`.
    pub blocked_on: String,
}

/// Outcome of a `start_all` sweep.
#[derive(Debug, Default)]
pub struct StartReport {
    /// Plugins that reached `Started`, in start order.
    pub started: Vec<String>,
    /// Plugins skipped because a dependency failed or was skipped.
    pub skipped: Vec<SkippedPlugin>,
    /// Plugins whose start hook (or registration) failed.
    pub failures: Vec<StartFailure>,
}

impl StartReport {
    /// True when every plugin started.
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty() && self.failures.is_empty()
    }
}

struct PluginRecord {
    plugin: Arc<dyn Plugin>,
    descriptor: PluginDescriptor,
    state: RwLock<PluginState>,
}

/// Resolves the plugin graph and drives plugin lifecycle.
pub struct PluginManager {
    context: RuntimeContext,
    records: Vec<PluginRecord>,
    index: HashMap<String, usize>,
    graph: DependencyGraph,
    fail_fast: bool,
}

impl std::fmt::Debug for PluginManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginManager").finish_non_exhaustive()
    }
}

impl PluginManager {
    /// Build a manager over a declaration-ordered set of plugins.
    ///
    /// Fails fatally on duplicate ids, unknown dependencies, and cycles;
    /// none of the plugins is started.
    pub fn new(
        context: RuntimeContext,
        plugins: Vec<Arc<dyn Plugin>>,
    ) -> Result<Self, ArmatureError> {
        let descriptors: Vec<PluginDescriptor> =
            plugins.iter().map(|plugin| plugin.descriptor()).collect();
        let graph = DependencyGraph::resolve(&descriptors)?;

        let mut index = HashMap::new();
        let mut records = Vec::with_capacity(plugins.len());
        for (plugin, descriptor) in plugins.into_iter().zip(descriptors) {
            index.insert(descriptor.id.clone(), records.len());
            records.push(PluginRecord {
                plugin,
                descriptor,
                state: RwLock::new(PluginState::Registered),
            });
        }

        info!(plugins = records.len(), "plugin manager initialized");

        Ok(Self {
            context,
            records,
            index,
            graph,
            fail_fast: false,
        })
    }

    /// Abort `start_all` on the first failing plugin instead of isolating it.
    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    pub fn context(&self) -> &RuntimeContext {
        &self.context
    }

    /// Plugin ids in declaration order.
    pub fn plugin_ids(&self) -> Vec<String> {
        self.records
            .iter()
            .map(|record| record.descriptor.id.clone())
            .collect()
    }

    /// Current lifecycle state of one plugin.
    pub fn plugin_state(&self, plugin_id: &str) -> Result<PluginState, ArmatureError> {
        Ok(self.state_of(self.idx(plugin_id)?))
    }

    /// The descriptor a plugin was registered with.
    pub fn descriptor(&self, plugin_id: &str) -> Result<&PluginDescriptor, ArmatureError> {
        Ok(&self.records[self.idx(plugin_id)?].descriptor)
    }

    /// Start every plugin in dependency order.
    ///
    /// Failures are isolated and aggregated unless fail-fast is set, in
    /// which case the first failure aborts the sweep.
    pub async fn start_all(&self) -> Result<StartReport, ArmatureError> {
        let mut report = StartReport::default();

        for &idx in self.graph.start_order() {
            let plugin_id = self.records[idx].descriptor.id.clone();
            if self.state_of(idx) == PluginState::Started {
                continue;
            }

            // Dependency gate: a failed or skipped dependency leaves this
            // plugin in `Registered`.
            if let Some(&blocked) = self
                .graph
                .dependencies_of(idx)
                .iter()
                .find(|&&dep| self.state_of(dep) != PluginState::Started)
            {
                let blocked_on = self.records[blocked].descriptor.id.clone();
                debug!(
                    plugin = plugin_id.as_str(),
                    blocked_on = blocked_on.as_str(),
                    "skipping plugin, dependency not started"
                );
                report.skipped.push(SkippedPlugin {
                    plugin_id,
                    blocked_on,
                });
                continue;
            }

            match self.start_one(idx).await {
                Ok(true) => report.started.push(plugin_id),
                Ok(false) => {}
                Err(error) => {
                    if self.fail_fast {
                        return Err(error);
                    }
                    report.failures.push(StartFailure { plugin_id, error });
                }
            }
        }

        Ok(report)
    }

    /// Start one plugin, starting any of its unstarted dependencies first.
    pub async fn start_plugin(&self, plugin_id: &str) -> Result<(), ArmatureError> {
        let idx = self.idx(plugin_id)?;
        for dep in self.graph.transitive_dependencies(idx) {
            if self.state_of(dep) != PluginState::Started {
                self.start_one(dep).await?;
            }
        }
        self.start_one(idx).await.map(|_| ())
    }

    /// Stop every started plugin in reverse start order.
    pub async fn stop_all(&self) {
        for &idx in self.graph.start_order().iter().rev() {
            self.stop_one(idx).await;
        }
    }

    /// Stop one plugin, stopping its started dependents first.
    pub async fn stop_plugin(&self, plugin_id: &str) -> Result<(), ArmatureError> {
        let idx = self.idx(plugin_id)?;
        for dependent in self.graph.transitive_dependents(idx) {
            self.stop_one(dependent).await;
        }
        self.stop_one(idx).await;
        Ok(())
    }

    /// Drive one plugin through `Starting -> Started`.
    ///
    /// Returns `Ok(false)` if the plugin was already started. On any
    /// failure the plugin ends in `StartFailed` with nothing of it left in
    /// the registries.
    async fn start_one(&self, idx: usize) -> Result<bool, ArmatureError> {
        let record = &self.records[idx];
        let plugin_id = record.descriptor.id.clone();

        {
            let mut state = record.state.write().expect("plugin state poisoned");
            match *state {
                PluginState::Started => return Ok(false),
                PluginState::Starting | PluginState::Stopping => {
                    let current = *state;
                    return Err(ArmatureError::Internal(format!(
                        "plugin `{plugin_id}` is mid-transition ({current})"
                    )));
                }
                PluginState::Registered | PluginState::Stopped | PluginState::StartFailed => {
                    *state = PluginState::Starting;
                }
            }
        }

        debug!(plugin = plugin_id.as_str(), "plugin starting");

        // Owned extension points are declared before the hook so the plugin
        // can contribute to them dynamically during start.
        for point in &record.descriptor.extension_points {
            self.context.extensions().add_extension_point(point.clone());
        }

        let ctx = self.context.plugin_context(&plugin_id);
        let hook_result = record.plugin.start(&ctx).await;

        let result = match hook_result {
            Ok(()) => self.register_declarations(idx),
            Err(error) => Err(error),
        };

        match result {
            Ok(()) => {
                self.set_state(idx, PluginState::Started);
                self.context.events().publish(RuntimeEvent::PluginStarted {
                    plugin_id: plugin_id.clone(),
                });
                info!(plugin = plugin_id.as_str(), "plugin started");
                Ok(true)
            }
            Err(error) => {
                // Nothing of a failed plugin may stay visible, including
                // registrations its hook made dynamically.
                self.context.extensions().remove_contributions(&plugin_id);
                self.context.services().unregister_owned(&plugin_id);
                self.set_state(idx, PluginState::StartFailed);
                self.context
                    .events()
                    .publish(RuntimeEvent::PluginStartFailed {
                        plugin_id: plugin_id.clone(),
                        error: error.to_string(),
                    });
                warn!(plugin = plugin_id.as_str(), error = %error, "plugin failed to start");
                Err(ArmatureError::PluginStartFailed {
                    plugin: plugin_id,
                    source: Box::new(error),
                })
            }
        }
    }

    /// Register the descriptor's contributions (batched per point) and
    /// service offers.
    fn register_declarations(&self, idx: usize) -> Result<(), ArmatureError> {
        let record = &self.records[idx];
        let plugin_id = &record.descriptor.id;

        // Group by point id, preserving declaration order, so each point
        // sees one change event for the whole batch.
        let mut batches: Vec<(&str, Vec<serde_json::Value>)> = Vec::new();
        for contribution in &record.descriptor.contributions {
            match batches
                .iter_mut()
                .find(|(point_id, _)| *point_id == contribution.point_id)
            {
                Some((_, values)) => values.push(contribution.value.clone()),
                None => batches.push((&contribution.point_id, vec![contribution.value.clone()])),
            }
        }
        for (point_id, values) in batches {
            self.context
                .extensions()
                .register_contributions(point_id, plugin_id, values)?;
        }

        for offer in &record.descriptor.service_offers {
            self.context.services().register_service_owned(
                &offer.capability,
                offer.provider.clone(),
                offer.properties.clone(),
                plugin_id,
            );
        }

        Ok(())
    }

    /// Drive one plugin through `Stopping -> Stopped`. Plugins in any
    /// other state than `Started` are left alone.
    async fn stop_one(&self, idx: usize) -> bool {
        let record = &self.records[idx];
        let plugin_id = record.descriptor.id.clone();

        {
            let mut state = record.state.write().expect("plugin state poisoned");
            if *state != PluginState::Started {
                return false;
            }
            *state = PluginState::Stopping;
        }

        debug!(plugin = plugin_id.as_str(), "plugin stopping");

        // Contributions and services disappear the moment stopping begins.
        self.context.extensions().remove_contributions(&plugin_id);
        self.context.services().unregister_owned(&plugin_id);

        let ctx = self.context.plugin_context(&plugin_id);
        if let Err(error) = record.plugin.stop(&ctx).await {
            // Shutdown is best-effort; the plugin still reaches `Stopped`.
            warn!(plugin = plugin_id.as_str(), error = %error, "stop hook failed");
        }

        self.set_state(idx, PluginState::Stopped);
        self.context.events().publish(RuntimeEvent::PluginStopped {
            plugin_id: plugin_id.clone(),
        });
        info!(plugin = plugin_id.as_str(), "plugin stopped");
        true
    }

    fn idx(&self, plugin_id: &str) -> Result<usize, ArmatureError> {
        self.index
            .get(plugin_id)
            .copied()
            .ok_or_else(|| ArmatureError::UnknownPlugin {
                id: plugin_id.to_string(),
            })
    }

    fn state_of(&self, idx: usize) -> PluginState {
        *self.records[idx].state.read().expect("plugin state poisoned")
    }

    fn set_state(&self, idx: usize, state: PluginState) {
        *self.records[idx].state.write().expect("plugin state poisoned") = state;
    }
}
