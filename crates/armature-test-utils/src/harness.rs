// SPDX-FileCopyrightText: 2026 Armature Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness wiring a runtime context and plugin manager together.

use std::sync::Arc;

use armature_core::ArmatureError;
use armature_plugin::Plugin;
use armature_runtime::{PluginManager, RuntimeContext};

/// Initialize a tracing subscriber for test output.
///
/// Safe to call from every test; only the first call installs a subscriber.
/// Verbosity follows `RUST_LOG`.
pub fn init_test_logging() {
    use tracing_subscriber::EnvFilter;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A manager plus its context, preconfigured for deterministic tests.
pub struct TestRuntime {
    context: RuntimeContext,
    manager: PluginManager,
}

impl TestRuntime {
    /// Build a runtime over the given plugins with default options.
    pub fn new(plugins: Vec<Arc<dyn Plugin>>) -> Result<Self, ArmatureError> {
        let context = RuntimeContext::default();
        let manager = PluginManager::new(context.clone(), plugins)?;
        Ok(Self { context, manager })
    }

    /// Same, but with auto-created extension points.
    pub fn with_auto_create_points(
        plugins: Vec<Arc<dyn Plugin>>,
    ) -> Result<Self, ArmatureError> {
        let context = RuntimeContext::new(true);
        let manager = PluginManager::new(context.clone(), plugins)?;
        Ok(Self { context, manager })
    }

    pub fn context(&self) -> &RuntimeContext {
        &self.context
    }

    pub fn manager(&self) -> &PluginManager {
        &self.manager
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::{RecordingPlugin, journal};
    use armature_plugin::PluginDescriptor;

    #[tokio::test]
    async fn harness_starts_and_stops_plugins() {
        let journal = journal();
        let runtime = TestRuntime::new(vec![RecordingPlugin::new(
            PluginDescriptor::new("only"),
            &journal,
        )])
        .unwrap();

        let report = runtime.manager().start_all().await.unwrap();
        assert_eq!(report.started, vec!["only"]);
        runtime.manager().stop_all().await;

        assert_eq!(*journal.lock().unwrap(), vec!["start:only", "stop:only"]);
    }
}
