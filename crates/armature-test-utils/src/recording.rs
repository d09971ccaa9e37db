// SPDX-FileCopyrightText: 2026 Armature Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plugins that record their lifecycle for assertion in tests.

use std::sync::{Arc, Mutex};

use armature_core::ArmatureError;
use armature_plugin::{Plugin, PluginContext, PluginDescriptor};
use async_trait::async_trait;

/// Shared journal of lifecycle entries (`"start:<id>"`, `"stop:<id>"`).
pub type Journal = Arc<Mutex<Vec<String>>>;

/// Create an empty journal.
pub fn journal() -> Journal {
    Arc::default()
}

/// A plugin that appends `start:<id>` / `stop:<id>` to a shared journal.
pub struct RecordingPlugin {
    descriptor: PluginDescriptor,
    journal: Journal,
}

impl RecordingPlugin {
    pub fn new(descriptor: PluginDescriptor, journal: &Journal) -> Arc<dyn Plugin> {
        Arc::new(Self {
            descriptor,
            journal: Arc::clone(journal),
        })
    }
}

#[async_trait]
impl Plugin for RecordingPlugin {
    fn descriptor(&self) -> PluginDescriptor {
        self.descriptor.clone()
    }

    async fn start(&self, ctx: &PluginContext) -> Result<(), ArmatureError> {
        self.journal
            .lock()
            .unwrap()
            .push(format!("start:{}", ctx.plugin_id()));
        Ok(())
    }

    async fn stop(&self, ctx: &PluginContext) -> Result<(), ArmatureError> {
        self.journal
            .lock()
            .unwrap()
            .push(format!("stop:{}", ctx.plugin_id()));
        Ok(())
    }
}

/// A plugin whose start hook always fails.
pub struct FailingPlugin {
    descriptor: PluginDescriptor,
    message: String,
}

impl FailingPlugin {
    pub fn new(descriptor: PluginDescriptor, message: impl Into<String>) -> Arc<dyn Plugin> {
        Arc::new(Self {
            descriptor,
            message: message.into(),
        })
    }
}

#[async_trait]
impl Plugin for FailingPlugin {
    fn descriptor(&self) -> PluginDescriptor {
        self.descriptor.clone()
    }

    async fn start(&self, _ctx: &PluginContext) -> Result<(), ArmatureError> {
        Err(ArmatureError::Internal(self.message.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use armature_runtime::RuntimeContext;

    #[tokio::test]
    async fn recording_plugin_journals_both_hooks() {
        let journal = journal();
        let plugin = RecordingPlugin::new(PluginDescriptor::new("rec"), &journal);
        let ctx = RuntimeContext::default().plugin_context("rec");

        plugin.start(&ctx).await.unwrap();
        plugin.stop(&ctx).await.unwrap();

        assert_eq!(*journal.lock().unwrap(), vec!["start:rec", "stop:rec"]);
    }

    #[tokio::test]
    async fn failing_plugin_reports_its_message() {
        let plugin = FailingPlugin::new(PluginDescriptor::new("bad"), "no disk");
        let ctx = RuntimeContext::default().plugin_context("bad");

        let err = plugin.start(&ctx).await.unwrap_err();
        assert!(err.to_string().contains("no disk"));
    }
}
