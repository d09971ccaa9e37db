// SPDX-FileCopyrightText: 2026 Armature Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Runtime event bus.
//!
//! A publish-subscribe channel carrying application and plugin lifecycle
//! events. Extension-point change notification is separate (and
//! synchronous); see `armature_registry::ExtensionRegistry::subscribe`.

use tokio::sync::broadcast;
use tracing::debug;

/// Application and plugin lifecycle events.
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    /// Fired once every plugin has reached `Started` or `StartFailed`.
    ApplicationStarted {
        started: usize,
        failed: usize,
        timestamp: String,
    },
    /// Fired after the last plugin has reached `Stopped`.
    ApplicationStopped { timestamp: String },
    PluginStarted { plugin_id: String },
    PluginStopped { plugin_id: String },
    PluginStartFailed { plugin_id: String, error: String },
}

/// Broadcast bus for [`RuntimeEvent`]s.
///
/// Slow subscribers may miss events once the channel buffer wraps; lifecycle
/// events are advisory, the registries remain the source of truth.
pub struct EventBus {
    sender: broadcast::Sender<RuntimeEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(64);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    pub fn publish(&self, event: RuntimeEvent) {
        debug!(?event, "runtime event");
        // Send only fails when there are no subscribers, which is fine.
        let _ = self.sender.send(event);
    }

    /// Subscribe to events published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<RuntimeEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Timestamp helper for lifecycle events.
pub(crate) fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}
