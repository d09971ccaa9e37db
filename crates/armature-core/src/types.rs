// SPDX-FileCopyrightText: 2026 Armature Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across the registries and the plugin manager.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Opaque identifier for a service registration.
///
/// Ids are monotonically increasing within one registry instance and are
/// never persisted between process invocations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServiceId(pub u64);

impl std::fmt::Display for ServiceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque identifier for an extension-point listener subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriptionId(pub u64);

/// Lifecycle state of a plugin as tracked by the plugin manager.
///
/// A plugin's contributions and services are visible in the registries only
/// while it is `Started`. There is no restart transition; restart is a stop
/// followed by a fresh start.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PluginState {
    /// Known to the manager, not yet started.
    Registered,
    /// The start hook is running.
    Starting,
    /// The start hook completed; contributions and services are live.
    Started,
    /// The stop hook is running; contributions and services are being removed.
    Stopping,
    /// Fully stopped. May be started again.
    Stopped,
    /// The start hook failed. Terminal until an explicit fresh start.
    StartFailed,
}

/// Arbitrary key/value properties attached to a service registration.
///
/// Used purely for filtering at lookup time, never for identity.
pub type ServiceProperties = serde_json::Map<String, serde_json::Value>;
