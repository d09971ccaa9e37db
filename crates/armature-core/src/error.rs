// SPDX-FileCopyrightText: 2026 Armature Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Armature plugin runtime.

use thiserror::Error;

use crate::types::ServiceId;

/// The primary error type used across the registries, the plugin manager,
/// and the application facade.
#[derive(Debug, Error)]
pub enum ArmatureError {
    /// A contribution was offered to an extension point that was never declared.
    #[error("unknown extension point `{id}`")]
    UnknownExtensionPoint { id: String },

    /// Two plugins were registered under the same id.
    #[error("duplicate plugin id `{id}`")]
    DuplicatePluginId { id: String },

    /// The plugin dependency graph contains a cycle.
    ///
    /// `cycle` lists the plugin ids on the cycle, in dependency order.
    #[error("cyclic plugin dependency: {}", cycle.join(" -> "))]
    CyclicDependency { cycle: Vec<String> },

    /// A plugin's start hook returned an error.
    ///
    /// The plugin is left in the `StartFailed` state and its dependents are
    /// not started; unrelated plugins are unaffected.
    #[error("plugin `{plugin}` failed to start")]
    PluginStartFailed {
        plugin: String,
        #[source]
        source: Box<ArmatureError>,
    },

    /// No registered service matched the requested capability and filter.
    #[error("no service matches capability `{capability}`")]
    NoMatchingService { capability: String },

    /// More than one service matched where exactly one was required.
    #[error("{count} services match capability `{capability}`, expected exactly one")]
    AmbiguousService { capability: String, count: usize },

    /// No service is registered under the given id.
    #[error("no service with id <{id}>")]
    UnknownServiceId { id: ServiceId },

    /// A plugin id was referenced (lookup or dependency) that is not registered.
    #[error("unknown plugin `{id}`")]
    UnknownPlugin { id: String },

    /// A service filter expression could not be parsed.
    #[error("invalid filter `{expression}`: {reason}")]
    InvalidFilter { expression: String, reason: String },

    /// A contributed value did not match the shape the consumer expected.
    #[error("bad contribution to extension point `{point_id}`: {reason}")]
    Contribution { point_id: String, reason: String },

    /// Configuration errors (invalid values, missing required settings).
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}
