// SPDX-FileCopyrightText: 2026 Armature Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plugin lifecycle orchestration for the Armature plugin runtime.
//!
//! The [`PluginManager`] resolves the dependency graph over a set of
//! plugins, drives each through its lifecycle states, and keeps the shared
//! registries in [`RuntimeContext`] consistent with which plugins are
//! started. Lifecycle events flow over the [`EventBus`].

pub mod context;
pub mod events;
pub mod manager;
pub mod shutdown;

pub use context::RuntimeContext;
pub use events::{EventBus, RuntimeEvent};
pub use manager::{PluginManager, SkippedPlugin, StartFailure, StartReport};
pub use shutdown::install_signal_handler;
