// SPDX-FileCopyrightText: 2026 Armature Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plugin trait, descriptors, and dependency resolution for the Armature
//! plugin runtime.
//!
//! A plugin is described by a [`PluginDescriptor`] (id, dependencies, owned
//! extension points, contributions, service offers) and implemented as a
//! [`Plugin`] with async start/stop hooks. [`DependencyGraph`] turns a set
//! of descriptors into a deterministic start order, rejecting duplicate
//! ids, unknown dependencies, and cycles.

pub mod context;
pub mod descriptor;
pub mod graph;
pub mod traits;

pub use context::PluginContext;
pub use descriptor::{Contribution, PluginDescriptor, ServiceOffer};
pub use graph::DependencyGraph;
pub use traits::Plugin;
