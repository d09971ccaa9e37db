// SPDX-FileCopyrightText: 2026 Armature Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Armature plugin runtime.
//!
//! This crate provides the error taxonomy, lifecycle state, identifier
//! types, and the type-erased service handle used throughout the Armature
//! workspace. The registries and the plugin manager build on these types.

pub mod error;
pub mod handle;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::ArmatureError;
pub use handle::ServiceHandle;
pub use types::{PluginState, ServiceId, ServiceProperties, SubscriptionId};
