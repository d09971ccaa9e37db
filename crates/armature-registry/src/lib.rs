// SPDX-FileCopyrightText: 2026 Armature Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Extension-point and service registries for the Armature plugin runtime.
//!
//! The [`ExtensionRegistry`] holds ordered, contributor-tagged values per
//! named extension point and notifies subscribers of changes. The
//! [`ServiceRegistry`] holds capability-keyed service registrations with
//! property filtering and lazy, memoized factories.
//!
//! Both registries are internally locked: mutations are serialized and
//! appear atomic to readers, and reads may run concurrently.

pub mod extension;
pub mod filter;
pub mod service;

pub use extension::{ExtensionPoint, ExtensionPointChange, ExtensionRegistry};
pub use filter::{CompareOp, Filter};
pub use service::{ServiceFactory, ServiceProvider, ServiceRef, ServiceRegistry};
