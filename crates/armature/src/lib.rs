// SPDX-FileCopyrightText: 2026 Armature Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Armature - a plugin extension-point and service-registry runtime.
//!
//! Independently-packaged plugins contribute values to named extension
//! points and publish/look up services by capability rather than by
//! concrete type. The [`Application`] facade owns the shared registries
//! and the plugin manager for its lifetime:
//!
//! ```no_run
//! use std::sync::Arc;
//! use armature::{Application, ArmatureConfig, Plugin, PluginDescriptor};
//! use serde_json::json;
//!
//! struct Greetings;
//!
//! #[async_trait::async_trait]
//! impl Plugin for Greetings {
//!     fn descriptor(&self) -> PluginDescriptor {
//!         PluginDescriptor::new("demo.greetings")
//!             .declares_extension_point("demo.greetings.messages", "greeting strings")
//!             .contributes("demo.greetings.messages", json!("hello world"))
//!     }
//! }
//!
//! # async fn demo() -> Result<(), armature::ArmatureError> {
//! let app = Application::new(ArmatureConfig::default(), vec![Arc::new(Greetings)])?;
//! app.start().await?;
//! assert_eq!(app.get_extensions("demo.greetings.messages").len(), 1);
//! app.stop().await;
//! # Ok(())
//! # }
//! ```

pub mod application;

pub use application::Application;

// Re-export the public API surface of the workspace crates.
pub use armature_config::{ArmatureConfig, ConfigError, load_and_validate, render_errors};
pub use armature_core::{
    ArmatureError, PluginState, ServiceHandle, ServiceId, ServiceProperties, SubscriptionId,
};
pub use armature_plugin::{
    Contribution, DependencyGraph, Plugin, PluginContext, PluginDescriptor, ServiceOffer,
};
pub use armature_registry::{
    ExtensionPoint, ExtensionPointChange, ExtensionRegistry, Filter, ServiceFactory,
    ServiceProvider, ServiceRef, ServiceRegistry,
};
pub use armature_runtime::{
    EventBus, PluginManager, RuntimeContext, RuntimeEvent, SkippedPlugin, StartFailure,
    StartReport,
};
