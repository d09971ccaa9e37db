// SPDX-FileCopyrightText: 2026 Armature Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The extension registry.
//!
//! Stores, per declared extension point, the ordered list of values
//! contributed by plugins, and notifies subscribers synchronously when the
//! contents of a point change. Contribution values are opaque
//! [`serde_json::Value`]s; the consuming side validates shape via
//! [`ExtensionRegistry::get_extensions_as`].
//!
//! All mutations take the registry-wide write lock, so readers observe
//! either the full pre-mutation or full post-mutation state. Listeners are
//! invoked after the lock is released.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use armature_core::{ArmatureError, SubscriptionId};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

/// A named slot that plugins contribute values to.
///
/// Owned by the plugin that declares it; immutable once registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionPoint {
    /// Globally unique identifier, conventionally dotted
    /// (e.g. `"acme.messages"`).
    pub id: String,
    /// Human-readable description of what contributions mean.
    pub description: String,
}

impl ExtensionPoint {
    pub fn new(id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
        }
    }
}

/// Delta delivered to extension-point listeners after a mutation commits.
#[derive(Debug, Clone)]
pub struct ExtensionPointChange {
    pub point_id: String,
    pub added: Vec<Value>,
    pub removed: Vec<Value>,
}

type Listener = Arc<dyn Fn(&ExtensionPointChange) + Send + Sync>;

struct TaggedContribution {
    contributor: String,
    value: Value,
}

#[derive(Default)]
struct Inner {
    points: HashMap<String, ExtensionPoint>,
    // Insertion-ordered contributions per point id.
    contributions: HashMap<String, Vec<TaggedContribution>>,
    // Keyed by point id; the `None` key holds listeners for all points.
    listeners: HashMap<Option<String>, Vec<(SubscriptionId, Listener)>>,
}

/// The extension registry.
pub struct ExtensionRegistry {
    inner: RwLock<Inner>,
    next_subscription: AtomicU64,
    auto_create_points: bool,
}

impl ExtensionRegistry {
    /// Create a registry that rejects contributions to undeclared points.
    pub fn new() -> Self {
        Self::with_auto_create(false)
    }

    /// Create a registry that declares a point on its first contribution
    /// instead of failing with `UnknownExtensionPoint`.
    pub fn with_auto_create(auto_create_points: bool) -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            next_subscription: AtomicU64::new(1),
            auto_create_points,
        }
    }

    /// Declare an extension point.
    ///
    /// Points are immutable once declared: re-declaring an existing id keeps
    /// the original and logs a warning.
    pub fn add_extension_point(&self, point: ExtensionPoint) {
        let mut inner = self.inner.write().expect("extension registry poisoned");
        if let Some(existing) = inner.points.get(&point.id) {
            // Identical re-declaration happens on plugin restart; only a
            // conflicting one is worth a warning.
            if *existing == point {
                debug!(point_id = point.id.as_str(), "extension point already declared");
            } else {
                warn!(
                    point_id = point.id.as_str(),
                    "extension point already declared, keeping original"
                );
            }
            return;
        }
        debug!(point_id = point.id.as_str(), "extension point added");
        inner.points.insert(point.id.clone(), point);
    }

    /// Return the declared point with the given id, if any.
    pub fn get_extension_point(&self, point_id: &str) -> Option<ExtensionPoint> {
        let inner = self.inner.read().expect("extension registry poisoned");
        inner.points.get(point_id).cloned()
    }

    /// Return all declared extension points.
    pub fn extension_points(&self) -> Vec<ExtensionPoint> {
        let inner = self.inner.read().expect("extension registry poisoned");
        inner.points.values().cloned().collect()
    }

    /// Append a single contribution to a point, tagged with its contributor.
    pub fn register_contribution(
        &self,
        point_id: &str,
        contributor_id: &str,
        value: Value,
    ) -> Result<(), ArmatureError> {
        self.register_contributions(point_id, contributor_id, vec![value])
    }

    /// Append a batch of contributions to a point.
    ///
    /// The batch lands atomically and produces a single change event.
    pub fn register_contributions(
        &self,
        point_id: &str,
        contributor_id: &str,
        values: Vec<Value>,
    ) -> Result<(), ArmatureError> {
        if values.is_empty() {
            return Ok(());
        }

        let notify;
        {
            let mut inner = self.inner.write().expect("extension registry poisoned");
            if !inner.points.contains_key(point_id) {
                if !self.auto_create_points {
                    return Err(ArmatureError::UnknownExtensionPoint {
                        id: point_id.to_string(),
                    });
                }
                debug!(point_id, "auto-creating extension point on first contribution");
                inner.points.insert(
                    point_id.to_string(),
                    ExtensionPoint::new(point_id, String::new()),
                );
            }

            let entries = inner.contributions.entry(point_id.to_string()).or_default();
            for value in &values {
                entries.push(TaggedContribution {
                    contributor: contributor_id.to_string(),
                    value: value.clone(),
                });
            }

            debug!(
                point_id,
                contributor = contributor_id,
                count = values.len(),
                "contributions registered"
            );

            notify = self.collect_listeners(&inner, point_id);
        }

        let change = ExtensionPointChange {
            point_id: point_id.to_string(),
            added: values,
            removed: Vec::new(),
        };
        Self::deliver(&notify, &change);
        Ok(())
    }

    /// Return the ordered contributions for a point.
    ///
    /// A point with no contributions — including one never declared — yields
    /// an empty vec; lookup is never an error.
    pub fn get_extensions(&self, point_id: &str) -> Vec<Value> {
        let inner = self.inner.read().expect("extension registry poisoned");
        inner
            .contributions
            .get(point_id)
            .map(|entries| entries.iter().map(|e| e.value.clone()).collect())
            .unwrap_or_default()
    }

    /// Return the contributions for a point, deserialized into `T`.
    ///
    /// The consuming component chooses `T` and thereby defines the point's
    /// value contract; a non-conforming contribution is reported against the
    /// point id.
    pub fn get_extensions_as<T: DeserializeOwned>(
        &self,
        point_id: &str,
    ) -> Result<Vec<T>, ArmatureError> {
        self.get_extensions(point_id)
            .into_iter()
            .map(|value| {
                serde_json::from_value(value).map_err(|e| ArmatureError::Contribution {
                    point_id: point_id.to_string(),
                    reason: e.to_string(),
                })
            })
            .collect()
    }

    /// Remove every contribution tagged with `contributor_id`, across all
    /// points, atomically. Used when a plugin stops.
    pub fn remove_contributions(&self, contributor_id: &str) {
        let mut changes: Vec<(Vec<(SubscriptionId, Listener)>, ExtensionPointChange)> = Vec::new();
        {
            let mut inner = self.inner.write().expect("extension registry poisoned");
            let mut removed_per_point: Vec<(String, Vec<Value>)> = Vec::new();

            for (point_id, entries) in inner.contributions.iter_mut() {
                let mut removed = Vec::new();
                entries.retain(|entry| {
                    if entry.contributor == contributor_id {
                        removed.push(entry.value.clone());
                        false
                    } else {
                        true
                    }
                });
                if !removed.is_empty() {
                    removed_per_point.push((point_id.clone(), removed));
                }
            }

            for (point_id, removed) in removed_per_point {
                debug!(
                    point_id = point_id.as_str(),
                    contributor = contributor_id,
                    count = removed.len(),
                    "contributions removed"
                );
                let notify = self.collect_listeners(&inner, &point_id);
                changes.push((
                    notify,
                    ExtensionPointChange {
                        point_id,
                        added: Vec::new(),
                        removed,
                    },
                ));
            }
        }

        for (notify, change) in changes {
            Self::deliver(&notify, &change);
        }
    }

    /// Subscribe to changes on one point (`Some(id)`) or on every point
    /// (`None`).
    ///
    /// Listeners run synchronously after each mutation commits:
    /// point-specific listeners first, then all-point listeners, each group
    /// in subscription order.
    pub fn subscribe(
        &self,
        point_id: Option<&str>,
        listener: impl Fn(&ExtensionPointChange) + Send + Sync + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::Relaxed));
        let mut inner = self.inner.write().expect("extension registry poisoned");
        inner
            .listeners
            .entry(point_id.map(str::to_string))
            .or_default()
            .push((id, Arc::new(listener)));
        id
    }

    /// Drop a subscription. Returns false if the id was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut inner = self.inner.write().expect("extension registry poisoned");
        for listeners in inner.listeners.values_mut() {
            let before = listeners.len();
            listeners.retain(|(sub_id, _)| *sub_id != id);
            if listeners.len() != before {
                return true;
            }
        }
        false
    }

    fn collect_listeners(
        &self,
        inner: &Inner,
        point_id: &str,
    ) -> Vec<(SubscriptionId, Listener)> {
        let mut notify = Vec::new();
        if let Some(specific) = inner.listeners.get(&Some(point_id.to_string())) {
            notify.extend(specific.iter().map(|(id, l)| (*id, Arc::clone(l))));
        }
        if let Some(global) = inner.listeners.get(&None) {
            notify.extend(global.iter().map(|(id, l)| (*id, Arc::clone(l))));
        }
        notify
    }

    fn deliver(notify: &[(SubscriptionId, Listener)], change: &ExtensionPointChange) {
        for (_, listener) in notify {
            listener(change);
        }
    }
}

impl Default for ExtensionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    fn registry_with_point(id: &str) -> ExtensionRegistry {
        let registry = ExtensionRegistry::new();
        registry.add_extension_point(ExtensionPoint::new(id, "test point"));
        registry
    }

    #[test]
    fn contributions_preserve_registration_order() {
        let registry = registry_with_point("acme.messages");
        registry
            .register_contribution("acme.messages", "plugin.a", json!("first"))
            .unwrap();
        registry
            .register_contribution("acme.messages", "plugin.b", json!("second"))
            .unwrap();
        registry
            .register_contribution("acme.messages", "plugin.a", json!("third"))
            .unwrap();

        assert_eq!(
            registry.get_extensions("acme.messages"),
            vec![json!("first"), json!("second"), json!("third")]
        );
    }

    #[test]
    fn unknown_point_fails_registration_but_not_lookup() {
        let registry = ExtensionRegistry::new();
        let err = registry
            .register_contribution("nowhere", "plugin.a", json!(1))
            .unwrap_err();
        assert!(matches!(
            err,
            ArmatureError::UnknownExtensionPoint { ref id } if id == "nowhere"
        ));
        assert!(registry.get_extensions("nowhere").is_empty());
    }

    #[test]
    fn auto_create_option_declares_on_first_contribution() {
        let registry = ExtensionRegistry::with_auto_create(true);
        registry
            .register_contribution("lazy.point", "plugin.a", json!(1))
            .unwrap();
        assert_eq!(registry.get_extensions("lazy.point"), vec![json!(1)]);
        assert!(registry.get_extension_point("lazy.point").is_some());
    }

    #[test]
    fn redeclaring_a_point_keeps_the_original() {
        let registry = ExtensionRegistry::new();
        registry.add_extension_point(ExtensionPoint::new("p", "original"));
        registry.add_extension_point(ExtensionPoint::new("p", "usurper"));
        assert_eq!(
            registry.get_extension_point("p").unwrap().description,
            "original"
        );
        assert_eq!(registry.extension_points().len(), 1);
    }

    #[test]
    fn remove_contributions_only_touches_the_given_contributor() {
        let registry = registry_with_point("shared.point");
        registry
            .register_contribution("shared.point", "plugin.a", json!("a1"))
            .unwrap();
        registry
            .register_contribution("shared.point", "plugin.b", json!("b1"))
            .unwrap();
        registry
            .register_contribution("shared.point", "plugin.a", json!("a2"))
            .unwrap();

        registry.remove_contributions("plugin.a");

        assert_eq!(registry.get_extensions("shared.point"), vec![json!("b1")]);
    }

    #[test]
    fn remove_spans_all_points() {
        let registry = ExtensionRegistry::new();
        registry.add_extension_point(ExtensionPoint::new("p1", ""));
        registry.add_extension_point(ExtensionPoint::new("p2", ""));
        registry.register_contribution("p1", "plugin.a", json!(1)).unwrap();
        registry.register_contribution("p2", "plugin.a", json!(2)).unwrap();

        registry.remove_contributions("plugin.a");

        assert!(registry.get_extensions("p1").is_empty());
        assert!(registry.get_extensions("p2").is_empty());
    }

    #[test]
    fn listeners_receive_added_and_removed_deltas() {
        let registry = registry_with_point("p");
        let events: Arc<Mutex<Vec<ExtensionPointChange>>> = Arc::default();

        let sink = Arc::clone(&events);
        registry.subscribe(Some("p"), move |change| {
            sink.lock().unwrap().push(change.clone());
        });

        registry
            .register_contributions("p", "plugin.a", vec![json!(1), json!(2)])
            .unwrap();
        registry.remove_contributions("plugin.a");

        let events = events.lock().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].added, vec![json!(1), json!(2)]);
        assert!(events[0].removed.is_empty());
        assert!(events[1].added.is_empty());
        assert_eq!(events[1].removed, vec![json!(1), json!(2)]);
    }

    #[test]
    fn point_specific_listeners_run_before_global_ones() {
        let registry = registry_with_point("p");
        let order: Arc<Mutex<Vec<&'static str>>> = Arc::default();

        let sink = Arc::clone(&order);
        registry.subscribe(None, move |_| sink.lock().unwrap().push("global"));
        let sink = Arc::clone(&order);
        registry.subscribe(Some("p"), move |_| sink.lock().unwrap().push("specific"));

        registry.register_contribution("p", "plugin.a", json!(1)).unwrap();

        assert_eq!(*order.lock().unwrap(), vec!["specific", "global"]);
    }

    #[test]
    fn unsubscribed_listeners_stop_firing() {
        let registry = registry_with_point("p");
        let count = Arc::new(Mutex::new(0usize));

        let sink = Arc::clone(&count);
        let sub = registry.subscribe(Some("p"), move |_| *sink.lock().unwrap() += 1);

        registry.register_contribution("p", "plugin.a", json!(1)).unwrap();
        assert!(registry.unsubscribe(sub));
        assert!(!registry.unsubscribe(sub));
        registry.register_contribution("p", "plugin.a", json!(2)).unwrap();

        assert_eq!(*count.lock().unwrap(), 1);
    }

    #[test]
    fn listener_may_read_the_registry_without_deadlock() {
        let registry = Arc::new(registry_with_point("p"));
        let seen = Arc::new(Mutex::new(0usize));

        let registry_ref = Arc::clone(&registry);
        let sink = Arc::clone(&seen);
        registry.subscribe(Some("p"), move |_| {
            *sink.lock().unwrap() = registry_ref.get_extensions("p").len();
        });

        registry.register_contribution("p", "plugin.a", json!(1)).unwrap();
        assert_eq!(*seen.lock().unwrap(), 1);
    }

    #[test]
    fn typed_accessor_deserializes_contributions() {
        #[derive(Debug, PartialEq, serde::Deserialize)]
        struct MenuEntry {
            label: String,
            weight: u32,
        }

        let registry = registry_with_point("menu.entries");
        registry
            .register_contribution(
                "menu.entries",
                "plugin.a",
                json!({"label": "Open", "weight": 10}),
            )
            .unwrap();

        let entries: Vec<MenuEntry> = registry.get_extensions_as("menu.entries").unwrap();
        assert_eq!(
            entries,
            vec![MenuEntry { label: "Open".into(), weight: 10 }]
        );

        registry
            .register_contribution("menu.entries", "plugin.b", json!("not an entry"))
            .unwrap();
        let err = registry
            .get_extensions_as::<MenuEntry>("menu.entries")
            .unwrap_err();
        assert!(matches!(
            err,
            ArmatureError::Contribution { ref point_id, .. } if point_id == "menu.entries"
        ));
    }
}
