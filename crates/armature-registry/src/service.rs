// SPDX-FileCopyrightText: 2026 Armature Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The service registry.
//!
//! Services are registered under a capability name together with an
//! arbitrary property map used for filtering. A registration carries either
//! a ready instance or a factory; factories are invoked at most once, on
//! the first lookup that matches the registration, and the produced handle
//! is memoized for the registration's remaining lifetime.
//!
//! Lookup order is registration order. `get_service` returns the first
//! match; `get_unique_service` insists on exactly one.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use armature_core::{ArmatureError, ServiceHandle, ServiceId, ServiceProperties};
use tracing::debug;

use crate::filter::Filter;

/// Creates a service instance on first matching lookup.
///
/// Implemented for any `Fn(&ServiceProperties) -> Result<ServiceHandle, ArmatureError>`
/// closure, so plain closures can be registered as factories.
pub trait ServiceFactory: Send + Sync {
    fn create(&self, properties: &ServiceProperties) -> Result<ServiceHandle, ArmatureError>;
}

impl<F> ServiceFactory for F
where
    F: Fn(&ServiceProperties) -> Result<ServiceHandle, ArmatureError> + Send + Sync,
{
    fn create(&self, properties: &ServiceProperties) -> Result<ServiceHandle, ArmatureError> {
        self(properties)
    }
}

/// What a registration offers: a ready instance, or a factory invoked lazily.
#[derive(Clone)]
pub enum ServiceProvider {
    Instance(ServiceHandle),
    Factory(Arc<dyn ServiceFactory>),
}

impl ServiceProvider {
    /// Wrap a ready service object (usually an `Arc<dyn Trait>`).
    pub fn instance<T>(service: Arc<T>) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
    {
        Self::Instance(ServiceHandle::new(service))
    }

    /// Wrap a lazily-invoked factory.
    pub fn factory(factory: impl ServiceFactory + 'static) -> Self {
        Self::Factory(Arc::new(factory))
    }
}

/// A resolved service returned from lookup.
///
/// Stays valid after the underlying registration is unregistered; holders
/// are never forcibly invalidated.
#[derive(Clone, Debug)]
pub struct ServiceRef {
    pub id: ServiceId,
    pub capability: String,
    /// Property snapshot taken at lookup time.
    pub properties: ServiceProperties,
    handle: ServiceHandle,
}

impl ServiceRef {
    pub fn handle(&self) -> &ServiceHandle {
        &self.handle
    }

    /// Recover the service as the capability's interface type.
    pub fn downcast<T>(&self) -> Option<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.handle.downcast::<T>()
    }
}

enum ProviderSlot {
    Factory(Arc<dyn ServiceFactory>),
    Ready(ServiceHandle),
}

struct Registration {
    id: ServiceId,
    capability: String,
    owner: Option<String>,
    properties: RwLock<ServiceProperties>,
    // Per-registration lock: serializes factory invocation so concurrent
    // first lookups produce exactly one instance.
    slot: Mutex<ProviderSlot>,
}

impl Registration {
    fn resolve(&self) -> Result<ServiceRef, ArmatureError> {
        let handle = {
            let mut slot = self.slot.lock().expect("service slot poisoned");
            match &*slot {
                ProviderSlot::Ready(handle) => handle.clone(),
                ProviderSlot::Factory(factory) => {
                    let factory = Arc::clone(factory);
                    let properties = self
                        .properties
                        .read()
                        .expect("service registry poisoned")
                        .clone();
                    debug!(service_id = %self.id, capability = self.capability.as_str(), "invoking service factory");
                    // A factory error leaves the slot untouched so a later
                    // lookup retries; only success is memoized.
                    let handle = factory.create(&properties)?;
                    *slot = ProviderSlot::Ready(handle.clone());
                    handle
                }
            }
        };

        Ok(ServiceRef {
            id: self.id,
            capability: self.capability.clone(),
            properties: self.properties.read().expect("service registry poisoned").clone(),
            handle,
        })
    }
}

/// The service registry.
pub struct ServiceRegistry {
    // Registration order is lookup order.
    inner: RwLock<Vec<Arc<Registration>>>,
    next_id: AtomicU64,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register a service under a capability name.
    pub fn register_service(
        &self,
        capability: &str,
        provider: ServiceProvider,
        properties: ServiceProperties,
    ) -> ServiceId {
        self.register(capability, provider, properties, None)
    }

    /// Register a service tagged with an owning plugin id, so it can be
    /// removed wholesale when that plugin stops.
    pub fn register_service_owned(
        &self,
        capability: &str,
        provider: ServiceProvider,
        properties: ServiceProperties,
        owner: &str,
    ) -> ServiceId {
        self.register(capability, provider, properties, Some(owner.to_string()))
    }

    fn register(
        &self,
        capability: &str,
        provider: ServiceProvider,
        properties: ServiceProperties,
        owner: Option<String>,
    ) -> ServiceId {
        let id = ServiceId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let slot = match provider {
            ServiceProvider::Instance(handle) => ProviderSlot::Ready(handle),
            ServiceProvider::Factory(factory) => ProviderSlot::Factory(factory),
        };
        let registration = Arc::new(Registration {
            id,
            capability: capability.to_string(),
            owner,
            properties: RwLock::new(properties),
            slot: Mutex::new(slot),
        });

        self.inner
            .write()
            .expect("service registry poisoned")
            .push(registration);

        debug!(service_id = %id, capability, "service registered");
        id
    }

    /// Return the first registered service matching the capability and
    /// optional filter expression, or `NoMatchingService`.
    pub fn get_service(
        &self,
        capability: &str,
        filter: Option<&str>,
    ) -> Result<ServiceRef, ArmatureError> {
        let matches = self.collect_matches(capability, filter)?;
        match matches.first() {
            Some(registration) => registration.resolve(),
            None => Err(ArmatureError::NoMatchingService {
                capability: capability.to_string(),
            }),
        }
    }

    /// Return the single matching service; `AmbiguousService` if several
    /// match, `NoMatchingService` if none do.
    pub fn get_unique_service(
        &self,
        capability: &str,
        filter: Option<&str>,
    ) -> Result<ServiceRef, ArmatureError> {
        let matches = self.collect_matches(capability, filter)?;
        match matches.as_slice() {
            [] => Err(ArmatureError::NoMatchingService {
                capability: capability.to_string(),
            }),
            [only] => only.resolve(),
            many => Err(ArmatureError::AmbiguousService {
                capability: capability.to_string(),
                count: many.len(),
            }),
        }
    }

    /// Return all matching services in registration order.
    pub fn get_services(
        &self,
        capability: &str,
        filter: Option<&str>,
    ) -> Result<Vec<ServiceRef>, ArmatureError> {
        self.collect_matches(capability, filter)?
            .iter()
            .map(|registration| registration.resolve())
            .collect()
    }

    /// Look a service up by its registration id.
    pub fn get_service_by_id(&self, id: ServiceId) -> Result<ServiceRef, ArmatureError> {
        self.find(id)?.resolve()
    }

    /// Return a copy of a registration's property map.
    pub fn get_service_properties(
        &self,
        id: ServiceId,
    ) -> Result<ServiceProperties, ArmatureError> {
        let registration = self.find(id)?;
        let properties = registration
            .properties
            .read()
            .expect("service registry poisoned")
            .clone();
        Ok(properties)
    }

    /// Replace a registration's property map.
    pub fn set_service_properties(
        &self,
        id: ServiceId,
        properties: ServiceProperties,
    ) -> Result<(), ArmatureError> {
        let registration = self.find(id)?;
        *registration
            .properties
            .write()
            .expect("service registry poisoned") = properties;
        Ok(())
    }

    /// Remove a registration.
    ///
    /// `ServiceRef`s already handed out stay usable; unregistering only
    /// stops the service from matching future lookups.
    pub fn unregister_service(&self, id: ServiceId) -> Result<(), ArmatureError> {
        let mut inner = self.inner.write().expect("service registry poisoned");
        let before = inner.len();
        inner.retain(|registration| registration.id != id);
        if inner.len() == before {
            return Err(ArmatureError::UnknownServiceId { id });
        }
        debug!(service_id = %id, "service unregistered");
        Ok(())
    }

    /// Remove every registration tagged with the given owner. Used when a
    /// plugin stops. Returns the removed ids.
    pub fn unregister_owned(&self, owner: &str) -> Vec<ServiceId> {
        let mut inner = self.inner.write().expect("service registry poisoned");
        let mut removed = Vec::new();
        inner.retain(|registration| {
            if registration.owner.as_deref() == Some(owner) {
                removed.push(registration.id);
                false
            } else {
                true
            }
        });
        if !removed.is_empty() {
            debug!(owner, count = removed.len(), "owned services unregistered");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.inner.read().expect("service registry poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn find(&self, id: ServiceId) -> Result<Arc<Registration>, ArmatureError> {
        self.inner
            .read()
            .expect("service registry poisoned")
            .iter()
            .find(|registration| registration.id == id)
            .cloned()
            .ok_or(ArmatureError::UnknownServiceId { id })
    }

    // Snapshot the matching registrations, then release the registry lock
    // before any factory can run.
    fn collect_matches(
        &self,
        capability: &str,
        filter: Option<&str>,
    ) -> Result<Vec<Arc<Registration>>, ArmatureError> {
        let filter = filter.map(Filter::parse).transpose()?;
        let inner = self.inner.read().expect("service registry poisoned");
        let matches = inner
            .iter()
            .filter(|registration| {
                if registration.capability != capability {
                    return false;
                }
                match &filter {
                    Some(filter) => {
                        let properties = registration
                            .properties
                            .read()
                            .expect("service registry poisoned");
                        filter.matches(&properties)
                    }
                    None => true,
                }
            })
            .cloned()
            .collect();
        Ok(matches)
    }
}

impl Default for ServiceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    trait Pricer: Send + Sync {
        fn price(&self) -> u32;
    }

    struct FixedPricer(u32);

    impl Pricer for FixedPricer {
        fn price(&self) -> u32 {
            self.0
        }
    }

    fn props(value: serde_json::Value) -> ServiceProperties {
        value.as_object().expect("object").clone()
    }

    #[test]
    fn lookup_is_by_capability_interface_not_concrete_type() {
        let registry = ServiceRegistry::new();
        registry.register_service(
            "pricing",
            ServiceProvider::instance::<dyn Pricer>(Arc::new(FixedPricer(5))),
            ServiceProperties::new(),
        );

        let service = registry.get_service("pricing", None).unwrap();
        let pricer = service.downcast::<dyn Pricer>().expect("interface match");
        assert_eq!(pricer.price(), 5);
    }

    #[test]
    fn get_service_returns_first_registered_match() {
        let registry = ServiceRegistry::new();
        let first = registry.register_service(
            "pricing",
            ServiceProvider::instance::<dyn Pricer>(Arc::new(FixedPricer(1))),
            ServiceProperties::new(),
        );
        registry.register_service(
            "pricing",
            ServiceProvider::instance::<dyn Pricer>(Arc::new(FixedPricer(2))),
            ServiceProperties::new(),
        );

        let service = registry.get_service("pricing", None).unwrap();
        assert_eq!(service.id, first);
    }

    #[test]
    fn missing_capability_is_no_matching_service() {
        let registry = ServiceRegistry::new();
        let err = registry.get_service("absent", None).unwrap_err();
        assert!(matches!(err, ArmatureError::NoMatchingService { .. }));
    }

    #[test]
    fn unique_lookup_distinguishes_ambiguity_from_absence() {
        let registry = ServiceRegistry::new();
        registry.register_service(
            "pricing",
            ServiceProvider::instance::<dyn Pricer>(Arc::new(FixedPricer(1))),
            ServiceProperties::new(),
        );
        registry.register_service(
            "pricing",
            ServiceProvider::instance::<dyn Pricer>(Arc::new(FixedPricer(2))),
            ServiceProperties::new(),
        );

        let err = registry.get_unique_service("pricing", None).unwrap_err();
        assert!(matches!(
            err,
            ArmatureError::AmbiguousService { count: 2, .. }
        ));

        let err = registry.get_unique_service("absent", None).unwrap_err();
        assert!(matches!(err, ArmatureError::NoMatchingService { .. }));
    }

    #[test]
    fn property_filter_selects_matching_registrations() {
        let registry = ServiceRegistry::new();
        let cheap = registry.register_service(
            "pricing",
            ServiceProvider::instance::<dyn Pricer>(Arc::new(FixedPricer(5))),
            props(json!({"price": 5})),
        );
        registry.register_service(
            "pricing",
            ServiceProvider::instance::<dyn Pricer>(Arc::new(FixedPricer(20))),
            props(json!({"price": 20})),
        );

        let matches = registry.get_services("pricing", Some("price < 10")).unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].id, cheap);
    }

    #[test]
    fn malformed_filter_is_reported() {
        let registry = ServiceRegistry::new();
        let err = registry.get_services("pricing", Some("price <")).unwrap_err();
        assert!(matches!(err, ArmatureError::InvalidFilter { .. }));
    }

    #[test]
    fn factory_runs_lazily_and_exactly_once() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let registry = ServiceRegistry::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&calls);
        registry.register_service(
            "pricing",
            ServiceProvider::factory(move |_: &ServiceProperties| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(ServiceHandle::new::<dyn Pricer>(Arc::new(FixedPricer(9))))
            }),
            ServiceProperties::new(),
        );

        // Not invoked at registration time.
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let a = registry.get_service("pricing", None).unwrap();
        let b = registry.get_service("pricing", None).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // Both lookups see the same memoized instance.
        let a = a.downcast::<dyn Pricer>().unwrap();
        let b = b.downcast::<dyn Pricer>().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn concurrent_first_lookups_share_one_factory_call() {
        use std::sync::Barrier;
        use std::sync::atomic::{AtomicUsize, Ordering};

        let registry = Arc::new(ServiceRegistry::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&calls);
        registry.register_service(
            "pricing",
            ServiceProvider::factory(move |_: &ServiceProperties| {
                counter.fetch_add(1, Ordering::SeqCst);
                // Widen the race window.
                std::thread::sleep(std::time::Duration::from_millis(20));
                Ok(ServiceHandle::new::<dyn Pricer>(Arc::new(FixedPricer(9))))
            }),
            ServiceProperties::new(),
        );

        let barrier = Arc::new(Barrier::new(10));
        let handles: Vec<_> = (0..10)
            .map(|_| {
                let registry = Arc::clone(&registry);
                let barrier = Arc::clone(&barrier);
                std::thread::spawn(move || {
                    barrier.wait();
                    registry
                        .get_service("pricing", None)
                        .unwrap()
                        .downcast::<dyn Pricer>()
                        .unwrap()
                })
            })
            .collect();

        let services: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        for service in &services[1..] {
            assert!(Arc::ptr_eq(&services[0], service));
        }
    }

    #[test]
    fn factory_failure_propagates_and_is_retried() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let registry = ServiceRegistry::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&calls);
        registry.register_service(
            "pricing",
            ServiceProvider::factory(move |_: &ServiceProperties| {
                if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(ArmatureError::Internal("transient".into()))
                } else {
                    Ok(ServiceHandle::new::<dyn Pricer>(Arc::new(FixedPricer(9))))
                }
            }),
            ServiceProperties::new(),
        );

        assert!(registry.get_service("pricing", None).is_err());
        assert!(registry.get_service("pricing", None).is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn unregister_removes_from_future_lookups_only() {
        let registry = ServiceRegistry::new();
        let id = registry.register_service(
            "pricing",
            ServiceProvider::instance::<dyn Pricer>(Arc::new(FixedPricer(5))),
            ServiceProperties::new(),
        );

        let held = registry.get_service("pricing", None).unwrap();
        registry.unregister_service(id).unwrap();

        // The held reference still works.
        assert_eq!(held.downcast::<dyn Pricer>().unwrap().price(), 5);
        // But lookup no longer matches.
        assert!(registry.get_service("pricing", None).is_err());
        // And unregistering again reports the unknown id.
        let err = registry.unregister_service(id).unwrap_err();
        assert!(matches!(err, ArmatureError::UnknownServiceId { .. }));
    }

    #[test]
    fn owned_registrations_are_removed_together() {
        let registry = ServiceRegistry::new();
        registry.register_service_owned(
            "pricing",
            ServiceProvider::instance::<dyn Pricer>(Arc::new(FixedPricer(1))),
            ServiceProperties::new(),
            "plugin.a",
        );
        registry.register_service_owned(
            "logging",
            ServiceProvider::instance::<dyn Pricer>(Arc::new(FixedPricer(2))),
            ServiceProperties::new(),
            "plugin.a",
        );
        let kept = registry.register_service_owned(
            "pricing",
            ServiceProvider::instance::<dyn Pricer>(Arc::new(FixedPricer(3))),
            ServiceProperties::new(),
            "plugin.b",
        );

        let removed = registry.unregister_owned("plugin.a");
        assert_eq!(removed.len(), 2);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get_service("pricing", None).unwrap().id, kept);
    }

    #[test]
    fn properties_can_be_read_and_replaced() {
        let registry = ServiceRegistry::new();
        let id = registry.register_service(
            "pricing",
            ServiceProvider::instance::<dyn Pricer>(Arc::new(FixedPricer(5))),
            props(json!({"tier": "basic"})),
        );

        assert_eq!(
            registry.get_service_properties(id).unwrap()["tier"],
            json!("basic")
        );

        registry
            .set_service_properties(id, props(json!({"tier": "gold"})))
            .unwrap();
        assert!(registry.get_service("pricing", Some("tier == 'gold'")).is_ok());

        let missing = ServiceId(9999);
        assert!(registry.get_service_properties(missing).is_err());
        assert!(registry
            .set_service_properties(missing, ServiceProperties::new())
            .is_err());
    }
}
