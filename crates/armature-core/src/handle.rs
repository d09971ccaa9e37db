// SPDX-FileCopyrightText: 2026 Armature Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Type-erased service handles.
//!
//! A service is looked up by capability name, not by concrete type, so the
//! registry stores every service behind a [`ServiceHandle`]. The handle
//! erases an `Arc<T>` — where `T` is usually a trait object such as
//! `dyn PreferencesStore` — and recovers it with [`ServiceHandle::downcast`].
//! Consumers therefore depend only on the capability's interface, never on
//! the implementing type.

use std::any::Any;
use std::sync::Arc;

/// A type-erased, shareable reference to a service object.
///
/// ```
/// use std::sync::Arc;
/// use armature_core::ServiceHandle;
///
/// trait Greeter: Send + Sync {
///     fn greet(&self) -> String;
/// }
///
/// struct English;
/// impl Greeter for English {
///     fn greet(&self) -> String {
///         "hello".to_string()
///     }
/// }
///
/// let erased = ServiceHandle::new::<dyn Greeter>(Arc::new(English));
/// let greeter = erased.downcast::<dyn Greeter>().unwrap();
/// assert_eq!(greeter.greet(), "hello");
/// ```
#[derive(Clone)]
pub struct ServiceHandle {
    inner: Arc<dyn Any + Send + Sync>,
}

impl ServiceHandle {
    /// Erase a service reference.
    ///
    /// `T` may be unsized; registering `Arc<dyn Trait>` is the normal case.
    pub fn new<T>(service: Arc<T>) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(service),
        }
    }

    /// Recover the service as `Arc<T>`.
    ///
    /// Returns `None` if the handle was not created from an `Arc<T>` of
    /// exactly this `T` (for trait objects: the same trait).
    pub fn downcast<T>(&self) -> Option<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.inner.downcast_ref::<Arc<T>>().map(Arc::clone)
    }
}

impl std::fmt::Debug for ServiceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceHandle").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Counter: Send + Sync {
        fn value(&self) -> u32;
    }

    struct Fixed(u32);

    impl Counter for Fixed {
        fn value(&self) -> u32 {
            self.0
        }
    }

    #[test]
    fn downcast_recovers_trait_object() {
        let handle = ServiceHandle::new::<dyn Counter>(Arc::new(Fixed(7)));
        let counter = handle.downcast::<dyn Counter>().expect("same interface");
        assert_eq!(counter.value(), 7);
    }

    #[test]
    fn downcast_to_wrong_interface_fails() {
        trait Other: Send + Sync {}

        let handle = ServiceHandle::new::<dyn Counter>(Arc::new(Fixed(7)));
        assert!(handle.downcast::<dyn Other>().is_none());
    }

    #[test]
    fn concrete_types_work_too() {
        let handle = ServiceHandle::new(Arc::new(String::from("svc")));
        let s = handle.downcast::<String>().expect("same concrete type");
        assert_eq!(*s, "svc");
    }

    #[test]
    fn clones_share_the_same_service() {
        let handle = ServiceHandle::new::<dyn Counter>(Arc::new(Fixed(3)));
        let a = handle.clone().downcast::<dyn Counter>().unwrap();
        let b = handle.downcast::<dyn Counter>().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
