//! Service Catalog
//!
//! Global service discovery. Implementations register themselves at link
//! time with [`register_service!`](crate::register_service), and
//! [`ServiceCatalog::discover`] instantiates every registration in a
//! deterministic order: priority descending, then name. Hosts that want an
//! explicit set instead build the catalog by hand.

use std::cmp::Reverse;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::domain::ports::{
    AttachedWatcher, MethodWatcher, RunListener, ShutdownListener, TestClassWatcher,
    TestObjectWatcher,
};

/// Factory of one discoverable service.
#[derive(Clone, Copy)]
pub enum Service {
    /// A [`TestClassWatcher`].
    ClassWatcher(fn() -> Arc<dyn TestClassWatcher>),
    /// A [`TestObjectWatcher`].
    ObjectWatcher(fn() -> Arc<dyn TestObjectWatcher>),
    /// A [`RunListener`].
    RunListener(fn() -> Arc<dyn RunListener>),
    /// A global [`MethodWatcher`], prepended to every watcher chain.
    MethodWatcher(fn() -> AttachedWatcher),
    /// A [`ShutdownListener`].
    Shutdown(fn() -> Arc<dyn ShutdownListener>),
}

/// Link-time registration of a service.
pub struct ServiceRegistration {
    /// Implementation name, used as the ordering tie-breaker.
    pub name: &'static str,
    /// Higher priorities are instantiated and notified first.
    pub priority: i16,
    /// Factory of the service.
    pub service: Service,
}

inventory::collect!(ServiceRegistration);

#[doc(hidden)]
pub fn new_class_watcher<T>() -> Arc<dyn TestClassWatcher>
where
    T: TestClassWatcher + Default + 'static,
{
    Arc::new(T::default())
}

#[doc(hidden)]
pub fn new_object_watcher<T>() -> Arc<dyn TestObjectWatcher>
where
    T: TestObjectWatcher + Default + 'static,
{
    Arc::new(T::default())
}

#[doc(hidden)]
pub fn new_run_listener<T: RunListener + Default + 'static>() -> Arc<dyn RunListener> {
    Arc::new(T::default())
}

#[doc(hidden)]
pub fn new_method_watcher<T: MethodWatcher + Default + 'static>() -> AttachedWatcher {
    AttachedWatcher::from_arc(Arc::new(T::default()))
}

#[doc(hidden)]
pub fn new_shutdown_listener<T>() -> Arc<dyn ShutdownListener>
where
    T: ShutdownListener + Default + 'static,
{
    Arc::new(T::default())
}

/// Registers a service implementation for discovery.
///
/// The type must implement `Default` and the trait named by the kind:
/// `class_watcher`, `object_watcher`, `run_listener`, `method_watcher` or
/// `shutdown_listener`.
///
/// ```ignore
/// register_service!(run_listener: ResultCollector);
/// register_service!(method_watcher: InvocationTimer, priority = 10);
/// ```
#[macro_export]
macro_rules! register_service {
    ($kind:ident : $ty:ty) => {
        $crate::register_service!($kind: $ty, priority = 0);
    };
    (class_watcher : $ty:ty, priority = $priority:expr) => {
        $crate::__submit_service!(
            $ty,
            $priority,
            ClassWatcher($crate::services::service_catalog::new_class_watcher::<$ty>)
        );
    };
    (object_watcher : $ty:ty, priority = $priority:expr) => {
        $crate::__submit_service!(
            $ty,
            $priority,
            ObjectWatcher($crate::services::service_catalog::new_object_watcher::<$ty>)
        );
    };
    (run_listener : $ty:ty, priority = $priority:expr) => {
        $crate::__submit_service!(
            $ty,
            $priority,
            RunListener($crate::services::service_catalog::new_run_listener::<$ty>)
        );
    };
    (method_watcher : $ty:ty, priority = $priority:expr) => {
        $crate::__submit_service!(
            $ty,
            $priority,
            MethodWatcher($crate::services::service_catalog::new_method_watcher::<$ty>)
        );
    };
    (shutdown_listener : $ty:ty, priority = $priority:expr) => {
        $crate::__submit_service!(
            $ty,
            $priority,
            Shutdown($crate::services::service_catalog::new_shutdown_listener::<$ty>)
        );
    };
}

#[macro_export]
#[doc(hidden)]
macro_rules! __submit_service {
    ($ty:ty, $priority:expr, $variant:ident($factory:expr)) => {
        $crate::inventory::submit! {
            $crate::services::service_catalog::ServiceRegistration {
                name: ::core::stringify!($ty),
                priority: $priority,
                service: $crate::services::service_catalog::Service::$variant($factory),
            }
        }
    };
}

/// Instantiated services, grouped by kind, each list in notification order.
#[derive(Clone, Default)]
pub struct ServiceCatalog {
    class_watchers: Vec<Arc<dyn TestClassWatcher>>,
    object_watchers: Vec<Arc<dyn TestObjectWatcher>>,
    run_listeners: Vec<Arc<dyn RunListener>>,
    method_watchers: Vec<AttachedWatcher>,
    shutdown_listeners: Vec<Arc<dyn ShutdownListener>>,
}

impl ServiceCatalog {
    /// Instantiate every registered service.
    pub fn discover() -> Self {
        let mut registrations: Vec<&'static ServiceRegistration> =
            inventory::iter::<ServiceRegistration>.into_iter().collect();
        registrations.sort_by_key(|entry| (Reverse(entry.priority), entry.name));

        let mut builder = Self::builder();
        for registration in registrations {
            builder = match registration.service {
                Service::ClassWatcher(factory) => builder.class_watcher(factory()),
                Service::ObjectWatcher(factory) => builder.object_watcher(factory()),
                Service::RunListener(factory) => builder.run_listener(factory()),
                Service::MethodWatcher(factory) => builder.attached_method_watcher(factory()),
                Service::Shutdown(factory) => builder.shutdown_listener(factory()),
            };
        }

        let catalog = builder.build();
        debug!(
            class_watchers = catalog.class_watchers.len(),
            object_watchers = catalog.object_watchers.len(),
            run_listeners = catalog.run_listeners.len(),
            method_watchers = catalog.method_watchers.len(),
            shutdown_listeners = catalog.shutdown_listeners.len(),
            "Discovered services"
        );
        catalog
    }

    /// Start an explicit catalog.
    pub fn builder() -> ServiceCatalogBuilder {
        ServiceCatalogBuilder::default()
    }

    /// Test class watchers.
    pub fn class_watchers(&self) -> &[Arc<dyn TestClassWatcher>] {
        &self.class_watchers
    }

    /// Test object watchers.
    pub fn object_watchers(&self) -> &[Arc<dyn TestObjectWatcher>] {
        &self.object_watchers
    }

    /// Run listeners.
    pub fn run_listeners(&self) -> &[Arc<dyn RunListener>] {
        &self.run_listeners
    }

    /// Global method watchers.
    pub fn method_watchers(&self) -> &[AttachedWatcher] {
        &self.method_watchers
    }

    /// Shutdown listeners.
    pub fn shutdown_listeners(&self) -> &[Arc<dyn ShutdownListener>] {
        &self.shutdown_listeners
    }
}

impl fmt::Debug for ServiceCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceCatalog")
            .field("class_watchers", &self.class_watchers.len())
            .field("object_watchers", &self.object_watchers.len())
            .field("run_listeners", &self.run_listeners.len())
            .field("method_watchers", &self.method_watchers)
            .field("shutdown_listeners", &self.shutdown_listeners.len())
            .finish()
    }
}

/// Builder for an explicit [`ServiceCatalog`].
#[derive(Default)]
pub struct ServiceCatalogBuilder {
    catalog: ServiceCatalog,
}

impl ServiceCatalogBuilder {
    /// Add a test class watcher.
    #[must_use]
    pub fn class_watcher(mut self, watcher: Arc<dyn TestClassWatcher>) -> Self {
        self.catalog.class_watchers.push(watcher);
        self
    }

    /// Add a test object watcher.
    #[must_use]
    pub fn object_watcher(mut self, watcher: Arc<dyn TestObjectWatcher>) -> Self {
        self.catalog.object_watchers.push(watcher);
        self
    }

    /// Add a run listener.
    #[must_use]
    pub fn run_listener(mut self, listener: Arc<dyn RunListener>) -> Self {
        self.catalog.run_listeners.push(listener);
        self
    }

    /// Add a global method watcher.
    #[must_use]
    pub fn method_watcher<W>(self, watcher: Arc<W>) -> Self
    where
        W: MethodWatcher + std::any::Any,
    {
        self.attached_method_watcher(AttachedWatcher::from_arc(watcher))
    }

    /// Add an already wrapped global method watcher.
    #[must_use]
    pub fn attached_method_watcher(mut self, watcher: AttachedWatcher) -> Self {
        self.catalog.method_watchers.push(watcher);
        self
    }

    /// Add a shutdown listener.
    #[must_use]
    pub fn shutdown_listener(mut self, listener: Arc<dyn ShutdownListener>) -> Self {
        self.catalog.shutdown_listeners.push(listener);
        self
    }

    /// Finish the catalog.
    pub fn build(self) -> ServiceCatalog {
        self.catalog
    }
}
