//! Lifecycle hooks engine.
//!
//! [`LifecycleHooks`] is the context object every piece of advice runs
//! against. It owns the watcher registry, the proxy factory and the
//! correlation registries, and it is what the host queries afterwards to
//! relate instances, descriptors and runners.
//!
//! Installing the engine registers one [`RunnerTransformer`] with the host's
//! instrumentation capability. From then on every runner the host builds is
//! wrapped in a [`HookedRunner`], which calls back into the advice below
//! around each rewired extension point.

use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info, instrument};

use super::hooked_runner::HookedRunner;
use crate::domain::errors::HookResult;
use crate::domain::models::{
    Description, FrameworkMethod, HooksConfig, RunNotifier, TestClass, TestInstance, TestType,
};
use crate::domain::ports::{Instrumentation, Runner, RunnerTransformer};
use crate::services::{
    CorrelationRegistry, MethodInterceptor, ProxyFactory, ServiceCatalog, TimeoutPolicy,
    WatcherRegistry,
};

/// The engine's context object.
pub struct LifecycleHooks {
    config: HooksConfig,
    catalog: ServiceCatalog,
    watchers: Arc<WatcherRegistry>,
    proxies: ProxyFactory,
    correlation: CorrelationRegistry,
    timeouts: TimeoutPolicy,
    installed: Mutex<bool>,
}

impl std::fmt::Debug for LifecycleHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LifecycleHooks")
            .field("config", &self.config)
            .field("catalog", &self.catalog)
            .field("watchers", &self.watchers)
            .field("proxies", &self.proxies)
            .field("correlation", &self.correlation)
            .field("installed", &*self.installed.lock())
            .finish()
    }
}

impl LifecycleHooks {
    /// Build an engine from `config` and the services in `catalog`.
    pub fn new(config: HooksConfig, catalog: ServiceCatalog) -> Arc<Self> {
        let watchers = Arc::new(WatcherRegistry::new(catalog.method_watchers().to_vec()));
        let interceptor = Arc::new(MethodInterceptor::new(Arc::clone(&watchers)));
        let proxies = ProxyFactory::new(interceptor, config.hooked_class_naming);
        let timeouts = TimeoutPolicy::new(config.default_test_timeout());
        Arc::new(Self {
            config,
            catalog,
            watchers,
            proxies,
            correlation: CorrelationRegistry::new(),
            timeouts,
            installed: Mutex::new(false),
        })
    }

    /// Register the engine with the host's instrumentation capability.
    ///
    /// Idempotent. When the capability refuses the transformer the engine
    /// stays uninstalled and the error is returned; nothing is retried.
    #[instrument(skip_all)]
    pub fn install(self: &Arc<Self>, instrumentation: &dyn Instrumentation) -> HookResult<()> {
        let mut installed = self.installed.lock();
        if *installed {
            debug!("Lifecycle hooks already installed");
            return Ok(());
        }

        instrumentation.add_transformer(Arc::new(HookTransformer {
            hooks: Arc::clone(self),
        }))?;
        *installed = true;

        info!(
            class_watchers = self.catalog.class_watchers().len(),
            object_watchers = self.catalog.object_watchers().len(),
            run_listeners = self.catalog.run_listeners().len(),
            method_watchers = self.catalog.method_watchers().len(),
            default_timeout_ms = ?self.config.default_test_timeout_ms,
            "Lifecycle hooks installed"
        );
        Ok(())
    }

    /// Whether [`LifecycleHooks::install`] has succeeded.
    pub fn is_installed(&self) -> bool {
        *self.installed.lock()
    }

    /// Wrap `runner` unless it is already hooked.
    pub fn wrap(self: &Arc<Self>, runner: Arc<dyn Runner>) -> Arc<dyn Runner> {
        if runner.is_hooked() {
            return runner;
        }
        HookedRunner::wrap(runner, Arc::clone(self))
    }

    // Advice

    pub(crate) fn test_class_created(&self, test_class: &Arc<TestClass>, runner: &Arc<dyn Runner>) {
        self.correlation.record_runner(test_class, runner);
        for watcher in self.catalog.class_watchers() {
            watcher.test_class_created(test_class, runner);
        }
        test_class.bind(&self.proxies.variant_for(test_class.test_type()));
    }

    pub(crate) fn run_starting(&self, runner: &dyn Runner, notifier: &RunNotifier) {
        if !self.correlation.first_sighting(notifier.id()) {
            return;
        }
        let description = runner.description();
        debug!(notifier = %notifier.id(), suite = %description, "Announcing test run");
        for listener in self.catalog.run_listeners() {
            notifier.add_listener(Arc::clone(listener));
            listener.test_run_started(&description);
        }
    }

    pub(crate) fn test_created(
        &self,
        instance: &TestInstance,
        test_class: &Arc<TestClass>,
    ) -> HookResult<TestInstance> {
        let enhanced = self.proxies.enhance(instance)?;
        self.correlation.record_instance(&enhanced, test_class);
        self.timeouts.apply_default(&enhanced);
        for watcher in self.catalog.object_watchers() {
            watcher.test_object_created(&enhanced, test_class);
        }
        Ok(enhanced)
    }

    pub(crate) fn child_starting(&self, test_class: &TestClass) {
        test_class.bind(&self.proxies.variant_for(test_class.test_type()));
    }

    // Queries

    /// Descriptor of the class `instance` was created for.
    pub fn test_class_for(&self, instance: &TestInstance) -> HookResult<Arc<TestClass>> {
        self.correlation.lookup_class(instance)
    }

    /// Runner that built `test_class`.
    pub fn runner_for(&self, test_class: &TestClass) -> HookResult<Arc<dyn Runner>> {
        self.correlation.lookup_runner(test_class)
    }

    /// Framework-native description of `method` as run on `instance`.
    pub fn description_for(
        &self,
        instance: &TestInstance,
        method: &FrameworkMethod,
    ) -> HookResult<Description> {
        self.correlation.resolve_description(instance, method)
    }

    /// The attached method watcher of type `W`, if any.
    pub fn attached_watcher<W>(&self) -> Option<Arc<W>>
    where
        W: std::any::Any + Send + Sync,
    {
        self.watchers.lookup::<W>()
    }

    /// Source type of `instance`, plain or enhanced.
    pub fn instance_class(&self, instance: &TestInstance) -> Arc<TestType> {
        ProxyFactory::instance_class(instance)
    }

    /// Configuration the engine was built with.
    pub fn config(&self) -> &HooksConfig {
        &self.config
    }

    /// Services the engine notifies.
    pub fn catalog(&self) -> &ServiceCatalog {
        &self.catalog
    }

    /// Watcher registry.
    pub fn watchers(&self) -> &Arc<WatcherRegistry> {
        &self.watchers
    }

    /// Proxy factory.
    pub fn proxies(&self) -> &ProxyFactory {
        &self.proxies
    }

    /// Correlation registries.
    pub fn correlation(&self) -> &CorrelationRegistry {
        &self.correlation
    }
}

/// Transformer wrapping every runner in a [`HookedRunner`].
struct HookTransformer {
    hooks: Arc<LifecycleHooks>,
}

impl RunnerTransformer for HookTransformer {
    fn transform(&self, runner: Arc<dyn Runner>) -> Arc<dyn Runner> {
        self.hooks.wrap(runner)
    }
}
