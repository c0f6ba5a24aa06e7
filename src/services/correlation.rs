//! Correlation registries.
//!
//! Append-only maps relating live entities to each other: test instance to
//! class descriptor, class descriptor to runner, and the set of notifiers
//! that already received the run-started notification. Entries are written
//! once and kept for the lifetime of the registry.

use parking_lot::{Mutex, RwLock};
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::domain::errors::{HookError, HookResult};
use crate::domain::models::{
    ClassId, Description, FrameworkMethod, InstanceId, NotifierId, TestClass, TestInstance,
};
use crate::domain::ports::Runner;

/// Registry of instance, class descriptor, runner and notifier correlations.
#[derive(Default)]
pub struct CorrelationRegistry {
    instance_to_class: RwLock<HashMap<InstanceId, Arc<TestClass>>>,
    class_to_runner: RwLock<HashMap<ClassId, Arc<dyn Runner>>>,
    notifiers: Mutex<HashSet<NotifierId>>,
}

impl std::fmt::Debug for CorrelationRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CorrelationRegistry")
            .field("instances", &self.instance_to_class.read().len())
            .field("runners", &self.class_to_runner.read().len())
            .field("notifiers", &self.notifiers.lock().len())
            .finish()
    }
}

impl CorrelationRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Associate `instance` with the descriptor it was created for.
    ///
    /// Re-recording the same association is accepted silently. A different
    /// descriptor under an existing key keeps the first one.
    pub fn record_instance(&self, instance: &TestInstance, test_class: &Arc<TestClass>) {
        match self.instance_to_class.write().entry(instance.id()) {
            Entry::Vacant(slot) => {
                debug!(
                    instance = %instance.id(),
                    class = %test_class.name(),
                    "Recorded instance correlation"
                );
                slot.insert(Arc::clone(test_class));
            }
            Entry::Occupied(existing) if existing.get().id() == test_class.id() => {}
            Entry::Occupied(existing) => {
                warn!(
                    instance = %instance.id(),
                    recorded = %existing.get().id(),
                    ignored = %test_class.id(),
                    "Conflicting instance correlation ignored"
                );
            }
        }
    }

    /// Associate `test_class` with the runner that built it.
    pub fn record_runner(&self, test_class: &Arc<TestClass>, runner: &Arc<dyn Runner>) {
        match self.class_to_runner.write().entry(test_class.id()) {
            Entry::Vacant(slot) => {
                debug!(
                    class = %test_class.id(),
                    name = %test_class.name(),
                    "Recorded runner correlation"
                );
                slot.insert(Arc::clone(runner));
            }
            Entry::Occupied(existing)
                if std::ptr::addr_eq(Arc::as_ptr(existing.get()), Arc::as_ptr(runner)) => {}
            Entry::Occupied(_) => {
                warn!(class = %test_class.id(), "Conflicting runner correlation ignored");
            }
        }
    }

    /// Descriptor of the class `instance` was created for.
    pub fn lookup_class(&self, instance: &TestInstance) -> HookResult<Arc<TestClass>> {
        self.instance_to_class
            .read()
            .get(&instance.id())
            .cloned()
            .ok_or(HookError::InstanceNotFound(instance.id()))
    }

    /// Runner that owns `test_class`.
    pub fn lookup_runner(&self, test_class: &TestClass) -> HookResult<Arc<dyn Runner>> {
        self.class_to_runner
            .read()
            .get(&test_class.id())
            .cloned()
            .ok_or(HookError::RunnerNotFound(test_class.id()))
    }

    /// Framework-native description of `target` as run on `instance`.
    pub fn resolve_description(
        &self,
        instance: &TestInstance,
        target: &FrameworkMethod,
    ) -> HookResult<Description> {
        let test_class = self.lookup_class(instance)?;
        let runner = self.lookup_runner(&test_class)?;
        Ok(runner.child_description(target))
    }

    /// Record `notifier` as seen; `true` only for the first caller.
    pub fn first_sighting(&self, notifier: NotifierId) -> bool {
        self.notifiers.lock().insert(notifier)
    }

    /// Number of recorded instance correlations.
    pub fn instance_count(&self) -> usize {
        self.instance_to_class.read().len()
    }

    /// Number of recorded runner correlations.
    pub fn runner_count(&self) -> usize {
        self.class_to_runner.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{RunNotifier, TestType};

    struct StubRunner {
        name: String,
    }

    impl Runner for StubRunner {
        fn create_test_class(&self) -> anyhow::Result<Arc<TestClass>> {
            anyhow::bail!("not used")
        }

        fn description(&self) -> Description {
            Description::suite(&self.name)
        }

        fn child_description(&self, child: &FrameworkMethod) -> Description {
            Description::test(&self.name, child.name())
        }

        fn run(&self, _notifier: &RunNotifier, _outer: &Arc<dyn Runner>) {}
    }

    fn fixture() -> (Arc<TestType>, Arc<TestClass>, TestInstance) {
        let ty = TestType::builder("com.acme.FooTest")
            .default_constructor::<()>()
            .method(FrameworkMethod::test("works", |_| Ok(())))
            .build();
        let class = Arc::new(TestClass::new(Arc::clone(&ty)));
        let instance = TestInstance::instantiate(&ty).expect("constructor");
        (ty, class, instance)
    }

    #[test]
    fn test_lookup_on_unset_instance_fails() {
        let registry = CorrelationRegistry::new();
        let (_, _, instance) = fixture();
        let err = registry.lookup_class(&instance).unwrap_err();
        assert!(matches!(err, HookError::InstanceNotFound(id) if id == instance.id()));
        assert!(err.is_not_found());
    }

    #[test]
    fn test_lookup_on_unset_runner_fails() {
        let registry = CorrelationRegistry::new();
        let (_, class, _) = fixture();
        assert!(matches!(
            registry.lookup_runner(&class),
            Err(HookError::RunnerNotFound(id)) if id == class.id()
        ));
    }

    #[test]
    fn test_resolve_description_composes_lookups() {
        let registry = CorrelationRegistry::new();
        let (ty, class, instance) = fixture();
        let runner: Arc<dyn Runner> = Arc::new(StubRunner {
            name: "com.acme.FooTest".to_owned(),
        });

        registry.record_instance(&instance, &class);
        let method = Arc::clone(&ty.declared_methods()[0]);
        assert!(matches!(
            registry.resolve_description(&instance, &method),
            Err(HookError::RunnerNotFound(_))
        ));

        registry.record_runner(&class, &runner);
        let description = registry.resolve_description(&instance, &method).unwrap();
        assert_eq!(description, Description::test("com.acme.FooTest", "works"));
    }

    #[test]
    fn test_first_write_wins() {
        let registry = CorrelationRegistry::new();
        let (ty, class, instance) = fixture();
        let other = Arc::new(TestClass::new(ty));

        registry.record_instance(&instance, &class);
        registry.record_instance(&instance, &class);
        registry.record_instance(&instance, &other);

        assert_eq!(registry.instance_count(), 1);
        assert_eq!(registry.lookup_class(&instance).unwrap().id(), class.id());
    }

    #[test]
    fn test_first_sighting_is_exclusive() {
        let registry = CorrelationRegistry::new();
        let notifier = RunNotifier::new();
        assert!(registry.first_sighting(notifier.id()));
        assert!(!registry.first_sighting(notifier.id()));
        assert!(registry.first_sighting(RunNotifier::new().id()));
    }

    #[test]
    fn test_first_sighting_under_contention() {
        let registry = CorrelationRegistry::new();
        let notifier = RunNotifier::new();
        let winners = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| registry.first_sighting(notifier.id())))
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join().unwrap())
                .filter(|won| *won)
                .count()
        });
        assert_eq!(winners, 1);
    }
}
