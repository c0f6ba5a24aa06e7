//! Common test utilities for integration tests
//!
//! Provides a minimal host framework (a block runner that creates one test
//! instance per test method) and recording watchers shared by the
//! integration test files.
#![allow(dead_code)]

use lifecycle_hooks::{
    BlockRunner, Description, Failure, FrameworkMethod, HooksConfig, LifecycleHooks,
    LifecycleKind, MethodWatcher, Outcome, RunNotifier, Runner, RunnerInstrumentation,
    ServiceCatalog, TestClass, TestInstance, TestType, WatcherCapabilities,
};
use parking_lot::Mutex;
use std::sync::{Arc, OnceLock};

/// Block runner modelled on a typical xUnit class runner.
///
/// Class-level setup runs once, then every test method runs on a fresh
/// instance surrounded by its instance setup and teardown methods.
pub struct BasicClassRunner {
    test_type: Arc<TestType>,
    test_class: OnceLock<Arc<TestClass>>,
}

impl BasicClassRunner {
    /// Build a runner for `test_type` the way the host does: construct it,
    /// let the instrumentation rewire it, then create its class descriptor
    /// through the outermost view.
    pub fn build(
        test_type: &Arc<TestType>,
        instrumentation: &RunnerInstrumentation,
    ) -> anyhow::Result<Arc<dyn Runner>> {
        let runner = instrumentation.instrument(Arc::new(Self {
            test_type: Arc::clone(test_type),
            test_class: OnceLock::new(),
        }));
        runner.create_test_class()?;
        Ok(runner)
    }

    fn descriptor(&self) -> Arc<TestClass> {
        Arc::clone(
            self.test_class
                .get_or_init(|| Arc::new(TestClass::new(Arc::clone(&self.test_type)))),
        )
    }
}

impl Runner for BasicClassRunner {
    fn create_test_class(&self) -> anyhow::Result<Arc<TestClass>> {
        Ok(self.descriptor())
    }

    fn description(&self) -> Description {
        Description::suite(self.test_type.name())
    }

    fn child_description(&self, child: &FrameworkMethod) -> Description {
        Description::test(self.test_type.name(), child.name())
    }

    fn run(&self, notifier: &RunNotifier, outer: &Arc<dyn Runner>) {
        let Some(block) = Arc::clone(outer).block() else {
            return;
        };
        let test_class = self.descriptor();
        let suite = self.description();

        let setup = test_class
            .annotated_methods(LifecycleKind::BeforeClass)
            .iter()
            .try_for_each(|method| test_class.invoke_class_method(method));

        match setup {
            Ok(()) => {
                for child in test_class.annotated_methods(LifecycleKind::Test) {
                    block.run_child(&child, notifier, outer);
                }
            }
            Err(failure) => notifier.fire_test_failure(&suite, &failure),
        }

        for method in test_class.annotated_methods(LifecycleKind::AfterClass) {
            if let Err(failure) = test_class.invoke_class_method(&method) {
                notifier.fire_test_failure(&suite, &failure);
            }
        }
    }

    fn block(self: Arc<Self>) -> Option<Arc<dyn BlockRunner>> {
        Some(self)
    }
}

impl BlockRunner for BasicClassRunner {
    fn test_class(&self) -> Arc<TestClass> {
        self.descriptor()
    }

    fn create_test(&self) -> anyhow::Result<TestInstance> {
        TestInstance::instantiate(&self.test_type)
            .ok_or_else(|| anyhow::anyhow!("{} has no default constructor", self.test_type))
    }

    fn run_child(
        &self,
        child: &Arc<FrameworkMethod>,
        notifier: &RunNotifier,
        outer: &Arc<dyn Runner>,
    ) {
        let description = outer.child_description(child);
        notifier.fire_test_started(&description);

        let created = match Arc::clone(outer).block() {
            Some(block) => block.create_test(),
            None => self.create_test(),
        };
        let outcome = created.map_err(Failure::new).and_then(|target| {
            run_test(&self.test_type, &target, child)
        });

        if let Err(failure) = outcome {
            notifier.fire_test_failure(&description, &failure);
        }
        notifier.fire_test_finished(&description);
    }
}

fn run_test(test_type: &TestType, target: &TestInstance, child: &Arc<FrameworkMethod>) -> Outcome {
    let mut outcome = test_type
        .annotated_methods(LifecycleKind::Before)
        .iter()
        .try_for_each(|method| target.invoke(method));
    if outcome.is_ok() {
        outcome = target.invoke(child);
    }
    for method in test_type.annotated_methods(LifecycleKind::After) {
        if let Err(failure) = target.invoke(&method) {
            if outcome.is_ok() {
                outcome = Err(failure);
            }
        }
    }
    outcome
}

/// Engine installed into a fresh instrumentation capability.
pub fn installed(
    config: HooksConfig,
    catalog: ServiceCatalog,
) -> (Arc<LifecycleHooks>, RunnerInstrumentation) {
    let instrumentation = RunnerInstrumentation::new();
    let hooks = LifecycleHooks::new(config, catalog);
    hooks
        .install(&instrumentation)
        .expect("install into an open capability");
    (hooks, instrumentation)
}

// Journal of observed events, keyed by test type name so that tests running
// in parallel do not see each other's entries.

static JOURNAL: Mutex<Vec<(String, String)>> = Mutex::new(Vec::new());
static THROWN: Mutex<Vec<(String, Failure)>> = Mutex::new(Vec::new());

/// Record `event` against `type_name`.
pub fn record(type_name: &str, event: impl Into<String>) {
    JOURNAL.lock().push((type_name.to_owned(), event.into()));
}

/// Events recorded against `type_name`, in order.
pub fn events_for(type_name: &str) -> Vec<String> {
    JOURNAL
        .lock()
        .iter()
        .filter(|(owner, _)| owner == type_name)
        .map(|(_, event)| event.clone())
        .collect()
}

/// Failures observed by recording after-hooks for `type_name`.
pub fn thrown_for(type_name: &str) -> Vec<Failure> {
    THROWN
        .lock()
        .iter()
        .filter(|(owner, _)| owner == type_name)
        .map(|(_, failure)| failure.clone())
        .collect()
}

fn outcome_label(thrown: Option<&Failure>) -> &'static str {
    if thrown.is_some() {
        "failed"
    } else {
        "ok"
    }
}

macro_rules! recording_watcher {
    ($name:ident, $tag:literal) => {
        /// Records every hook it receives.
        #[derive(Default)]
        pub struct $name;

        impl MethodWatcher for $name {
            fn capabilities(&self) -> WatcherCapabilities {
                WatcherCapabilities::all()
            }

            fn before_invocation(
                &self,
                target: &TestInstance,
                method: &FrameworkMethod,
            ) -> anyhow::Result<()> {
                record(target.source_type().name(), format!("{}.before:{}", $tag, method.name()));
                Ok(())
            }

            fn after_invocation(
                &self,
                target: &TestInstance,
                method: &FrameworkMethod,
                thrown: Option<&Failure>,
            ) -> anyhow::Result<()> {
                let owner = target.source_type().name();
                if let Some(failure) = thrown {
                    THROWN.lock().push((owner.to_owned(), failure.clone()));
                }
                record(
                    owner,
                    format!("{}.after:{}:{}", $tag, method.name(), outcome_label(thrown)),
                );
                Ok(())
            }

            fn before_class_invocation(
                &self,
                test_type: &TestType,
                method: &FrameworkMethod,
            ) -> anyhow::Result<()> {
                record(test_type.name(), format!("{}.before_class:{}", $tag, method.name()));
                Ok(())
            }

            fn after_class_invocation(
                &self,
                test_type: &TestType,
                method: &FrameworkMethod,
                thrown: Option<&Failure>,
            ) -> anyhow::Result<()> {
                record(
                    test_type.name(),
                    format!("{}.after_class:{}:{}", $tag, method.name(), outcome_label(thrown)),
                );
                Ok(())
            }
        }
    };
}

recording_watcher!(FirstWatcher, "first");
recording_watcher!(SecondWatcher, "second");

/// Test method body that records `real:<name>` and succeeds.
pub fn recorded_test(type_name: &'static str, name: &'static str) -> FrameworkMethod {
    FrameworkMethod::test(name, move |_| {
        record(type_name, format!("real:{name}"));
        Ok(())
    })
}
