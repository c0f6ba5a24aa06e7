//! Services registered with `register_service!` are discovered, notified
//! and shut down by an agent launched from the default configuration.

mod common;

use common::{events_for, record, recorded_test, BasicClassRunner};
use lifecycle_hooks::{
    execute, register_service, Agent, Description, FrameworkMethod, MethodWatcher, RunListener,
    RunNotifier, Runner, RunnerInstrumentation, ShutdownListener, TestClass, TestClassWatcher,
    TestInstance, TestObjectWatcher, TestType, WatcherCapabilities,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

const NAME: &str = "com.acme.DiscoveredTest";

static CLASSES: AtomicUsize = AtomicUsize::new(0);
static OBJECTS: AtomicUsize = AtomicUsize::new(0);
static RUNS: AtomicUsize = AtomicUsize::new(0);
static SHUTDOWNS: AtomicUsize = AtomicUsize::new(0);

#[derive(Default)]
struct ClassCounter;

impl TestClassWatcher for ClassCounter {
    fn test_class_created(&self, _test_class: &Arc<TestClass>, runner: &Arc<dyn Runner>) {
        assert!(runner.is_hooked());
        CLASSES.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
struct ObjectCounter;

impl TestObjectWatcher for ObjectCounter {
    fn test_object_created(&self, instance: &TestInstance, _test_class: &Arc<TestClass>) {
        assert!(instance.is_enhanced());
        OBJECTS.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
struct RunCounter;

impl RunListener for RunCounter {
    fn test_run_started(&self, _description: &Description) {
        RUNS.fetch_add(1, Ordering::SeqCst);
    }
}

/// Global watcher, never declared on any type.
#[derive(Default)]
struct Tracer;

impl MethodWatcher for Tracer {
    fn capabilities(&self) -> WatcherCapabilities {
        WatcherCapabilities::BEFORE_TARGETED
    }

    fn before_invocation(
        &self,
        target: &TestInstance,
        method: &FrameworkMethod,
    ) -> anyhow::Result<()> {
        record(target.source_type().name(), format!("tracer:{}", method.name()));
        Ok(())
    }
}

#[derive(Default)]
struct ShutdownCounter;

impl ShutdownListener for ShutdownCounter {
    fn on_shutdown(&self) {
        SHUTDOWNS.fetch_add(1, Ordering::SeqCst);
    }
}

register_service!(class_watcher: ClassCounter);
register_service!(object_watcher: ObjectCounter);
register_service!(run_listener: RunCounter, priority = 3);
register_service!(method_watcher: Tracer);
register_service!(shutdown_listener: ShutdownCounter);

#[test]
fn test_launched_agent_drives_discovered_services() {
    let instrumentation = RunnerInstrumentation::new();
    let agent = Agent::launch(&instrumentation).unwrap();
    let catalog = agent.hooks().catalog();
    assert_eq!(catalog.class_watchers().len(), 1);
    assert_eq!(catalog.object_watchers().len(), 1);
    assert_eq!(catalog.run_listeners().len(), 1);
    assert_eq!(catalog.method_watchers().len(), 1);
    assert_eq!(catalog.shutdown_listeners().len(), 1);

    let ty = TestType::builder(NAME)
        .default_constructor::<()>()
        .method(recorded_test(NAME, "first"))
        .method(recorded_test(NAME, "second"))
        .build();
    let runner = BasicClassRunner::build(&ty, &instrumentation).unwrap();
    execute(&runner, &RunNotifier::new());

    assert_eq!(CLASSES.load(Ordering::SeqCst), 1);
    assert_eq!(OBJECTS.load(Ordering::SeqCst), 2);
    assert_eq!(RUNS.load(Ordering::SeqCst), 1);
    assert_eq!(
        events_for(NAME),
        ["tracer:first", "real:first", "tracer:second", "real:second"]
    );
    assert!(agent.hooks().attached_watcher::<Tracer>().is_some());

    assert_eq!(SHUTDOWNS.load(Ordering::SeqCst), 0);
    drop(agent);
    assert_eq!(SHUTDOWNS.load(Ordering::SeqCst), 1);
}
