//! Behavior of the engine when runners, instances and watchers are touched
//! from many threads at once.

mod common;

use common::{installed, BasicClassRunner};
use lifecycle_hooks::{
    execute, Description, FrameworkMethod, HooksConfig, MethodWatcher, RunListener, RunNotifier,
    ServiceCatalog, TestInstance, TestType, WatcherCapabilities, WatcherType,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

const THREADS: usize = 8;

static CONSTRUCTED: AtomicUsize = AtomicUsize::new(0);

struct CountedWatcher;

impl Default for CountedWatcher {
    fn default() -> Self {
        CONSTRUCTED.fetch_add(1, Ordering::SeqCst);
        Self
    }
}

impl MethodWatcher for CountedWatcher {
    fn capabilities(&self) -> WatcherCapabilities {
        WatcherCapabilities::TARGETED
    }
}

#[derive(Default)]
struct RunStarted(AtomicUsize);

impl RunListener for RunStarted {
    fn test_run_started(&self, _description: &Description) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn test_parallel_enhance_shares_one_variant() {
    let (hooks, _instrumentation) = installed(HooksConfig::default(), ServiceCatalog::default());
    let ty = TestType::builder("com.acme.ParallelEnhanceTest")
        .default_constructor::<()>()
        .method(FrameworkMethod::test("works", |_| Ok(())))
        .build();
    let barrier = Barrier::new(THREADS);

    let enhanced: Vec<TestInstance> = thread::scope(|scope| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                scope.spawn(|| {
                    let plain = TestInstance::instantiate(&ty).unwrap();
                    barrier.wait();
                    hooks.proxies().enhance(&plain).unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|handle| handle.join().unwrap()).collect()
    });

    assert_eq!(hooks.proxies().variant_count(), 1);
    let variant = ty.variant().expect("type is marked once enhanced");
    for instance in &enhanced {
        assert!(Arc::ptr_eq(instance.variant().unwrap(), &variant));
    }
    let mut ids: Vec<_> = enhanced.iter().map(TestInstance::id).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), THREADS);
}

#[test]
fn test_parallel_runs_on_one_notifier_announce_once() {
    let listener = Arc::new(RunStarted::default());
    let catalog = ServiceCatalog::builder()
        .run_listener(Arc::clone(&listener) as Arc<dyn RunListener>)
        .build();
    let (_hooks, instrumentation) = installed(HooksConfig::default(), catalog);
    let notifier = RunNotifier::new();

    let runners: Vec<_> = (0..THREADS)
        .map(|index| {
            let ty = TestType::builder(format!("com.acme.ParallelRun{index}Test"))
                .default_constructor::<()>()
                .method(FrameworkMethod::test("works", |_| Ok(())))
                .build();
            BasicClassRunner::build(&ty, &instrumentation).unwrap()
        })
        .collect();

    let barrier = Barrier::new(THREADS);
    thread::scope(|scope| {
        for runner in &runners {
            let barrier = &barrier;
            let notifier = &notifier;
            scope.spawn(move || {
                barrier.wait();
                execute(runner, notifier);
            });
        }
    });

    assert_eq!(listener.0.load(Ordering::SeqCst), 1);
    assert_eq!(notifier.listener_count(), 1);
}

#[test]
fn test_parallel_attach_instantiates_each_watcher_once() {
    let (hooks, _instrumentation) = installed(HooksConfig::default(), ServiceCatalog::default());
    let base = TestType::builder("com.acme.ParallelAttachBase")
        .default_constructor::<()>()
        .method_watchers([WatcherType::of::<CountedWatcher>()])
        .build();
    let subclasses: Vec<_> = (0..THREADS)
        .map(|index| {
            TestType::builder(format!("com.acme.ParallelAttach{index}Test"))
                .extends(&base)
                .default_constructor::<()>()
                .method(FrameworkMethod::test("works", |_| Ok(())))
                .build()
        })
        .collect();

    let barrier = Barrier::new(THREADS);
    let chains: Vec<_> = thread::scope(|scope| {
        let handles: Vec<_> = subclasses
            .iter()
            .map(|ty| {
                let barrier = &barrier;
                let watchers = hooks.watchers();
                scope.spawn(move || {
                    barrier.wait();
                    watchers.attach(ty).unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|handle| handle.join().unwrap()).collect()
    });

    assert_eq!(CONSTRUCTED.load(Ordering::SeqCst), 1);
    for chain in &chains {
        assert_eq!(chain.declared_by(), Some("com.acme.ParallelAttachBase"));
        assert!(Arc::ptr_eq(chain, &chains[0]));
    }
    assert!(hooks.attached_watcher::<CountedWatcher>().is_some());
}
