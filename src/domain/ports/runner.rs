//! Host framework runner port.
//!
//! These traits are the host framework's extension points. An implementation
//! provides the original bodies; the engine wraps runners so that the same
//! calls first pass through its advice.
//!
//! Wrapping is explicit, so a runner must not call its own extension points
//! on `self`: bodies that need to create a test instance or run a child go
//! through the `outer` runner they are handed, which is the outermost
//! (possibly hooked) view of the same runner.

use std::sync::Arc;

use crate::domain::models::{Description, FrameworkMethod, RunNotifier, TestClass, TestInstance};

/// A runner executing the tests of one class descriptor (or a suite of them).
pub trait Runner: Send + Sync {
    /// Build the class descriptor for the runner's test class.
    fn create_test_class(&self) -> anyhow::Result<Arc<TestClass>>;

    /// Description of the whole suite.
    fn description(&self) -> Description;

    /// Description of one child test.
    fn child_description(&self, child: &FrameworkMethod) -> Description;

    /// Execute the suite, reporting to `notifier`.
    fn run(&self, notifier: &RunNotifier, outer: &Arc<dyn Runner>);

    /// Per-test extension points, for runners that run test methods directly.
    fn block(self: Arc<Self>) -> Option<Arc<dyn BlockRunner>> {
        None
    }

    /// Whether this runner has been rewired by the engine.
    fn is_hooked(&self) -> bool {
        false
    }
}

/// Extension points of a runner that instantiates tests and runs methods.
pub trait BlockRunner: Send + Sync {
    /// Descriptor created by [`Runner::create_test_class`].
    fn test_class(&self) -> Arc<TestClass>;

    /// Create the test instance for one child.
    fn create_test(&self) -> anyhow::Result<TestInstance>;

    /// Execute one child test, reporting to `notifier`.
    fn run_child(
        &self,
        child: &Arc<FrameworkMethod>,
        notifier: &RunNotifier,
        outer: &Arc<dyn Runner>,
    );
}

/// Execute `runner` as the outermost view of itself.
pub fn execute(runner: &Arc<dyn Runner>, notifier: &RunNotifier) {
    runner.run(notifier, runner);
}
