//! Rewired runner.
//!
//! [`HookedRunner`] decorates a host runner. Each extension point first
//! runs the engine's advice and then the original body, so the host sees
//! exactly the behavior it implemented plus the engine's bookkeeping.

use std::sync::{Arc, Weak};

use super::lifecycle_hooks::LifecycleHooks;
use crate::domain::errors::HookError;
use crate::domain::models::{Description, FrameworkMethod, RunNotifier, TestClass, TestInstance};
use crate::domain::ports::{BlockRunner, Runner};

/// A host runner wrapped by the engine.
pub struct HookedRunner {
    inner: Arc<dyn Runner>,
    block: Option<Arc<HookedBlock>>,
    hooks: Arc<LifecycleHooks>,
    this: Weak<HookedRunner>,
}

impl HookedRunner {
    /// Wrap `inner`, routing its extension points through `hooks`.
    pub fn wrap(inner: Arc<dyn Runner>, hooks: Arc<LifecycleHooks>) -> Arc<Self> {
        let block = Arc::clone(&inner).block().map(|block| {
            Arc::new(HookedBlock {
                inner: block,
                hooks: Arc::clone(&hooks),
            })
        });
        Arc::new_cyclic(|this| Self {
            inner,
            block,
            hooks,
            this: this.clone(),
        })
    }

    /// The host runner being decorated.
    pub fn inner(&self) -> &Arc<dyn Runner> {
        &self.inner
    }
}

impl std::fmt::Debug for HookedRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookedRunner")
            .field("suite", &self.inner.description())
            .field("block", &self.block.is_some())
            .finish_non_exhaustive()
    }
}

impl Runner for HookedRunner {
    fn create_test_class(&self) -> anyhow::Result<Arc<TestClass>> {
        let test_class = self
            .inner
            .create_test_class()
            .map_err(|source| HookError::Construction {
                what: "class descriptor",
                source,
            })?;
        let runner: Arc<dyn Runner> = match self.this.upgrade() {
            Some(this) => this,
            None => Arc::clone(&self.inner),
        };
        self.hooks.test_class_created(&test_class, &runner);
        Ok(test_class)
    }

    fn description(&self) -> Description {
        self.inner.description()
    }

    fn child_description(&self, child: &FrameworkMethod) -> Description {
        self.inner.child_description(child)
    }

    fn run(&self, notifier: &RunNotifier, outer: &Arc<dyn Runner>) {
        self.hooks.run_starting(self, notifier);
        self.inner.run(notifier, outer);
    }

    fn block(self: Arc<Self>) -> Option<Arc<dyn BlockRunner>> {
        self.block.clone().map(|block| block as Arc<dyn BlockRunner>)
    }

    fn is_hooked(&self) -> bool {
        true
    }
}

/// Rewired per-test extension points of a hooked runner.
struct HookedBlock {
    inner: Arc<dyn BlockRunner>,
    hooks: Arc<LifecycleHooks>,
}

impl BlockRunner for HookedBlock {
    fn test_class(&self) -> Arc<TestClass> {
        self.inner.test_class()
    }

    fn create_test(&self) -> anyhow::Result<TestInstance> {
        let instance = self
            .inner
            .create_test()
            .map_err(|source| HookError::Construction {
                what: "test instance",
                source,
            })?;
        let enhanced = self.hooks.test_created(&instance, &self.inner.test_class())?;
        Ok(enhanced)
    }

    fn run_child(
        &self,
        child: &Arc<FrameworkMethod>,
        notifier: &RunNotifier,
        outer: &Arc<dyn Runner>,
    ) {
        self.hooks.child_starting(&self.inner.test_class());
        self.inner.run_child(child, notifier, outer);
    }
}
