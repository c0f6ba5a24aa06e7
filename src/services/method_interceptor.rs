//! Method Interceptor
//!
//! Runs the watcher chain around an intercepted lifecycle call: before-hooks
//! last registered first, then the real body, then after-hooks first
//! registered first. The method's own failure comes back to the caller as
//! the identical value the after-hooks observed.

use std::sync::Arc;
use tracing::{trace, warn};

use super::watcher_registry::{WatcherChain, WatcherRegistry};
use crate::domain::models::{Failure, FrameworkMethod, Outcome, TestInstance, TestType};
use crate::domain::ports::{InvocationHandler, MethodWatcher, SuperCall, WatcherCapabilities};

/// Capability pair selecting which hooks of a chain take part in a dispatch.
#[derive(Debug, Clone, Copy)]
struct Phase {
    before: WatcherCapabilities,
    after: WatcherCapabilities,
}

const TARGETED: Phase = Phase {
    before: WatcherCapabilities::BEFORE_TARGETED,
    after: WatcherCapabilities::AFTER_TARGETED,
};

const CLASS_ONLY: Phase = Phase {
    before: WatcherCapabilities::BEFORE_CLASS,
    after: WatcherCapabilities::AFTER_CLASS,
};

/// Invocation handler shared by every generated variant.
#[derive(Debug, Clone)]
pub struct MethodInterceptor {
    watchers: Arc<WatcherRegistry>,
}

impl MethodInterceptor {
    /// Create an interceptor resolving chains through `watchers`.
    pub fn new(watchers: Arc<WatcherRegistry>) -> Self {
        Self { watchers }
    }

    /// Registry the interceptor attaches chains from.
    pub fn watchers(&self) -> &Arc<WatcherRegistry> {
        &self.watchers
    }

    fn around<B, A>(
        chain: &WatcherChain,
        phase: Phase,
        call: SuperCall<'_>,
        before: B,
        after: A,
    ) -> Outcome
    where
        B: Fn(&dyn MethodWatcher) -> anyhow::Result<()>,
        A: Fn(&dyn MethodWatcher, Option<&Failure>) -> anyhow::Result<()>,
    {
        for attached in chain.before_order(phase.before) {
            before(attached.watcher()).map_err(Failure::new)?;
        }

        let outcome = call();
        let thrown = outcome.as_ref().err();

        for attached in chain.after_order(phase.after) {
            if let Err(err) = after(attached.watcher(), thrown) {
                if let Some(real) = thrown {
                    warn!(
                        watcher = attached.kind().name(),
                        failure = %real,
                        "Method failure superseded by after-hook error"
                    );
                }
                return Err(Failure::new(err));
            }
        }

        outcome
    }
}

impl InvocationHandler for MethodInterceptor {
    fn intercept(
        &self,
        target: &TestInstance,
        method: &Arc<FrameworkMethod>,
        call: SuperCall<'_>,
    ) -> Outcome {
        let chain = self.watchers.attach(target.source_type()).map_err(Failure::new)?;
        trace!(
            instance = %target.id(),
            method = method.name(),
            watchers = chain.len(),
            "Dispatching instance lifecycle method"
        );
        Self::around(
            &chain,
            TARGETED,
            call,
            |watcher| watcher.before_invocation(target, method),
            |watcher, thrown| watcher.after_invocation(target, method, thrown),
        )
    }

    fn intercept_static(
        &self,
        test_type: &Arc<TestType>,
        method: &Arc<FrameworkMethod>,
        call: SuperCall<'_>,
    ) -> Outcome {
        let chain = self.watchers.attach(test_type).map_err(Failure::new)?;
        trace!(
            test_type = %test_type.name(),
            method = method.name(),
            watchers = chain.len(),
            "Dispatching class lifecycle method"
        );
        Self::around(
            &chain,
            CLASS_ONLY,
            call,
            |watcher| watcher.before_class_invocation(test_type, method),
            |watcher, thrown| watcher.after_class_invocation(test_type, method, thrown),
        )
    }
}
