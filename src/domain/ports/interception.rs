//! Invocation handler port.
//!
//! Generated variants forward every intercepted lifecycle call to an
//! [`InvocationHandler`]. The handler receives the real method body as a
//! [`SuperCall`] and decides what runs around it.

use std::sync::Arc;

use crate::domain::models::{FrameworkMethod, Outcome, TestInstance, TestType};

/// The real body of an intercepted method.
pub type SuperCall<'a> = Box<dyn FnOnce() -> Outcome + 'a>;

/// Receives intercepted lifecycle calls.
pub trait InvocationHandler: Send + Sync {
    /// An instance lifecycle method was called on `target`.
    fn intercept(
        &self,
        target: &TestInstance,
        method: &Arc<FrameworkMethod>,
        call: SuperCall<'_>,
    ) -> Outcome;

    /// A class-level lifecycle method of `test_type` was called.
    fn intercept_static(
        &self,
        test_type: &Arc<TestType>,
        method: &Arc<FrameworkMethod>,
        call: SuperCall<'_>,
    ) -> Outcome;
}
