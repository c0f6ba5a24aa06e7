//! Generated intercepting variants of test types.

use std::fmt;
use std::sync::Arc;

use super::instance::TestInstance;
use super::method::FrameworkMethod;
use super::test_type::TestType;
use crate::domain::ports::interception::InvocationHandler;

/// Intercepting variant of one source type.
///
/// The variant overrides every instance lifecycle method of the source
/// ancestry and forwards it to its invocation handler. It behaves like the
/// source type in every other respect; instances keep the source's state
/// object and non-lifecycle methods run unchanged.
pub struct EnhancedType {
    name: String,
    source: Arc<TestType>,
    intercepted: Vec<Arc<FrameworkMethod>>,
    handler: Arc<dyn InvocationHandler>,
}

impl EnhancedType {
    /// Generate the variant of `source` named `name`.
    pub fn new(name: String, source: Arc<TestType>, handler: Arc<dyn InvocationHandler>) -> Self {
        let intercepted = source.instance_lifecycle_methods();
        Self {
            name,
            source,
            intercepted,
            handler,
        }
    }

    /// Generated type name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The type this variant was generated from.
    pub fn source(&self) -> &Arc<TestType> {
        &self.source
    }

    /// Methods this variant overrides.
    pub fn intercepted_methods(&self) -> &[Arc<FrameworkMethod>] {
        &self.intercepted
    }

    /// Whether calls to `method` are routed through the handler.
    pub fn intercepts(&self, method: &Arc<FrameworkMethod>) -> bool {
        self.intercepted.iter().any(|candidate| Arc::ptr_eq(candidate, method))
    }

    /// Handler receiving intercepted calls.
    pub fn handler(&self) -> &Arc<dyn InvocationHandler> {
        &self.handler
    }

    /// Create an instance of the variant.
    ///
    /// Returns `None` when the source type has no default constructor.
    pub fn instantiate(self: &Arc<Self>) -> Option<TestInstance> {
        self.source
            .instantiate()
            .map(|state| TestInstance::enhanced(Arc::clone(self), state))
    }
}

impl fmt::Debug for EnhancedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnhancedType")
            .field("name", &self.name)
            .field("source", &self.source.name())
            .field(
                "intercepted",
                &self.intercepted.iter().map(|method| method.name()).collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}
