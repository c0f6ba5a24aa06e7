//! Test instances.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use super::enhanced::EnhancedType;
use super::failure::Outcome;
use super::handles::InstanceId;
use super::method::FrameworkMethod;
use super::test_type::{InstanceState, TestType};

/// Handle to one instantiated test object.
///
/// A plain instance invokes lifecycle methods directly. An enhanced instance
/// carries the generated variant of its type (the capability marker) and
/// routes every intercepted method through that variant's handler. Cloning
/// the handle does not create a new instance: clones share the same
/// [`InstanceId`] and state.
#[derive(Clone)]
pub struct TestInstance {
    id: InstanceId,
    source: Arc<TestType>,
    state: InstanceState,
    variant: Option<Arc<EnhancedType>>,
}

impl TestInstance {
    /// Wrap a state object created by the host framework.
    pub fn new(source: Arc<TestType>, state: InstanceState) -> Self {
        Self {
            id: InstanceId::next(),
            source,
            state,
            variant: None,
        }
    }

    /// Instantiate `source` through its default constructor.
    pub fn instantiate(source: &Arc<TestType>) -> Option<Self> {
        source
            .instantiate()
            .map(|state| Self::new(Arc::clone(source), state))
    }

    pub(crate) fn enhanced(variant: Arc<EnhancedType>, state: InstanceState) -> Self {
        Self {
            id: InstanceId::next(),
            source: Arc::clone(variant.source()),
            state,
            variant: Some(variant),
        }
    }

    /// Stable handle of this instance.
    pub const fn id(&self) -> InstanceId {
        self.id
    }

    /// The type the test author wrote, for plain and enhanced instances alike.
    pub fn source_type(&self) -> &Arc<TestType> {
        &self.source
    }

    /// Generated variant, when enhanced.
    pub fn variant(&self) -> Option<&Arc<EnhancedType>> {
        self.variant.as_ref()
    }

    /// Whether this instance carries the capability marker.
    pub const fn is_enhanced(&self) -> bool {
        self.variant.is_some()
    }

    /// Name of the runtime type: the variant's name when enhanced.
    pub fn type_name(&self) -> &str {
        self.variant
            .as_ref()
            .map_or_else(|| self.source.name(), |variant| variant.name())
    }

    /// Methods declared by the runtime type itself.
    ///
    /// For a plain instance these are the source type's own methods. An
    /// enhanced instance's runtime type declares exactly the lifecycle
    /// methods its variant overrides, inherited ones included.
    pub fn declared_methods(&self) -> Vec<Arc<FrameworkMethod>> {
        self.variant.as_ref().map_or_else(
            || self.source.declared_methods().to_vec(),
            |variant| variant.intercepted_methods().to_vec(),
        )
    }

    /// Borrow the state object as `T`.
    pub fn state<T: Any>(&self) -> Option<&T> {
        self.state.downcast_ref::<T>()
    }

    /// Invoke a method on this instance.
    ///
    /// Methods the variant overrides go through its invocation handler;
    /// everything else runs the real body directly.
    pub fn invoke(&self, method: &Arc<FrameworkMethod>) -> Outcome {
        match &self.variant {
            Some(variant) if variant.intercepts(method) => {
                variant.handler().intercept(self, method, Box::new(|| method.invoke_on(self)))
            }
            _ => method.invoke_on(self),
        }
    }
}

impl fmt::Debug for TestInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestInstance")
            .field("id", &self.id)
            .field("type", &self.type_name())
            .field("enhanced", &self.is_enhanced())
            .finish()
    }
}
