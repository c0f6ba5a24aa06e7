//! Class descriptors built by the host framework.

use std::fmt;
use std::sync::{Arc, OnceLock};

use super::enhanced::EnhancedType;
use super::failure::Outcome;
use super::handles::ClassId;
use super::method::{FrameworkMethod, LifecycleKind};
use super::test_type::TestType;

/// Framework metadata for one test type.
///
/// Owned by the host framework; the engine keeps references and only binds
/// the variant of the engine that hooked the descriptor's runner. Every
/// descriptor gets its own [`ClassId`], so two descriptors of the same type
/// are distinct correlation keys.
pub struct TestClass {
    id: ClassId,
    test_type: Arc<TestType>,
    variant: OnceLock<Arc<EnhancedType>>,
}

impl TestClass {
    /// Describe `test_type`.
    pub fn new(test_type: Arc<TestType>) -> Self {
        Self {
            id: ClassId::next(),
            test_type,
            variant: OnceLock::new(),
        }
    }

    /// Stable handle of this descriptor.
    pub const fn id(&self) -> ClassId {
        self.id
    }

    /// Described type.
    pub fn test_type(&self) -> &Arc<TestType> {
        &self.test_type
    }

    /// Fully-qualified name of the described type.
    pub fn name(&self) -> &str {
        self.test_type.name()
    }

    /// Methods carrying `kind`, in execution order.
    pub fn annotated_methods(&self, kind: LifecycleKind) -> Vec<Arc<FrameworkMethod>> {
        self.test_type.annotated_methods(kind)
    }

    /// Bind the variant whose handler intercepts this descriptor's
    /// class-level methods. Only the first binding sticks.
    pub(crate) fn bind(&self, variant: &Arc<EnhancedType>) -> bool {
        self.variant.set(Arc::clone(variant)).is_ok()
    }

    /// Variant intercepting class-level methods: the bound one, otherwise
    /// the variant currently marked on the described type.
    pub fn variant(&self) -> Option<Arc<EnhancedType>> {
        self.variant.get().cloned().or_else(|| self.test_type.variant())
    }

    /// Invoke a class-level lifecycle method.
    ///
    /// Once the descriptor is bound or its type is instrumented the call
    /// goes through the variant's handler (the class-only interception
    /// shape); before that it runs the real body.
    pub fn invoke_class_method(&self, method: &Arc<FrameworkMethod>) -> Outcome {
        match self.variant() {
            Some(variant) => variant.handler().intercept_static(
                &self.test_type,
                method,
                Box::new(|| method.invoke_static()),
            ),
            None => method.invoke_static(),
        }
    }
}

impl fmt::Debug for TestClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestClass")
            .field("id", &self.id)
            .field("test_type", &self.test_type.name())
            .finish()
    }
}

impl fmt::Display for TestClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
