//! Source test types.
//!
//! A [`TestType`] is the engine's view of a test class as written by the
//! test author: its name, its superclass, the methods it declares and the
//! watcher types it asks for. Types are immutable once built, apart from the
//! capability marker that records the generated intercepting variant.

use parking_lot::RwLock;
use std::any::Any;
use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Weak};

use super::enhanced::EnhancedType;
use super::handles::TypeKey;
use super::method::{FrameworkMethod, LifecycleKind};
use crate::domain::ports::watchers::WatcherType;

/// State object of one test instance.
pub type InstanceState = Arc<dyn Any + Send + Sync>;

/// Default constructor of a test type.
pub type Constructor = Arc<dyn Fn() -> InstanceState + Send + Sync>;

/// A test class as declared by the test author.
pub struct TestType {
    key: TypeKey,
    name: String,
    superclass: Option<Arc<TestType>>,
    methods: Vec<Arc<FrameworkMethod>>,
    method_watchers: Option<Vec<WatcherType>>,
    constructor: Option<Constructor>,
    variant: RwLock<Weak<EnhancedType>>,
}

impl TestType {
    /// Start building a type with the given fully-qualified name.
    pub fn builder(name: impl Into<String>) -> TestTypeBuilder {
        TestTypeBuilder {
            name: name.into(),
            superclass: None,
            methods: Vec::new(),
            method_watchers: None,
            constructor: None,
        }
    }

    /// Stable handle of this type.
    pub const fn key(&self) -> TypeKey {
        self.key
    }

    /// Fully-qualified name, e.g. `com.acme.FooTest`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name without the package, e.g. `FooTest`.
    pub fn simple_name(&self) -> &str {
        self.name.rsplit_once('.').map_or(self.name.as_str(), |(_, simple)| simple)
    }

    /// Package part of the name, empty for the default package.
    pub fn package(&self) -> &str {
        self.name.rsplit_once('.').map_or("", |(package, _)| package)
    }

    /// Direct superclass, if any.
    pub fn superclass(&self) -> Option<&Arc<TestType>> {
        self.superclass.as_ref()
    }

    /// Methods declared directly on this type (not inherited).
    pub fn declared_methods(&self) -> &[Arc<FrameworkMethod>] {
        &self.methods
    }

    /// Watcher types declared directly on this type.
    pub fn declared_watchers(&self) -> Option<&[WatcherType]> {
        self.method_watchers.as_deref()
    }

    /// This type followed by its superclasses, nearest first.
    pub fn ancestry(&self) -> impl Iterator<Item = &TestType> {
        std::iter::successors(Some(self), |current| current.superclass.as_deref())
    }

    /// Nearest type in the ancestry that declares watchers, with its declaration.
    pub fn watcher_declaration(&self) -> Option<(&TestType, &[WatcherType])> {
        self.ancestry()
            .find_map(|current| current.declared_watchers().map(|watchers| (current, watchers)))
    }

    /// Whether the type can be instantiated without arguments.
    pub fn has_default_constructor(&self) -> bool {
        self.constructor.is_some()
    }

    /// Build a fresh state object, if a default constructor exists.
    pub fn instantiate(&self) -> Option<InstanceState> {
        self.constructor.as_ref().map(|construct| construct())
    }

    /// Methods carrying `kind` across the ancestry, in execution order.
    ///
    /// A method shadows same-named methods of its superclasses. Setup methods
    /// of superclasses run first; everything else runs subclass first.
    pub fn annotated_methods(&self, kind: LifecycleKind) -> Vec<Arc<FrameworkMethod>> {
        let mut methods = self.visible_methods(|method| method.is(kind));
        if matches!(kind, LifecycleKind::Before | LifecycleKind::BeforeClass) {
            methods.reverse();
        }
        methods
    }

    /// Instance lifecycle methods (`Test`, `Before`, `After`) across the
    /// ancestry, subclass first, overridden methods omitted.
    pub fn instance_lifecycle_methods(&self) -> Vec<Arc<FrameworkMethod>> {
        self.visible_methods(|method| {
            method.kind().is_some_and(|kind| !kind.is_static()) && !method.is_static()
        })
    }

    fn visible_methods<P>(&self, predicate: P) -> Vec<Arc<FrameworkMethod>>
    where
        P: Fn(&FrameworkMethod) -> bool,
    {
        let mut seen = HashSet::new();
        let mut methods = Vec::new();
        for current in self.ancestry() {
            for method in &current.methods {
                if seen.insert(method.name().to_owned()) && predicate(method) {
                    methods.push(Arc::clone(method));
                }
            }
        }
        methods
    }

    /// Record `variant` as the generated variant of this type.
    ///
    /// The most recent engine to mark the type wins, and a marker whose
    /// engine is gone is replaced. Returns `false` when `variant` was already
    /// the recorded one.
    pub(crate) fn mark(&self, variant: &Arc<EnhancedType>) -> bool {
        let mut current = self.variant.write();
        if std::ptr::eq(current.as_ptr(), Arc::as_ptr(variant)) {
            return false;
        }
        *current = Arc::downgrade(variant);
        true
    }

    /// The generated variant, while the engine that produced it is alive.
    pub fn variant(&self) -> Option<Arc<EnhancedType>> {
        self.variant.read().upgrade()
    }

    /// Whether an intercepting variant has been generated for this type.
    pub fn is_instrumented(&self) -> bool {
        self.variant().is_some()
    }
}

impl fmt::Debug for TestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestType")
            .field("key", &self.key)
            .field("name", &self.name)
            .field("superclass", &self.superclass.as_ref().map(|parent| parent.name()))
            .field("methods", &self.methods.len())
            .field(
                "method_watchers",
                &self
                    .method_watchers
                    .as_ref()
                    .map(|watchers| watchers.iter().map(WatcherType::name).collect::<Vec<_>>()),
            )
            .field("instrumented", &self.is_instrumented())
            .finish()
    }
}

impl fmt::Display for TestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Builder for [`TestType`].
pub struct TestTypeBuilder {
    name: String,
    superclass: Option<Arc<TestType>>,
    methods: Vec<FrameworkMethod>,
    method_watchers: Option<Vec<WatcherType>>,
    constructor: Option<Constructor>,
}

impl TestTypeBuilder {
    /// Set the superclass.
    #[must_use]
    pub fn extends(mut self, superclass: &Arc<TestType>) -> Self {
        self.superclass = Some(Arc::clone(superclass));
        self
    }

    /// Declare a method.
    #[must_use]
    pub fn method(mut self, method: FrameworkMethod) -> Self {
        self.methods.push(method);
        self
    }

    /// Declare the ordered list of watcher types this type (and its
    /// subclasses) should be observed by.
    #[must_use]
    pub fn method_watchers(mut self, watchers: impl IntoIterator<Item = WatcherType>) -> Self {
        self.method_watchers = Some(watchers.into_iter().collect());
        self
    }

    /// Give the type a default constructor producing `T`.
    #[must_use]
    pub fn constructor<T, F>(mut self, construct: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.constructor = Some(Arc::new(move || Arc::new(construct()) as InstanceState));
        self
    }

    /// Give the type a default constructor using `T::default()`.
    #[must_use]
    pub fn default_constructor<T>(self) -> Self
    where
        T: Any + Default + Send + Sync,
    {
        self.constructor(T::default)
    }

    /// Finish the type.
    pub fn build(self) -> Arc<TestType> {
        let name = self.name;
        let methods = self
            .methods
            .into_iter()
            .map(|method| Arc::new(method.declared_by(&name)))
            .collect();
        Arc::new(TestType {
            key: TypeKey::next(),
            name,
            superclass: self.superclass,
            methods,
            method_watchers: self.method_watchers,
            constructor: self.constructor,
            variant: RwLock::new(Weak::new()),
        })
    }
}
