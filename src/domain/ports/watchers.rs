//! Method watcher port.
//!
//! Method watchers observe lifecycle method invocations. A watcher states
//! which hooks it wants through [`WatcherCapabilities`]; the dispatcher only
//! calls the hooks a watcher declares, so there is no runtime type
//! inspection of watcher objects.

use bitflags::bitflags;
use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

use crate::domain::models::{Failure, FrameworkMethod, TestInstance, TestType};

bitflags! {
    /// Hooks a method watcher participates in.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct WatcherCapabilities: u8 {
        /// Before an instance lifecycle method.
        const BEFORE_TARGETED = 1 << 0;
        /// After an instance lifecycle method.
        const AFTER_TARGETED = 1 << 1;
        /// Before a class-level lifecycle method.
        const BEFORE_CLASS = 1 << 2;
        /// After a class-level lifecycle method.
        const AFTER_CLASS = 1 << 3;

        /// Both instance hooks.
        const TARGETED = Self::BEFORE_TARGETED.bits() | Self::AFTER_TARGETED.bits();
        /// Both class-level hooks.
        const CLASS_ONLY = Self::BEFORE_CLASS.bits() | Self::AFTER_CLASS.bits();
    }
}

/// Observer invoked around lifecycle methods.
///
/// Hooks default to no-ops. An error returned from a hook aborts the
/// remaining hooks of that phase and is surfaced to the caller of the
/// intercepted method.
pub trait MethodWatcher: Send + Sync {
    /// Hooks this watcher participates in.
    fn capabilities(&self) -> WatcherCapabilities {
        WatcherCapabilities::TARGETED
    }

    /// Invoked before an instance lifecycle method runs.
    fn before_invocation(
        &self,
        _target: &TestInstance,
        _method: &FrameworkMethod,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    /// Invoked after an instance lifecycle method ran; `thrown` is the
    /// method's failure, if any.
    fn after_invocation(
        &self,
        _target: &TestInstance,
        _method: &FrameworkMethod,
        _thrown: Option<&Failure>,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    /// Invoked before a class-level lifecycle method runs.
    fn before_class_invocation(
        &self,
        _test_type: &TestType,
        _method: &FrameworkMethod,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    /// Invoked after a class-level lifecycle method ran.
    fn after_class_invocation(
        &self,
        _test_type: &TestType,
        _method: &FrameworkMethod,
        _thrown: Option<&Failure>,
    ) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Identifier of a concrete watcher type, used in watcher declarations.
///
/// Two `WatcherType`s are equal when they name the same Rust type.
#[derive(Clone, Copy)]
pub struct WatcherType {
    name: &'static str,
    type_id: fn() -> TypeId,
    factory: Option<fn() -> AttachedWatcher>,
}

impl WatcherType {
    /// Watcher type instantiated through `W::default()`.
    pub fn of<W>() -> Self
    where
        W: MethodWatcher + Default + Any,
    {
        Self {
            name: std::any::type_name::<W>(),
            type_id: TypeId::of::<W>,
            factory: Some(AttachedWatcher::instantiate::<W>),
        }
    }

    /// Watcher type the engine cannot instantiate on its own.
    ///
    /// Declaring such a type on a test class is a configuration error; it
    /// can only enter a chain as an already-built instance.
    pub fn without_default<W>() -> Self
    where
        W: MethodWatcher + Any,
    {
        Self {
            name: std::any::type_name::<W>(),
            type_id: TypeId::of::<W>,
            factory: None,
        }
    }

    /// Rust type name of the watcher.
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Type identity of the watcher.
    pub fn id(&self) -> TypeId {
        (self.type_id)()
    }

    /// Whether [`WatcherType::instantiate`] can succeed.
    pub const fn is_instantiable(&self) -> bool {
        self.factory.is_some()
    }

    /// Build a new watcher object of this type.
    pub fn instantiate(&self) -> Option<AttachedWatcher> {
        self.factory.map(|factory| factory())
    }
}

impl PartialEq for WatcherType {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for WatcherType {}

impl fmt::Debug for WatcherType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatcherType")
            .field("name", &self.name)
            .field("instantiable", &self.is_instantiable())
            .finish()
    }
}

/// A live watcher object together with its type identity.
#[derive(Clone)]
pub struct AttachedWatcher {
    kind: WatcherType,
    capabilities: WatcherCapabilities,
    watcher: Arc<dyn MethodWatcher>,
    any: Arc<dyn Any + Send + Sync>,
}

impl AttachedWatcher {
    fn instantiate<W>() -> Self
    where
        W: MethodWatcher + Default + Any,
    {
        Self::from_arc(Arc::new(W::default()))
    }

    /// Wrap an existing watcher object.
    pub fn from_arc<W>(watcher: Arc<W>) -> Self
    where
        W: MethodWatcher + Any,
    {
        let kind = WatcherType {
            name: std::any::type_name::<W>(),
            type_id: TypeId::of::<W>,
            factory: None,
        };
        Self {
            kind,
            capabilities: watcher.capabilities(),
            watcher: Arc::clone(&watcher) as Arc<dyn MethodWatcher>,
            any: watcher,
        }
    }

    /// Type of the watcher.
    pub const fn kind(&self) -> &WatcherType {
        &self.kind
    }

    /// Capabilities captured when the watcher was attached.
    pub const fn capabilities(&self) -> WatcherCapabilities {
        self.capabilities
    }

    /// Whether the watcher declares every flag in `capability`.
    pub const fn supports(&self, capability: WatcherCapabilities) -> bool {
        self.capabilities.contains(capability)
    }

    /// The watcher object.
    pub fn watcher(&self) -> &dyn MethodWatcher {
        self.watcher.as_ref()
    }

    /// The watcher object as its concrete type.
    pub fn downcast<W>(&self) -> Option<Arc<W>>
    where
        W: Any + Send + Sync,
    {
        Arc::clone(&self.any).downcast::<W>().ok()
    }
}

impl fmt::Debug for AttachedWatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttachedWatcher")
            .field("kind", &self.kind.name())
            .field("capabilities", &self.capabilities)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Plain;
    impl MethodWatcher for Plain {}

    #[derive(Default)]
    struct ClassLevel;
    impl MethodWatcher for ClassLevel {
        fn capabilities(&self) -> WatcherCapabilities {
            WatcherCapabilities::all()
        }
    }

    #[test]
    fn test_watcher_type_identity() {
        assert_eq!(WatcherType::of::<Plain>(), WatcherType::of::<Plain>());
        assert_ne!(WatcherType::of::<Plain>(), WatcherType::of::<ClassLevel>());
        assert_eq!(WatcherType::of::<Plain>(), WatcherType::without_default::<Plain>());
    }

    #[test]
    fn test_instantiate_captures_capabilities() {
        let attached = WatcherType::of::<ClassLevel>().instantiate().expect("default");
        assert!(attached.supports(WatcherCapabilities::CLASS_ONLY));
        assert!(attached.supports(WatcherCapabilities::BEFORE_TARGETED));
        assert!(attached.downcast::<ClassLevel>().is_some());
        assert!(attached.downcast::<Plain>().is_none());

        let plain = WatcherType::of::<Plain>().instantiate().expect("default");
        assert!(plain.supports(WatcherCapabilities::TARGETED));
        assert!(!plain.supports(WatcherCapabilities::AFTER_CLASS));
    }

    #[test]
    fn test_without_default_is_not_instantiable() {
        let kind = WatcherType::without_default::<Plain>();
        assert!(!kind.is_instantiable());
        assert!(kind.instantiate().is_none());
    }
}
