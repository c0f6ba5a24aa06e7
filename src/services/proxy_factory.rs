//! Proxy Factory
//!
//! Produces enhanced test instances. One intercepting variant is generated
//! per source type, lazily, the first time an instance of that type is
//! enhanced or one of its children runs. All instances of a type share it.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use super::method_interceptor::MethodInterceptor;
use crate::domain::errors::{HookError, HookResult};
use crate::domain::models::{EnhancedType, HookedClassNaming, TestInstance, TestType, TypeKey};
use crate::domain::ports::InvocationHandler;

/// Name of the variant generated for `source`.
pub fn variant_name(source: &TestType, naming: HookedClassNaming) -> String {
    match naming {
        HookedClassNaming::Suffix => format!("{}Hooked", source.name()),
        HookedClassNaming::PackagePrefix if source.package().is_empty() => {
            format!("Hooked{}", source.simple_name())
        }
        HookedClassNaming::PackagePrefix => {
            format!("{}.Hooked{}", source.package(), source.simple_name())
        }
    }
}

/// Creates and caches intercepting variants.
pub struct ProxyFactory {
    variants: Mutex<HashMap<TypeKey, Arc<EnhancedType>>>,
    interceptor: Arc<MethodInterceptor>,
    naming: HookedClassNaming,
}

impl std::fmt::Debug for ProxyFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyFactory")
            .field("variants", &self.variants.lock().len())
            .field("naming", &self.naming)
            .finish_non_exhaustive()
    }
}

impl ProxyFactory {
    /// Create a factory whose variants forward to `interceptor`.
    pub fn new(interceptor: Arc<MethodInterceptor>, naming: HookedClassNaming) -> Self {
        Self {
            variants: Mutex::new(HashMap::new()),
            interceptor,
            naming,
        }
    }

    /// The interceptor shared by every variant.
    pub fn interceptor(&self) -> &Arc<MethodInterceptor> {
        &self.interceptor
    }

    /// Return an enhanced counterpart of `instance`.
    ///
    /// Watchers are attached before anything else so that a misdeclared
    /// watcher fails here rather than on the first lifecycle call. An
    /// instance that is already enhanced comes back unchanged.
    pub fn enhance(&self, instance: &TestInstance) -> HookResult<TestInstance> {
        let source = instance.source_type();
        self.interceptor.watchers().attach(source)?;

        if instance.is_enhanced() {
            return Ok(instance.clone());
        }

        let variant = self.variant_for(source);
        let enhanced = variant
            .instantiate()
            .ok_or_else(|| HookError::VariantInstantiation {
                variant: variant.name().to_owned(),
                source_type: source.name().to_owned(),
            })?;
        debug!(
            source = %instance.id(),
            enhanced = %enhanced.id(),
            variant = variant.name(),
            "Enhanced test instance"
        );
        Ok(enhanced)
    }

    /// Variant of `source`, generated on first request.
    ///
    /// Also records the variant on `source`, which turns on interception of
    /// its class-level lifecycle methods.
    pub fn variant_for(&self, source: &Arc<TestType>) -> Arc<EnhancedType> {
        let variant = {
            let mut variants = self.variants.lock();
            Arc::clone(variants.entry(source.key()).or_insert_with(|| {
                let handler: Arc<dyn InvocationHandler> = self.interceptor.clone();
                let variant = EnhancedType::new(
                    variant_name(source, self.naming),
                    Arc::clone(source),
                    handler,
                );
                debug!(
                    source = %source.name(),
                    variant = variant.name(),
                    intercepted = variant.intercepted_methods().len(),
                    "Generated intercepting variant"
                );
                Arc::new(variant)
            }))
        };
        source.mark(&variant);
        variant
    }

    /// Source type of `instance`, whether plain or enhanced.
    pub fn instance_class(instance: &TestInstance) -> Arc<TestType> {
        Arc::clone(instance.source_type())
    }

    /// Number of variants generated so far.
    pub fn variant_count(&self) -> usize {
        self.variants.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::FrameworkMethod;
    use crate::domain::ports::{MethodWatcher, WatcherType};
    use crate::services::watcher_registry::WatcherRegistry;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn factory(naming: HookedClassNaming) -> ProxyFactory {
        let interceptor = MethodInterceptor::new(Arc::new(WatcherRegistry::default()));
        ProxyFactory::new(Arc::new(interceptor), naming)
    }

    #[derive(Default)]
    struct Counter(AtomicUsize);

    fn counting_type() -> Arc<TestType> {
        TestType::builder("com.acme.CountingTest")
            .default_constructor::<Counter>()
            .method(FrameworkMethod::test("bump", |target| {
                if let Some(counter) = target.state::<Counter>() {
                    counter.0.fetch_add(1, Ordering::SeqCst);
                }
                Ok(())
            }))
            .method(FrameworkMethod::after_class("tearDownClass", || Ok(())))
            .build()
    }

    #[test]
    fn test_variant_names() {
        let ty = TestType::builder("com.acme.FooTest").build();
        assert_eq!(variant_name(&ty, HookedClassNaming::Suffix), "com.acme.FooTestHooked");
        assert_eq!(
            variant_name(&ty, HookedClassNaming::PackagePrefix),
            "com.acme.HookedFooTest"
        );
        let bare = TestType::builder("FooTest").build();
        assert_eq!(variant_name(&bare, HookedClassNaming::PackagePrefix), "HookedFooTest");
    }

    #[test]
    fn test_instances_share_one_variant() {
        let factory = factory(HookedClassNaming::Suffix);
        let ty = counting_type();
        let first = factory.enhance(&TestInstance::instantiate(&ty).unwrap()).unwrap();
        let second = factory.enhance(&TestInstance::instantiate(&ty).unwrap()).unwrap();

        assert!(Arc::ptr_eq(first.variant().unwrap(), second.variant().unwrap()));
        assert_eq!(factory.variant_count(), 1);
        assert!(ty.is_instrumented());
    }

    #[test]
    fn test_enhancing_twice_is_identity() {
        let factory = factory(HookedClassNaming::Suffix);
        let ty = counting_type();
        let enhanced = factory.enhance(&TestInstance::instantiate(&ty).unwrap()).unwrap();
        let again = factory.enhance(&enhanced).unwrap();
        assert_eq!(again.id(), enhanced.id());
    }

    #[test]
    fn test_enhanced_instance_runs_real_body() {
        let factory = factory(HookedClassNaming::Suffix);
        let ty = counting_type();
        let enhanced = factory.enhance(&TestInstance::instantiate(&ty).unwrap()).unwrap();
        let bump = Arc::clone(&ty.declared_methods()[0]);

        enhanced.invoke(&bump).unwrap();
        enhanced.invoke(&bump).unwrap();

        assert_eq!(enhanced.state::<Counter>().unwrap().0.load(Ordering::SeqCst), 2);
        assert_eq!(ProxyFactory::instance_class(&enhanced).key(), ty.key());
        assert_eq!(enhanced.type_name(), "com.acme.CountingTestHooked");
    }

    #[test]
    fn test_missing_constructor_is_reported() {
        let factory = factory(HookedClassNaming::Suffix);
        let ty = TestType::builder("com.acme.ArgsTest").build();
        let plain = TestInstance::new(Arc::clone(&ty), Arc::new(()));

        let err = factory.enhance(&plain).unwrap_err();
        assert!(matches!(
            err,
            HookError::VariantInstantiation { variant, source_type }
                if variant == "com.acme.ArgsTestHooked" && source_type == "com.acme.ArgsTest"
        ));
    }

    #[test]
    fn test_attach_error_precedes_enhancement() {
        struct Opaque;
        impl MethodWatcher for Opaque {}

        let factory = factory(HookedClassNaming::Suffix);
        let ty = TestType::builder("com.acme.MisdeclaredTest")
            .default_constructor::<()>()
            .method_watchers([WatcherType::without_default::<Opaque>()])
            .build();

        let err = factory.enhance(&TestInstance::instantiate(&ty).unwrap()).unwrap_err();
        assert!(matches!(err, HookError::WatcherNotInstantiable { .. }));
        assert_eq!(factory.variant_count(), 0);
    }
}
