pub mod correlation;
pub mod method_interceptor;
pub mod proxy_factory;
pub mod service_catalog;
pub mod shutdown;
pub mod timeout_policy;
pub mod watcher_registry;

pub use correlation::CorrelationRegistry;
pub use method_interceptor::MethodInterceptor;
pub use proxy_factory::{variant_name, ProxyFactory};
pub use service_catalog::{Service, ServiceCatalog, ServiceCatalogBuilder, ServiceRegistration};
pub use shutdown::ShutdownHooks;
pub use timeout_policy::TimeoutPolicy;
pub use watcher_registry::{WatcherChain, WatcherRegistry};
