//! Domain models for test lifecycle instrumentation.

pub mod config;
pub mod description;
pub mod enhanced;
pub mod failure;
pub mod handles;
pub mod instance;
pub mod method;
pub mod notifier;
pub mod test_class;
pub mod test_type;

pub use config::{HookedClassNaming, HooksConfig, LoggingConfig};
pub use description::Description;
pub use enhanced::EnhancedType;
pub use failure::{Failure, Outcome};
pub use handles::{ClassId, InstanceId, NotifierId, TypeKey};
pub use instance::TestInstance;
pub use method::{FrameworkMethod, InstanceBody, LifecycleKind, MethodBody, StaticBody};
pub use notifier::RunNotifier;
pub use test_class::TestClass;
pub use test_type::{Constructor, InstanceState, TestType, TestTypeBuilder};
