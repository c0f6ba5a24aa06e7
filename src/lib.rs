//! Lifecycle Hooks - test lifecycle instrumentation engine
//!
//! Lifecycle Hooks instruments a test framework's runners so that third-party
//! watchers can observe class descriptor creation, test object creation,
//! run start, and every lifecycle method invocation, without the test
//! author changing any test code.
//!
//! # Architecture
//!
//! This crate follows Clean Architecture / Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): Test model, failures and the host/watcher ports
//! - **Service Layer** (`services`): Watcher chains, interception, variants, correlation
//! - **Application Layer** (`application`): The engine context, hooked runners, the agent
//! - **Infrastructure Layer** (`infrastructure`): Instrumentation capability, config, logging
//!
//! # Example
//!
//! ```ignore
//! use lifecycle_hooks::{Agent, RunnerInstrumentation};
//!
//! fn main() -> anyhow::Result<()> {
//!     let instrumentation = RunnerInstrumentation::new();
//!     let agent = Agent::launch(&instrumentation)?;
//!     // Build runners through `instrumentation.instrument(..)` and run them.
//!     let _hooks = agent.hooks();
//!     Ok(())
//! }
//! ```

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod services;

#[doc(hidden)]
pub use inventory;

// Re-export commonly used types for convenience
pub use application::{Agent, HookedRunner, LifecycleHooks};
pub use domain::models::{
    ClassId, Description, Failure, FrameworkMethod, HookedClassNaming, HooksConfig, InstanceId,
    LifecycleKind, LoggingConfig, NotifierId, Outcome, RunNotifier, TestClass, TestInstance,
    TestType, TypeKey,
};
pub use domain::ports::{
    execute, AttachedWatcher, BlockRunner, Instrumentation, InvocationHandler, MethodWatcher,
    RunListener, Runner, RunnerTransformer, ShutdownListener, TestClassWatcher,
    TestObjectWatcher, WatcherCapabilities, WatcherType,
};
pub use domain::{HookError, HookResult, InjectionError};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use infrastructure::logging::{LogConfig, LoggerImpl};
pub use infrastructure::RunnerInstrumentation;
pub use services::{ServiceCatalog, WatcherRegistry};
