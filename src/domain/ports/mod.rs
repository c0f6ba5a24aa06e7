//! Ports: the traits through which the engine meets the host framework and
//! third-party watchers.

pub mod instrumentation;
pub mod interception;
pub mod listeners;
pub mod runner;
pub mod watchers;

pub use instrumentation::{Instrumentation, RunnerTransformer};
pub use interception::{InvocationHandler, SuperCall};
pub use listeners::{RunListener, ShutdownListener, TestClassWatcher, TestObjectWatcher};
pub use runner::{execute, BlockRunner, Runner};
pub use watchers::{AttachedWatcher, MethodWatcher, WatcherCapabilities, WatcherType};
