//! Creation watchers, run listeners and shutdown listeners.

use std::sync::Arc;

use super::runner::Runner;
use crate::domain::models::{Description, Failure, TestClass, TestInstance};

/// Notified whenever the host framework builds a class descriptor.
pub trait TestClassWatcher: Send + Sync {
    /// A descriptor was built by `runner`.
    fn test_class_created(&self, test_class: &Arc<TestClass>, runner: &Arc<dyn Runner>);
}

/// Notified whenever a test instance is constructed.
pub trait TestObjectWatcher: Send + Sync {
    /// `instance` (already enhanced) was created for `test_class`.
    fn test_object_created(&self, instance: &TestInstance, test_class: &Arc<TestClass>);
}

/// Receives run events from a [`RunNotifier`](crate::domain::models::RunNotifier).
///
/// Every callback defaults to a no-op.
pub trait RunListener: Send + Sync {
    /// A run is about to start.
    fn test_run_started(&self, _description: &Description) {}

    /// A run has finished.
    fn test_run_finished(&self, _description: &Description) {}

    /// An atomic test is about to start.
    fn test_started(&self, _description: &Description) {}

    /// An atomic test finished, whatever its outcome.
    fn test_finished(&self, _description: &Description) {}

    /// An atomic test failed.
    fn test_failure(&self, _description: &Description, _failure: &Failure) {}

    /// An atomic test assumed a condition that was false.
    fn test_assumption_failure(&self, _description: &Description, _failure: &Failure) {}

    /// A test will not be run.
    fn test_ignored(&self, _description: &Description) {}
}

/// Callback run when the process shuts down.
pub trait ShutdownListener: Send + Sync {
    /// The process is shutting down.
    fn on_shutdown(&self);
}
