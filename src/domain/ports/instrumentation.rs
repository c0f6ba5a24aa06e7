//! Behavior-injection capability port.
//!
//! The engine never rewrites host code itself. It hands a
//! [`RunnerTransformer`] to whatever [`Instrumentation`] the host provides,
//! and the host routes every runner it builds through the registered
//! transformers.

use std::sync::Arc;

use super::runner::Runner;
use crate::domain::errors::InjectionError;

/// Rewrites a runner, typically by wrapping it.
pub trait RunnerTransformer: Send + Sync {
    /// Return the runner the host should use instead of `runner`.
    fn transform(&self, runner: Arc<dyn Runner>) -> Arc<dyn Runner>;
}

/// Capability to reroute the host framework's runner extension points.
pub trait Instrumentation: Send + Sync {
    /// Register a transformer for every runner built from now on.
    fn add_transformer(&self, transformer: Arc<dyn RunnerTransformer>)
        -> Result<(), InjectionError>;
}
