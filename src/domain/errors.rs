//! Domain errors for the lifecycle hooks engine.

use thiserror::Error;

use super::models::{ClassId, InstanceId};

/// Errors raised by the engine itself.
///
/// Configuration errors (`WatcherNotInstantiable`, `VariantInstantiation`)
/// and lookup errors (`InstanceNotFound`, `RunnerNotFound`) are fatal to the
/// calling operation and never retried.
#[derive(Debug, Error)]
pub enum HookError {
    #[error("Unable to instantiate watcher: {watcher} (declared by {declared_by})")]
    WatcherNotInstantiable {
        watcher: &'static str,
        declared_by: String,
    },

    #[error(
        "Unable to instantiate enhanced variant {variant} of {source_type}: no default constructor"
    )]
    VariantInstantiation {
        variant: String,
        source_type: String,
    },

    #[error("No associated test class was found for {0}")]
    InstanceNotFound(InstanceId),

    #[error("No associated runner was found for {0}")]
    RunnerNotFound(ClassId),

    #[error("Behavior injection failed: {0}")]
    Injection(#[from] InjectionError),

    #[error("Host framework failed to construct {what}: {source:#}")]
    Construction {
        what: &'static str,
        source: anyhow::Error,
    },
}

impl HookError {
    /// Whether this is a lookup on an unset correlation key.
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::InstanceNotFound(_) | Self::RunnerNotFound(_))
    }
}

/// Errors reported by a behavior-injection capability.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InjectionError {
    #[error("instrumentation no longer accepts transformers")]
    Closed,

    #[error("transformer rejected: {0}")]
    Rejected(String),
}

/// Result alias for engine operations.
pub type HookResult<T> = Result<T, HookError>;
