//! Configuration for the lifecycle hooks engine.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Top-level engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct HooksConfig {
    /// Default timeout applied to test methods with a smaller or unset timeout.
    pub default_test_timeout_ms: Option<u64>,
    /// Naming scheme of generated intercepting variants.
    pub hooked_class_naming: HookedClassNaming,
    /// Logging settings.
    pub logging: LoggingConfig,
}

impl HooksConfig {
    /// Configured default test timeout.
    pub fn default_test_timeout(&self) -> Option<Duration> {
        self.default_test_timeout_ms.map(Duration::from_millis)
    }

    /// Set the default test timeout.
    #[must_use]
    pub fn with_default_test_timeout(mut self, timeout: Duration) -> Self {
        self.default_test_timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }
}

/// How generated variants are named.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum HookedClassNaming {
    /// `com.acme.FooTest` becomes `com.acme.FooTestHooked`.
    #[default]
    Suffix,
    /// `com.acme.FooTest` becomes `com.acme.HookedFooTest`, keeping the
    /// variant next to its source in surefire/failsafe style report layouts.
    PackagePrefix,
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    pub level: String,
    /// Output format (json, pretty).
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
