//! Default test timeout enforcement.

use std::time::Duration;
use tracing::debug;

use crate::domain::models::{LifecycleKind, TestInstance};

/// Raises test timeouts to a configured floor.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeoutPolicy {
    default_timeout: Option<Duration>,
}

impl TimeoutPolicy {
    /// Policy enforcing `default_timeout`; `None` disables it.
    pub const fn new(default_timeout: Option<Duration>) -> Self {
        Self { default_timeout }
    }

    /// The configured floor.
    pub const fn default_timeout(&self) -> Option<Duration> {
        self.default_timeout
    }

    /// Raise every `Test` method declared by the runtime type of `instance`
    /// whose timeout is below the default. Unset timeouts count as zero and
    /// explicit timeouts above the default are left alone.
    ///
    /// Returns the number of methods raised.
    pub fn apply_default(&self, instance: &TestInstance) -> usize {
        let Some(floor) = self.default_timeout else {
            return 0;
        };

        let raised = instance
            .declared_methods()
            .iter()
            .filter(|method| method.is(LifecycleKind::Test))
            .filter(|method| method.raise_timeout(floor))
            .count();

        if raised > 0 {
            debug!(
                instance = %instance.id(),
                timeout_ms = u64::try_from(floor.as_millis()).unwrap_or(u64::MAX),
                raised,
                "Applied default test timeout"
            );
        }
        raised
    }
}
