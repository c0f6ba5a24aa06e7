//! Lifecycle methods of a test type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::failure::Outcome;
use super::instance::TestInstance;

/// Lifecycle annotation carried by a method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleKind {
    /// Test body.
    Test,
    /// Per-test setup.
    Before,
    /// Per-test teardown.
    After,
    /// Class-level setup, runs without an instance.
    BeforeClass,
    /// Class-level teardown, runs without an instance.
    AfterClass,
}

impl LifecycleKind {
    /// Whether methods with this annotation run in a static (class-only) context.
    pub const fn is_static(self) -> bool {
        matches!(self, Self::BeforeClass | Self::AfterClass)
    }
}

impl fmt::Display for LifecycleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Test => write!(f, "test"),
            Self::Before => write!(f, "before"),
            Self::After => write!(f, "after"),
            Self::BeforeClass => write!(f, "before_class"),
            Self::AfterClass => write!(f, "after_class"),
        }
    }
}

/// Body of an instance method.
pub type InstanceBody = Arc<dyn Fn(&TestInstance) -> Outcome + Send + Sync>;

/// Body of a static method.
pub type StaticBody = Arc<dyn Fn() -> Outcome + Send + Sync>;

/// Executable body of a method.
#[derive(Clone)]
pub enum MethodBody {
    /// Runs against a test instance.
    Instance(InstanceBody),
    /// Runs without an instance.
    Static(StaticBody),
}

/// One method declared on a test type.
///
/// The timeout is the only piece of metadata that changes after
/// construction; the timeout policy raises it in place and the host reads it
/// when it enforces timeouts.
pub struct FrameworkMethod {
    name: String,
    declaring_type: String,
    kind: Option<LifecycleKind>,
    timeout_ms: AtomicU64,
    body: MethodBody,
}

impl FrameworkMethod {
    /// A `Test` method without an explicit timeout.
    pub fn test<F>(name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&TestInstance) -> Outcome + Send + Sync + 'static,
    {
        Self::instance(name, Some(LifecycleKind::Test), body)
    }

    /// A `Before` method.
    pub fn before<F>(name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&TestInstance) -> Outcome + Send + Sync + 'static,
    {
        Self::instance(name, Some(LifecycleKind::Before), body)
    }

    /// An `After` method.
    pub fn after<F>(name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&TestInstance) -> Outcome + Send + Sync + 'static,
    {
        Self::instance(name, Some(LifecycleKind::After), body)
    }

    /// A `BeforeClass` method.
    pub fn before_class<F>(name: impl Into<String>, body: F) -> Self
    where
        F: Fn() -> Outcome + Send + Sync + 'static,
    {
        Self::with_body(name, Some(LifecycleKind::BeforeClass), MethodBody::Static(Arc::new(body)))
    }

    /// An `AfterClass` method.
    pub fn after_class<F>(name: impl Into<String>, body: F) -> Self
    where
        F: Fn() -> Outcome + Send + Sync + 'static,
    {
        Self::with_body(name, Some(LifecycleKind::AfterClass), MethodBody::Static(Arc::new(body)))
    }

    /// An instance method with an arbitrary (or no) lifecycle annotation.
    pub fn instance<F>(name: impl Into<String>, kind: Option<LifecycleKind>, body: F) -> Self
    where
        F: Fn(&TestInstance) -> Outcome + Send + Sync + 'static,
    {
        Self::with_body(name, kind, MethodBody::Instance(Arc::new(body)))
    }

    fn with_body(name: impl Into<String>, kind: Option<LifecycleKind>, body: MethodBody) -> Self {
        Self {
            name: name.into(),
            declaring_type: String::new(),
            kind,
            timeout_ms: AtomicU64::new(0),
            body,
        }
    }

    /// Set the explicit timeout declared on the annotation.
    #[must_use]
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.set_timeout(timeout);
        self
    }

    pub(crate) fn declared_by(mut self, type_name: &str) -> Self {
        type_name.clone_into(&mut self.declaring_type);
        self
    }

    /// Method name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fully-qualified name of the declaring type.
    pub fn declaring_type(&self) -> &str {
        &self.declaring_type
    }

    /// Lifecycle annotation, if any.
    pub const fn kind(&self) -> Option<LifecycleKind> {
        self.kind
    }

    /// Whether the method carries the given annotation.
    pub fn is(&self, kind: LifecycleKind) -> bool {
        self.kind == Some(kind)
    }

    /// Whether the method runs without an instance.
    pub const fn is_static(&self) -> bool {
        matches!(self.body, MethodBody::Static(_))
    }

    /// Effective timeout. `None` when unset.
    pub fn timeout(&self) -> Option<Duration> {
        match self.timeout_ms.load(Ordering::Acquire) {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }

    /// Effective timeout in milliseconds, `0` when unset.
    pub fn timeout_millis(&self) -> u64 {
        self.timeout_ms.load(Ordering::Acquire)
    }

    /// Overwrite the effective timeout.
    pub fn set_timeout(&self, timeout: Duration) {
        let ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self.timeout_ms.store(ms, Ordering::Release);
    }

    /// Raise the timeout to `floor` when it is currently lower.
    ///
    /// Returns `true` when the timeout changed. The comparison and the store
    /// happen atomically, so concurrent callers cannot lower a raised value.
    pub fn raise_timeout(&self, floor: Duration) -> bool {
        let floor_ms = u64::try_from(floor.as_millis()).unwrap_or(u64::MAX);
        self.timeout_ms.fetch_max(floor_ms, Ordering::AcqRel) < floor_ms
    }

    /// Run the real body of an instance method against `target`.
    pub fn invoke_on(&self, target: &TestInstance) -> Outcome {
        match &self.body {
            MethodBody::Instance(body) => body(target),
            MethodBody::Static(body) => body(),
        }
    }

    /// Run the real body of a static method.
    ///
    /// Instance methods cannot run without a target; calling this on one is
    /// reported as a failure of the call.
    pub fn invoke_static(&self) -> Outcome {
        match &self.body {
            MethodBody::Static(body) => body(),
            MethodBody::Instance(_) => Err(super::failure::Failure::msg(format!(
                "method '{}' of {} requires a test instance",
                self.name, self.declaring_type
            ))),
        }
    }
}

impl fmt::Debug for FrameworkMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameworkMethod")
            .field("name", &self.name)
            .field("declaring_type", &self.declaring_type)
            .field("kind", &self.kind)
            .field("timeout_ms", &self.timeout_millis())
            .field("static", &self.is_static())
            .finish()
    }
}

impl fmt::Display for FrameworkMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.declaring_type, self.name)
    }
}
