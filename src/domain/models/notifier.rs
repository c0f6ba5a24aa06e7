//! Run notification.

use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

use super::description::Description;
use super::failure::Failure;
use super::handles::NotifierId;
use crate::domain::ports::listeners::RunListener;

/// Fans run events out to the attached listeners.
///
/// Owned by the host framework. The engine identifies notifiers by their
/// [`NotifierId`] so it can attach its run listeners exactly once.
pub struct RunNotifier {
    id: NotifierId,
    listeners: RwLock<Vec<Arc<dyn RunListener>>>,
}

impl RunNotifier {
    /// Create a notifier with no listeners.
    pub fn new() -> Self {
        Self {
            id: NotifierId::next(),
            listeners: RwLock::new(Vec::new()),
        }
    }

    /// Stable handle of this notifier.
    pub const fn id(&self) -> NotifierId {
        self.id
    }

    /// Attach a listener; it receives every event fired afterwards.
    pub fn add_listener(&self, listener: Arc<dyn RunListener>) {
        self.listeners.write().push(listener);
    }

    /// Number of attached listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }

    fn each(&self, event: impl Fn(&dyn RunListener)) {
        let listeners = self.listeners.read().clone();
        for listener in &listeners {
            event(listener.as_ref());
        }
    }

    /// A run is about to start.
    pub fn fire_test_run_started(&self, description: &Description) {
        self.each(|listener| listener.test_run_started(description));
    }

    /// A run has finished.
    pub fn fire_test_run_finished(&self, description: &Description) {
        self.each(|listener| listener.test_run_finished(description));
    }

    /// An atomic test is about to start.
    pub fn fire_test_started(&self, description: &Description) {
        self.each(|listener| listener.test_started(description));
    }

    /// An atomic test failed.
    pub fn fire_test_failure(&self, description: &Description, failure: &Failure) {
        self.each(|listener| listener.test_failure(description, failure));
    }

    /// An atomic test assumed a condition that was false.
    pub fn fire_test_assumption_failed(&self, description: &Description, failure: &Failure) {
        self.each(|listener| listener.test_assumption_failure(description, failure));
    }

    /// A test will not be run.
    pub fn fire_test_ignored(&self, description: &Description) {
        self.each(|listener| listener.test_ignored(description));
    }

    /// An atomic test finished, whatever its outcome.
    pub fn fire_test_finished(&self, description: &Description) {
        self.each(|listener| listener.test_finished(description));
    }
}

impl Default for RunNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RunNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunNotifier")
            .field("id", &self.id)
            .field("listeners", &self.listener_count())
            .finish()
    }
}
