//! Shutdown hook registrar.

use parking_lot::Mutex;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::domain::ports::ShutdownListener;

/// Runs registered shutdown listeners exactly once.
///
/// Listeners run in registration order when [`ShutdownHooks::run`] is called
/// or when the registrar is dropped, whichever comes first. A panicking
/// listener is logged and does not stop the others.
#[derive(Default)]
pub struct ShutdownHooks {
    pending: Mutex<Vec<Arc<dyn ShutdownListener>>>,
}

impl std::fmt::Debug for ShutdownHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShutdownHooks")
            .field("pending", &self.pending.lock().len())
            .finish()
    }
}

impl ShutdownHooks {
    /// Create an empty registrar.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `listeners` to run at shutdown.
    pub fn register<I>(&self, listeners: I)
    where
        I: IntoIterator<Item = Arc<dyn ShutdownListener>>,
    {
        let mut pending = self.pending.lock();
        let before = pending.len();
        pending.extend(listeners);
        debug!(registered = pending.len() - before, "Registered shutdown listeners");
    }

    /// Number of listeners that have not run yet.
    pub fn pending(&self) -> usize {
        self.pending.lock().len()
    }

    /// Run every pending listener; returns how many completed normally.
    pub fn run(&self) -> usize {
        let listeners = std::mem::take(&mut *self.pending.lock());
        let total = listeners.len();
        let completed = listeners
            .into_iter()
            .filter(|listener| {
                let outcome = catch_unwind(AssertUnwindSafe(|| listener.on_shutdown()));
                if outcome.is_err() {
                    warn!("Shutdown listener panicked");
                }
                outcome.is_ok()
            })
            .count();
        if total > 0 {
            debug!(total, completed, "Ran shutdown listeners");
        }
        completed
    }
}

impl Drop for ShutdownHooks {
    fn drop(&mut self) {
        self.run();
    }
}
