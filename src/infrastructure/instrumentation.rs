//! In-process instrumentation capability.
//!
//! Hosts that build their runners in the same process use
//! [`RunnerInstrumentation`] as their behavior-injection capability: every
//! runner the host constructs is passed through [`RunnerInstrumentation::instrument`]
//! before it is used.

use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, trace};

use crate::domain::errors::InjectionError;
use crate::domain::ports::{Instrumentation, Runner, RunnerTransformer};

#[derive(Default)]
struct State {
    transformers: Vec<Arc<dyn RunnerTransformer>>,
    closed: bool,
}

/// Transformer registry applied to runners as the host builds them.
#[derive(Default)]
pub struct RunnerInstrumentation {
    state: RwLock<State>,
}

impl std::fmt::Debug for RunnerInstrumentation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("RunnerInstrumentation")
            .field("transformers", &state.transformers.len())
            .field("closed", &state.closed)
            .finish()
    }
}

impl RunnerInstrumentation {
    /// Create an open capability with no transformers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pass `runner` through every registered transformer, in registration order.
    pub fn instrument(&self, runner: Arc<dyn Runner>) -> Arc<dyn Runner> {
        let transformers = self.state.read().transformers.clone();
        trace!(transformers = transformers.len(), "Instrumenting runner");
        transformers
            .iter()
            .fold(runner, |runner, transformer| transformer.transform(runner))
    }

    /// Stop accepting transformers. Registered ones stay in effect.
    pub fn close(&self) {
        self.state.write().closed = true;
        debug!("Instrumentation closed");
    }

    /// Number of registered transformers.
    pub fn transformer_count(&self) -> usize {
        self.state.read().transformers.len()
    }
}

impl Instrumentation for RunnerInstrumentation {
    fn add_transformer(
        &self,
        transformer: Arc<dyn RunnerTransformer>,
    ) -> Result<(), InjectionError> {
        let mut state = self.state.write();
        if state.closed {
            return Err(InjectionError::Closed);
        }
        state.transformers.push(transformer);
        debug!(transformers = state.transformers.len(), "Registered runner transformer");
        Ok(())
    }
}
