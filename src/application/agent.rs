//! Agent entry point.
//!
//! The agent is what a host process starts before building any runner: it
//! creates the engine, installs it into the host's instrumentation
//! capability and queues the discovered shutdown listeners.

use anyhow::Context;
use std::sync::Arc;
use tracing::{info, warn};

use super::lifecycle_hooks::LifecycleHooks;
use crate::domain::errors::HookResult;
use crate::domain::models::HooksConfig;
use crate::domain::ports::Instrumentation;
use crate::infrastructure::config::ConfigLoader;
use crate::infrastructure::logging::{LogConfig, LoggerImpl};
use crate::services::{ServiceCatalog, ShutdownHooks};

/// A running engine together with its shutdown hooks.
///
/// Dropping the agent runs the shutdown listeners. They are tied to the
/// agent's lifetime, not to process exit: an agent kept in a `static`, or a
/// process ended with [`std::process::exit`], never runs them. Hosts in that
/// position call [`Agent::shutdown`] themselves before exiting.
pub struct Agent {
    hooks: Arc<LifecycleHooks>,
    shutdown: ShutdownHooks,
    // Dropped last so shutdown listeners can still log.
    logger: Option<LoggerImpl>,
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("hooks", &self.hooks)
            .field("shutdown", &self.shutdown)
            .field("logger", &self.logger.is_some())
            .finish()
    }
}

impl Agent {
    /// Start the engine with an explicit configuration and catalog.
    ///
    /// Logging is left to the host.
    pub fn start(
        config: HooksConfig,
        catalog: ServiceCatalog,
        instrumentation: &dyn Instrumentation,
    ) -> HookResult<Self> {
        let shutdown = ShutdownHooks::new();
        shutdown.register(catalog.shutdown_listeners().iter().cloned());

        let hooks = LifecycleHooks::new(config, catalog);
        hooks.install(instrumentation)?;
        Ok(Self {
            hooks,
            shutdown,
            logger: None,
        })
    }

    /// Start the engine from the layered configuration files and the
    /// services registered for discovery.
    ///
    /// The `logging` section of the configuration initializes the global
    /// tracing subscriber. When the host already installed one, that
    /// subscriber is kept and the section is ignored.
    pub fn launch(instrumentation: &dyn Instrumentation) -> anyhow::Result<Self> {
        let config = ConfigLoader::load().context("Failed to load lifecycle hooks configuration")?;
        let logger = match LoggerImpl::init(&LogConfig::from(&config.logging)) {
            Ok(logger) => Some(logger),
            Err(err) => {
                warn!(error = %err, "Keeping the host's tracing subscriber");
                None
            }
        };

        let mut agent = Self::start(config, ServiceCatalog::discover(), instrumentation)
            .context("Failed to install lifecycle hooks")?;
        agent.logger = logger;
        info!("Lifecycle hooks agent launched");
        Ok(agent)
    }

    /// Logger initialized by [`Agent::launch`], if it installed one.
    pub fn logger(&self) -> Option<&LoggerImpl> {
        self.logger.as_ref()
    }

    /// The engine.
    pub fn hooks(&self) -> &Arc<LifecycleHooks> {
        &self.hooks
    }

    /// Run the shutdown listeners now instead of on drop.
    pub fn shutdown(&self) -> usize {
        self.shutdown.run()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::ShutdownListener;
    use crate::infrastructure::instrumentation::RunnerInstrumentation;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counting(AtomicUsize);

    impl ShutdownListener for Counting {
        fn on_shutdown(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn agent_with(listener: &Arc<Counting>) -> Agent {
        let catalog = ServiceCatalog::builder()
            .shutdown_listener(Arc::clone(listener) as Arc<dyn ShutdownListener>)
            .build();
        Agent::start(HooksConfig::default(), catalog, &RunnerInstrumentation::new()).unwrap()
    }

    #[test]
    fn test_explicit_shutdown_runs_listeners_once() {
        let listener = Arc::new(Counting::default());
        let agent = agent_with(&listener);

        assert_eq!(agent.shutdown(), 1);
        assert_eq!(listener.0.load(Ordering::SeqCst), 1);
        assert_eq!(agent.shutdown(), 0);
        drop(agent);
        assert_eq!(listener.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_leaked_agent_never_runs_listeners() {
        let listener = Arc::new(Counting::default());
        let agent: &'static Agent = Box::leak(Box::new(agent_with(&listener)));

        assert!(agent.hooks().is_installed());
        assert_eq!(listener.0.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_started_agent_leaves_logging_to_host() {
        let listener = Arc::new(Counting::default());
        assert!(agent_with(&listener).logger().is_none());
    }
}
