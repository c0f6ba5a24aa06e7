//! Watcher Registry
//!
//! Resolves the watcher chain of a test type. Chains are keyed by the
//! nearest type in the ancestry that declares watchers, so a subclass shares
//! its ancestor's chain instead of attaching it again. Each concrete watcher
//! type is instantiated once per registry and shared by every chain that
//! names it.

use parking_lot::RwLock;
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::domain::errors::{HookError, HookResult};
use crate::domain::models::{TestType, TypeKey};
use crate::domain::ports::{AttachedWatcher, WatcherCapabilities, WatcherType};

/// Frozen, ordered list of the watchers applicable to one declaring type.
#[derive(Debug)]
pub struct WatcherChain {
    declared_by: Option<String>,
    watchers: Vec<AttachedWatcher>,
}

impl WatcherChain {
    fn new(declared_by: Option<String>, watchers: Vec<AttachedWatcher>) -> Self {
        Self {
            declared_by,
            watchers,
        }
    }

    /// Type whose declaration produced this chain; `None` for the chain of
    /// types that declare nothing.
    pub fn declared_by(&self) -> Option<&str> {
        self.declared_by.as_deref()
    }

    /// Watchers in registration order.
    pub fn watchers(&self) -> &[AttachedWatcher] {
        &self.watchers
    }

    /// Number of watchers in the chain.
    pub fn len(&self) -> usize {
        self.watchers.len()
    }

    /// Whether the chain has no watchers.
    pub fn is_empty(&self) -> bool {
        self.watchers.is_empty()
    }

    /// Watchers declaring `capability`, last registered first.
    pub fn before_order(
        &self,
        capability: WatcherCapabilities,
    ) -> impl Iterator<Item = &AttachedWatcher> {
        self.watchers.iter().rev().filter(move |watcher| watcher.supports(capability))
    }

    /// Watchers declaring `capability`, first registered first.
    pub fn after_order(
        &self,
        capability: WatcherCapabilities,
    ) -> impl Iterator<Item = &AttachedWatcher> {
        self.watchers.iter().filter(move |watcher| watcher.supports(capability))
    }
}

#[derive(Default)]
struct RegistryState {
    by_type: HashMap<TypeId, AttachedWatcher>,
    watchers: Vec<AttachedWatcher>,
    targeted: Vec<AttachedWatcher>,
    class_only: Vec<AttachedWatcher>,
    chains: HashMap<TypeKey, Arc<WatcherChain>>,
    resolved: HashMap<TypeKey, Arc<WatcherChain>>,
}

impl RegistryState {
    fn register(&mut self, watcher: &AttachedWatcher) -> bool {
        let id = watcher.kind().id();
        if self.by_type.contains_key(&id) {
            return false;
        }
        self.by_type.insert(id, watcher.clone());
        self.watchers.push(watcher.clone());
        if watcher.capabilities().intersects(WatcherCapabilities::TARGETED) {
            self.targeted.push(watcher.clone());
        }
        if watcher.capabilities().intersects(WatcherCapabilities::CLASS_ONLY) {
            self.class_only.push(watcher.clone());
        }
        true
    }
}

/// Registry of attached method watchers and their per-type chains.
pub struct WatcherRegistry {
    default_chain: Arc<WatcherChain>,
    state: RwLock<RegistryState>,
}

impl std::fmt::Debug for WatcherRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("WatcherRegistry")
            .field(
                "watchers",
                &state.watchers.iter().map(|w| w.kind().name()).collect::<Vec<_>>(),
            )
            .field("chains", &state.chains.len())
            .finish()
    }
}

impl Default for WatcherRegistry {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl WatcherRegistry {
    /// Create a registry; `discovered` watchers head every chain, in order.
    pub fn new(discovered: Vec<AttachedWatcher>) -> Self {
        let mut state = RegistryState::default();
        let mut global = Vec::with_capacity(discovered.len());
        for watcher in discovered {
            if state.register(&watcher) {
                global.push(watcher);
            }
        }
        Self {
            default_chain: Arc::new(WatcherChain::new(None, global)),
            state: RwLock::new(state),
        }
    }

    /// Attach the watchers declared for `test_type` and return its chain.
    ///
    /// Attachment happens at most once per declaring type. A declared type
    /// that cannot be instantiated aborts attachment before any watcher of
    /// the declaration is created, and nothing is recorded for the type.
    #[instrument(skip(self, test_type), fields(test_type = %test_type.name()))]
    pub fn attach(&self, test_type: &TestType) -> HookResult<Arc<WatcherChain>> {
        if let Some(chain) = self.state.read().resolved.get(&test_type.key()) {
            return Ok(Arc::clone(chain));
        }

        let Some((declaring, declared)) = test_type.watcher_declaration() else {
            let chain = Arc::clone(&self.default_chain);
            self.state.write().resolved.insert(test_type.key(), Arc::clone(&chain));
            return Ok(chain);
        };

        let mut state = self.state.write();
        if let Some(chain) = state.chains.get(&declaring.key()).cloned() {
            state.resolved.insert(test_type.key(), Arc::clone(&chain));
            return Ok(chain);
        }

        if let Some(missing) = declared
            .iter()
            .find(|kind| !kind.is_instantiable() && !state.by_type.contains_key(&kind.id()))
        {
            return Err(HookError::WatcherNotInstantiable {
                watcher: missing.name(),
                declared_by: declaring.name().to_owned(),
            });
        }

        let mut members = self.default_chain.watchers().to_vec();
        for kind in declared {
            let attached = match state.by_type.get(&kind.id()) {
                Some(existing) => existing.clone(),
                None => {
                    let created = kind.instantiate().ok_or_else(|| {
                        HookError::WatcherNotInstantiable {
                            watcher: kind.name(),
                            declared_by: declaring.name().to_owned(),
                        }
                    })?;
                    state.register(&created);
                    debug!(watcher = kind.name(), "Instantiated method watcher");
                    created
                }
            };
            if !members.iter().any(|member| member.kind() == attached.kind()) {
                members.push(attached);
            }
        }

        let chain = Arc::new(WatcherChain::new(Some(declaring.name().to_owned()), members));
        state.chains.insert(declaring.key(), Arc::clone(&chain));
        state.resolved.insert(test_type.key(), Arc::clone(&chain));
        debug!(
            declared_by = %declaring.name(),
            watchers = chain.len(),
            "Attached watcher chain"
        );
        Ok(chain)
    }

    /// The attached watcher of type `W`, if any.
    pub fn lookup<W>(&self) -> Option<Arc<W>>
    where
        W: std::any::Any + Send + Sync,
    {
        self.state
            .read()
            .by_type
            .get(&TypeId::of::<W>())
            .and_then(AttachedWatcher::downcast::<W>)
    }

    /// The attached watcher of the given type, if any.
    pub fn lookup_type(&self, kind: &WatcherType) -> Option<AttachedWatcher> {
        self.state.read().by_type.get(&kind.id()).cloned()
    }

    /// Every attached watcher, in attachment order.
    pub fn watchers(&self) -> Vec<AttachedWatcher> {
        self.state.read().watchers.clone()
    }

    /// Attached watchers with at least one instance hook.
    pub fn targeted_watchers(&self) -> Vec<AttachedWatcher> {
        self.state.read().targeted.clone()
    }

    /// Attached watchers with at least one class-level hook.
    pub fn class_watchers(&self) -> Vec<AttachedWatcher> {
        self.state.read().class_only.clone()
    }

    /// Whether a chain has been attached for the declaring type `key`.
    pub fn is_attached(&self, key: TypeKey) -> bool {
        self.state.read().chains.contains_key(&key)
    }
}
