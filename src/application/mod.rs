pub mod agent;
pub mod hooked_runner;
pub mod lifecycle_hooks;

pub use agent::Agent;
pub use hooked_runner::HookedRunner;
pub use lifecycle_hooks::LifecycleHooks;
