//! Domain layer for test lifecycle instrumentation
//!
//! This module contains the engine's data model and the ports through which
//! it talks to the host framework and to watchers.

pub mod errors;
pub mod models;
pub mod ports;

// Re-export error types for convenient access
pub use errors::{HookError, HookResult, InjectionError};
