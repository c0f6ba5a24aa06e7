//! Infrastructure layer module
//!
//! This module contains the adapters around the engine:
//! - In-process instrumentation capability
//! - Configuration management
//! - Logging infrastructure
//!
//! Infrastructure implementations satisfy the port traits defined in the domain layer.

pub mod config;
pub mod instrumentation;
pub mod logging;

pub use instrumentation::RunnerInstrumentation;
