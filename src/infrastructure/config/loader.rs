use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use std::path::Path;
use thiserror::Error;

use crate::domain::models::config::HooksConfig;

/// Project configuration file.
pub const CONFIG_FILE: &str = "lifecycle-hooks.yaml";

/// Optional local overrides, not meant to be committed.
pub const LOCAL_CONFIG_FILE: &str = "lifecycle-hooks.local.yaml";

/// Prefix of environment overrides.
pub const ENV_PREFIX: &str = "LIFECYCLE_HOOKS_";

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid default_test_timeout_ms: {0}. Must be positive when set")]
    InvalidDefaultTimeout(u64),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. lifecycle-hooks.yaml (project config)
    /// 3. lifecycle-hooks.local.yaml (local overrides, optional)
    /// 4. Environment variables (LIFECYCLE_HOOKS_* prefix, `__` for nesting)
    pub fn load() -> Result<HooksConfig> {
        Self::load_from_dir(".")
    }

    /// Same layering as [`ConfigLoader::load`], with files resolved in `dir`.
    pub fn load_from_dir(dir: impl AsRef<Path>) -> Result<HooksConfig> {
        let dir = dir.as_ref();
        let config: HooksConfig = Figment::new()
            .merge(Serialized::defaults(HooksConfig::default()))
            .merge(Yaml::file(dir.join(CONFIG_FILE)))
            .merge(Yaml::file(dir.join(LOCAL_CONFIG_FILE)))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<HooksConfig> {
        let config: HooksConfig = Figment::new()
            .merge(Serialized::defaults(HooksConfig::default()))
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .with_context(|| format!("Failed to load config from {}", path.as_ref().display()))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &HooksConfig) -> Result<(), ConfigError> {
        if config.default_test_timeout_ms == Some(0) {
            return Err(ConfigError::InvalidDefaultTimeout(0));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        Ok(())
    }
}
