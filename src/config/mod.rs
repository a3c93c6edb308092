//! Configuration management module for the registry discovery engine.
//!
//! Provides hierarchical configuration loading and validation with:
//! - Default values as code base
//! - Environment variable overrides
//! - Configuration file support
//! - Component-wise validation
mod cache;
mod cooldown;
mod registry;

pub use cache::*;
pub use cooldown::*;
pub use registry::*;

#[cfg(test)]
mod config_test;

use std::env;
use std::fmt::Debug;
use std::path::Path;

use config::Config;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

/// Main configuration container for the registry discovery components
///
/// Combines all subsystem configurations with hierarchical override support:
/// 1. Default values from code implementation
/// 2. Configuration file passed to `load()` or named by `CONFIG_PATH`
/// 3. Environment variables (highest priority)
#[derive(Serialize, Deserialize, Clone, Default)]
pub struct Settings {
    /// Registry identity and visibility configuration
    pub registry: RegistryConfig,
    /// Discovery cache tuning parameters
    pub cache: CacheConfig,
    /// Stale-entry repair policy for the find cache
    pub cooldown: CooldownPolicy,
}

impl Debug for Settings {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("Settings").field("registry", &self.registry).finish()
    }
}

impl Settings {
    /// Loads configuration from hierarchical sources without validation.
    ///
    /// Configuration sources are merged in the following order (later sources override earlier):
    /// 1. Type defaults (lowest priority)
    /// 2. Explicit `config_path` file, if provided
    /// 3. Configuration file from `CONFIG_PATH` environment variable (if set)
    /// 4. Environment variables with `REGISTRY__` prefix (highest priority)
    ///
    /// # Note
    /// This method does NOT validate the configuration. Validation is deferred to allow
    /// further overrides via `with_override_config()`. Callers MUST call `validate()`
    /// before using the configuration.
    ///
    /// # Examples
    /// ```ignore
    /// // Load with default values only
    /// let cfg = Settings::load(None)?.validate()?;
    ///
    /// // Load with config file and environment variables
    /// std::env::set_var("REGISTRY__CACHE__REFRESH_INTERVAL_MS", "10000");
    /// let cfg = Settings::load(Some("config/registry.toml"))?.validate()?;
    /// ```
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        if let Ok(env_path) = env::var("CONFIG_PATH") {
            builder = builder.add_source(File::with_name(&env_path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix("REGISTRY")
                .separator("__")
                .ignore_empty(true)
                .try_parsing(true),
        );

        let config: Self = builder.build()?.try_deserialize()?;
        Ok(config) // No validation - deferred to validate()
    }

    /// Applies additional configuration overrides from file without validation.
    ///
    /// Merging order (later sources override earlier):
    /// 1. Current configuration values
    /// 2. New configuration file
    /// 3. Latest environment variables (highest priority)
    pub fn with_override_config(
        &self,
        path: &str,
    ) -> Result<Self> {
        let config: Self = Config::builder()
            .add_source(Config::try_from(self)?)
            .add_source(File::with_name(path))
            .add_source(
                Environment::with_prefix("REGISTRY")
                    .separator("__")
                    .ignore_empty(true)
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        Ok(config) // No validation - deferred to validate()
    }

    /// Validates configuration and returns validated instance.
    ///
    /// Consumes self and performs validation of all subsystems. Must be called
    /// after all configuration overrides to ensure the final config is valid.
    pub fn validate(self) -> Result<Self> {
        self.registry.validate()?;
        self.cache.validate()?;
        self.cooldown.validate()?;
        Ok(self)
    }
}

/// Ensures directory path is valid and writable
pub(super) fn validate_directory(
    path: &Path,
    name: &str,
) -> Result<()> {
    if path.as_os_str().is_empty() {
        return Err(Error::Config(ConfigError::Message(format!(
            "{name} path cannot be empty"
        ))));
    }

    #[cfg(not(test))]
    {
        use std::fs;
        // Check directory existence or create ability
        if !path.exists() {
            fs::create_dir_all(path).map_err(|e| {
                Error::Config(ConfigError::Message(format!(
                    "Failed to create {} directory at {}: {}",
                    name,
                    path.display(),
                    e
                )))
            })?;
        }

        // Check write permissions
        let test_file = path.join(".permission_test");
        fs::write(&test_file, b"test").map_err(|e| {
            Error::Config(ConfigError::Message(format!(
                "No write permission in {} directory {}: {}",
                name,
                path.display(),
                e
            )))
        })?;
        fs::remove_file(&test_file).ok();
    }

    Ok(())
}
