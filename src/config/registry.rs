use std::path::PathBuf;

use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;

use super::validate_directory;
use crate::constants::REGISTRY_DEFAULT_LEASE_RENEWAL_INTERVAL_S;
use crate::constants::REGISTRY_DEFAULT_LEASE_RETRY_TIMES;
use crate::constants::REGISTRY_DOMAIN;
use crate::constants::REGISTRY_PROJECT;
use crate::constants::REGISTRY_SERVICE_NAME;
use crate::Error;
use crate::Result;

/// Registry identity and visibility configuration
///
/// Covers the registry's own service descriptor, the source treated as the
/// local authority by the aggregator, and the set of service names every
/// domain is allowed to discover.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RegistryConfig {
    /// Service name the registry registers itself under
    ///
    /// Default: `default_service_name()` (DREGISTRY)
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Tenant domain for self-registration
    #[serde(default = "default_domain")]
    pub domain: String,

    /// Tenant project for self-registration
    #[serde(default = "default_project")]
    pub project: String,

    /// Name of the discovery source treated as the local authority
    ///
    /// The aggregator routes non-shared lookups to this source only.
    #[serde(default = "default_local_source")]
    pub local_source: String,

    /// Comma-separated service names visible to every domain
    ///
    /// Lookups for these services are answered by all sources, not just
    /// the local one.
    #[serde(default)]
    pub global_visible: String,

    /// Heartbeat renewal interval for instance leases, in seconds
    #[serde(default = "default_lease_renewal_interval_secs")]
    pub lease_renewal_interval_secs: u32,

    /// Missed heartbeats tolerated before an instance lease expires
    #[serde(default = "default_lease_retry_times")]
    pub lease_retry_times: u32,

    /// Database storage root directory for the bundled local backend
    ///
    /// Default: `default_db_dir()` (/tmp/registry/db)
    #[serde(default = "default_db_dir")]
    pub db_root_dir: PathBuf,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            service_name: default_service_name(),
            domain: default_domain(),
            project: default_project(),
            local_source: default_local_source(),
            global_visible: String::new(),
            lease_renewal_interval_secs: default_lease_renewal_interval_secs(),
            lease_retry_times: default_lease_retry_times(),
            db_root_dir: default_db_dir(),
        }
    }
}

impl RegistryConfig {
    /// Splits `global_visible` into trimmed, non-empty service names
    pub fn global_visible_services(&self) -> Vec<String> {
        self.global_visible
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Validates registry identity configuration consistency
    pub fn validate(&self) -> Result<()> {
        if self.service_name.is_empty() {
            return Err(Error::Config(ConfigError::Message(
                "service_name cannot be empty".into(),
            )));
        }

        if self.domain.is_empty() || self.project.is_empty() {
            return Err(Error::Config(ConfigError::Message(
                "domain and project cannot be empty".into(),
            )));
        }

        if self.local_source.is_empty() {
            return Err(Error::Config(ConfigError::Message(
                "local_source cannot be empty".into(),
            )));
        }

        if self.lease_renewal_interval_secs == 0 {
            return Err(Error::Config(ConfigError::Message(
                "lease_renewal_interval_secs cannot be 0 (instances would expire immediately)"
                    .into(),
            )));
        }

        validate_directory(&self.db_root_dir, "db_root_dir")?;

        Ok(())
    }
}

fn default_service_name() -> String {
    REGISTRY_SERVICE_NAME.to_string()
}

fn default_domain() -> String {
    REGISTRY_DOMAIN.to_string()
}

fn default_project() -> String {
    REGISTRY_PROJECT.to_string()
}

fn default_local_source() -> String {
    "local".to_string()
}

fn default_lease_renewal_interval_secs() -> u32 {
    REGISTRY_DEFAULT_LEASE_RENEWAL_INTERVAL_S
}

fn default_lease_retry_times() -> u32 {
    REGISTRY_DEFAULT_LEASE_RETRY_TIMES
}

fn default_db_dir() -> PathBuf {
    PathBuf::from("/tmp/registry/db")
}
