//! Service and instance descriptors stored in the registry.
//!
//! Descriptors are the payloads behind service and instance keys, bincode
//! framed by the backend. The registry also registers itself with its own
//! descriptor pair so it is discoverable like any other service.

use std::collections::HashMap;

use serde::Deserialize;
use serde::Serialize;

use crate::constants::REGISTRY_DEFAULT_LEASE_RENEWAL_INTERVAL_S;
use crate::constants::REGISTRY_DEFAULT_LEASE_RETRY_TIMES;
use crate::constants::REGISTRY_SERVICE_ALIAS;
use crate::constants::REGISTRY_SERVICE_NAME;

/// Deployment environment a service is registered under.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Testing,
    Acceptance,
    #[default]
    Production,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ServiceStatus {
    #[default]
    Up,
    Down,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum InstanceStatus {
    #[default]
    Up,
    Starting,
    Testing,
    OutOfService,
    Down,
}

/// How an instance's lease is kept alive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthCheckMode {
    /// The instance pushes heartbeats to the registry
    #[default]
    Push,
    /// The registry probes the instance
    Pull,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthCheck {
    pub mode: HealthCheckMode,
    pub port: u16,
    /// Seconds between lease renewals
    pub interval: u32,
    /// Missed renewals tolerated before the lease lapses
    pub times: u32,
}

impl Default for HealthCheck {
    fn default() -> Self {
        Self {
            mode: HealthCheckMode::Push,
            port: 0,
            interval: REGISTRY_DEFAULT_LEASE_RENEWAL_INTERVAL_S,
            times: REGISTRY_DEFAULT_LEASE_RETRY_TIMES,
        }
    }
}

/// A service registration record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MicroService {
    pub service_id: String,
    pub service_name: String,
    pub alias: String,
    pub version: String,
    pub environment: Environment,
    pub status: ServiceStatus,
    /// Ids of the schemas attached to this service
    pub schemas: Vec<String>,
    pub properties: HashMap<String, String>,
}

/// One running instance of a registered service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MicroServiceInstance {
    pub instance_id: String,
    pub service_id: String,
    pub host_name: String,
    pub endpoints: Vec<String>,
    pub status: InstanceStatus,
    pub version: String,
    pub health_check: Option<HealthCheck>,
    pub properties: HashMap<String, String>,
}

/// The registry's own service record, written during self registration.
pub fn registry_service() -> MicroService {
    MicroService {
        service_name: REGISTRY_SERVICE_NAME.to_string(),
        alias: REGISTRY_SERVICE_ALIAS.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        environment: Environment::Production,
        status: ServiceStatus::Up,
        ..Default::default()
    }
}

/// The registry's own instance record.
pub fn registry_instance() -> MicroServiceInstance {
    MicroServiceInstance {
        status: InstanceStatus::Up,
        version: env!("CARGO_PKG_VERSION").to_string(),
        health_check: Some(HealthCheck::default()),
        ..Default::default()
    }
}
