//! Service records, shared visibility and self registration.

mod descriptor;
mod global;
mod registrar;

pub use descriptor::registry_instance;
pub use descriptor::registry_service;
pub use descriptor::Environment;
pub use descriptor::HealthCheck;
pub use descriptor::HealthCheckMode;
pub use descriptor::InstanceStatus;
pub use descriptor::MicroService;
pub use descriptor::MicroServiceInstance;
pub use descriptor::ServiceStatus;
pub use global::GlobalVisibility;
pub use registrar::Registrar;

#[cfg(test)]
mod global_test;
