//! Registry-wide visibility of shared services.

use dashmap::DashSet;
use tracing::debug;

use crate::constants::REGISTRY_SERVICE_NAME;

/// Names of services every domain/project may discover.
///
/// A find for a registered name is aggregated across all configured
/// sources; anything else resolves against the designated local source
/// only. The set is seeded at startup and may grow at runtime.
#[derive(Debug, Default)]
pub struct GlobalVisibility {
    services: DashSet<String>,
}

impl GlobalVisibility {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the set from configuration. The registry's own name is always
    /// included so its instances stay discoverable from every scope.
    pub fn seed(names: impl IntoIterator<Item = String>) -> Self {
        let visibility = Self::new();
        for name in names {
            visibility.register(name);
        }
        visibility.register(REGISTRY_SERVICE_NAME.to_string());
        visibility
    }

    pub fn register(
        &self,
        service_name: String,
    ) {
        if service_name.is_empty() {
            return;
        }
        if self.services.insert(service_name.clone()) {
            debug!("service '{}' is now globally visible", service_name);
        }
    }

    pub fn is_global(
        &self,
        service_name: &str,
    ) -> bool {
        self.services.contains(service_name)
    }
}
