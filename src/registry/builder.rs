//! A builder pattern implementation for assembling a running [`Registry`].
//!
//! The [`RegistryBuilder`] provides a fluent interface to configure and wire
//! the components of the registry: the storage backend, the cached discovery
//! indexers with their background refreshers, the find path and the write
//! surfaces.
//!
//! ## Key Design Points
//! - **Default Components**: opens the bundled sled backend when no custom
//!   backend is supplied.
//! - **Customization**: allows overriding the storage layer via `backend()`.
//! - **Lifecycle Management**: `build()` validates the configuration, spawns
//!   one cache refresher per watched range and registers the registry under
//!   its own service name before handing back the assembled [`Registry`].
//!
//! ## Example
//! ```ignore
//! let shutdown = CancellationToken::new();
//! let registry = RegistryBuilder::new(None, shutdown.clone())?
//!     .build()
//!     .await?;
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::info;

use super::Registry;
use crate::backend::BackendAdaptor;
use crate::backend::RegistryBackend;
use crate::backend::SledBackend;
use crate::config::Settings;
use crate::discovery::Adaptor;
use crate::discovery::AdaptorsIndexer;
use crate::discovery::Aggregator;
use crate::discovery::AggregatorIndexer;
use crate::discovery::Cacher;
use crate::discovery::Indexer;
use crate::discovery::KvCache;
use crate::instance::Finder;
use crate::keyspace;
use crate::schema::SchemaStore;
use crate::service::GlobalVisibility;
use crate::service::Registrar;
use crate::Result;

/// Builder for a [`Registry`] with configurable components.
pub struct RegistryBuilder {
    pub(super) settings: Settings,
    pub(super) backend: Option<Arc<dyn RegistryBackend>>,
    pub(super) shutdown_signal: CancellationToken,
}

impl RegistryBuilder {
    /// Creates a builder with configuration loaded from the hierarchical
    /// sources (defaults, the optional file, environment variables).
    ///
    /// # Arguments
    /// * `config_path` - Optional path to a configuration file
    /// * `shutdown_signal` - Cancellation token for graceful shutdown
    pub fn new(
        config_path: Option<&str>,
        shutdown_signal: CancellationToken,
    ) -> Result<Self> {
        if let Some(p) = config_path {
            info!("loading configuration from: {}", p);
        }
        let settings = Settings::load(config_path)?;
        Ok(Self::from_settings(settings, shutdown_signal))
    }

    /// Constructs a builder from in-memory settings
    pub fn from_settings(
        settings: Settings,
        shutdown_signal: CancellationToken,
    ) -> Self {
        Self {
            settings,
            backend: None,
            shutdown_signal,
        }
    }

    /// Sets a custom storage backend implementation
    pub fn backend(
        mut self,
        backend: Arc<dyn RegistryBackend>,
    ) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Finalizes the builder and assembles the running registry.
    ///
    /// Validates the configuration, then wires the default components around
    /// any overrides:
    /// - Opens the sled backend under `db_root_dir` when none is set
    /// - Builds the cached service and instance indexers over the backend
    /// - Spawns one background refresher per watched range
    /// - Registers the registry's own service and instance records
    pub async fn build(mut self) -> Result<Registry> {
        let settings = self.settings.validate()?;
        let domain_project =
            keyspace::domain_project(&settings.registry.domain, &settings.registry.project);

        let backend = match self.backend.take() {
            Some(backend) => backend,
            None => Arc::new(SledBackend::open(
                &settings.registry.db_root_dir,
                settings.registry.local_source.as_str(),
            )?) as Arc<dyn RegistryBackend>,
        };

        let adaptors: Vec<Arc<dyn Adaptor>> =
            vec![Arc::new(BackendAdaptor::new(backend.clone()))];
        let search_timeout = Duration::from_millis(settings.cache.search_timeout_ms);

        let service_cache = Arc::new(KvCache::new(
            "services",
            keyspace::service_root(&domain_project),
        ));
        let instance_cache = Arc::new(KvCache::new(
            "instances",
            keyspace::instance_root(&domain_project),
        ));

        let service_aggregator = Aggregator::new(
            adaptors.clone(),
            Some(settings.registry.local_source.as_str()),
            service_cache.clone(),
        )?;
        let instance_aggregator = Aggregator::new(
            adaptors.clone(),
            Some(settings.registry.local_source.as_str()),
            instance_cache.clone(),
        )?;
        let services = Arc::new(AggregatorIndexer::new(&service_aggregator, search_timeout));
        let instances = Arc::new(AggregatorIndexer::new(&instance_aggregator, search_timeout));

        // Both caches refresh from the full fan-out, not the local source alone
        let refresh_source: Arc<dyn Indexer> =
            Arc::new(AdaptorsIndexer::new(adaptors, search_timeout));
        let cacher_handles = vec![
            Cacher::new(service_cache, refresh_source.clone(), &settings.cache)
                .spawn(self.shutdown_signal.clone()),
            Cacher::new(instance_cache, refresh_source, &settings.cache)
                .spawn(self.shutdown_signal.clone()),
        ];

        let globals = Arc::new(GlobalVisibility::seed(
            settings.registry.global_visible_services(),
        ));
        let finder = Finder::new(
            services.clone(),
            instances.clone(),
            globals.clone(),
            settings.cooldown,
            settings.cache.find_cache_capacity,
        );
        let registrar = Registrar::new(backend.clone(), domain_project.clone());
        let schemas = SchemaStore::new(backend.clone(), domain_project.clone());

        let (service_id, instance_id) =
            registrar.register_self(&settings.registry.service_name).await?;
        info!(
            "registry online as service [{}] instance [{}] in {}",
            service_id, instance_id, domain_project
        );

        Ok(Registry {
            settings: Arc::new(settings),
            backend,
            services,
            instances,
            finder,
            registrar,
            schemas,
            globals,
            domain_project,
            cacher_handles,
            shutdown_signal: self.shutdown_signal,
        })
    }
}
