//! The assembled registry handle.
//!
//! ## Key Responsibilities
//! - Owns the storage backend and the cached discovery indexers
//! - Exposes the find path, the registrar and the schema store
//! - Tracks the background refresher tasks for graceful shutdown

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::backend::RegistryBackend;
use crate::config::Settings;
use crate::discovery::AggregatorIndexer;
use crate::instance::Finder;
use crate::schema::SchemaStore;
use crate::service::GlobalVisibility;
use crate::service::Registrar;

/// A fully wired registry.
///
/// Construction goes through `RegistryBuilder`; dropping the handle does not
/// stop the background refreshers, [`Registry::shutdown`] does.
pub struct Registry {
    pub(super) settings: Arc<Settings>,
    pub(super) backend: Arc<dyn RegistryBackend>,
    pub(super) services: Arc<AggregatorIndexer>,
    pub(super) instances: Arc<AggregatorIndexer>,
    pub(super) finder: Finder,
    pub(super) registrar: Registrar,
    pub(super) schemas: SchemaStore,
    pub(super) globals: Arc<GlobalVisibility>,
    pub(super) domain_project: String,
    pub(super) cacher_handles: Vec<JoinHandle<()>>,
    pub(super) shutdown_signal: CancellationToken,
}

// Tests unwrap construction results; the backend trait object keeps this
// from being derived.
impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry").finish_non_exhaustive()
    }
}

impl Registry {
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn backend(&self) -> Arc<dyn RegistryBackend> {
        self.backend.clone()
    }

    /// Routing surface over the service record range
    pub fn services(&self) -> Arc<AggregatorIndexer> {
        self.services.clone()
    }

    /// Routing surface over the instance record range
    pub fn instances(&self) -> Arc<AggregatorIndexer> {
        self.instances.clone()
    }

    pub fn finder(&self) -> &Finder {
        &self.finder
    }

    pub fn registrar(&self) -> &Registrar {
        &self.registrar
    }

    pub fn schemas(&self) -> &SchemaStore {
        &self.schemas
    }

    pub fn globals(&self) -> Arc<GlobalVisibility> {
        self.globals.clone()
    }

    /// `{domain}/{project}` scope this registry serves
    pub fn domain_project(&self) -> &str {
        &self.domain_project
    }

    /// Cancels the shutdown token and waits for the refreshers to drain.
    pub async fn shutdown(self) {
        self.shutdown_signal.cancel();
        for handle in self.cacher_handles {
            if let Err(e) = handle.await {
                warn!("cache refresher ended abnormally: {:?}", e);
            }
        }
    }
}
