//! Layered discovery path of the registry.
//!
//! A query enters through [`AggregatorIndexer`], which routes it to the
//! snapshot cache, the single local source, or a best-effort fan-out over
//! every configured source, depending on the request's `global`, `no_cache`
//! and `cache_only` flags. All layers speak the same [`Indexer`] surface, so
//! they compose freely.
mod adaptors_indexer;
mod aggregator;
mod cache;
mod cache_indexer;
mod cacher;
mod types;

pub use adaptors_indexer::AdaptorsIndexer;
pub use aggregator::Aggregator;
pub use aggregator::AggregatorIndexer;
pub use cache::KvCache;
pub use cache_indexer::CacheIndexer;
pub use cacher::Cacher;
pub use types::KeyValue;
pub use types::Response;
pub use types::SearchRequest;


// Trait definition of the current module
// -----------------------------------------------------------------------------
// Core model of the discovery path: source capability and composable indexers
//

use std::sync::Arc;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::Result;

/// One registry backend exposed to the discovery path.
///
/// The discovery layers never assume a call succeeds; every call site either
/// tolerates a failure or propagates it, depending on whether the path is
/// best-effort or authoritative.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Adaptor: Send + Sync + 'static {
    /// Stable identifier of this source, unique within one aggregator
    fn name(&self) -> &str;

    /// Executes one live query against the backing registry
    async fn search(
        &self,
        req: &SearchRequest,
    ) -> Result<Response>;

    /// Whether results from this source may be treated as authoritative
    /// and complete
    fn creditable(&self) -> bool;
}

/// A composable search layer over one or more sources.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Indexer: Send + Sync + 'static {
    async fn search(
        &self,
        req: &SearchRequest,
    ) -> Result<Response>;

    fn creditable(&self) -> bool;
}

/// Exposes a single source through the [`Indexer`] surface.
pub struct SingleAdaptorIndexer {
    adaptor: Arc<dyn Adaptor>,
}

impl SingleAdaptorIndexer {
    pub fn new(adaptor: Arc<dyn Adaptor>) -> Self {
        Self { adaptor }
    }
}

#[async_trait]
impl Indexer for SingleAdaptorIndexer {
    async fn search(
        &self,
        req: &SearchRequest,
    ) -> Result<Response> {
        self.adaptor.search(req).await
    }

    fn creditable(&self) -> bool {
        self.adaptor.creditable()
    }
}
