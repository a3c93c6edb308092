//! Top-level routing across the cache, local, and fan-out search paths.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use super::Adaptor;
use super::AdaptorsIndexer;
use super::CacheIndexer;
use super::Indexer;
use super::KvCache;
use super::Response;
use super::SearchRequest;
use super::SingleAdaptorIndexer;
use crate::DiscoveryError;
use crate::Result;

/// The set of sources one discovery path is built from.
///
/// Holds every configured source, the optional designation of one of them
/// as the local authority, and the snapshot cache shared by the composed
/// indexers.
pub struct Aggregator {
    adaptors: Vec<Arc<dyn Adaptor>>,
    local_index: Option<usize>,
    cache: Arc<KvCache>,
}

// Tests unwrap construction results; the adaptor trait objects keep this
// from being derived.
impl std::fmt::Debug for Aggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Aggregator").finish_non_exhaustive()
    }
}

impl Aggregator {
    /// Composes the configured sources.
    ///
    /// `local_source` names the adaptor treated as the local authority;
    /// naming a source that is not configured is a construction error.
    pub fn new(
        adaptors: Vec<Arc<dyn Adaptor>>,
        local_source: Option<&str>,
        cache: Arc<KvCache>,
    ) -> Result<Self> {
        let local_index = match local_source {
            Some(name) => Some(
                adaptors
                    .iter()
                    .position(|a| a.name() == name)
                    .ok_or_else(|| DiscoveryError::UnknownLocalSource(name.to_string()))?,
            ),
            None => None,
        };

        Ok(Self {
            adaptors,
            local_index,
            cache,
        })
    }

    pub fn adaptors(&self) -> &[Arc<dyn Adaptor>] {
        &self.adaptors
    }

    /// The designated local authority, if one is configured
    pub fn local(&self) -> Option<Arc<dyn Adaptor>> {
        self.local_index.map(|i| self.adaptors[i].clone())
    }

    pub fn cache(&self) -> Arc<KvCache> {
        self.cache.clone()
    }
}

/// Routes a query to the cache, the local source, or the fan-out path.
pub struct AggregatorIndexer {
    cache_indexer: CacheIndexer,
    adaptors_indexer: Arc<dyn Indexer>,
    local_indexer: Arc<dyn Indexer>,
}

impl AggregatorIndexer {
    /// Builds the routing layers over an aggregator's sources.
    ///
    /// Without a designated local source, local-scoped queries fall back to
    /// the fan-out path.
    pub fn new(
        aggregator: &Aggregator,
        search_timeout: Duration,
    ) -> Self {
        let adaptors_indexer: Arc<dyn Indexer> = Arc::new(AdaptorsIndexer::new(
            aggregator.adaptors().to_vec(),
            search_timeout,
        ));
        let local_indexer: Arc<dyn Indexer> = match aggregator.local() {
            Some(adaptor) => Arc::new(SingleAdaptorIndexer::new(adaptor)),
            None => adaptors_indexer.clone(),
        };
        let cache_indexer = CacheIndexer::new(aggregator.cache(), local_indexer.clone());

        Self {
            cache_indexer,
            adaptors_indexer,
            local_indexer,
        }
    }

    /// Creditability of the local route alone, without the fan-out path.
    ///
    /// A local-scoped query never touches the fan-out merge, so its answer
    /// is authoritative whenever the designated local source is.
    pub fn local_creditable(&self) -> bool {
        self.local_indexer.creditable()
    }

    async fn route(
        &self,
        req: &SearchRequest,
    ) -> Result<Response> {
        if !req.global {
            return self.local_indexer.search(req).await;
        }

        self.adaptors_indexer.search(req).await
    }
}

#[async_trait]
impl Indexer for AggregatorIndexer {
    /// Local-scoped or cache-bypassing queries are routed directly; global
    /// queries probe the cache first and fall through to the fan-out path
    /// on a miss.
    async fn search(
        &self,
        req: &SearchRequest,
    ) -> Result<Response> {
        if req.no_cache || !req.global {
            return self.route(req).await;
        }

        // The probe must not fall through to the single live source: a
        // missed global query is routed to the fan-out path instead.
        let probe = req.clone().with_cache_only();
        let resp = self.cache_indexer.search(&probe).await?;

        if resp.count > 0 || req.cache_only {
            return Ok(resp);
        }

        self.route(req).await
    }

    /// Any uncertain component makes the aggregate uncertain.
    fn creditable(&self) -> bool {
        self.adaptors_indexer.creditable()
            && self.local_indexer.creditable()
            && self.cache_indexer.creditable()
    }
}
