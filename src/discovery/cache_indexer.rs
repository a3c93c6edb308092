//! Cache-first search scoped to one source/cache pair.

use std::sync::Arc;

use async_trait::async_trait;

use super::Indexer;
use super::KvCache;
use super::Response;
use super::SearchRequest;
use crate::metrics::CACHE_HIT_METRIC;
use crate::metrics::CACHE_MISS_METRIC;
use crate::Result;

/// Serves queries from a snapshot cache first, falling back to the live
/// source only when the cache cannot answer.
pub struct CacheIndexer {
    cache: Arc<KvCache>,
    live: Arc<dyn Indexer>,
}

impl CacheIndexer {
    pub fn new(
        cache: Arc<KvCache>,
        live: Arc<dyn Indexer>,
    ) -> Self {
        Self { cache, live }
    }
}

#[async_trait]
impl Indexer for CacheIndexer {
    /// Resolution order: live search on `no_cache`, hard error for keys
    /// outside the watched prefix, the cache result when non-empty or
    /// `cache_only`, live search otherwise.
    async fn search(
        &self,
        req: &SearchRequest,
    ) -> Result<Response> {
        if req.no_cache {
            return self.live.search(req).await;
        }

        self.cache.check_prefix(&req.key)?;

        let resp = self.cache.search(req);
        if resp.count > 0 || req.cache_only {
            CACHE_HIT_METRIC.with_label_values(&[self.cache.name()]).inc();
            return Ok(resp);
        }

        CACHE_MISS_METRIC.with_label_values(&[self.cache.name()]).inc();
        self.live.search(req).await
    }

    /// Cache freshness is a separate concern from result correctness:
    /// trustworthiness follows the live source.
    fn creditable(&self) -> bool {
        self.live.creditable()
    }
}
