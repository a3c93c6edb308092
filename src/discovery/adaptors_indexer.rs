//! Best-effort fan-out search across every configured source.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::future::join_all;
use tokio::time::timeout;
use tracing::warn;

use super::Adaptor;
use super::Indexer;
use super::Response;
use super::SearchRequest;
use crate::metrics::SOURCE_FAILURE_METRIC;
use crate::Result;

/// Merges all configured sources into one best-effort result.
///
/// Failing sources are skipped so the merged answer stays available; the
/// price is that the result is never creditable.
pub struct AdaptorsIndexer {
    adaptors: Vec<Arc<dyn Adaptor>>,
    search_timeout: Duration,
}

impl AdaptorsIndexer {
    pub fn new(
        adaptors: Vec<Arc<dyn Adaptor>>,
        search_timeout: Duration,
    ) -> Self {
        Self {
            adaptors,
            search_timeout,
        }
    }
}

#[async_trait]
impl Indexer for AdaptorsIndexer {
    /// Queries every source concurrently and merges the results.
    ///
    /// Entries are deduplicated by key, the first source in configured
    /// order wins. `count` sums every source's reported count regardless of
    /// deduplication, so it may exceed the number of merged entries. A
    /// failed or timed-out source is tallied in `sources_failed` instead of
    /// failing the search.
    async fn search(
        &self,
        req: &SearchRequest,
    ) -> Result<Response> {
        // Results are merged only after every source completed or timed
        // out; no source's failure blocks or cancels another's query.
        let searches = self
            .adaptors
            .iter()
            .map(|adaptor| timeout(self.search_timeout, adaptor.search(req)));
        let results = join_all(searches).await;

        let mut response = Response::default();
        let mut exists: HashSet<Bytes> = HashSet::new();
        for (adaptor, result) in self.adaptors.iter().zip(results) {
            let resp = match result {
                Ok(Ok(resp)) => resp,
                Ok(Err(e)) => {
                    warn!("search on source '{}' failed: {:?}", adaptor.name(), e);
                    SOURCE_FAILURE_METRIC.with_label_values(&[adaptor.name()]).inc();
                    response.sources_failed += 1;
                    continue;
                }
                Err(_) => {
                    warn!(
                        "search on source '{}' timed out after {:?}",
                        adaptor.name(),
                        self.search_timeout
                    );
                    SOURCE_FAILURE_METRIC.with_label_values(&[adaptor.name()]).inc();
                    response.sources_failed += 1;
                    continue;
                }
            };

            for kv in resp.kvs {
                if exists.insert(kv.key.clone()) {
                    response.kvs.push(kv);
                }
            }
            response.count += resp.count;
            response.sources_failed += resp.sources_failed;
        }

        Ok(response)
    }

    /// Always false: per-source failures are invisible to the caller, so
    /// the merged result is never guaranteed complete.
    fn creditable(&self) -> bool {
        false
    }
}
