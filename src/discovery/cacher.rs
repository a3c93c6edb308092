//! Background snapshot refresher for a [`KvCache`].

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::warn;

use super::Indexer;
use super::KvCache;
use super::SearchRequest;
use crate::config::CacheConfig;
use crate::metrics::CACHE_REFRESH_METRIC;
use crate::Result;

/// Periodically relists a watched range from a live source and installs the
/// result as the cache's new snapshot.
///
/// A failed refresh keeps the previous snapshot in place: the cache keeps
/// serving the last good state until the next tick succeeds.
pub struct Cacher {
    cache: Arc<KvCache>,
    source: Arc<dyn Indexer>,
    refresh_interval: Duration,
    refresh_jitter_ms: u64,
}

impl Cacher {
    pub fn new(
        cache: Arc<KvCache>,
        source: Arc<dyn Indexer>,
        config: &CacheConfig,
    ) -> Self {
        Self {
            cache,
            source,
            refresh_interval: Duration::from_millis(config.refresh_interval_ms),
            refresh_jitter_ms: config.refresh_jitter_ms,
        }
    }

    /// Runs the refresh loop until `shutdown` is cancelled.
    pub fn spawn(
        self,
        shutdown: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(async move { self.run(shutdown).await })
    }

    async fn run(
        self,
        shutdown: CancellationToken,
    ) {
        loop {
            // Jitter spreads ticks apart when many cachers share a source
            let jitter = if self.refresh_jitter_ms > 0 {
                rand::thread_rng().gen_range(0..=self.refresh_jitter_ms)
            } else {
                0
            };
            let tick = self.refresh_interval + Duration::from_millis(jitter);

            tokio::select! {
                _ = shutdown.cancelled() => {
                    debug!("cacher for '{}' shutting down", self.cache.name());
                    return;
                }
                _ = sleep(tick) => {}
            }

            match self.refresh_once().await {
                Ok(installed) => {
                    debug!(
                        "cache '{}' refreshed with {} entries at revision {}",
                        self.cache.name(),
                        installed,
                        self.cache.revision()
                    );
                    CACHE_REFRESH_METRIC
                        .with_label_values(&[self.cache.name(), "success"])
                        .inc();
                }
                Err(e) => {
                    warn!("refresh of cache '{}' failed: {:?}", self.cache.name(), e);
                    CACHE_REFRESH_METRIC
                        .with_label_values(&[self.cache.name(), "failure"])
                        .inc();
                }
            }
        }
    }

    /// Relists the watched range live and swaps the snapshot in.
    ///
    /// Returns the number of entries installed. An empty listing keeps the
    /// previous revision since no entry carries a newer one.
    pub async fn refresh_once(&self) -> Result<usize> {
        let req = SearchRequest::new(self.cache.prefix())
            .with_prefix()
            .with_no_cache();
        let resp = self.source.search(&req).await?;

        let revision = resp
            .kvs
            .iter()
            .map(|kv| kv.mod_revision)
            .max()
            .unwrap_or_else(|| self.cache.revision());
        let installed = resp.kvs.len();
        self.cache.replace(resp.kvs, revision);

        Ok(installed)
    }
}
