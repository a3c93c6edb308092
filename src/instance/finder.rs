//! End-to-end instance resolution: match services against the version
//! rule, gather their instances, stamp a revision token.

use std::sync::Arc;

use async_trait::async_trait;
use autometrics::autometrics;
use tracing::debug;

use crate::config::CooldownPolicy;
use crate::discovery::AggregatorIndexer;
use crate::discovery::Indexer;
use crate::discovery::Response;
use crate::discovery::SearchRequest;
use crate::errors::Result;
use crate::errors::StorageError;
use crate::instance::find_cache::FindCache;
use crate::instance::find_cache::FindKey;
use crate::instance::find_cache::FindState;
use crate::instance::revision_filter::InstanceSource;
use crate::instance::revision_filter::RevisionFilter;
use crate::instance::version_rule::version_ord;
use crate::instance::version_rule::VersionRule;
use crate::keyspace;
use crate::service::GlobalVisibility;
use crate::service::MicroService;
use crate::service::MicroServiceInstance;
use crate::API_SLO;

/// Live resolution of one find query across the service and instance
/// ranges.
struct InstanceLookup {
    services: Arc<AggregatorIndexer>,
    instances: Arc<AggregatorIndexer>,
    globals: Arc<GlobalVisibility>,
}

impl InstanceLookup {
    /// Resolves the query against the discovery path.
    ///
    /// The revision token folds the highest modification revision and the
    /// total entry count of every consulted range, so additions, rewrites
    /// and deletions all move it.
    async fn gather(
        &self,
        key: &FindKey,
        no_cache: bool,
    ) -> Result<FindState> {
        let global = self.globals.is_global(&key.service_name);
        let rule = VersionRule::parse(&key.version_rule);

        let services = self
            .search_range(
                &self.services,
                keyspace::service_root(&key.domain_project),
                global,
                no_cache,
            )
            .await?;

        let mut max_revision: u64 = 0;
        let mut total: i64 = services.count;

        let mut matched: Vec<MicroService> = Vec::new();
        for kv in &services.kvs {
            max_revision = max_revision.max(kv.mod_revision);
            let service: MicroService =
                bincode::deserialize(&kv.value).map_err(StorageError::from)?;
            if service.service_name == key.service_name && rule.matches(&service.version) {
                matched.push(service);
            }
        }

        // `latest` narrows the match set to the single highest version
        if matches!(rule, VersionRule::Latest) {
            matched.sort_by_key(|s| version_ord(&s.version));
            matched = matched.pop().into_iter().collect();
        }

        let mut instances = Vec::new();
        for service in &matched {
            let resp = self
                .search_range(
                    &self.instances,
                    keyspace::instance_prefix(&key.domain_project, &service.service_id),
                    global,
                    no_cache,
                )
                .await?;

            total += resp.count;
            for kv in &resp.kvs {
                max_revision = max_revision.max(kv.mod_revision);
                let instance: MicroServiceInstance =
                    bincode::deserialize(&kv.value).map_err(StorageError::from)?;
                instances.push(instance);
            }
        }

        Ok(FindState {
            revision: format!("{}.{}", max_revision, total),
            instances,
        })
    }

    async fn search_range(
        &self,
        indexer: &AggregatorIndexer,
        root: String,
        global: bool,
        no_cache: bool,
    ) -> Result<Response> {
        let mut req = SearchRequest::new(root).with_prefix();
        if global {
            req = req.with_global();
        }
        if no_cache {
            req = req.with_no_cache();
        }
        indexer.search(&req).await
    }
}

#[async_trait]
impl InstanceSource for InstanceLookup {
    async fn find_live(
        &self,
        key: &FindKey,
    ) -> Result<FindState> {
        self.gather(key, true).await
    }

    /// Globally visible names are answered by the fan-out merge, which is
    /// never authoritative; everything else rides the local route alone.
    fn creditable(
        &self,
        key: &FindKey,
    ) -> bool {
        if self.globals.is_global(&key.service_name) {
            self.services.creditable() && self.instances.creditable()
        } else {
            self.services.local_creditable() && self.instances.local_creditable()
        }
    }
}

/// The instance find path: cached resolution with revision-gated repair.
pub struct Finder {
    lookup: Arc<InstanceLookup>,
    cache: FindCache,
    filter: RevisionFilter,
}

impl Finder {
    pub fn new(
        services: Arc<AggregatorIndexer>,
        instances: Arc<AggregatorIndexer>,
        globals: Arc<GlobalVisibility>,
        policy: CooldownPolicy,
        capacity: usize,
    ) -> Self {
        let lookup = Arc::new(InstanceLookup {
            services,
            instances,
            globals,
        });

        Self {
            lookup: lookup.clone(),
            cache: FindCache::new(capacity),
            filter: RevisionFilter::new(lookup, policy),
        }
    }

    /// Resolves instances for a query, preferring the cached result.
    ///
    /// `requested_revision` is the token stamped on the caller's previous
    /// answer; a mismatch against a fresh entry may trigger one live repair
    /// before the (possibly updated) snapshot is returned. An empty token
    /// never does.
    #[autometrics(objective = API_SLO)]
    pub async fn find(
        &self,
        key: &FindKey,
        requested_revision: &str,
    ) -> Result<Arc<FindState>> {
        let item = self.cache.item(key);

        // First touch of this key: populate under the repair gate so
        // concurrent first queries collapse into one resolution.
        if item.state().revision.is_empty() {
            let _gate = item.lock_repair().await;
            if item.state().revision.is_empty() {
                let state = self.lookup.gather(key, false).await?;
                debug!("first resolution of '{}' at revision {}", key, state.revision);
                item.replace(state);
            }
        }

        self.filter.apply(key, &item, requested_revision).await?;
        Ok(item.state())
    }
}
