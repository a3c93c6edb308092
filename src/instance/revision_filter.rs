//! Revision-gated repair of cached find results.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use tracing::warn;

use crate::config::CooldownPolicy;
use crate::errors::DiscoveryError;
use crate::errors::Result;
use crate::instance::find_cache::FindKey;
use crate::instance::find_cache::FindState;
use crate::instance::find_cache::VersionRuleCacheItem;
use crate::metrics::FIND_REPAIR_METRIC;

/// Live resolution surface the repair path queries.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait InstanceSource: Send + Sync + 'static {
    /// Resolves a find query against live sources, bypassing snapshots
    async fn find_live(
        &self,
        key: &FindKey,
    ) -> Result<FindState>;

    /// Whether the path answering this key's scope is authoritative for it
    fn creditable(
        &self,
        key: &FindKey,
    ) -> bool;
}

/// Decides when a revision mismatch may consult live sources, and applies
/// the resulting repair under the entry's gate.
pub struct RevisionFilter {
    source: Arc<dyn InstanceSource>,
    policy: CooldownPolicy,
}

impl RevisionFilter {
    pub fn new(
        source: Arc<dyn InstanceSource>,
        policy: CooldownPolicy,
    ) -> Self {
        Self { source, policy }
    }

    /// Whether this request justifies a live resolution.
    ///
    /// Requests with no revision, a matching revision, an unauthoritative
    /// answer path or a cooling entry are all served from the snapshot.
    fn wants_refresh(
        &self,
        key: &FindKey,
        item: &VersionRuleCacheItem,
        requested_revision: &str,
    ) -> bool {
        if requested_revision.is_empty() {
            return false;
        }
        if item.state().revision == requested_revision {
            return false;
        }
        if !self.source.creditable(key) {
            return false;
        }
        !item.in_cooldown()
    }

    /// Re-resolves the entry from live sources when the requested revision
    /// justifies it.
    ///
    /// Every attempt, successful or not, starts the cooling period, so one
    /// consumer holding a stale token cannot keep hammering live sources.
    pub async fn apply(
        &self,
        key: &FindKey,
        item: &VersionRuleCacheItem,
        requested_revision: &str,
    ) -> Result<()> {
        if !self.wants_refresh(key, item, requested_revision) {
            return Ok(());
        }

        let _gate = item.lock_repair().await;

        // The entry may have been repaired while waiting on the gate
        if !self.wants_refresh(key, item, requested_revision) {
            return Ok(());
        }

        let timeout = Duration::from_millis(self.policy.live_timeout_ms);
        let cooling = Duration::from_millis(self.policy.cooldown_ms);

        let refreshed = match tokio::time::timeout(timeout, self.source.find_live(key)).await {
            Ok(Ok(state)) => state,
            Ok(Err(e)) => {
                item.enter_cooldown(cooling);
                FIND_REPAIR_METRIC.with_label_values(&["failure"]).inc();
                return Err(e);
            }
            Err(_) => {
                item.enter_cooldown(cooling);
                FIND_REPAIR_METRIC.with_label_values(&["failure"]).inc();
                return Err(DiscoveryError::Timeout {
                    source: key.to_string(),
                    timeout,
                }
                .into());
            }
        };

        warn!(
            "requested revision {} != {}, refreshed '{}'",
            requested_revision,
            item.state().revision,
            key
        );
        item.replace(refreshed);
        item.enter_cooldown(cooling);
        FIND_REPAIR_METRIC.with_label_values(&["success"]).inc();
        Ok(())
    }
}
