//! Keyed cache of resolved find results.
//!
//! Each distinct (domain/project, service, version-rule) triple owns one
//! entry holding the instance snapshot, the revision token it was computed
//! at, and the repair-coordination state for that entry.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use dashmap::DashMap;
use parking_lot::Mutex;
use tokio::sync::Mutex as AsyncMutex;
use tokio::sync::MutexGuard;
use tokio::time::Instant;

use crate::service::MicroServiceInstance;

/// Identity of one find query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FindKey {
    pub domain_project: String,
    pub service_name: String,
    pub version_rule: String,
}

impl FindKey {
    /// An empty version rule is normalized to the `latest` query.
    pub fn new(
        domain_project: impl Into<String>,
        service_name: impl Into<String>,
        version_rule: impl Into<String>,
    ) -> Self {
        let version_rule = version_rule.into();
        let version_rule = if version_rule.trim().is_empty() {
            "latest".to_string()
        } else {
            version_rule
        };

        Self {
            domain_project: domain_project.into(),
            service_name: service_name.into(),
            version_rule,
        }
    }
}

impl fmt::Display for FindKey {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.domain_project, self.service_name, self.version_rule
        )
    }
}

/// One resolved find result: the instance snapshot and the revision token
/// it was computed at.
///
/// An empty revision marks an entry that has never been populated; a
/// resolution that matched nothing still carries the token it was computed
/// at, which is never empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindState {
    pub revision: String,
    pub instances: Vec<MicroServiceInstance>,
}

/// Repair cooldown of one entry
#[derive(Debug, Clone, Copy)]
pub(crate) enum CooldownState {
    Idle,
    Cooling { until: Instant },
}

/// One slot of the find cache.
///
/// The snapshot and its revision swap together behind one pointer, so a
/// reader never observes the instances of one resolution paired with the
/// revision of another.
pub struct VersionRuleCacheItem {
    state: ArcSwap<FindState>,
    cooldown: Mutex<CooldownState>,
    repair_gate: AsyncMutex<()>,
}

impl VersionRuleCacheItem {
    fn new() -> Self {
        Self {
            state: ArcSwap::from_pointee(FindState::default()),
            cooldown: Mutex::new(CooldownState::Idle),
            repair_gate: AsyncMutex::new(()),
        }
    }

    /// Current snapshot/revision pair
    pub fn state(&self) -> Arc<FindState> {
        self.state.load_full()
    }

    /// Atomically publishes a new snapshot/revision pair
    pub fn replace(
        &self,
        state: FindState,
    ) {
        self.state.store(Arc::new(state));
    }

    /// Whether this entry is still inside a cooling period.
    ///
    /// Expiry is lazy: the state flips back to idle on the first check past
    /// the deadline.
    pub fn in_cooldown(&self) -> bool {
        let mut cooldown = self.cooldown.lock();
        match *cooldown {
            CooldownState::Idle => false,
            CooldownState::Cooling { until } => {
                if Instant::now() < until {
                    true
                } else {
                    *cooldown = CooldownState::Idle;
                    false
                }
            }
        }
    }

    /// Starts (or restarts) the cooling period
    pub fn enter_cooldown(
        &self,
        period: Duration,
    ) {
        *self.cooldown.lock() = CooldownState::Cooling {
            until: Instant::now() + period,
        };
    }

    /// Serializes live resolutions targeting this entry
    pub(crate) async fn lock_repair(&self) -> MutexGuard<'_, ()> {
        self.repair_gate.lock().await
    }
}

/// Bounded map of find entries, keyed by the full query identity.
pub struct FindCache {
    items: DashMap<FindKey, Arc<VersionRuleCacheItem>>,
    capacity: usize,
}

impl FindCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            items: DashMap::new(),
            capacity,
        }
    }

    /// The entry for a key, created empty on first use.
    ///
    /// At capacity an arbitrary other entry is dropped first; a dropped
    /// entry is rebuilt from scratch by the next query for its key.
    pub fn item(
        &self,
        key: &FindKey,
    ) -> Arc<VersionRuleCacheItem> {
        if let Some(item) = self.items.get(key) {
            return item.clone();
        }

        if self.items.len() >= self.capacity {
            self.evict_one(key);
        }

        self.items
            .entry(key.clone())
            .or_insert_with(|| Arc::new(VersionRuleCacheItem::new()))
            .clone()
    }

    fn evict_one(
        &self,
        keep: &FindKey,
    ) {
        // The victim key is cloned out before the removal; removing while
        // the iterator still holds a shard lock would deadlock.
        let victim = self
            .items
            .iter()
            .map(|entry| entry.key().clone())
            .find(|candidate| candidate != keep);
        if let Some(victim) = victim {
            self.items.remove(&victim);
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
