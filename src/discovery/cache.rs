//! Revision-tagged in-memory snapshot of one watched key range.

use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwap;
use bytes::Bytes;

use super::KeyValue;
use super::Response;
use super::SearchRequest;
use crate::DiscoveryError;
use crate::Result;

/// Immutable view of the cached range at one refresh
struct Snapshot {
    entries: HashMap<Bytes, KeyValue>,
    revision: u64,
}

/// Concurrently readable cache over one key range.
///
/// Readers load the current snapshot through an atomic pointer, so a
/// refresh never exposes a partially applied map: [`KvCache::replace`]
/// installs the new entries and their revision in a single swap.
pub struct KvCache {
    name: String,
    prefix: Bytes,
    snapshot: ArcSwap<Snapshot>,
}

impl KvCache {
    pub fn new(
        name: impl Into<String>,
        prefix: impl Into<Bytes>,
    ) -> Self {
        Self {
            name: name.into(),
            prefix: prefix.into(),
            snapshot: ArcSwap::from_pointee(Snapshot {
                entries: HashMap::new(),
                revision: 0,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Key range this cache is authoritative for
    pub fn prefix(&self) -> Bytes {
        self.prefix.clone()
    }

    /// Store revision the current snapshot was taken at
    pub fn revision(&self) -> u64 {
        self.snapshot.load().revision
    }

    pub fn len(&self) -> usize {
        self.snapshot.load().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot.load().entries.is_empty()
    }

    /// Rejects keys outside the watched range.
    ///
    /// An out-of-range key is a caller error, never a cache miss.
    pub fn check_prefix(
        &self,
        key: &[u8],
    ) -> Result<()> {
        if !key.starts_with(&self.prefix) {
            return Err(DiscoveryError::PrefixMismatch {
                key: String::from_utf8_lossy(key).into_owned(),
                prefix: String::from_utf8_lossy(&self.prefix).into_owned(),
                cache: self.name.clone(),
            }
            .into());
        }
        Ok(())
    }

    /// Answers a query from the current snapshot.
    ///
    /// Prefix queries return entries in ascending key order.
    pub fn search(
        &self,
        req: &SearchRequest,
    ) -> Response {
        let snapshot = self.snapshot.load();

        let mut kvs: Vec<KeyValue> = if req.prefix {
            snapshot
                .entries
                .values()
                .filter(|kv| kv.key.starts_with(&req.key))
                .cloned()
                .collect()
        } else {
            snapshot.entries.get(&req.key).cloned().into_iter().collect()
        };
        kvs.sort_by(|a, b| a.key.cmp(&b.key));

        Response {
            count: kvs.len() as i64,
            kvs,
            sources_failed: 0,
        }
    }

    /// Atomically installs a freshly listed snapshot and its revision.
    pub fn replace(
        &self,
        kvs: Vec<KeyValue>,
        revision: u64,
    ) {
        let entries = kvs.into_iter().map(|kv| (kv.key.clone(), kv)).collect();
        self.snapshot.store(Arc::new(Snapshot { entries, revision }));
    }
}
