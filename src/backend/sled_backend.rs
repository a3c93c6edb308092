use std::path::Path;

use async_trait::async_trait;
use bytes::Bytes;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

use crate::backend::RegistryBackend;
use crate::constants::REGISTRY_KV_TREE;
use crate::constants::REGISTRY_META_KEY_REVISION;
use crate::constants::REGISTRY_META_TREE;
use crate::discovery::KeyValue;
use crate::discovery::Response;
use crate::discovery::SearchRequest;
use crate::errors::Result;
use crate::errors::StorageError;
use crate::Error;

/// On-disk framing of one record: the assigned revision plus the raw value
#[derive(Debug, Serialize, Deserialize)]
struct StoredRecord {
    mod_revision: u64,
    value: Vec<u8>,
}

/// Embedded sled-backed store, the default local registry backend.
///
/// Records live in a dedicated kv tree; the modification-revision counter
/// lives in a separate metadata tree so record scans never see it.
pub struct SledBackend {
    name: String,
    kv: sled::Tree,
    meta: sled::Tree,
}

#[async_trait]
impl RegistryBackend for SledBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn search(
        &self,
        req: &SearchRequest,
    ) -> Result<Response> {
        let mut kvs = Vec::new();

        if req.prefix {
            for item in self.kv.scan_prefix(&req.key) {
                let (key, value) = item?;
                kvs.push(Self::decode_record(&key, &value)?);
            }
        } else if let Some(value) = self.kv.get(&req.key)? {
            kvs.push(Self::decode_record(&req.key, &value)?);
        }

        Ok(Response {
            count: kvs.len() as i64,
            kvs,
            sources_failed: 0,
        })
    }

    async fn get(
        &self,
        key: &[u8],
    ) -> Result<Option<KeyValue>> {
        match self.kv.get(key)? {
            Some(value) => Self::decode_record(key, &value).map(Some),
            None => Ok(None),
        }
    }

    async fn put(
        &self,
        key: &[u8],
        value: &[u8],
    ) -> Result<u64> {
        let revision = self.next_revision()?;
        let record = StoredRecord {
            mod_revision: revision,
            value: value.to_vec(),
        };
        let body = bincode::serialize(&record).map_err(StorageError::from)?;
        self.kv.insert(key, body)?;

        Ok(revision)
    }

    async fn delete(
        &self,
        key: &[u8],
    ) -> Result<bool> {
        Ok(self.kv.remove(key)?.is_some())
    }

    async fn compare_and_swap<'a, 'b>(
        &self,
        key: &[u8],
        expected: Option<&'a [u8]>,
        new: Option<&'b [u8]>,
    ) -> Result<bool> {
        let current = self.kv.get(key)?;

        // Callers compare against the value they wrote, not the framed bytes.
        let current_value = match &current {
            Some(raw) => {
                let record: StoredRecord =
                    bincode::deserialize(raw).map_err(StorageError::from)?;
                Some(record.value)
            }
            None => None,
        };
        if current_value.as_deref() != expected {
            return Ok(false);
        }

        // A lost race burns one revision; the counter only has to grow.
        let proposed: Option<Vec<u8>> = match new {
            Some(value) => {
                let record = StoredRecord {
                    mod_revision: self.next_revision()?,
                    value: value.to_vec(),
                };
                Some(bincode::serialize(&record).map_err(StorageError::from)?)
            }
            None => None,
        };

        Ok(self.kv.compare_and_swap(key, current, proposed)?.is_ok())
    }

    fn creditable(&self) -> bool {
        true
    }
}

impl std::fmt::Debug for SledBackend {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("SledBackend").field("name", &self.name).finish()
    }
}

impl Drop for SledBackend {
    fn drop(&mut self) {
        match self.kv.flush() {
            Ok(_) => info!("Successfully flush registry kv tree"),
            Err(e) => error!(?e, "Failed to flush registry kv tree"),
        }
        match self.meta.flush() {
            Ok(_) => info!("Successfully flush registry metadata tree"),
            Err(e) => error!(?e, "Failed to flush registry metadata tree"),
        }
    }
}

impl SledBackend {
    /// Opens (or creates) the store rooted at `dir`, under a subdirectory
    /// named after this backend.
    pub fn open(
        dir: impl AsRef<Path> + std::fmt::Debug,
        name: impl Into<String>,
    ) -> Result<Self> {
        let name = name.into();
        debug!("opening registry backend [{}] under {:?}", name, dir);

        let db_path = dir.as_ref().join(&name);
        let db = sled::Config::default()
            .path(&db_path)
            .cache_capacity(10 * 1024 * 1024) //10MB
            .flush_every_ms(Some(3))
            .use_compression(true)
            .compression_factor(1)
            .open()
            .map_err(|e| {
                warn!(
                    "Try to open DB at this location: {:?} and failed: {:?}",
                    db_path, e
                );
                Error::from(e)
            })?;

        let kv = db.open_tree(REGISTRY_KV_TREE)?;
        let meta = db.open_tree(REGISTRY_META_TREE)?;

        Ok(Self { name, kv, meta })
    }

    fn next_revision(&self) -> Result<u64> {
        let bumped = self
            .meta
            .update_and_fetch(REGISTRY_META_KEY_REVISION, |current| {
                let next = current.map(Self::decode_revision).unwrap_or(0) + 1;
                Some(next.to_be_bytes().to_vec())
            })?;

        Ok(bumped.map(|raw| Self::decode_revision(&raw)).unwrap_or(0))
    }

    /// Helper: convert counter bytes back to a revision, 0 when malformed
    #[inline]
    fn decode_revision(raw: &[u8]) -> u64 {
        raw.try_into().map(u64::from_be_bytes).unwrap_or(0)
    }

    fn decode_record(
        key: &[u8],
        raw: &[u8],
    ) -> Result<KeyValue> {
        let record: StoredRecord = bincode::deserialize(raw).map_err(StorageError::from)?;

        Ok(KeyValue {
            key: Bytes::copy_from_slice(key),
            value: Bytes::from(record.value),
            mod_revision: record.mod_revision,
        })
    }
}
