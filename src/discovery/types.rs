use bytes::Bytes;

/// A single key/value entry returned by a discovery search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValue {
    pub key: Bytes,
    pub value: Bytes,
    /// Store revision at which this entry was last modified
    pub mod_revision: u64,
}

/// Result of a discovery search.
///
/// `count` is the cardinality reported by the answering sources and is not
/// guaranteed to equal `kvs.len()`: a fan-out merge deduplicates entries by
/// key but still sums every source's count.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Response {
    pub kvs: Vec<KeyValue>,
    pub count: i64,
    /// Number of sources that failed to answer while this response was built
    pub sources_failed: usize,
}

/// Options determining how a discovery query is routed.
///
/// The four flags fully determine the path a query takes through the
/// aggregator: cache, single local source, or fan-out across all sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub key: Bytes,
    pub prefix: bool,
    pub global: bool,
    pub no_cache: bool,
    pub cache_only: bool,
}

impl SearchRequest {
    pub fn new(key: impl Into<Bytes>) -> Self {
        Self {
            key: key.into(),
            prefix: false,
            global: false,
            no_cache: false,
            cache_only: false,
        }
    }

    /// Match every key starting with `key` instead of the exact key
    pub fn with_prefix(mut self) -> Self {
        self.prefix = true;
        self
    }

    /// Aggregate results across all configured sources
    pub fn with_global(mut self) -> Self {
        self.global = true;
        self
    }

    /// Bypass every cache layer and query live sources
    pub fn with_no_cache(mut self) -> Self {
        self.no_cache = true;
        self
    }

    /// Never fall through to a live source, even on a cache miss
    pub fn with_cache_only(mut self) -> Self {
        self.cache_only = true;
        self
    }
}
