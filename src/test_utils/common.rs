use bytes::Bytes;

use crate::discovery::KeyValue;
use crate::discovery::Response;

/// Builds a cache entry from string literals
pub fn kv(
    key: &str,
    value: &str,
    mod_revision: u64,
) -> KeyValue {
    KeyValue {
        key: Bytes::copy_from_slice(key.as_bytes()),
        value: Bytes::copy_from_slice(value.as_bytes()),
        mod_revision,
    }
}

/// Builds a response whose count equals the number of entries
pub fn response_of(kvs: Vec<KeyValue>) -> Response {
    Response {
        count: kvs.len() as i64,
        kvs,
        sources_failed: 0,
    }
}
