//! Persistent storage surface of the registry.
//!
//! Registration, lease and schema traffic writes through a
//! [`RegistryBackend`]; the discovery path reads the same records through
//! [`BackendAdaptor`], which exposes a backend as one discovery source.
mod adaptor;
mod sled_backend;

pub use adaptor::BackendAdaptor;
pub use sled_backend::SledBackend;

#[cfg(test)]
mod adaptor_test;
#[cfg(test)]
mod sled_backend_test;

// Trait definition of the current module
// -----------------------------------------------------------------------------
// Write surface shared by every backing store
//

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::discovery::KeyValue;
use crate::discovery::Response;
use crate::discovery::SearchRequest;
use crate::Result;

/// One backing store holding registry records as opaque byte values.
///
/// Every write is stamped with a store-wide monotonically increasing
/// modification revision, reported back to the caller and attached to each
/// entry a search returns.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait RegistryBackend: Send + Sync + 'static {
    /// Stable identifier, also used as the discovery source name
    fn name(&self) -> &str;

    /// Executes one query against the stored records
    async fn search(
        &self,
        req: &SearchRequest,
    ) -> Result<Response>;

    async fn get(
        &self,
        key: &[u8],
    ) -> Result<Option<KeyValue>>;

    /// Writes a record and returns the revision assigned to it
    async fn put(
        &self,
        key: &[u8],
        value: &[u8],
    ) -> Result<u64>;

    /// Removes a record, reporting whether it existed
    async fn delete(
        &self,
        key: &[u8],
    ) -> Result<bool>;

    /// Atomically replaces `expected` with `new`, `None` meaning absent.
    ///
    /// Returns false without touching the store when the current value does
    /// not match `expected`.
    async fn compare_and_swap<'a, 'b>(
        &self,
        key: &[u8],
        expected: Option<&'a [u8]>,
        new: Option<&'b [u8]>,
    ) -> Result<bool>;

    /// Whether this store may be treated as authoritative and complete
    fn creditable(&self) -> bool;
}
