// -
// Keyspace layout

/// Root of every registry key
pub(crate) const REGISTRY_ROOT: &str = "/registry/v1";

pub(crate) const SERVICE_SEGMENT: &str = "services";
pub(crate) const INSTANCE_SEGMENT: &str = "instances";
pub(crate) const SCHEMA_REF_SEGMENT: &str = "schemas/ref";
pub(crate) const SCHEMA_SUMMARY_SEGMENT: &str = "schemas/summary";
pub(crate) const SCHEMA_CONTENT_SEGMENT: &str = "schemas/content";

/// Sled database tree namespaces
pub(crate) const REGISTRY_KV_TREE: &str = "_registry_kv_tree";
pub(crate) const REGISTRY_META_TREE: &str = "_registry_metadata";

/// Key holding the backend's monotonically increasing revision counter
pub(crate) const REGISTRY_META_KEY_REVISION: &str = "_registry_revision";

// -
// Self registration

pub const REGISTRY_SERVICE_NAME: &str = "DREGISTRY";
pub const REGISTRY_SERVICE_ALIAS: &str = "DREGISTRY";
pub const REGISTRY_DOMAIN: &str = "default";
pub const REGISTRY_PROJECT: &str = "default";

pub const REGISTRY_DEFAULT_LEASE_RENEWAL_INTERVAL_S: u32 = 30;
pub const REGISTRY_DEFAULT_LEASE_RETRY_TIMES: u32 = 3;
