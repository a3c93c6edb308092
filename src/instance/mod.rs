//! The find path: version-rule matching, cached resolution, and
//! revision-gated repair against live sources.
mod find_cache;
mod finder;
mod revision_filter;
mod version_rule;

pub use find_cache::FindCache;
pub use find_cache::FindKey;
pub use find_cache::FindState;
pub use find_cache::VersionRuleCacheItem;
pub use finder::Finder;
pub use revision_filter::InstanceSource;
pub use revision_filter::RevisionFilter;
pub use version_rule::VersionRule;

#[cfg(test)]
pub use revision_filter::MockInstanceSource;
