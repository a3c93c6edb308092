//! Key layout of the registry keyspace.
//!
//! Every record lives under one root, partitioned first by record type and
//! then by the domain/project pair that owns it:
//!
//! ```text
//! /registry/v1/services/{domain}/{project}/{service_id}
//! /registry/v1/instances/{domain}/{project}/{service_id}/{instance_id}
//! /registry/v1/schemas/ref/{domain}/{project}/{service_id}/{schema_id}
//! /registry/v1/schemas/summary/{domain}/{project}/{service_id}/{schema_id}
//! /registry/v1/schemas/content/{domain}/{project}/{hash}
//! ```
//!
//! The `*_root` helpers end with the separator so they can be used directly
//! as watch and scan prefixes. The `parse_*` helpers recover the ids a key
//! was generated from; a key outside the expected layout parses to `None`.

use crate::constants::INSTANCE_SEGMENT;
use crate::constants::REGISTRY_ROOT;
use crate::constants::SCHEMA_CONTENT_SEGMENT;
use crate::constants::SCHEMA_REF_SEGMENT;
use crate::constants::SCHEMA_SUMMARY_SEGMENT;
use crate::constants::SERVICE_SEGMENT;

const SPLIT: char = '/';

/// Joins a domain and a project into the partition they share.
pub fn domain_project(
    domain: &str,
    project: &str,
) -> String {
    format!("{}{}{}", domain, SPLIT, project)
}

fn root(
    segment: &str,
    domain_project: &str,
) -> String {
    format!("{}/{}/{}/", REGISTRY_ROOT, segment, domain_project)
}

/// Prefix under which every service record of a domain/project lives.
pub fn service_root(domain_project: &str) -> String {
    root(SERVICE_SEGMENT, domain_project)
}

pub fn service_key(
    domain_project: &str,
    service_id: &str,
) -> String {
    format!("{}{}", service_root(domain_project), service_id)
}

/// Prefix under which every instance record of a domain/project lives.
pub fn instance_root(domain_project: &str) -> String {
    root(INSTANCE_SEGMENT, domain_project)
}

/// Prefix under which every instance of one service lives.
pub fn instance_prefix(
    domain_project: &str,
    service_id: &str,
) -> String {
    format!("{}{}{}", instance_root(domain_project), service_id, SPLIT)
}

pub fn instance_key(
    domain_project: &str,
    service_id: &str,
    instance_id: &str,
) -> String {
    format!("{}{}", instance_prefix(domain_project, service_id), instance_id)
}

pub fn schema_ref_root(domain_project: &str) -> String {
    root(SCHEMA_REF_SEGMENT, domain_project)
}

/// Prefix over the schema references of one service.
pub fn schema_ref_prefix(
    domain_project: &str,
    service_id: &str,
) -> String {
    format!("{}{}{}", schema_ref_root(domain_project), service_id, SPLIT)
}

pub fn schema_ref_key(
    domain_project: &str,
    service_id: &str,
    schema_id: &str,
) -> String {
    format!("{}{}", schema_ref_prefix(domain_project, service_id), schema_id)
}

pub fn schema_summary_root(domain_project: &str) -> String {
    root(SCHEMA_SUMMARY_SEGMENT, domain_project)
}

/// Prefix over the schema summaries of one service.
pub fn schema_summary_prefix(
    domain_project: &str,
    service_id: &str,
) -> String {
    format!("{}{}{}", schema_summary_root(domain_project), service_id, SPLIT)
}

pub fn schema_summary_key(
    domain_project: &str,
    service_id: &str,
    schema_id: &str,
) -> String {
    format!(
        "{}{}",
        schema_summary_prefix(domain_project, service_id),
        schema_id
    )
}

pub fn schema_content_root(domain_project: &str) -> String {
    root(SCHEMA_CONTENT_SEGMENT, domain_project)
}

/// Content records are keyed by hash, shared across services.
pub fn schema_content_key(
    domain_project: &str,
    hash: &str,
) -> String {
    format!("{}{}", schema_content_root(domain_project), hash)
}

/// Recovers `(domain_project, service_id)` from a service key.
pub fn parse_service_key(key: &[u8]) -> Option<(String, String)> {
    let parts = segments(key, SERVICE_SEGMENT, 3)?;
    Some((domain_project(parts[0], parts[1]), parts[2].to_string()))
}

/// Recovers `(domain_project, service_id, instance_id)` from an instance
/// key.
pub fn parse_instance_key(key: &[u8]) -> Option<(String, String, String)> {
    let parts = segments(key, INSTANCE_SEGMENT, 4)?;
    Some((
        domain_project(parts[0], parts[1]),
        parts[2].to_string(),
        parts[3].to_string(),
    ))
}

/// Recovers `(domain_project, service_id, schema_id)` from a schema
/// reference key.
pub fn parse_schema_ref_key(key: &[u8]) -> Option<(String, String, String)> {
    let parts = segments(key, SCHEMA_REF_SEGMENT, 4)?;
    Some((
        domain_project(parts[0], parts[1]),
        parts[2].to_string(),
        parts[3].to_string(),
    ))
}

/// Recovers `(domain_project, service_id, schema_id)` from a schema summary
/// key.
pub fn parse_schema_summary_key(key: &[u8]) -> Option<(String, String, String)> {
    let parts = segments(key, SCHEMA_SUMMARY_SEGMENT, 4)?;
    Some((
        domain_project(parts[0], parts[1]),
        parts[2].to_string(),
        parts[3].to_string(),
    ))
}

/// Recovers `(domain_project, hash)` from a content key.
pub fn parse_schema_content_key(key: &[u8]) -> Option<(String, String)> {
    let parts = segments(key, SCHEMA_CONTENT_SEGMENT, 3)?;
    Some((domain_project(parts[0], parts[1]), parts[2].to_string()))
}

/// Splits the tail of a key below its type segment into exactly `n`
/// non-empty parts.
fn segments<'a>(
    key: &'a [u8],
    segment: &str,
    n: usize,
) -> Option<Vec<&'a str>> {
    let key = std::str::from_utf8(key).ok()?;
    let tail = key
        .strip_prefix(REGISTRY_ROOT)?
        .strip_prefix(SPLIT)?
        .strip_prefix(segment)?
        .strip_prefix(SPLIT)?;

    let parts: Vec<&str> = tail.split(SPLIT).collect();
    if parts.len() != n || parts.iter().any(|p| p.is_empty()) {
        return None;
    }
    Some(parts)
}
