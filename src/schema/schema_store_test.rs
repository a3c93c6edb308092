use super::*;

use std::sync::Arc;

use tempfile::TempDir;

use crate::backend::RegistryBackend;
use crate::backend::SledBackend;
use crate::errors::Error;
use crate::errors::SchemaError;
use crate::errors::ServiceError;
use crate::keyspace;
use crate::service::MicroService;
use crate::service::Registrar;

const DP: &str = "default/default";

async fn fixture() -> (TempDir, Arc<SledBackend>, SchemaStore) {
    let dir = TempDir::new().unwrap();
    let backend = Arc::new(SledBackend::open(dir.path(), "local").unwrap());

    let registrar = Registrar::new(backend.clone(), DP);
    let service = MicroService {
        service_id: "svc-1".into(),
        service_name: "web".into(),
        version: "1.0.0".into(),
        ..Default::default()
    };
    registrar.register_service(&service).await.unwrap();

    let store = SchemaStore::new(backend.clone(), DP);
    (dir, backend, store)
}

fn put(
    schema_id: &str,
    hash: &str,
    content: &str,
) -> SchemaPut {
    SchemaPut {
        schema_id: schema_id.into(),
        hash: hash.into(),
        summary: format!("summary-of-{}", schema_id),
        content: content.into(),
    }
}

async fn stored_schema_list(backend: &Arc<SledBackend>) -> Vec<String> {
    let key = keyspace::service_key(DP, "svc-1");
    let kv = backend.get(key.as_bytes()).await.unwrap().unwrap();
    let service: MicroService = bincode::deserialize(&kv.value).unwrap();
    service.schemas
}

#[tokio::test]
async fn put_content_writes_ref_summary_and_service_list() {
    let (_dir, backend, store) = fixture().await;

    store
        .put_content("svc-1", &put("schema-a", "hash-a", "content-a"))
        .await
        .unwrap();

    let schema_ref = store.get_ref("svc-1", "schema-a").await.unwrap();
    assert_eq!(schema_ref.hash, "hash-a");
    assert_eq!(schema_ref.summary, "summary-of-schema-a");
    assert_eq!(schema_ref.service_id, "svc-1");

    assert_eq!(
        stored_schema_list(&backend).await,
        vec!["schema-a".to_string()]
    );

    // Re-putting the same schema does not duplicate the list entry
    store
        .put_content("svc-1", &put("schema-a", "hash-a2", "content-a2"))
        .await
        .unwrap();
    assert_eq!(
        stored_schema_list(&backend).await,
        vec!["schema-a".to_string()]
    );
}

#[tokio::test]
async fn get_ref_reports_missing_schemas() {
    let (_dir, _backend, store) = fixture().await;

    let err = store.get_ref("svc-1", "ghost").await.unwrap_err();
    assert!(matches!(err, Error::Schema(SchemaError::SchemaNotFound)));
}

#[tokio::test]
async fn put_content_requires_the_owning_service() {
    let (_dir, _backend, store) = fixture().await;

    let err = store
        .put_content("ghost", &put("schema-a", "hash-a", "content-a"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Service(ServiceError::ServiceNotFound(_))
    ));
}

#[tokio::test]
async fn list_ref_pairs_every_schema_with_its_summary() {
    let (_dir, _backend, store) = fixture().await;

    store
        .put_content("svc-1", &put("schema-a", "hash-a", "content-a"))
        .await
        .unwrap();
    store
        .put_content("svc-1", &put("schema-b", "hash-b", "content-b"))
        .await
        .unwrap();

    let refs = store.list_ref("svc-1").await.unwrap();
    assert_eq!(refs.len(), 2);

    let a = refs.iter().find(|r| r.schema_id == "schema-a").unwrap();
    assert_eq!(a.hash, "hash-a");
    assert_eq!(a.summary, "summary-of-schema-a");

    assert!(store.list_ref("other").await.unwrap().is_empty());
}

#[tokio::test]
async fn shared_content_is_not_overwritten() {
    let (_dir, _backend, store) = fixture().await;

    store
        .put_content("svc-1", &put("schema-a", "hash-x", "original"))
        .await
        .unwrap();
    // A second schema reuses the hash; the stored bytes stay the first
    store
        .put_content("svc-1", &put("schema-b", "hash-x", "replacement"))
        .await
        .unwrap();

    let content = store.get_content("hash-x").await.unwrap();
    assert_eq!(content.content, "original");
}

#[tokio::test]
async fn delete_content_is_refused_while_referenced() {
    let (_dir, _backend, store) = fixture().await;

    store
        .put_content("svc-1", &put("schema-a", "hash-a", "content-a"))
        .await
        .unwrap();

    let err = store.delete_content("hash-a").await.unwrap_err();
    assert!(matches!(
        err,
        Error::Schema(SchemaError::StillReferenced { hash }) if hash == "hash-a"
    ));

    store.delete_ref("svc-1", "schema-a").await.unwrap();
    store.delete_content("hash-a").await.unwrap();

    let err = store.delete_content("hash-a").await.unwrap_err();
    assert!(matches!(
        err,
        Error::Schema(SchemaError::SchemaContentNotFound)
    ));
}

#[tokio::test]
async fn delete_ref_reports_missing_schemas() {
    let (_dir, _backend, store) = fixture().await;

    let err = store.delete_ref("svc-1", "ghost").await.unwrap_err();
    assert!(matches!(err, Error::Schema(SchemaError::SchemaNotFound)));
}

#[tokio::test]
async fn put_many_content_replaces_the_schema_set() {
    let (_dir, backend, store) = fixture().await;

    store
        .put_many_content(
            "svc-1",
            &[
                put("schema-a", "hash-a", "content-a"),
                put("schema-b", "hash-b", "content-b"),
            ],
        )
        .await
        .unwrap();
    assert_eq!(
        stored_schema_list(&backend).await,
        vec!["schema-a".to_string(), "schema-b".to_string()]
    );

    store
        .put_many_content(
            "svc-1",
            &[
                put("schema-b", "hash-b", "content-b"),
                put("schema-c", "hash-c", "content-c"),
            ],
        )
        .await
        .unwrap();
    assert_eq!(
        stored_schema_list(&backend).await,
        vec!["schema-b".to_string(), "schema-c".to_string()]
    );

    // The dropped schema's ref is gone; the survivors are intact
    let err = store.get_ref("svc-1", "schema-a").await.unwrap_err();
    assert!(matches!(err, Error::Schema(SchemaError::SchemaNotFound)));
    assert_eq!(store.list_ref("svc-1").await.unwrap().len(), 2);
}

#[tokio::test]
async fn exist_ref_finds_a_reference_by_hash() {
    let (_dir, _backend, store) = fixture().await;

    store
        .put_content("svc-1", &put("schema-a", "hash-a", "content-a"))
        .await
        .unwrap();

    let found = store.exist_ref("hash-a").await.unwrap().unwrap();
    assert_eq!(found.schema_id, "schema-a");
    assert_eq!(found.service_id, "svc-1");
    assert_eq!(found.summary, "summary-of-schema-a");

    assert!(store.exist_ref("hash-z").await.unwrap().is_none());
    let err = store.get_content("hash-z").await.unwrap_err();
    assert!(matches!(
        err,
        Error::Schema(SchemaError::SchemaContentNotFound)
    ));
}

#[tokio::test]
async fn list_hash_enumerates_stored_content() {
    let (_dir, _backend, store) = fixture().await;

    store
        .put_content("svc-1", &put("schema-a", "hash-a", "content-a"))
        .await
        .unwrap();
    store
        .put_content("svc-1", &put("schema-b", "hash-b", "content-b"))
        .await
        .unwrap();

    let mut hashes = store.list_hash().await.unwrap();
    hashes.sort();
    assert_eq!(hashes, vec!["hash-a".to_string(), "hash-b".to_string()]);
}
