use super::*;

use std::sync::Arc;

use crate::discovery::Adaptor;
use crate::test_utils::kv;

#[tokio::test]
async fn delegates_search_to_the_backend() {
    let mut backend = MockRegistryBackend::new();
    backend
        .expect_search()
        .withf(|req| req.key.as_ref() == b"/k" && req.prefix)
        .times(1)
        .returning(|_| {
            Ok(Response {
                kvs: vec![kv("/k/1", "v", 7)],
                count: 1,
                sources_failed: 0,
            })
        });

    let adaptor = BackendAdaptor::new(Arc::new(backend));
    let resp = adaptor
        .search(&SearchRequest::new("/k").with_prefix())
        .await
        .unwrap();

    assert_eq!(resp.count, 1);
    assert_eq!(resp.kvs[0].mod_revision, 7);
}

#[tokio::test]
async fn reports_the_backend_name_and_creditability() {
    let mut backend = MockRegistryBackend::new();
    backend.expect_name().return_const("local".to_string());
    backend.expect_creditable().return_const(true);

    let adaptor = BackendAdaptor::new(Arc::new(backend));

    assert_eq!(adaptor.name(), "local");
    assert!(adaptor.creditable());
}
