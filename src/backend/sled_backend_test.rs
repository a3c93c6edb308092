use super::*;

use tempfile::TempDir;

fn open_backend() -> (TempDir, SledBackend) {
    let dir = TempDir::new().unwrap();
    let backend = SledBackend::open(dir.path(), "local").unwrap();
    (dir, backend)
}

#[tokio::test]
async fn put_assigns_monotonic_revisions() {
    let (_dir, backend) = open_backend();

    let first = backend.put(b"/a", b"one").await.unwrap();
    let second = backend.put(b"/b", b"two").await.unwrap();
    let rewrite = backend.put(b"/a", b"three").await.unwrap();

    assert_eq!(first, 1);
    assert_eq!(second, 2);
    assert_eq!(rewrite, 3);
}

#[tokio::test]
async fn get_returns_latest_value_and_revision() {
    let (_dir, backend) = open_backend();

    backend.put(b"/a", b"one").await.unwrap();
    let rewritten = backend.put(b"/a", b"two").await.unwrap();

    let kv = backend.get(b"/a").await.unwrap().unwrap();
    assert_eq!(kv.key.as_ref(), b"/a");
    assert_eq!(kv.value.as_ref(), b"two");
    assert_eq!(kv.mod_revision, rewritten);

    assert!(backend.get(b"/missing").await.unwrap().is_none());
}

#[tokio::test]
async fn prefix_search_is_scoped_and_ordered() {
    let (_dir, backend) = open_backend();

    backend.put(b"/services/b", b"b").await.unwrap();
    backend.put(b"/services/a", b"a").await.unwrap();
    backend.put(b"/instances/a", b"other").await.unwrap();

    let resp = backend
        .search(&SearchRequest::new("/services/").with_prefix())
        .await
        .unwrap();

    assert_eq!(resp.count, 2);
    let keys: Vec<&[u8]> = resp.kvs.iter().map(|kv| kv.key.as_ref()).collect();
    assert_eq!(keys, vec![&b"/services/a"[..], &b"/services/b"[..]]);
}

#[tokio::test]
async fn exact_search_ignores_longer_keys() {
    let (_dir, backend) = open_backend();

    backend.put(b"/services/a", b"a").await.unwrap();
    backend.put(b"/services/ab", b"ab").await.unwrap();

    let resp = backend
        .search(&SearchRequest::new("/services/a"))
        .await
        .unwrap();

    assert_eq!(resp.count, 1);
    assert_eq!(resp.kvs[0].value.as_ref(), b"a");

    let missing = backend.search(&SearchRequest::new("/nope")).await.unwrap();
    assert_eq!(missing.count, 0);
    assert!(missing.kvs.is_empty());
}

#[tokio::test]
async fn compare_and_swap_creates_only_when_absent() {
    let (_dir, backend) = open_backend();

    assert!(backend
        .compare_and_swap(b"/a", None, Some(&b"one"[..]))
        .await
        .unwrap());
    assert!(!backend
        .compare_and_swap(b"/a", None, Some(&b"two"[..]))
        .await
        .unwrap());

    let kv = backend.get(b"/a").await.unwrap().unwrap();
    assert_eq!(kv.value.as_ref(), b"one");
}

#[tokio::test]
async fn compare_and_swap_replaces_matching_value() {
    let (_dir, backend) = open_backend();

    backend.put(b"/a", b"one").await.unwrap();

    assert!(!backend
        .compare_and_swap(b"/a", Some(&b"stale"[..]), Some(&b"two"[..]))
        .await
        .unwrap());
    assert!(backend
        .compare_and_swap(b"/a", Some(&b"one"[..]), Some(&b"two"[..]))
        .await
        .unwrap());

    let kv = backend.get(b"/a").await.unwrap().unwrap();
    assert_eq!(kv.value.as_ref(), b"two");
}

#[tokio::test]
async fn compare_and_swap_deletes_matching_value() {
    let (_dir, backend) = open_backend();

    backend.put(b"/a", b"one").await.unwrap();

    assert!(backend
        .compare_and_swap(b"/a", Some(&b"one"[..]), None)
        .await
        .unwrap());
    assert!(backend.get(b"/a").await.unwrap().is_none());
}

#[tokio::test]
async fn delete_reports_presence() {
    let (_dir, backend) = open_backend();

    backend.put(b"/a", b"one").await.unwrap();

    assert!(backend.delete(b"/a").await.unwrap());
    assert!(!backend.delete(b"/a").await.unwrap());
    assert!(backend.get(b"/a").await.unwrap().is_none());
}

#[tokio::test]
async fn reopened_store_keeps_records_and_revision_counter() {
    let dir = TempDir::new().unwrap();

    {
        let backend = SledBackend::open(dir.path(), "local").unwrap();
        backend.put(b"/a", b"one").await.unwrap();
        backend.put(b"/b", b"two").await.unwrap();
    }

    let backend = SledBackend::open(dir.path(), "local").unwrap();

    let kv = backend.get(b"/a").await.unwrap().unwrap();
    assert_eq!(kv.value.as_ref(), b"one");
    assert_eq!(kv.mod_revision, 1);

    // The counter must not restart: a rewrite after reopen keeps growing
    assert_eq!(backend.put(b"/c", b"three").await.unwrap(), 3);
}
