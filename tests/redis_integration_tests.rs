// SPDX-License-Identifier: LGPL-2.1-or-later
//
// Integration tests for the Redis key-value adapter: namespacing, TTL
// propagation, batch transactions, and scan-driven clear/iteration.
//
// All tests require a running Redis instance on localhost:6379 and are
// therefore #[ignore]d by default:
//
//   cargo test -- --ignored

use redis_keyvalue::{Entry, KeyValueStore, RedisStore};
use std::time::Duration;

const URL: &str = "redis://localhost:6379";

async fn create_store() -> RedisStore {
    RedisStore::new(URL)
        .await
        .expect("failed to connect to Redis (ensure Redis is running)")
}

async fn create_store_in(namespace: &str) -> RedisStore {
    let mut store = create_store().await;
    store.set_namespace(Some(namespace));
    store
}

#[tokio::test]
#[ignore] // Requires running Redis instance
async fn test_set_get_round_trip() {
    let store = create_store_in("it-roundtrip").await;

    store.set("key1", b"value1".to_vec(), None).await.unwrap();
    assert_eq!(store.get("key1").await.unwrap(), Some(b"value1".to_vec()));

    // Overwrite
    store.set("key1", b"value2".to_vec(), None).await.unwrap();
    assert_eq!(store.get("key1").await.unwrap(), Some(b"value2".to_vec()));

    store.clear().await;
}

#[tokio::test]
#[ignore]
async fn test_example_scenario() {
    let store = create_store_in("it-example").await;

    store.set("foo", b"bar".to_vec(), None).await.unwrap();
    store
        .set("foo2", br#"{"x":1}"#.to_vec(), None)
        .await
        .unwrap();

    assert!(store.delete("foo").await.unwrap());
    assert_eq!(store.get("foo").await.unwrap(), None);
    assert_eq!(store.get("foo2").await.unwrap(), Some(br#"{"x":1}"#.to_vec()));

    store.clear().await;
}

#[tokio::test]
#[ignore]
async fn test_ttl_expiry() {
    let store = create_store_in("it-ttl").await;

    store
        .set("short", b"lived".to_vec(), Some(Duration::from_millis(100)))
        .await
        .unwrap();
    assert_eq!(store.get("short").await.unwrap(), Some(b"lived".to_vec()));

    tokio::time::sleep(Duration::from_millis(250)).await;
    assert_eq!(store.get("short").await.unwrap(), None);

    store.clear().await;
}

#[tokio::test]
#[ignore]
async fn test_default_ttl_applied_when_call_ttl_omitted() {
    let mut store = create_store_in("it-default-ttl").await;
    store.set_default_ttl(Some(Duration::from_millis(100)));

    store.set("fleeting", b"v".to_vec(), None).await.unwrap();
    tokio::time::sleep(Duration::from_millis(250)).await;
    assert_eq!(store.get("fleeting").await.unwrap(), None);

    // Per-call TTL overrides the default.
    store
        .set("longer", b"v".to_vec(), Some(Duration::from_secs(60)))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(250)).await;
    assert!(store.has("longer").await.unwrap());

    store.clear().await;
}

#[tokio::test]
#[ignore]
async fn test_has_and_delete() {
    let store = create_store_in("it-delete").await;

    assert!(!store.delete("absent").await.unwrap());
    assert!(!store.has("absent").await.unwrap());

    store.set("present", b"v".to_vec(), None).await.unwrap();
    assert!(store.has("present").await.unwrap());
    assert!(store.delete("present").await.unwrap());
    assert_eq!(store.get("present").await.unwrap(), None);

    store.clear().await;
}

#[tokio::test]
#[ignore]
async fn test_delete_with_del_instead_of_unlink() {
    let mut store = create_store_in("it-del").await;
    store.set_use_unlink(false);

    store.set("k", b"v".to_vec(), None).await.unwrap();
    assert!(store.delete("k").await.unwrap());
    assert!(!store.delete("k").await.unwrap());

    store.clear().await;
}

#[tokio::test]
#[ignore]
async fn test_get_many_preserves_order_and_length() {
    let store = create_store_in("it-getmany").await;

    store.set("a", b"va".to_vec(), None).await.unwrap();
    store.set("c", b"vc".to_vec(), None).await.unwrap();

    let values = store.get_many(&["a", "b", "c"]).await.unwrap();
    assert_eq!(
        values,
        vec![Some(b"va".to_vec()), None, Some(b"vc".to_vec())]
    );

    assert!(store.get_many(&[]).await.unwrap().is_empty());

    store.clear().await;
}

#[tokio::test]
#[ignore]
async fn test_has_many_mirrors_presence_in_order() {
    let store = create_store_in("it-hasmany").await;

    store.set("a", b"1".to_vec(), None).await.unwrap();
    store.set("c", b"3".to_vec(), None).await.unwrap();

    let present = store.has_many(&["a", "b", "c"]).await.unwrap();
    assert_eq!(present, vec![true, false, true]);

    store.clear().await;
}

#[tokio::test]
#[ignore]
async fn test_set_many_with_mixed_ttls() {
    let mut store = create_store_in("it-setmany").await;
    store.set_default_ttl(Some(Duration::from_secs(60)));

    store
        .set_many(&[
            Entry::new("k1", b"v1".to_vec()),
            Entry::with_ttl("k2", b"v2".to_vec(), Duration::from_millis(100)),
            Entry::new("k3", b"v3".to_vec()),
        ])
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(250)).await;

    // k2's own TTL expired it; the others ride the 60s default.
    let values = store.get_many(&["k1", "k2", "k3"]).await.unwrap();
    assert_eq!(
        values,
        vec![Some(b"v1".to_vec()), None, Some(b"v3".to_vec())]
    );

    // Empty batch is a no-op, not an error.
    store.set_many(&[]).await.unwrap();

    store.clear().await;
}

#[tokio::test]
#[ignore]
async fn test_delete_many() {
    let store = create_store_in("it-delmany").await;

    store.set("a", b"1".to_vec(), None).await.unwrap();
    store.set("b", b"2".to_vec(), None).await.unwrap();

    // At least one key removed across the batch.
    assert!(store.delete_many(&["a", "b", "missing"]).await.unwrap());
    assert!(!store.delete_many(&["a", "b"]).await.unwrap());
    assert!(!store.delete_many(&[]).await.unwrap());

    store.clear().await;
}

#[tokio::test]
#[ignore]
async fn test_clear_removes_only_current_namespace() {
    let mut store = create_store().await;

    store.set_namespace(Some("it-iso-n1"));
    store
        .set_many(&[
            Entry::new("a", b"n1a".to_vec()),
            Entry::new("b", b"n1b".to_vec()),
        ])
        .await
        .unwrap();

    store.set_namespace(Some("it-iso-n2"));
    store.set("a", b"n2a".to_vec(), None).await.unwrap();

    store.set_namespace(None::<String>);
    store.set("it-iso-plain", b"plain".to_vec(), None).await.unwrap();

    store.set_namespace(Some("it-iso-n1"));
    let report = store.clear().await;
    assert!(report.is_complete());
    assert_eq!(report.deleted, 2);
    assert_eq!(store.get("a").await.unwrap(), None);
    assert_eq!(store.get("b").await.unwrap(), None);

    // The other namespace and the unprefixed key survive.
    store.set_namespace(Some("it-iso-n2"));
    assert_eq!(store.get("a").await.unwrap(), Some(b"n2a".to_vec()));
    store.set_namespace(None::<String>);
    assert_eq!(
        store.get("it-iso-plain").await.unwrap(),
        Some(b"plain".to_vec())
    );

    // Cleanup
    store.delete("it-iso-plain").await.unwrap();
    store.set_namespace(Some("it-iso-n2"));
    store.clear().await;
}

#[tokio::test]
#[ignore]
async fn test_clear_without_namespace_spares_namespaced_keys() {
    // Clearing with no namespace removes every unprefixed key, so this
    // test gets its own logical database.
    let mut store = RedisStore::new("redis://localhost:6379/14").await.unwrap();

    store.set_namespace(Some("it-spare-ns"));
    store.set("kept", b"v".to_vec(), None).await.unwrap();

    store.set_namespace(None::<String>);
    store.set("it-spare-plain", b"v".to_vec(), None).await.unwrap();

    let report = store.clear().await;
    assert!(report.is_complete());
    assert_eq!(store.get("it-spare-plain").await.unwrap(), None);

    store.set_namespace(Some("it-spare-ns"));
    assert_eq!(store.get("kept").await.unwrap(), Some(b"v".to_vec()));

    store.clear().await;
}

#[tokio::test]
#[ignore]
async fn test_clear_affects_all_flushes_database() {
    // Uses a dedicated logical database so the flush cannot touch other
    // tests' keys.
    let mut store = RedisStore::new("redis://localhost:6379/15").await.unwrap();
    store.set_no_namespace_affects_all(true);

    store.set_namespace(Some("flush-ns"));
    store.set("a", b"1".to_vec(), None).await.unwrap();
    store.set_namespace(None::<String>);
    store.set("plain", b"2".to_vec(), None).await.unwrap();

    let report = store.clear().await;
    assert!(report.is_complete());

    assert_eq!(store.get("plain").await.unwrap(), None);
    store.set_namespace(Some("flush-ns"));
    assert_eq!(store.get("a").await.unwrap(), None);
}

#[tokio::test]
#[ignore]
async fn test_clear_paginates_past_batch_size() {
    let mut store = create_store_in("it-pages").await;
    store.set_clear_batch_size(10);

    let entries: Vec<Entry> = (0..100)
        .map(|i| Entry::new(format!("k{i}"), format!("v{i}").into_bytes()))
        .collect();
    store.set_many(&entries).await.unwrap();

    let report = store.clear().await;
    assert!(report.is_complete());
    assert_eq!(report.deleted, 100);

    let keys: Vec<&str> = ["k0", "k50", "k99"].to_vec();
    assert_eq!(store.has_many(&keys).await.unwrap(), vec![false; 3]);
}

#[tokio::test]
#[ignore]
async fn test_iter_yields_namespace_with_stripped_keys() {
    let mut store = create_store().await;

    store.set_namespace(Some("it-iter-n1"));
    store
        .set_many(&[
            Entry::new("a", b"1".to_vec()),
            Entry::new("b", b"2".to_vec()),
            Entry::new("c", b"3".to_vec()),
        ])
        .await
        .unwrap();

    store.set_namespace(Some("it-iter-n2"));
    store.set("other", b"x".to_vec(), None).await.unwrap();

    let mut iter = store.iter(Some("it-iter-n1"));
    let mut seen = Vec::new();
    while let Some((key, value)) = iter.next().await.unwrap() {
        seen.push((key, value));
    }
    seen.sort();
    assert_eq!(
        seen,
        vec![
            ("a".to_string(), b"1".to_vec()),
            ("b".to_string(), b"2".to_vec()),
            ("c".to_string(), b"3".to_vec()),
        ]
    );

    // Cleanup
    store.set_namespace(Some("it-iter-n1"));
    store.clear().await;
    store.set_namespace(Some("it-iter-n2"));
    store.clear().await;
}

#[tokio::test]
#[ignore]
async fn test_iter_without_namespace_skips_namespaced_keys() {
    let mut store = create_store().await;

    store.set("it-noiter-plain", b"v".to_vec(), None).await.unwrap();
    store.set_namespace(Some("it-noiter-ns"));
    store.set("hidden", b"v".to_vec(), None).await.unwrap();
    store.set_namespace(None::<String>);

    let mut iter = store.iter(None);
    let mut keys = Vec::new();
    while let Some((key, _)) = iter.next().await.unwrap() {
        keys.push(key);
    }
    assert!(keys.contains(&"it-noiter-plain".to_string()));
    assert!(keys.iter().all(|k| !k.contains("::")));

    // Cleanup
    store.delete("it-noiter-plain").await.unwrap();
    store.set_namespace(Some("it-noiter-ns"));
    store.clear().await;
}

#[tokio::test]
#[ignore]
async fn test_iter_early_termination() {
    let store = create_store_in("it-early").await;

    let entries: Vec<Entry> = (0..50)
        .map(|i| Entry::new(format!("k{i}"), b"v".to_vec()))
        .collect();
    store.set_many(&entries).await.unwrap();

    // Take a single entry and drop the iterator; no explicit cancel
    // exists or is needed.
    let mut iter = store.iter(Some("it-early"));
    let first = iter.next().await.unwrap();
    assert!(first.is_some());
    drop(iter);

    store.clear().await;
}

#[tokio::test]
#[ignore]
async fn test_iter_as_stream() {
    use futures::StreamExt;

    let store = create_store_in("it-stream").await;
    store.set("only", b"v".to_vec(), None).await.unwrap();

    let stream = KeyValueStore::iter(&store, Some("it-stream"));
    let items: Vec<_> = stream.collect().await;
    assert_eq!(items.len(), 1);
    let (key, value) = items.into_iter().next().unwrap().unwrap();
    assert_eq!(key, "only");
    assert_eq!(value, b"v".to_vec());

    store.clear().await;
}

#[tokio::test]
#[ignore]
async fn test_custom_separator() {
    let mut store = create_store().await;
    store.set_key_prefix_separator("/");
    store.set_namespace(Some("it-sep"));

    store.set("k", b"v".to_vec(), None).await.unwrap();
    assert_eq!(store.get("k").await.unwrap(), Some(b"v".to_vec()));

    let mut iter = store.iter(Some("it-sep"));
    let (key, _) = iter.next().await.unwrap().unwrap();
    assert_eq!(key, "k");

    store.clear().await;
}

#[tokio::test]
#[ignore]
async fn test_with_manager_shares_caller_connection() {
    let client = redis::Client::open(URL).unwrap();
    let manager = redis::aio::ConnectionManager::new(client).await.unwrap();

    let mut store = RedisStore::with_manager(manager);
    store.set_namespace(Some("it-manager"));

    store.set("k", b"v".to_vec(), None).await.unwrap();
    assert_eq!(store.get("k").await.unwrap(), Some(b"v".to_vec()));

    store.clear().await;
}
