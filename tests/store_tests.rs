use linkstash::store::{MemoryStore, Store, StoreError};
use serde_json::json;

#[tokio::test]
async fn create_then_read_roundtrips() {
    let store = MemoryStore::new();
    let record = json!({"phone": "1234567890", "firstName": "Ada"});

    store.create("accounts", "1234567890", record.clone()).await.unwrap();
    let read_back = store.read("accounts", "1234567890").await.unwrap();
    assert_eq!(read_back, record);
}

#[tokio::test]
async fn create_conflicts_on_existing_key() {
    let store = MemoryStore::new();
    store.create("accounts", "k", json!({"v": 1})).await.unwrap();

    let err = store.create("accounts", "k", json!({"v": 2})).await.unwrap_err();
    assert!(matches!(err, StoreError::Conflict));

    // The original record was not overwritten.
    assert_eq!(store.read("accounts", "k").await.unwrap(), json!({"v": 1}));
}

#[tokio::test]
async fn read_update_delete_report_not_found_on_absent_keys() {
    let store = MemoryStore::new();

    assert!(matches!(
        store.read("accounts", "missing").await.unwrap_err(),
        StoreError::NotFound
    ));
    assert!(matches!(
        store.update("accounts", "missing", json!({})).await.unwrap_err(),
        StoreError::NotFound
    ));
    assert!(matches!(
        store.delete("accounts", "missing").await.unwrap_err(),
        StoreError::NotFound
    ));
}

#[tokio::test]
async fn update_replaces_the_record() {
    let store = MemoryStore::new();
    store.create("tokens", "t", json!({"expires": 1})).await.unwrap();
    store.update("tokens", "t", json!({"expires": 2})).await.unwrap();
    assert_eq!(store.read("tokens", "t").await.unwrap(), json!({"expires": 2}));
}

#[tokio::test]
async fn list_returns_sorted_keys_and_is_scoped_by_collection() {
    let store = MemoryStore::new();
    store.create("media", "bbb", json!({})).await.unwrap();
    store.create("media", "aaa", json!({})).await.unwrap();
    store.create("accounts", "zzz", json!({})).await.unwrap();

    assert_eq!(store.list("media").await.unwrap(), vec!["aaa", "bbb"]);
    assert_eq!(store.list("accounts").await.unwrap(), vec!["zzz"]);
    assert!(store.list("tokens").await.unwrap().is_empty());
}

#[tokio::test]
async fn delete_removes_only_the_named_record() {
    let store = MemoryStore::new();
    store.create("media", "keep", json!({})).await.unwrap();
    store.create("media", "drop", json!({})).await.unwrap();

    store.delete("media", "drop").await.unwrap();
    assert_eq!(store.list("media").await.unwrap(), vec!["keep"]);
}
