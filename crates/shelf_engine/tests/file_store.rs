use chrono::{TimeZone, Utc};
use shelf_core::{ArticleId, ArticleStatus, OwnerId, StatusFilter};
use shelf_engine::{FileRecordStore, RecordStore, StoreError, StoredArticle, StoredStatus};

fn record(id: &str, owner: &str, minute: u32) -> StoredArticle {
    StoredArticle {
        id: id.to_string(),
        owner_id: owner.to_string(),
        url: format!("https://example.com/{id}"),
        title: None,
        description: None,
        image: None,
        memo: String::new(),
        status: StoredStatus::WantToRead,
        created_at: Utc.with_ymd_and_hms(2024, 3, 1, 8, minute, 0).unwrap(),
        seq: 0,
    }
}

#[tokio::test]
async fn records_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data").join("articles.json");
    let owner = OwnerId::new("alice");

    {
        let store = FileRecordStore::open(path.clone()).unwrap();
        store.insert(record("a", "alice", 1)).await.unwrap();
        store.insert(record("b", "alice", 2)).await.unwrap();
        store.insert(record("c", "bob", 3)).await.unwrap();
        let updated = store
            .update(&owner, &ArticleId::new("a"), "memo".into(), ArticleStatus::Completed)
            .await
            .unwrap()
            .expect("owned record");
        assert_eq!(updated.status, StoredStatus::Completed);
        assert!(store.delete(&owner, &ArticleId::new("b")).await.unwrap());
    }

    let reopened = FileRecordStore::open(path).unwrap();
    let rows = reopened.list(&owner, StatusFilter::All).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, "a");
    assert_eq!(rows[0].memo, "memo");
    assert_eq!(rows[0].status, StoredStatus::Completed);

    let bob = reopened
        .list(&OwnerId::new("bob"), StatusFilter::All)
        .await
        .unwrap();
    assert_eq!(bob.len(), 1);
}

#[tokio::test]
async fn equal_timestamps_keep_insertion_order_newest_first() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileRecordStore::open(dir.path().join("articles.json")).unwrap();
    store.insert(record("first", "alice", 5)).await.unwrap();
    store.insert(record("second", "alice", 5)).await.unwrap();

    let rows = store
        .list(&OwnerId::new("alice"), StatusFilter::All)
        .await
        .unwrap();
    let ids: Vec<_> = rows.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["second", "first"]);
}

#[tokio::test]
async fn missing_ids_do_not_touch_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("articles.json");
    let store = FileRecordStore::open(path.clone()).unwrap();
    let owner = OwnerId::new("alice");

    assert!(!store.delete(&owner, &ArticleId::new("nope")).await.unwrap());
    assert!(store
        .update(&owner, &ArticleId::new("nope"), String::new(), ArticleStatus::Completed)
        .await
        .unwrap()
        .is_none());
    assert!(!path.exists());
}

#[test]
fn corrupt_snapshot_is_a_persistence_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("articles.json");
    std::fs::write(&path, "{ not json").unwrap();

    let err = FileRecordStore::open(path).unwrap_err();
    assert!(matches!(err, StoreError::Persistence(_)));
}

#[tokio::test]
async fn failed_write_leaves_records_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let data_dir = dir.path().join("data");
    let store = FileRecordStore::open(data_dir.join("articles.json")).unwrap();
    let owner = OwnerId::new("alice");
    store.insert(record("kept", "alice", 1)).await.unwrap();

    std::fs::remove_dir_all(&data_dir).unwrap();
    std::fs::write(&data_dir, "not a directory").unwrap();

    let err = store.insert(record("lost", "alice", 2)).await.unwrap_err();
    assert!(matches!(err, StoreError::Persistence(_)));
    let err = store
        .update(&owner, &ArticleId::new("kept"), "memo".into(), ArticleStatus::Completed)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Persistence(_)));
    assert!(matches!(
        store.delete(&owner, &ArticleId::new("kept")).await,
        Err(StoreError::Persistence(_))
    ));

    let rows = store.list(&owner, StatusFilter::All).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, "kept");
    assert_eq!(rows[0].memo, "");
    assert_eq!(rows[0].status, StoredStatus::WantToRead);
}
