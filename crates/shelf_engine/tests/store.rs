use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, Once};

use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use shelf_core::{ArticleId, ArticleMetadata, ArticleStatus, OwnerId, StatusFilter};
use shelf_engine::{
    ArticleStore, AuthContext, Clock, FailureKind, FetchError, MemoryRecordStore, MetadataSource,
    StoreError,
};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(shelf_logging::initialize_for_tests);
}

/// Scripted metadata per URL; unknown URLs time out.
#[derive(Default)]
struct ScriptedMetadata {
    pages: Mutex<HashMap<String, ArticleMetadata>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedMetadata {
    fn with_page(self, url: &str, title: &str) -> Self {
        self.pages.lock().unwrap().insert(
            url.to_string(),
            ArticleMetadata {
                title: Some(title.to_string()),
                description: Some(format!("About {title}")),
                image: None,
            },
        );
        self
    }
}

#[async_trait::async_trait]
impl MetadataSource for ScriptedMetadata {
    async fn extract(&self, url: &str) -> Result<ArticleMetadata, FetchError> {
        self.calls.lock().unwrap().push(url.to_string());
        self.pages
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or(FetchError {
                kind: FailureKind::Timeout,
                message: "operation timed out".into(),
            })
    }
}

/// One minute later on every call.
fn ticking_clock() -> Clock {
    let minutes = Arc::new(AtomicI64::new(0));
    Arc::new(move || {
        let minute = minutes.fetch_add(1, Ordering::SeqCst);
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + chrono::Duration::minutes(minute)
    })
}

fn store_with(metadata: ScriptedMetadata) -> ArticleStore {
    ArticleStore::new(
        Arc::new(MemoryRecordStore::new()),
        Arc::new(metadata),
        ticking_clock(),
    )
}

fn alice() -> AuthContext {
    AuthContext::authenticated(OwnerId::new("alice"))
}

fn bob() -> AuthContext {
    AuthContext::authenticated(OwnerId::new("bob"))
}

fn ids(articles: &[shelf_core::Article]) -> Vec<String> {
    articles.iter().map(|a| a.id.as_str().to_string()).collect()
}

#[tokio::test]
async fn create_with_failed_extraction_stores_absent_fields() {
    init_logging();
    let store = store_with(ScriptedMetadata::default());

    let article = store
        .create(&alice(), "https://example.com/a", ArticleStatus::WantToRead, None)
        .await
        .expect("create ok");

    assert_eq!(article.title, None);
    assert_eq!(article.description, None);
    assert_eq!(article.image, None);
    assert_eq!(article.memo, "");
    assert_eq!(article.url, "https://example.com/a");
    assert_eq!(article.owner_id, OwnerId::new("alice"));

    let to_read = store
        .list_by_status(&alice(), StatusFilter::Only(ArticleStatus::WantToRead))
        .await
        .unwrap();
    assert_eq!(to_read, vec![article.clone()]);
    for other in [ArticleStatus::InProgress, ArticleStatus::Completed] {
        let listed = store
            .list_by_status(&alice(), StatusFilter::Only(other))
            .await
            .unwrap();
        assert!(listed.is_empty());
    }
    let all = store.list_by_status(&alice(), StatusFilter::All).await.unwrap();
    assert_eq!(all, vec![article]);
}

#[tokio::test]
async fn create_uses_extracted_metadata() {
    init_logging();
    let store =
        store_with(ScriptedMetadata::default().with_page("https://example.com/rust", "Rust"));

    let article = store
        .create(
            &alice(),
            "https://example.com/rust",
            ArticleStatus::InProgress,
            Some("chapter 3".into()),
        )
        .await
        .unwrap();

    assert_eq!(article.title.as_deref(), Some("Rust"));
    assert_eq!(article.description.as_deref(), Some("About Rust"));
    assert_eq!(article.memo, "chapter 3");
}

#[tokio::test]
async fn invalid_input_is_rejected_before_any_io() {
    init_logging();
    let metadata = Arc::new(ScriptedMetadata::default());
    let store = ArticleStore::new(
        Arc::new(MemoryRecordStore::new()),
        metadata.clone(),
        ticking_clock(),
    );

    let err = store
        .create(&alice(), "mailto:someone@example.com", ArticleStatus::WantToRead, None)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));

    let err = store
        .create(&AuthContext::anonymous(), "https://example.com", ArticleStatus::WantToRead, None)
        .await
        .unwrap_err();
    assert_eq!(err, StoreError::Unauthorized);

    assert!(metadata.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn every_operation_requires_an_owner() {
    init_logging();
    let store = store_with(ScriptedMetadata::default());
    let anon = AuthContext::anonymous();
    let id = ArticleId::new("x");

    assert_eq!(
        store.list_by_status(&anon, StatusFilter::All).await,
        Err(StoreError::Unauthorized)
    );
    assert_eq!(store.search(&anon, "x").await, Err(StoreError::Unauthorized));
    assert_eq!(
        store
            .update(&anon, &id, String::new(), ArticleStatus::Completed)
            .await,
        Err(StoreError::Unauthorized)
    );
    assert_eq!(store.delete(&anon, &id).await, Err(StoreError::Unauthorized));
}

#[tokio::test]
async fn listings_are_newest_first_and_status_filtered() {
    init_logging();
    let store = store_with(ScriptedMetadata::default());
    let mut created = Vec::new();
    for (i, status) in [
        ArticleStatus::WantToRead,
        ArticleStatus::Completed,
        ArticleStatus::WantToRead,
        ArticleStatus::InProgress,
    ]
    .into_iter()
    .enumerate()
    {
        created.push(
            store
                .create(&alice(), &format!("https://example.com/{i}"), status, None)
                .await
                .unwrap(),
        );
    }

    let all = store.list_by_status(&alice(), StatusFilter::All).await.unwrap();
    assert_eq!(
        ids(&all),
        created.iter().rev().map(|a| a.id.as_str().to_string()).collect::<Vec<_>>()
    );

    let to_read = store
        .list_by_status(&alice(), StatusFilter::Only(ArticleStatus::WantToRead))
        .await
        .unwrap();
    assert_eq!(ids(&to_read), ids(&[created[2].clone(), created[0].clone()]));
    assert!(to_read.iter().all(|a| a.status == ArticleStatus::WantToRead));
}

#[tokio::test]
async fn articles_are_visible_only_to_their_owner() {
    init_logging();
    let store = store_with(ScriptedMetadata::default());
    let article = store
        .create(&alice(), "https://example.com/private", ArticleStatus::WantToRead, None)
        .await
        .unwrap();

    assert!(store
        .list_by_status(&bob(), StatusFilter::All)
        .await
        .unwrap()
        .is_empty());
    assert!(store.search(&bob(), "private").await.unwrap().is_empty());
    assert_eq!(
        store
            .update(&bob(), &article.id, "mine now".into(), ArticleStatus::Completed)
            .await,
        Err(StoreError::NotFound(article.id.clone()))
    );
    assert_eq!(
        store.delete(&bob(), &article.id).await,
        Err(StoreError::NotFound(article.id.clone()))
    );

    let still_there = store.list_by_status(&alice(), StatusFilter::All).await.unwrap();
    assert_eq!(still_there, vec![article]);
}

#[tokio::test]
async fn search_matches_url_title_and_memo_case_insensitively() {
    init_logging();
    let store = store_with(
        ScriptedMetadata::default().with_page("https://example.com/borrow", "Borrow Checker Notes"),
    );
    let by_title = store
        .create(&alice(), "https://example.com/borrow", ArticleStatus::WantToRead, None)
        .await
        .unwrap();
    let by_url = store
        .create(&alice(), "https://CHECKER.example.org/x", ArticleStatus::Completed, None)
        .await
        .unwrap();
    let by_memo = store
        .create(
            &alice(),
            "https://example.net/y",
            ArticleStatus::InProgress,
            Some("re-read the checker part".into()),
        )
        .await
        .unwrap();
    store
        .create(&alice(), "https://example.net/unrelated", ArticleStatus::WantToRead, None)
        .await
        .unwrap();

    let hits = store.search(&alice(), "ChEcKeR").await.unwrap();
    assert_eq!(ids(&hits), ids(&[by_memo, by_url, by_title]));
}

#[tokio::test]
async fn empty_search_returns_nothing() {
    init_logging();
    let store = store_with(ScriptedMetadata::default());
    for i in 0..3 {
        store
            .create(&alice(), &format!("https://example.com/{i}"), ArticleStatus::WantToRead, None)
            .await
            .unwrap();
    }
    assert!(store.search(&alice(), "").await.unwrap().is_empty());
}

#[tokio::test]
async fn update_is_visible_to_the_next_listing() {
    init_logging();
    let store = store_with(ScriptedMetadata::default());
    let article = store
        .create(&alice(), "https://example.com/a", ArticleStatus::WantToRead, None)
        .await
        .unwrap();

    // Warm the caches first.
    let completed = StatusFilter::Only(ArticleStatus::Completed);
    assert!(store.list_by_status(&alice(), completed).await.unwrap().is_empty());
    assert!(store.search(&alice(), "done").await.unwrap().is_empty());

    let updated = store
        .update(&alice(), &article.id, "done reading".into(), ArticleStatus::Completed)
        .await
        .unwrap();
    assert_eq!(updated.id, article.id);
    assert_eq!(updated.created_at, article.created_at);
    assert_eq!(updated.url, article.url);

    assert_eq!(
        store.list_by_status(&alice(), completed).await.unwrap(),
        vec![updated.clone()]
    );
    assert!(store
        .list_by_status(&alice(), StatusFilter::Only(ArticleStatus::WantToRead))
        .await
        .unwrap()
        .is_empty());
    assert_eq!(store.search(&alice(), "done").await.unwrap(), vec![updated]);
}

#[tokio::test]
async fn deleted_article_disappears_everywhere() {
    init_logging();
    let store = store_with(ScriptedMetadata::default());
    let keep = store
        .create(&alice(), "https://example.com/keep", ArticleStatus::WantToRead, None)
        .await
        .unwrap();
    let gone = store
        .create(&alice(), "https://example.com/gone", ArticleStatus::WantToRead, None)
        .await
        .unwrap();

    // Warm the caches first.
    store.list_by_status(&alice(), StatusFilter::All).await.unwrap();
    store.search(&alice(), "example").await.unwrap();

    store.delete(&alice(), &gone.id).await.unwrap();

    for filter in StatusFilter::TABS {
        let listed = store.list_by_status(&alice(), filter).await.unwrap();
        assert!(listed.iter().all(|a| a.id != gone.id), "{filter}");
    }
    assert_eq!(store.search(&alice(), "example").await.unwrap(), vec![keep]);
    assert_eq!(
        store.delete(&alice(), &gone.id).await,
        Err(StoreError::NotFound(gone.id))
    );
}
