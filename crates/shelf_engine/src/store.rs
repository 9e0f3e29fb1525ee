use std::sync::Arc;

use shelf_core::{
    validate_article_url, Article, ArticleId, ArticleMetadata, ArticleStatus, OwnerId,
    StatusFilter, ValidationError,
};
use shelf_logging::{shelf_info, shelf_warn};

use crate::cache::{CacheKey, ListingCache};
use crate::records::{RecordStore, StoredArticle};
use crate::{Clock, MetadataSource};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("article not found: {0}")]
    NotFound(ArticleId),
    #[error("unauthorized: no authenticated owner")]
    Unauthorized,
}

/// Authenticated-owner context supplied by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthContext {
    owner: Option<OwnerId>,
}

impl AuthContext {
    pub fn authenticated(owner: OwnerId) -> Self {
        Self { owner: Some(owner) }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn require_owner(&self) -> Result<&OwnerId, StoreError> {
        self.owner.as_ref().ok_or(StoreError::Unauthorized)
    }
}

/// Owner-scoped article operations with cached reads.
///
/// Any successful create, update or delete invalidates the owner's cached
/// listings and searches before returning.
pub struct ArticleStore {
    records: Arc<dyn RecordStore>,
    metadata: Arc<dyn MetadataSource>,
    cache: ListingCache,
    clock: Clock,
}

impl ArticleStore {
    pub fn new(records: Arc<dyn RecordStore>, metadata: Arc<dyn MetadataSource>, clock: Clock) -> Self {
        Self {
            records,
            metadata,
            cache: ListingCache::new(),
            clock,
        }
    }

    /// Extract metadata for `url` and save a new article. Extraction failures
    /// are absorbed: the article is stored with absent fields.
    pub async fn create(
        &self,
        auth: &AuthContext,
        url: &str,
        status: ArticleStatus,
        memo: Option<String>,
    ) -> Result<Article, StoreError> {
        let owner = auth.require_owner()?;
        let url = validate_article_url(url)?;

        let metadata = match self.metadata.extract(&url).await {
            Ok(metadata) => metadata,
            Err(err) => {
                shelf_warn!("Metadata extraction failed for {} ({}): {}", url, err.kind, err);
                ArticleMetadata::default()
            }
        };

        let record = StoredArticle {
            id: uuid::Uuid::new_v4().to_string(),
            owner_id: owner.as_str().to_string(),
            url,
            title: metadata.title,
            description: metadata.description,
            image: metadata.image,
            memo: memo.unwrap_or_default(),
            status: status.into(),
            created_at: (self.clock)(),
            seq: 0,
        };
        let stored = self.records.insert(record).await?;
        self.cache.invalidate(owner);

        let article = Article::from(stored);
        shelf_info!("Created article id={} owner={} status={}", article.id, owner, article.status);
        Ok(article)
    }

    /// Newest first. `StatusFilter::All` returns every article of the owner.
    pub async fn list_by_status(
        &self,
        auth: &AuthContext,
        filter: StatusFilter,
    ) -> Result<Vec<Article>, StoreError> {
        let owner = auth.require_owner()?;
        let key = CacheKey::Status(filter);
        if let Some(hit) = self.cache.get(owner, &key) {
            return Ok(hit);
        }

        let generation = self.cache.generation(owner);
        let articles: Vec<Article> = self
            .records
            .list(owner, filter)
            .await?
            .into_iter()
            .map(Article::from)
            .collect();
        self.cache.insert(owner, key, generation, articles.clone());
        Ok(articles)
    }

    /// Case-insensitive substring search over url, title and memo. An empty
    /// query matches nothing.
    pub async fn search(&self, auth: &AuthContext, query: &str) -> Result<Vec<Article>, StoreError> {
        let owner = auth.require_owner()?;
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let needle = query.to_lowercase();
        let key = CacheKey::Search(needle.clone());
        if let Some(hit) = self.cache.get(owner, &key) {
            return Ok(hit);
        }

        let generation = self.cache.generation(owner);
        let articles: Vec<Article> = self
            .records
            .search(owner, &needle)
            .await?
            .into_iter()
            .map(Article::from)
            .collect();
        self.cache.insert(owner, key, generation, articles.clone());
        Ok(articles)
    }

    pub async fn update(
        &self,
        auth: &AuthContext,
        id: &ArticleId,
        memo: String,
        status: ArticleStatus,
    ) -> Result<Article, StoreError> {
        let owner = auth.require_owner()?;
        let updated = self
            .records
            .update(owner, id, memo, status)
            .await?
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        self.cache.invalidate(owner);

        shelf_info!("Updated article id={} owner={} status={}", id, owner, status);
        Ok(Article::from(updated))
    }

    pub async fn delete(&self, auth: &AuthContext, id: &ArticleId) -> Result<(), StoreError> {
        let owner = auth.require_owner()?;
        if !self.records.delete(owner, id).await? {
            return Err(StoreError::NotFound(id.clone()));
        }
        self.cache.invalidate(owner);

        shelf_info!("Deleted article id={} owner={}", id, owner);
        Ok(())
    }
}
