//! The keyed record store behind the article store.
//!
//! Records are only ever touched through [`RecordStore`]. Every operation is
//! scoped by owner; listings come back newest first.

use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shelf_core::{Article, ArticleId, ArticleStatus, OwnerId, StatusFilter};
use shelf_logging::{shelf_error, shelf_info};

use crate::{AtomicFileWriter, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StoredStatus {
    WantToRead,
    InProgress,
    Completed,
}

impl From<ArticleStatus> for StoredStatus {
    fn from(status: ArticleStatus) -> Self {
        match status {
            ArticleStatus::WantToRead => StoredStatus::WantToRead,
            ArticleStatus::InProgress => StoredStatus::InProgress,
            ArticleStatus::Completed => StoredStatus::Completed,
        }
    }
}

impl From<StoredStatus> for ArticleStatus {
    fn from(status: StoredStatus) -> Self {
        match status {
            StoredStatus::WantToRead => ArticleStatus::WantToRead,
            StoredStatus::InProgress => ArticleStatus::InProgress,
            StoredStatus::Completed => ArticleStatus::Completed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredArticle {
    pub id: String,
    pub owner_id: String,
    pub url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    #[serde(default)]
    pub memo: String,
    pub status: StoredStatus,
    pub created_at: DateTime<Utc>,
    /// Insertion order; breaks ties between equal timestamps.
    #[serde(default)]
    pub seq: u64,
}

impl From<StoredArticle> for Article {
    fn from(record: StoredArticle) -> Self {
        Article {
            id: ArticleId::new(record.id),
            owner_id: OwnerId::new(record.owner_id),
            url: record.url,
            title: record.title,
            description: record.description,
            image: record.image,
            memo: record.memo,
            status: record.status.into(),
            created_at: record.created_at,
        }
    }
}

#[async_trait::async_trait]
pub trait RecordStore: Send + Sync {
    /// Persist a new record; the store assigns `seq`.
    async fn insert(&self, record: StoredArticle) -> Result<StoredArticle, StoreError>;
    async fn list(&self, owner: &OwnerId, filter: StatusFilter)
        -> Result<Vec<StoredArticle>, StoreError>;
    /// `needle` is lowercased and non-empty.
    async fn search(&self, owner: &OwnerId, needle: &str) -> Result<Vec<StoredArticle>, StoreError>;
    /// `None` when no record with `id` belongs to `owner`.
    async fn update(
        &self,
        owner: &OwnerId,
        id: &ArticleId,
        memo: String,
        status: ArticleStatus,
    ) -> Result<Option<StoredArticle>, StoreError>;
    /// `false` when no record with `id` belongs to `owner`.
    async fn delete(&self, owner: &OwnerId, id: &ArticleId) -> Result<bool, StoreError>;
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Snapshot {
    next_seq: u64,
    articles: Vec<StoredArticle>,
}

impl Snapshot {
    fn insert(&mut self, mut record: StoredArticle) -> StoredArticle {
        self.next_seq += 1;
        record.seq = self.next_seq;
        self.articles.push(record.clone());
        record
    }

    fn select<P>(&self, owner: &OwnerId, predicate: P) -> Vec<StoredArticle>
    where
        P: Fn(&StoredArticle) -> bool,
    {
        let mut rows: Vec<StoredArticle> = self
            .articles
            .iter()
            .filter(|row| row.owner_id == owner.as_str() && predicate(row))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.seq.cmp(&a.seq)));
        rows
    }

    fn list(&self, owner: &OwnerId, filter: StatusFilter) -> Vec<StoredArticle> {
        self.select(owner, |row| filter.matches(row.status.into()))
    }

    fn search(&self, owner: &OwnerId, needle: &str) -> Vec<StoredArticle> {
        self.select(owner, |row| Article::from(row.clone()).matches_query(needle))
    }

    fn position(&self, owner: &OwnerId, id: &ArticleId) -> Option<usize> {
        self.articles
            .iter()
            .position(|row| row.id == id.as_str() && row.owner_id == owner.as_str())
    }

    fn update(
        &mut self,
        owner: &OwnerId,
        id: &ArticleId,
        memo: String,
        status: ArticleStatus,
    ) -> Option<StoredArticle> {
        let index = self.position(owner, id)?;
        let row = &mut self.articles[index];
        row.memo = memo;
        row.status = status.into();
        Some(row.clone())
    }

    fn delete(&mut self, owner: &OwnerId, id: &ArticleId) -> bool {
        match self.position(owner, id) {
            Some(index) => {
                self.articles.remove(index);
                true
            }
            None => false,
        }
    }
}

/// Process-local store; contents are lost on exit.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    snapshot: Mutex<Snapshot>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl RecordStore for MemoryRecordStore {
    async fn insert(&self, record: StoredArticle) -> Result<StoredArticle, StoreError> {
        let mut snapshot = self.snapshot.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(snapshot.insert(record))
    }

    async fn list(
        &self,
        owner: &OwnerId,
        filter: StatusFilter,
    ) -> Result<Vec<StoredArticle>, StoreError> {
        let snapshot = self.snapshot.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(snapshot.list(owner, filter))
    }

    async fn search(&self, owner: &OwnerId, needle: &str) -> Result<Vec<StoredArticle>, StoreError> {
        let snapshot = self.snapshot.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(snapshot.search(owner, needle))
    }

    async fn update(
        &self,
        owner: &OwnerId,
        id: &ArticleId,
        memo: String,
        status: ArticleStatus,
    ) -> Result<Option<StoredArticle>, StoreError> {
        let mut snapshot = self.snapshot.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(snapshot.update(owner, id, memo, status))
    }

    async fn delete(&self, owner: &OwnerId, id: &ArticleId) -> Result<bool, StoreError> {
        let mut snapshot = self.snapshot.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(snapshot.delete(owner, id))
    }
}

/// Durable store: the whole collection lives in one JSON file that is
/// rewritten atomically after each mutation. A mutation whose write fails
/// leaves the in-memory state untouched.
#[derive(Debug)]
pub struct FileRecordStore {
    writer: AtomicFileWriter,
    snapshot: Arc<Mutex<Snapshot>>,
}

impl FileRecordStore {
    /// Load `path`, or start empty when it does not exist yet.
    pub fn open(path: PathBuf) -> Result<Self, StoreError> {
        let snapshot = match fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text).map_err(|err| {
                StoreError::Persistence(format!("failed to parse {}: {err}", path.display()))
            })?,
            Err(err) if err.kind() == io::ErrorKind::NotFound => Snapshot::default(),
            Err(err) => {
                return Err(StoreError::Persistence(format!(
                    "failed to read {}: {err}",
                    path.display()
                )))
            }
        };
        shelf_info!(
            "Loaded {} articles from {:?}",
            snapshot.articles.len(),
            path
        );
        Ok(Self {
            writer: AtomicFileWriter::new(path),
            snapshot: Arc::new(Mutex::new(snapshot)),
        })
    }

    /// Apply `change` to a copy, write it out, then commit it in memory. The
    /// write runs on the blocking pool with the lock held, so mutations are
    /// serialized.
    async fn mutate<R, C>(&self, change: C) -> Result<R, StoreError>
    where
        C: FnOnce(&mut Snapshot) -> R + Send + 'static,
        R: Send + 'static,
    {
        let snapshot = self.snapshot.clone();
        let writer = self.writer.clone();
        tokio::task::spawn_blocking(move || commit(&snapshot, &writer, change))
            .await
            .map_err(|err| StoreError::Persistence(format!("write task failed: {err}")))?
    }
}

fn commit<R>(
    snapshot: &Mutex<Snapshot>,
    writer: &AtomicFileWriter,
    change: impl FnOnce(&mut Snapshot) -> R,
) -> Result<R, StoreError> {
    let mut current = snapshot.lock().unwrap_or_else(PoisonError::into_inner);
    let mut next = current.clone();
    let result = change(&mut next);
    let content =
        serde_json::to_vec_pretty(&next).map_err(|err| StoreError::Persistence(err.to_string()))?;
    if let Err(err) = writer.write(&content) {
        shelf_error!("Failed to write {:?}: {}", writer.target(), err);
        return Err(StoreError::Persistence(err.to_string()));
    }
    *current = next;
    Ok(result)
}

#[async_trait::async_trait]
impl RecordStore for FileRecordStore {
    async fn insert(&self, record: StoredArticle) -> Result<StoredArticle, StoreError> {
        self.mutate(move |snapshot| snapshot.insert(record)).await
    }

    async fn list(
        &self,
        owner: &OwnerId,
        filter: StatusFilter,
    ) -> Result<Vec<StoredArticle>, StoreError> {
        let snapshot = self.snapshot.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(snapshot.list(owner, filter))
    }

    async fn search(&self, owner: &OwnerId, needle: &str) -> Result<Vec<StoredArticle>, StoreError> {
        let snapshot = self.snapshot.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(snapshot.search(owner, needle))
    }

    async fn update(
        &self,
        owner: &OwnerId,
        id: &ArticleId,
        memo: String,
        status: ArticleStatus,
    ) -> Result<Option<StoredArticle>, StoreError> {
        // Skip the write entirely for ids the owner does not have.
        {
            let snapshot = self.snapshot.lock().unwrap_or_else(PoisonError::into_inner);
            if snapshot.position(owner, id).is_none() {
                return Ok(None);
            }
        }
        let (owner, id) = (owner.clone(), id.clone());
        self.mutate(move |snapshot| snapshot.update(&owner, &id, memo, status))
            .await
    }

    async fn delete(&self, owner: &OwnerId, id: &ArticleId) -> Result<bool, StoreError> {
        {
            let snapshot = self.snapshot.lock().unwrap_or_else(PoisonError::into_inner);
            if snapshot.position(owner, id).is_none() {
                return Ok(false);
            }
        }
        let (owner, id) = (owner.clone(), id.clone());
        self.mutate(move |snapshot| snapshot.delete(&owner, &id)).await
    }
}
