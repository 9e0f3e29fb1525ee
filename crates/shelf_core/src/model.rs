use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use url::Url;

/// Opaque article identifier, assigned by the store at creation.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ArticleId(String);

impl ArticleId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArticleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of the authenticated user owning a set of articles.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OwnerId(String);

impl OwnerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ArticleStatus {
    WantToRead,
    InProgress,
    Completed,
}

impl ArticleStatus {
    pub const ALL: [ArticleStatus; 3] = [
        ArticleStatus::WantToRead,
        ArticleStatus::InProgress,
        ArticleStatus::Completed,
    ];

    /// Wire name, e.g. `WANT_TO_READ`.
    pub fn as_str(self) -> &'static str {
        match self {
            ArticleStatus::WantToRead => "WANT_TO_READ",
            ArticleStatus::InProgress => "IN_PROGRESS",
            ArticleStatus::Completed => "COMPLETED",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ArticleStatus::WantToRead => "To Read",
            ArticleStatus::InProgress => "In Progress",
            ArticleStatus::Completed => "Read",
        }
    }
}

impl fmt::Display for ArticleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArticleStatus {
    type Err = ValidationError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim() {
            "WANT_TO_READ" => Ok(ArticleStatus::WantToRead),
            "IN_PROGRESS" => Ok(ArticleStatus::InProgress),
            "COMPLETED" => Ok(ArticleStatus::Completed),
            other => Err(ValidationError::InvalidStatus(other.to_string())),
        }
    }
}

/// Listing filter: one of the three statuses, or every article.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StatusFilter {
    Only(ArticleStatus),
    All,
}

impl StatusFilter {
    /// Tabs in display order.
    pub const TABS: [StatusFilter; 4] = [
        StatusFilter::Only(ArticleStatus::WantToRead),
        StatusFilter::Only(ArticleStatus::InProgress),
        StatusFilter::Only(ArticleStatus::Completed),
        StatusFilter::All,
    ];

    pub fn matches(self, status: ArticleStatus) -> bool {
        match self {
            StatusFilter::Only(wanted) => wanted == status,
            StatusFilter::All => true,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            StatusFilter::Only(status) => status.label(),
            StatusFilter::All => "All",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StatusFilter::Only(status) => status.as_str(),
            StatusFilter::All => "ALL",
        }
    }
}

impl Default for StatusFilter {
    fn default() -> Self {
        StatusFilter::Only(ArticleStatus::WantToRead)
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatusFilter {
    type Err = ValidationError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        if raw.trim() == "ALL" {
            return Ok(StatusFilter::All);
        }
        raw.parse().map(StatusFilter::Only)
    }
}

/// Page metadata pulled from structured markup. Every field may be absent.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ArticleMetadata {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
}

impl ArticleMetadata {
    /// Title to show for `url`, falling back to the URL itself.
    pub fn display_title<'a>(&'a self, url: &'a str) -> &'a str {
        self.title.as_deref().unwrap_or(url)
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.image.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    pub id: ArticleId,
    pub owner_id: OwnerId,
    pub url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub memo: String,
    pub status: ArticleStatus,
    pub created_at: DateTime<Utc>,
}

impl Article {
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.url)
    }

    /// Case-insensitive substring match against url, title and memo.
    /// `needle` must already be lowercased.
    pub fn matches_query(&self, needle: &str) -> bool {
        self.url.to_lowercase().contains(needle)
            || self
                .title
                .as_deref()
                .is_some_and(|title| title.to_lowercase().contains(needle))
            || self.memo.to_lowercase().contains(needle)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("unsupported url scheme: {0}")]
    UnsupportedScheme(String),
    #[error("invalid status: {0}")]
    InvalidStatus(String),
}

/// Parse and normalize an article URL. Only absolute http/https URLs pass.
pub fn validate_article_url(raw: &str) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    let parsed =
        Url::parse(trimmed).map_err(|err| ValidationError::InvalidUrl(format!("{trimmed}: {err}")))?;
    match parsed.scheme() {
        "http" | "https" => {}
        other => return Err(ValidationError::UnsupportedScheme(other.to_string())),
    }
    Ok(parsed.to_string())
}
