use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use shelf_core::{Article, ArticleId, ArticleMetadata, ListingTag, RequestId};

use crate::StoreError;

/// Source of creation timestamps.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

pub fn system_clock() -> Clock {
    Arc::new(Utc::now)
}

/// Completion of one engine command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    ListingLoaded {
        tag: ListingTag,
        result: Result<Vec<Article>, StoreError>,
    },
    SearchLoaded {
        request: RequestId,
        result: Result<Vec<Article>, StoreError>,
    },
    PreviewLoaded {
        request: RequestId,
        result: Result<ArticleMetadata, FetchError>,
    },
    Created {
        result: Result<Article, StoreError>,
    },
    Updated {
        id: ArticleId,
        result: Result<Article, StoreError>,
    },
    Deleted {
        id: ArticleId,
        result: Result<(), StoreError>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutput {
    pub bytes: Vec<u8>,
    pub metadata: FetchMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchMetadata {
    pub requested_url: String,
    /// After redirects; relative links resolve against this.
    pub final_url: String,
    pub content_type: Option<String>,
    pub byte_len: u64,
}

/// Why a page could not be turned into metadata. `message` is shown to the
/// user as is; `kind` is for callers that need to branch.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct FetchError {
    pub kind: FailureKind,
    pub message: String,
}

impl FetchError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    /// Not an absolute http(s) URL.
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    RedirectLimitExceeded,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    UnsupportedContentType { content_type: String },
    /// The body could not be decoded into markup.
    Markup,
    Network,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => f.write_str("invalid-url"),
            FailureKind::HttpStatus(code) => write!(f, "status-{code}"),
            FailureKind::Timeout => f.write_str("timeout"),
            FailureKind::RedirectLimitExceeded => f.write_str("redirect-loop"),
            FailureKind::TooLarge { max_bytes, .. } => write!(f, "over-{max_bytes}-bytes"),
            FailureKind::UnsupportedContentType { content_type } => {
                write!(f, "content-type:{content_type}")
            }
            FailureKind::Markup => f.write_str("markup"),
            FailureKind::Network => f.write_str("network"),
        }
    }
}
