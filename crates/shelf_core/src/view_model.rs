use chrono::{DateTime, Utc};

use crate::{ArticleId, ArticleStatus, Notice, PageItem, StatusFilter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppViewModel {
    pub tabs: Vec<TabView>,
    pub listing: ListingView,
    pub current_page: usize,
    pub total_pages: usize,
    /// Empty when there is at most one page.
    pub page_window: Vec<PageItem>,
    pub can_go_prev: bool,
    pub can_go_next: bool,
    /// `None` while the search panel is closed.
    pub search: Option<SearchView>,
    pub form: FormView,
    pub notice: Option<Notice>,
    pub dirty: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TabView {
    pub filter: StatusFilter,
    pub label: &'static str,
    pub active: bool,
}

/// Loading, empty and error are mutually exclusive; items only when there
/// is something to show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingView {
    Loading,
    Empty,
    Error(String),
    Items(Vec<ArticleCardView>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleCardView {
    pub id: ArticleId,
    pub url: String,
    /// Page title, or the URL when extraction found none.
    pub title: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub memo: String,
    pub status: ArticleStatus,
    pub status_label: &'static str,
    pub created_at: DateTime<Utc>,
    /// An update or delete for this article is in flight.
    pub busy: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchView {
    pub input: String,
    pub results: SearchResultsView,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchResultsView {
    /// No settled query yet.
    Idle,
    Loading,
    Empty,
    Error(String),
    Items(Vec<ArticleCardView>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormView {
    pub input: String,
    pub preview: PreviewView,
    pub saving: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewView {
    None,
    Loading,
    Ready {
        title: String,
        description: Option<String>,
        image: Option<String>,
    },
    Error(String),
}
