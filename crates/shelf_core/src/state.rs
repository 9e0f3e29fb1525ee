use std::collections::BTreeSet;

use crate::pagination;
use crate::view_model::{
    AppViewModel, ArticleCardView, FormView, ListingView, PreviewView, SearchResultsView,
    SearchView, TabView,
};
use crate::{Article, ArticleId, ArticleMetadata, StatusFilter};

pub type RequestId = u64;

pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Snapshot of the listing state a request was issued for. A response is only
/// applied when its tag still equals the outstanding one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListingTag {
    pub request: RequestId,
    pub filter: StatusFilter,
    pub page: usize,
}

/// Outcome of one query as seen by the view.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum QueryState<T> {
    #[default]
    Idle,
    Loading,
    Loaded(T),
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct SearchState {
    pub(crate) open: bool,
    pub(crate) input: String,
    pub(crate) query: String,
    pub(crate) results: QueryState<Vec<Article>>,
    pub(crate) pending: Option<RequestId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct FormState {
    pub(crate) input: String,
    pub(crate) preview: QueryState<ArticleMetadata>,
    /// Request id and the normalized URL the preview was asked for.
    pub(crate) preview_request: Option<(RequestId, String)>,
    pub(crate) saving: bool,
    pub(crate) error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    page_size: usize,
    pub(crate) active_tab: StatusFilter,
    pub(crate) current_page: usize,
    pub(crate) listing: QueryState<Vec<Article>>,
    pub(crate) listing_request: Option<ListingTag>,
    pub(crate) busy: BTreeSet<ArticleId>,
    pub(crate) search: SearchState,
    pub(crate) form: FormState,
    pub(crate) notice: Option<Notice>,
    next_request: RequestId,
    dirty: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self::with_page_size(DEFAULT_PAGE_SIZE)
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// A zero page size is treated as one.
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            active_tab: StatusFilter::default(),
            current_page: 1,
            listing: QueryState::Idle,
            listing_request: None,
            busy: BTreeSet::new(),
            search: SearchState::default(),
            form: FormState::default(),
            notice: None,
            next_request: 1,
            dirty: false,
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn active_tab(&self) -> StatusFilter {
        self.active_tab
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    /// Outstanding listing request, if any.
    pub fn listing_request(&self) -> Option<ListingTag> {
        self.listing_request
    }

    pub fn is_busy(&self, id: &ArticleId) -> bool {
        self.busy.contains(id)
    }

    /// Returns whether the state changed since the last call.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn next_request_id(&mut self) -> RequestId {
        let id = self.next_request;
        self.next_request += 1;
        id
    }

    pub(crate) fn loaded_articles(&self) -> &[Article] {
        match &self.listing {
            QueryState::Loaded(articles) => articles,
            _ => &[],
        }
    }

    pub fn total_pages(&self) -> usize {
        pagination::total_pages(self.loaded_articles().len(), self.page_size)
    }

    /// Pull the current page back inside the listing after it shrank.
    pub(crate) fn clamp_current_page(&mut self) {
        let total = self.total_pages().max(1);
        if self.current_page > total {
            self.current_page = total;
        }
    }

    pub fn view(&self) -> AppViewModel {
        let total_pages = self.total_pages();
        AppViewModel {
            tabs: StatusFilter::TABS
                .iter()
                .map(|&filter| TabView {
                    filter,
                    label: filter.label(),
                    active: filter == self.active_tab,
                })
                .collect(),
            listing: self.listing_view(),
            current_page: self.current_page,
            total_pages,
            page_window: pagination::compute_window(self.current_page, total_pages),
            can_go_prev: self.current_page > 1,
            can_go_next: self.current_page < total_pages,
            search: self.search_view(),
            form: self.form_view(),
            notice: self.notice.clone(),
            dirty: self.dirty,
        }
    }

    fn card(&self, article: &Article) -> ArticleCardView {
        ArticleCardView {
            id: article.id.clone(),
            url: article.url.clone(),
            title: article.display_title().to_string(),
            description: article.description.clone(),
            image: article.image.clone(),
            memo: article.memo.clone(),
            status: article.status,
            status_label: article.status.label(),
            created_at: article.created_at,
            busy: self.busy.contains(&article.id),
        }
    }

    fn listing_view(&self) -> ListingView {
        match &self.listing {
            QueryState::Idle | QueryState::Loading => ListingView::Loading,
            QueryState::Failed(message) => ListingView::Error(message.clone()),
            QueryState::Loaded(articles) if articles.is_empty() => ListingView::Empty,
            QueryState::Loaded(articles) => ListingView::Items(
                pagination::slice(articles, self.current_page, self.page_size)
                    .iter()
                    .map(|article| self.card(article))
                    .collect(),
            ),
        }
    }

    fn search_view(&self) -> Option<SearchView> {
        if !self.search.open {
            return None;
        }
        let results = match &self.search.results {
            QueryState::Idle => SearchResultsView::Idle,
            QueryState::Loading => SearchResultsView::Loading,
            QueryState::Failed(message) => SearchResultsView::Error(message.clone()),
            QueryState::Loaded(articles) if articles.is_empty() => SearchResultsView::Empty,
            QueryState::Loaded(articles) => {
                SearchResultsView::Items(articles.iter().map(|a| self.card(a)).collect())
            }
        };
        Some(SearchView {
            input: self.search.input.clone(),
            results,
        })
    }

    fn form_view(&self) -> FormView {
        let preview = match (&self.form.preview, &self.form.preview_request) {
            (QueryState::Idle, _) => PreviewView::None,
            (QueryState::Loading, _) => PreviewView::Loading,
            (QueryState::Failed(message), _) => PreviewView::Error(message.clone()),
            (QueryState::Loaded(meta), request) => {
                let url = request
                    .as_ref()
                    .map(|(_, url)| url.as_str())
                    .unwrap_or(self.form.input.as_str());
                PreviewView::Ready {
                    title: meta.display_title(url).to_string(),
                    description: meta.description.clone(),
                    image: meta.image.clone(),
                }
            }
        };
        FormView {
            input: self.form.input.clone(),
            preview,
            saving: self.form.saving,
            error: self.form.error.clone(),
        }
    }
}
