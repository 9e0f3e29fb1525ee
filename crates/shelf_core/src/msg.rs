use crate::{Article, ArticleId, ArticleMetadata, ArticleStatus, ListingTag, RequestId, StatusFilter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// First render: load the default tab.
    Initialized,
    /// User picked a status tab.
    TabSelected(StatusFilter),
    /// User clicked a page button.
    PageRequested(usize),
    /// Store answered a listing request.
    ListingLoaded {
        tag: ListingTag,
        result: Result<Vec<Article>, String>,
    },
    SearchOpened,
    /// Closing clears the query and cancels the pending debounce.
    SearchClosed,
    /// Raw keystroke-level search input.
    SearchInputChanged(String),
    /// Debouncer settled on a query.
    SearchQuerySettled(String),
    SearchLoaded {
        request: RequestId,
        result: Result<Vec<Article>, String>,
    },
    /// User edited the URL box.
    UrlInputChanged(String),
    /// User asked to see page metadata before saving.
    PreviewRequested,
    PreviewLoaded {
        request: RequestId,
        result: Result<ArticleMetadata, String>,
    },
    /// User saved the URL currently in the input box.
    SaveRequested { status: ArticleStatus, memo: String },
    ArticleCreated { result: Result<Article, String> },
    UpdateRequested {
        id: ArticleId,
        memo: String,
        status: ArticleStatus,
    },
    ArticleUpdated {
        id: ArticleId,
        result: Result<Article, String>,
    },
    DeleteRequested { id: ArticleId },
    ArticleDeleted {
        id: ArticleId,
        result: Result<(), String>,
    },
}
