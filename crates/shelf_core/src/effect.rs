use crate::{ArticleId, ArticleStatus, ListingTag, RequestId, StatusFilter};

/// Work the runtime must perform on behalf of the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// List the owner's articles for `filter`; answer with `Msg::ListingLoaded`.
    FetchListing { tag: ListingTag, filter: StatusFilter },
    /// Feed the raw search input through the debouncer.
    DebounceSearch { query: String },
    /// Drop any pending debounce timer without firing it.
    CancelSearchDebounce,
    RunSearch { request: RequestId, query: String },
    FetchPreview { request: RequestId, url: String },
    CreateArticle {
        url: String,
        status: ArticleStatus,
        memo: String,
    },
    UpdateArticle {
        id: ArticleId,
        memo: String,
        status: ArticleStatus,
    },
    DeleteArticle { id: ArticleId },
}
