//! Shelf core: domain model, pagination and the pure presentation state machine.
mod effect;
mod model;
mod msg;
pub mod pagination;
mod state;
mod update;
mod view_model;

pub use effect::Effect;
pub use model::{
    validate_article_url, Article, ArticleId, ArticleMetadata, ArticleStatus, OwnerId,
    StatusFilter, ValidationError,
};
pub use msg::Msg;
pub use pagination::PageItem;
pub use state::{
    AppState, ListingTag, Notice, NoticeLevel, QueryState, RequestId, DEFAULT_PAGE_SIZE,
};
pub use update::update;
pub use view_model::{
    AppViewModel, ArticleCardView, FormView, ListingView, PreviewView, SearchResultsView,
    SearchView, TabView,
};
