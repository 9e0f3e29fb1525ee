use crate::state::QueryState;
use crate::{validate_article_url, AppState, Effect, ListingTag, Msg, Notice, StatusFilter};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::Initialized => {
            let filter = state.active_tab;
            select_tab(&mut state, filter)
        }
        Msg::TabSelected(filter) => select_tab(&mut state, filter),
        Msg::PageRequested(page) => {
            // Controls are disabled at the boundaries; anything else is ignored.
            if page == 0 || page > state.total_pages() || page == state.current_page {
                return (state, Vec::new());
            }
            state.current_page = page;
            state.mark_dirty();
            vec![issue_listing(&mut state)]
        }
        Msg::ListingLoaded { tag, result } => {
            if state.listing_request != Some(tag) {
                return (state, Vec::new());
            }
            state.listing_request = None;
            match result {
                Ok(articles) => {
                    state.listing = QueryState::Loaded(articles);
                    state.clamp_current_page();
                }
                // Keep the page so a retry lands where the user was.
                Err(message) => state.listing = QueryState::Failed(message),
            }
            state.mark_dirty();
            Vec::new()
        }
        Msg::SearchOpened => {
            if !state.search.open {
                state.search.open = true;
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::SearchClosed => {
            if !state.search.open {
                return (state, Vec::new());
            }
            state.search = Default::default();
            state.mark_dirty();
            vec![Effect::CancelSearchDebounce]
        }
        Msg::SearchInputChanged(text) => {
            if !state.search.open || state.search.input == text {
                return (state, Vec::new());
            }
            state.search.input = text.clone();
            state.mark_dirty();
            vec![Effect::DebounceSearch { query: text }]
        }
        Msg::SearchQuerySettled(query) => {
            // A settle for an older input, or after closing, is stale.
            if !state.search.open || state.search.input != query {
                return (state, Vec::new());
            }
            state.search.query = query;
            state.search.results = QueryState::Idle;
            state.mark_dirty();
            issue_search(&mut state).into_iter().collect()
        }
        Msg::SearchLoaded { request, result } => {
            if state.search.pending != Some(request) {
                return (state, Vec::new());
            }
            state.search.pending = None;
            state.search.results = match result {
                Ok(articles) => QueryState::Loaded(articles),
                Err(message) => QueryState::Failed(message),
            };
            state.mark_dirty();
            Vec::new()
        }
        Msg::UrlInputChanged(text) => {
            if state.form.input == text {
                return (state, Vec::new());
            }
            state.form.input = text;
            state.form.error = None;
            state.form.preview = QueryState::Idle;
            state.form.preview_request = None;
            state.mark_dirty();
            Vec::new()
        }
        Msg::PreviewRequested => match validate_article_url(&state.form.input) {
            Ok(url) => {
                let request = state.next_request_id();
                state.form.error = None;
                state.form.preview = QueryState::Loading;
                state.form.preview_request = Some((request, url.clone()));
                state.mark_dirty();
                vec![Effect::FetchPreview { request, url }]
            }
            Err(err) => {
                state.form.error = Some(err.to_string());
                state.mark_dirty();
                Vec::new()
            }
        },
        Msg::PreviewLoaded { request, result } => {
            let expected = matches!(
                (&state.form.preview, &state.form.preview_request),
                (QueryState::Loading, Some((pending, _))) if *pending == request
            );
            if !expected {
                return (state, Vec::new());
            }
            state.form.preview = match result {
                Ok(metadata) => QueryState::Loaded(metadata),
                Err(message) => QueryState::Failed(message),
            };
            state.mark_dirty();
            Vec::new()
        }
        Msg::SaveRequested { status, memo } => {
            if state.form.saving {
                return (state, Vec::new());
            }
            match validate_article_url(&state.form.input) {
                Ok(url) => {
                    state.form.saving = true;
                    state.form.error = None;
                    state.mark_dirty();
                    vec![Effect::CreateArticle { url, status, memo }]
                }
                Err(err) => {
                    state.form.error = Some(err.to_string());
                    state.mark_dirty();
                    Vec::new()
                }
            }
        }
        Msg::ArticleCreated { result } => {
            state.form.saving = false;
            state.mark_dirty();
            match result {
                Ok(article) => {
                    state.notice = Some(Notice::info(format!("Saved {}", article.display_title())));
                    state.form = Default::default();
                    refresh_views(&mut state)
                }
                Err(message) => {
                    state.form.error = Some(message);
                    Vec::new()
                }
            }
        }
        Msg::UpdateRequested { id, memo, status } => {
            if !state.busy.insert(id.clone()) {
                return (state, Vec::new());
            }
            state.mark_dirty();
            vec![Effect::UpdateArticle { id, memo, status }]
        }
        Msg::ArticleUpdated { id, result } => {
            state.busy.remove(&id);
            state.mark_dirty();
            match result {
                Ok(article) => {
                    state.notice = Some(Notice::info(format!("Updated {}", article.display_title())));
                    refresh_views(&mut state)
                }
                Err(message) => {
                    state.notice = Some(Notice::error(message));
                    Vec::new()
                }
            }
        }
        Msg::DeleteRequested { id } => {
            if !state.busy.insert(id.clone()) {
                return (state, Vec::new());
            }
            state.mark_dirty();
            vec![Effect::DeleteArticle { id }]
        }
        Msg::ArticleDeleted { id, result } => {
            state.busy.remove(&id);
            state.mark_dirty();
            match result {
                Ok(()) => {
                    state.notice = Some(Notice::info("Deleted"));
                    refresh_views(&mut state)
                }
                Err(message) => {
                    state.notice = Some(Notice::error(message));
                    Vec::new()
                }
            }
        }
    };

    (state, effects)
}

fn select_tab(state: &mut AppState, filter: StatusFilter) -> Vec<Effect> {
    state.active_tab = filter;
    state.current_page = 1;
    state.listing = QueryState::Loading;
    state.mark_dirty();
    vec![issue_listing(state)]
}

/// Tag a new listing request with the current tab and page. Any older
/// outstanding request is superseded.
fn issue_listing(state: &mut AppState) -> Effect {
    let tag = ListingTag {
        request: state.next_request_id(),
        filter: state.active_tab,
        page: state.current_page,
    };
    state.listing_request = Some(tag);
    if !matches!(state.listing, QueryState::Loaded(_)) {
        state.listing = QueryState::Loading;
    }
    Effect::FetchListing {
        tag,
        filter: tag.filter,
    }
}

/// Start a search for the settled query. Blank queries never reach the store.
fn issue_search(state: &mut AppState) -> Option<Effect> {
    if state.search.query.trim().is_empty() {
        state.search.pending = None;
        state.search.results = QueryState::Idle;
        return None;
    }
    let request = state.next_request_id();
    state.search.pending = Some(request);
    if !matches!(state.search.results, QueryState::Loaded(_)) {
        state.search.results = QueryState::Loading;
    }
    Some(Effect::RunSearch {
        request,
        query: state.search.query.clone(),
    })
}

/// Re-query whatever is on screen after a mutation.
fn refresh_views(state: &mut AppState) -> Vec<Effect> {
    let mut effects = vec![issue_listing(state)];
    if state.search.open {
        effects.extend(issue_search(state));
    }
    effects
}
