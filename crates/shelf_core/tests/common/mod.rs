#![allow(dead_code)]

use std::sync::Once;

use chrono::{TimeZone, Utc};
use shelf_core::{update, AppState, Article, ArticleId, ArticleStatus, Effect, ListingTag, Msg, OwnerId};

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(shelf_logging::initialize_for_tests);
}

pub fn article(id: &str, status: ArticleStatus, minute: u32) -> Article {
    Article {
        id: ArticleId::new(id),
        owner_id: OwnerId::new("owner-1"),
        url: format!("https://example.com/{id}"),
        title: Some(format!("Title {id}")),
        description: None,
        image: None,
        memo: String::new(),
        status,
        created_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, minute, 0).unwrap(),
    }
}

/// `count` articles, newest first.
pub fn articles(count: usize, status: ArticleStatus) -> Vec<Article> {
    (0..count)
        .map(|i| article(&format!("a{i}"), status, 59 - i as u32))
        .collect()
}

pub fn listing_tag(effects: &[Effect]) -> ListingTag {
    effects
        .iter()
        .find_map(|effect| match effect {
            Effect::FetchListing { tag, .. } => Some(*tag),
            _ => None,
        })
        .expect("listing effect")
}

/// Initialize and answer the first listing request with `items`.
pub fn loaded_state(page_size: usize, items: Vec<Article>) -> AppState {
    let (state, effects) = update(AppState::with_page_size(page_size), Msg::Initialized);
    let tag = listing_tag(&effects);
    let (mut state, _) = update(
        state,
        Msg::ListingLoaded {
            tag,
            result: Ok(items),
        },
    );
    state.consume_dirty();
    state
}
