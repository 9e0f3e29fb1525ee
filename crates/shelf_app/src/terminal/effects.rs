use std::sync::{mpsc, Arc};

use shelf_core::{Effect, Msg};
use shelf_engine::{
    Debouncer, EngineCommand, EngineError, EngineEvent, EngineHandle, EventSink,
};
use shelf_logging::{shelf_debug, shelf_warn};

use super::app::AppEvent;
use crate::config::ShelfConfig;

/// Executes core effects: store work goes to the engine, search input goes
/// through the debouncer whose settles come back as `Msg::SearchQuerySettled`.
pub struct EffectRunner {
    // Declared first so pending timers are cancelled before the runtime stops.
    search: Debouncer<String>,
    engine: EngineHandle,
}

impl EffectRunner {
    pub fn new(config: &ShelfConfig, events: mpsc::Sender<AppEvent>) -> Result<Self, EngineError> {
        let sink = Arc::new(MsgSink {
            events: events.clone(),
        });
        let engine = EngineHandle::new(config.engine_config(), sink)?;
        let search = Debouncer::new(engine.timers(), String::new(), config.search_debounce())
            .on_settle(move |query: &String| {
                let _ = events.send(AppEvent::Msg(Msg::SearchQuerySettled(query.clone())));
            });
        Ok(Self { search, engine })
    }

    pub fn run(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::FetchListing { tag, filter } => {
                    self.engine.submit(EngineCommand::List { tag, filter });
                }
                Effect::DebounceSearch { query } => self.search.set(query),
                Effect::CancelSearchDebounce => {
                    shelf_debug!("Search debounce cancelled");
                    self.search.cancel();
                }
                Effect::RunSearch { request, query } => {
                    self.engine.submit(EngineCommand::Search { request, query });
                }
                Effect::FetchPreview { request, url } => {
                    self.engine.submit(EngineCommand::Preview { request, url });
                }
                Effect::CreateArticle { url, status, memo } => {
                    self.engine
                        .submit(EngineCommand::Create { url, status, memo });
                }
                Effect::UpdateArticle { id, memo, status } => {
                    self.engine
                        .submit(EngineCommand::Update { id, memo, status });
                }
                Effect::DeleteArticle { id } => {
                    self.engine.submit(EngineCommand::Delete { id });
                }
            }
        }
    }
}

struct MsgSink {
    events: mpsc::Sender<AppEvent>,
}

impl EventSink for MsgSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.events.send(AppEvent::Msg(to_msg(event)));
    }
}

/// Engine errors reach the core as their display text.
pub(crate) fn to_msg(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::ListingLoaded { tag, result } => Msg::ListingLoaded {
            tag,
            result: flatten(result, "Listing"),
        },
        EngineEvent::SearchLoaded { request, result } => Msg::SearchLoaded {
            request,
            result: flatten(result, "Search"),
        },
        EngineEvent::PreviewLoaded { request, result } => Msg::PreviewLoaded {
            request,
            result: flatten(result, "Preview"),
        },
        EngineEvent::Created { result } => Msg::ArticleCreated {
            result: flatten(result, "Create"),
        },
        EngineEvent::Updated { id, result } => Msg::ArticleUpdated {
            id,
            result: flatten(result, "Update"),
        },
        EngineEvent::Deleted { id, result } => Msg::ArticleDeleted {
            id,
            result: flatten(result, "Delete"),
        },
    }
}

fn flatten<T, E: std::fmt::Display>(result: Result<T, E>, what: &str) -> Result<T, String> {
    result.map_err(|err| {
        shelf_warn!("{} failed: {}", what, err);
        err.to_string()
    })
}
