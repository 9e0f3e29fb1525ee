use std::io::{self, BufRead, Write};
use std::sync::mpsc;
use std::thread;

use anyhow::{Context, Result};
use shelf_core::{
    update, AppState, AppViewModel, ArticleCardView, ListingView, Msg, SearchResultsView,
};
use shelf_logging::{shelf_info, shelf_warn};

use super::effects::EffectRunner;
use super::input::{parse_command, Command, RowRef, HELP};
use super::render::render;
use crate::config::ShelfConfig;

/// Everything the main loop reacts to.
pub enum AppEvent {
    Input(Command),
    InvalidInput(String),
    /// Stdin reached end of file.
    InputClosed,
    Msg(Msg),
}

pub fn run_app(config: ShelfConfig) -> Result<()> {
    let (events_tx, events_rx) = mpsc::channel::<AppEvent>();
    let runner =
        EffectRunner::new(&config, events_tx.clone()).context("failed to start engine")?;
    spawn_input_reader(events_tx);

    let mut app = App {
        state: AppState::with_page_size(config.page_size),
        runner,
    };
    println!("type help for commands");
    app.dispatch(Msg::Initialized);
    app.render_if_dirty();

    for event in events_rx.iter() {
        match event {
            AppEvent::Msg(msg) => app.dispatch(msg),
            AppEvent::Input(Command::Quit) | AppEvent::InputClosed => break,
            AppEvent::Input(Command::Help) => println!("{HELP}"),
            AppEvent::Input(Command::Show) => app.render(),
            AppEvent::Input(command) => match translate(&app.state.view(), command) {
                Ok(msgs) => msgs.into_iter().for_each(|msg| app.dispatch(msg)),
                Err(message) => println!("{message}"),
            },
            AppEvent::InvalidInput(message) => println!("{message}"),
        }
        app.render_if_dirty();
    }

    shelf_info!("Shutting down");
    Ok(())
}

struct App {
    state: AppState,
    runner: EffectRunner,
}

impl App {
    fn dispatch(&mut self, msg: Msg) {
        let state = std::mem::take(&mut self.state);
        let (state, effects) = update(state, msg);
        self.state = state;
        self.runner.run(effects);
    }

    fn render_if_dirty(&mut self) {
        if self.state.consume_dirty() {
            self.render();
        }
    }

    fn render(&self) {
        let mut stdout = io::stdout().lock();
        let _ = write!(stdout, "\n{}> ", render(&self.state.view()));
        let _ = stdout.flush();
    }
}

fn spawn_input_reader(events: mpsc::Sender<AppEvent>) {
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let event = match line {
                Ok(line) => match parse_command(&line) {
                    Ok(command) => AppEvent::Input(command),
                    Err(message) => AppEvent::InvalidInput(message),
                },
                Err(err) => {
                    shelf_warn!("Failed to read stdin: {}", err);
                    break;
                }
            };
            if events.send(event).is_err() {
                return;
            }
        }
        let _ = events.send(AppEvent::InputClosed);
    });
}

/// Map a command onto controller messages, resolving row numbers against
/// what is currently on screen.
fn translate(view: &AppViewModel, command: Command) -> Result<Vec<Msg>, String> {
    let msgs = match command {
        Command::Tab(filter) => vec![Msg::TabSelected(filter)],
        Command::Page(page) => {
            if page == 0 || page > view.total_pages {
                return Err(format!("no page {page}"));
            }
            vec![Msg::PageRequested(page)]
        }
        Command::Next if view.can_go_next => vec![Msg::PageRequested(view.current_page + 1)],
        Command::Next => return Err("already on the last page".to_string()),
        Command::Prev if view.can_go_prev => vec![Msg::PageRequested(view.current_page - 1)],
        Command::Prev => return Err("already on the first page".to_string()),
        Command::Find(text) => {
            let mut msgs = Vec::new();
            if view.search.is_none() {
                msgs.push(Msg::SearchOpened);
            }
            if let Some(text) = text {
                msgs.push(Msg::SearchInputChanged(text));
            }
            msgs
        }
        Command::Close => vec![Msg::SearchClosed],
        Command::Preview(url) => vec![Msg::UrlInputChanged(url), Msg::PreviewRequested],
        Command::Add { url, status, memo } => {
            vec![Msg::UrlInputChanged(url), Msg::SaveRequested { status, memo }]
        }
        Command::Edit { row, status, memo } => {
            let card = card_at(view, row)?;
            vec![Msg::UpdateRequested {
                id: card.id.clone(),
                memo: memo.unwrap_or_else(|| card.memo.clone()),
                status,
            }]
        }
        Command::Delete(row) => vec![Msg::DeleteRequested {
            id: card_at(view, row)?.id.clone(),
        }],
        Command::Show | Command::Help | Command::Quit => Vec::new(),
    };
    Ok(msgs)
}

fn card_at(view: &AppViewModel, row: RowRef) -> Result<&ArticleCardView, String> {
    let none: &[ArticleCardView] = &[];
    let (cards, index) = match row {
        RowRef::Listing(index) => match &view.listing {
            ListingView::Items(cards) => (cards.as_slice(), index),
            _ => (none, index),
        },
        RowRef::Search(index) => match view.search.as_ref().map(|search| &search.results) {
            Some(SearchResultsView::Items(cards)) => (cards.as_slice(), index),
            _ => (none, index),
        },
    };
    index
        .checked_sub(1)
        .and_then(|i| cards.get(i))
        .ok_or_else(|| format!("no such row: {}", row_label(row)))
}

fn row_label(row: RowRef) -> String {
    match row {
        RowRef::Listing(index) => index.to_string(),
        RowRef::Search(index) => format!("s{index}"),
    }
}
