use std::fmt::Write;

use shelf_core::{
    AppViewModel, ArticleCardView, FormView, ListingView, NoticeLevel, PageItem, PreviewView,
    SearchResultsView, SearchView,
};

/// Full-screen text rendering of the view model.
pub fn render(view: &AppViewModel) -> String {
    let mut out = String::new();
    render_tabs(&mut out, view);
    render_listing(&mut out, &view.listing);
    render_pager(&mut out, view);
    if let Some(search) = &view.search {
        render_search(&mut out, search);
    }
    render_form(&mut out, &view.form);
    if let Some(notice) = &view.notice {
        let prefix = match notice.level {
            NoticeLevel::Info => "ok",
            NoticeLevel::Error => "error",
        };
        let _ = writeln!(out, "[{prefix}] {}", notice.message);
    }
    out
}

fn render_tabs(out: &mut String, view: &AppViewModel) {
    let tabs: Vec<String> = view
        .tabs
        .iter()
        .map(|tab| {
            if tab.active {
                format!("[{}]", tab.label)
            } else {
                format!(" {} ", tab.label)
            }
        })
        .collect();
    let _ = writeln!(out, "{}", tabs.join(" "));
}

fn render_listing(out: &mut String, listing: &ListingView) {
    match listing {
        ListingView::Loading => out.push_str("  loading...\n"),
        ListingView::Empty => out.push_str("  no articles\n"),
        ListingView::Error(message) => {
            let _ = writeln!(out, "  error: {message}");
        }
        ListingView::Items(cards) => {
            for (index, card) in cards.iter().enumerate() {
                render_card(out, &(index + 1).to_string(), card);
            }
        }
    }
}

fn render_card(out: &mut String, row: &str, card: &ArticleCardView) {
    let busy = if card.busy { " (saving)" } else { "" };
    let _ = writeln!(
        out,
        "{row:>4}. {} [{}] {}{busy}",
        card.title,
        card.status_label,
        card.created_at.format("%Y-%m-%d"),
    );
    if card.title != card.url {
        let _ = writeln!(out, "      {}", card.url);
    }
    if let Some(description) = &card.description {
        let _ = writeln!(out, "      {description}");
    }
    if !card.memo.is_empty() {
        let _ = writeln!(out, "      memo: {}", card.memo);
    }
}

pub(crate) fn render_page_window(view: &AppViewModel) -> String {
    let items: Vec<String> = view
        .page_window
        .iter()
        .map(|item| match item {
            PageItem::Page(page) if *page == view.current_page => format!("[{page}]"),
            PageItem::Page(page) => page.to_string(),
            PageItem::Ellipsis => "...".to_string(),
        })
        .collect();
    items.join(" ")
}

fn render_pager(out: &mut String, view: &AppViewModel) {
    if view.page_window.is_empty() {
        return;
    }
    let prev = if view.can_go_prev { "<prev" } else { "     " };
    let next = if view.can_go_next { "next>" } else { "" };
    let _ = writeln!(out, "  {prev} {} {next}", render_page_window(view));
}

fn render_search(out: &mut String, search: &SearchView) {
    let _ = writeln!(out, "search: {}", search.input);
    match &search.results {
        SearchResultsView::Idle => {}
        SearchResultsView::Loading => out.push_str("  searching...\n"),
        SearchResultsView::Empty => out.push_str("  no matches\n"),
        SearchResultsView::Error(message) => {
            let _ = writeln!(out, "  error: {message}");
        }
        SearchResultsView::Items(cards) => {
            for (index, card) in cards.iter().enumerate() {
                render_card(out, &format!("s{}", index + 1), card);
            }
        }
    }
}

fn render_form(out: &mut String, form: &FormView) {
    if form.input.is_empty() && form.preview == PreviewView::None && form.error.is_none() {
        return;
    }
    let saving = if form.saving { " (saving)" } else { "" };
    let _ = writeln!(out, "url: {}{saving}", form.input);
    match &form.preview {
        PreviewView::None => {}
        PreviewView::Loading => out.push_str("  fetching preview...\n"),
        PreviewView::Ready {
            title,
            description,
            image,
        } => {
            let _ = writeln!(out, "  title: {title}");
            if let Some(description) = description {
                let _ = writeln!(out, "  description: {description}");
            }
            if let Some(image) = image {
                let _ = writeln!(out, "  image: {image}");
            }
        }
        PreviewView::Error(message) => {
            let _ = writeln!(out, "  preview failed: {message}");
        }
    }
    if let Some(error) = &form.error {
        let _ = writeln!(out, "  error: {error}");
    }
}
