//! Line commands typed at the prompt.

use shelf_core::{ArticleStatus, StatusFilter};

pub const HELP: &str = "\
commands:
  tab <todo|reading|done|all>     switch status tab
  page <n> | next | prev          change page
  find [text]                     open search, optionally typing text
  close                           close search
  preview <url>                   show page metadata for a url
  add <url> [status] [memo...]    save a url (status defaults to todo)
  edit <row> <status> [memo...]   change status and memo of a row (memo - clears it)
  delete <row>                    remove a row
  show | help | quit
rows are numbered per page: 3 is the third listing row, s2 the second search hit";

/// A row on screen, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowRef {
    Listing(usize),
    Search(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Tab(StatusFilter),
    Page(usize),
    Next,
    Prev,
    Find(Option<String>),
    Close,
    Preview(String),
    Add {
        url: String,
        status: ArticleStatus,
        memo: String,
    },
    Edit {
        row: RowRef,
        status: ArticleStatus,
        memo: Option<String>,
    },
    Delete(RowRef),
    Show,
    Help,
    Quit,
}

pub fn parse_command(line: &str) -> Result<Command, String> {
    let line = line.trim();
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };

    match verb.to_ascii_lowercase().as_str() {
        "tab" => parse_filter(rest).map(Command::Tab),
        "page" => rest
            .parse::<usize>()
            .map(Command::Page)
            .map_err(|_| format!("not a page number: {rest:?}")),
        "next" | "n" => Ok(Command::Next),
        "prev" | "p" => Ok(Command::Prev),
        "find" | "search" | "/" => Ok(Command::Find(non_empty(rest))),
        "close" => Ok(Command::Close),
        "preview" => required(rest, "preview needs a url").map(Command::Preview),
        "add" => {
            let (url, tail) = split_word(rest);
            let url = required(url, "add needs a url")?;
            let (status, memo) = match tail_status(tail) {
                Some((status, memo)) => (status, memo),
                None => (ArticleStatus::WantToRead, tail.to_string()),
            };
            Ok(Command::Add { url, status, memo })
        }
        "edit" => {
            let (row, tail) = split_word(rest);
            let row = parse_row(row)?;
            let (status, memo) =
                tail_status(tail).ok_or_else(|| "edit needs a status".to_string())?;
            Ok(Command::Edit {
                row,
                status,
                memo: edit_memo(&memo),
            })
        }
        "delete" | "rm" => parse_row(rest).map(Command::Delete),
        "" | "show" => Ok(Command::Show),
        "help" | "?" => Ok(Command::Help),
        "quit" | "exit" | "q" => Ok(Command::Quit),
        other => Err(format!("unknown command {other:?}, try help")),
    }
}

/// Accepts the short names and the stored names (`WANT_TO_READ`, ...).
pub fn parse_status(raw: &str) -> Option<ArticleStatus> {
    match raw.to_ascii_lowercase().as_str() {
        "todo" | "to-read" | "toread" => Some(ArticleStatus::WantToRead),
        "reading" | "in-progress" | "doing" => Some(ArticleStatus::InProgress),
        "done" | "read" | "completed" => Some(ArticleStatus::Completed),
        _ => raw.to_ascii_uppercase().parse().ok(),
    }
}

/// No memo keeps the current one; a lone `-` clears it.
fn edit_memo(raw: &str) -> Option<String> {
    match raw.trim() {
        "-" => Some(String::new()),
        other => non_empty(other),
    }
}

fn parse_filter(raw: &str) -> Result<StatusFilter, String> {
    if raw.eq_ignore_ascii_case("all") {
        return Ok(StatusFilter::All);
    }
    parse_status(raw)
        .map(StatusFilter::Only)
        .ok_or_else(|| format!("unknown tab {raw:?}"))
}

fn parse_row(raw: &str) -> Result<RowRef, String> {
    let invalid = || format!("not a row: {raw:?}");
    let (search, digits) = match raw.strip_prefix(['s', 'S']) {
        Some(digits) => (true, digits),
        None => (false, raw),
    };
    let index = digits.parse::<usize>().map_err(|_| invalid())?;
    if index == 0 {
        return Err(invalid());
    }
    Ok(if search {
        RowRef::Search(index)
    } else {
        RowRef::Listing(index)
    })
}

/// Leading status word, if any, and the remainder as memo.
fn tail_status(tail: &str) -> Option<(ArticleStatus, String)> {
    let (word, memo) = split_word(tail);
    parse_status(word).map(|status| (status, memo.to_string()))
}

fn split_word(text: &str) -> (&str, &str) {
    match text.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (text, ""),
    }
}

fn required(text: &str, message: &str) -> Result<String, String> {
    non_empty(text).ok_or_else(|| message.to_string())
}

fn non_empty(text: &str) -> Option<String> {
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}
