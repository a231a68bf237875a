//! Cursor-driven enumeration with a bounded error count.
//!
//! A failed request leaves the cursor untouched, so the next pass asks for the
//! same page again. After `max_errors` failures the enumeration stops and
//! returns whatever it has, marked as [`Completion::Truncated`].

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::PageError;

/// Failed page requests tolerated per enumeration unless configured otherwise.
pub const DEFAULT_MAX_ERRORS: u32 = 3;

/// One page of results and the cursor of the page after it.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// `None` means this was the last page.
    pub cursor: Option<String>,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, cursor: Option<String>) -> Self {
        Self { items, cursor }
    }

    pub fn last(items: Vec<T>) -> Self {
        Self { items, cursor: None }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cursor {
    /// Nothing requested yet. Sent as a null cursor.
    Start,
    Next(String),
    End,
}

impl Cursor {
    /// The value to put in the query's cursor variable.
    pub fn as_variable(&self) -> Option<&str> {
        match self {
            Cursor::Next(cursor) => Some(cursor),
            Cursor::Start | Cursor::End => None,
        }
    }
}

/// Loop state of one enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchState {
    cursor: Cursor,
    error_count: u32,
    max_errors: u32,
}

impl FetchState {
    pub fn new(max_errors: u32) -> Self {
        Self {
            cursor: Cursor::Start,
            error_count: 0,
            max_errors,
        }
    }

    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    pub fn error_count(&self) -> u32 {
        self.error_count
    }

    pub fn is_running(&self) -> bool {
        self.error_count < self.max_errors && self.cursor != Cursor::End
    }

    /// Applies one page response, returning the next state and the items the
    /// response contributed.
    pub fn advance<T>(self, response: Result<Page<T>, PageError>) -> (Self, Vec<T>) {
        match response {
            Ok(page) => {
                let cursor = match page.cursor {
                    Some(next) => Cursor::Next(next),
                    None => Cursor::End,
                };
                (Self { cursor, ..self }, page.items)
            }
            Err(_) => (
                Self {
                    error_count: self.error_count + 1,
                    ..self
                },
                Vec::new(),
            ),
        }
    }

    fn completion(&self) -> Completion {
        if self.cursor == Cursor::End {
            Completion::Exhausted
        } else {
            Completion::Truncated
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The last page was received.
    Exhausted,
    /// The error ceiling was hit before the last page.
    Truncated,
}

/// Everything an enumeration gathered.
#[derive(Debug, Clone, PartialEq)]
pub struct Fetched<T> {
    pub items: Vec<T>,
    /// Failed page requests, including ones that were later retried successfully.
    pub errors: u32,
    pub completion: Completion,
}

impl<T> Fetched<T> {
    pub fn is_complete(&self) -> bool {
        self.completion == Completion::Exhausted
    }
}

/// Something that can be asked for a page at a given cursor.
#[async_trait]
pub trait PageSource: Send + Sync {
    type Item: Send;

    /// Short label used in log lines.
    fn describe(&self) -> String;

    async fn fetch_page(&self, cursor: Option<&str>) -> Result<Page<Self::Item>, PageError>;
}

/// Requests pages from `source` until the last page arrives or `max_errors`
/// requests have failed.
///
/// Never fails: a run that hits the ceiling returns the items of every page
/// that did succeed, flagged as truncated.
pub async fn fetch_all<S: PageSource + ?Sized>(source: &S, max_errors: u32) -> Fetched<S::Item> {
    let mut state = FetchState::new(max_errors);
    let mut items = Vec::new();

    while state.is_running() {
        let response = source.fetch_page(state.cursor().as_variable()).await;

        match &response {
            Ok(page) => debug!("{}: received {} items", source.describe(), page.items.len()),
            Err(e) => warn!(
                "{}: page request failed ({} of {} allowed): {}",
                source.describe(),
                state.error_count() + 1,
                max_errors,
                e
            ),
        }

        let (next, page_items) = state.advance(response);
        items.extend(page_items);
        state = next;
    }

    let completion = state.completion();
    if completion == Completion::Truncated {
        warn!(
            "{}: gave up after {} failed requests, returning {} items gathered so far",
            source.describe(),
            state.error_count(),
            items.len()
        );
    }

    Fetched {
        items,
        errors: state.error_count(),
        completion,
    }
}
