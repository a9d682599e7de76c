//! Paged enumeration of document URIs from the list endpoint.
//!
//! The list endpoint serves at most [`API_PAGE_LIMIT`] items per page. The
//! lister pulls one page at a time as the consumer iterates; nothing is
//! fetched ahead of demand, and a consumed lister cannot be restarted —
//! resume is done by constructing a new one with a `start_page` taken from
//! the checkpoint.

use std::collections::VecDeque;

use lexline_core::{Accept, Transport};
use serde::Deserialize;

use crate::uri::{list_path, Category};

/// Documented maximum page size of the list endpoint.
pub const API_PAGE_LIMIT: usize = 10;

/// Change tag the listing attaches to each URI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeStatus {
    New,
    Modified,
    Unknown,
}

impl ChangeStatus {
    fn from_wire(s: &str) -> Self {
        match s {
            "NEW" => Self::New,
            "MODIFIED" => Self::Modified,
            _ => Self::Unknown,
        }
    }
}

/// One listed document identifier.
#[derive(Debug, Clone)]
pub struct ListedDocument {
    pub uri: String,
    pub change: ChangeStatus,
}

/// Listing parameters for one (category, document type) pair.
#[derive(Debug, Clone)]
pub struct ListQuery {
    pub category: Category,
    pub document_type: String,
    pub lang_and_version: String,
    pub start_year: Option<i32>,
    pub end_year: Option<i32>,
    /// Requested page size; clamped to [`API_PAGE_LIMIT`].
    pub limit: usize,
    /// Absolute page cap; `None` pages to the end of the data.
    pub max_pages: Option<u32>,
    /// First page to request (resume offset).
    pub start_page: u32,
}

impl ListQuery {
    pub fn new(category: Category, document_type: impl Into<String>) -> Self {
        Self {
            category,
            document_type: document_type.into(),
            lang_and_version: "fin@".to_string(),
            start_year: None,
            end_year: None,
            limit: API_PAGE_LIMIT,
            max_pages: None,
            start_page: 1,
        }
    }
}

/// Why the sequence ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListEnd {
    /// `max_pages` reached
    PageLimit,
    /// Page request returned a bad status or a transport error
    RequestFailed,
    /// Page body was not a JSON array
    MalformedBody,
    /// Server returned an empty page
    Exhausted,
    /// Page had fewer items than the page size
    ShortPage,
}

#[derive(Deserialize)]
struct WireItem {
    #[serde(default)]
    akn_uri: String,
    #[serde(default)]
    status: String,
}

/// Lazy page-by-page iterator over listed documents.
pub struct DocumentLister<'a, T: Transport> {
    transport: &'a T,
    query: ListQuery,
    path: String,
    /// Next page to request.
    next_page: u32,
    /// Page whose items are currently being yielded.
    current_page: u32,
    buffer: VecDeque<ListedDocument>,
    end: Option<ListEnd>,
}

impl<'a, T: Transport> DocumentLister<'a, T> {
    pub fn new(transport: &'a T, query: ListQuery) -> Self {
        let path = list_path(query.category, &query.document_type);
        let start = query.start_page.max(1);
        Self {
            transport,
            query,
            path,
            next_page: start,
            current_page: start,
            buffer: VecDeque::new(),
            end: None,
        }
    }

    /// Page the most recently yielded items came from.
    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    /// Terminal reason, once the sequence has ended.
    pub fn end_reason(&self) -> Option<ListEnd> {
        self.end
    }

    fn label(&self) -> String {
        format!("{}/{}", self.query.category, self.query.document_type)
    }

    fn fetch_page(&mut self) {
        if let Some(max) = self.query.max_pages {
            if self.next_page > max {
                log::info!("{}: reached max pages ({max})", self.label());
                self.end = Some(ListEnd::PageLimit);
                return;
            }
        }

        let limit = self.query.limit.min(API_PAGE_LIMIT);
        let mut query: Vec<(&str, String)> = vec![
            ("format", "json".to_string()),
            ("page", self.next_page.to_string()),
            ("limit", limit.to_string()),
            ("langAndVersion", self.query.lang_and_version.clone()),
        ];
        if let Some(year) = self.query.start_year {
            query.push(("startYear", year.to_string()));
        }
        if let Some(year) = self.query.end_year {
            query.push(("endYear", year.to_string()));
        }

        log::info!("listing {} page {}", self.label(), self.next_page);
        let response = match self.transport.get(&self.path, &query, Accept::Json) {
            Ok(response) => response,
            Err(e) => {
                log::error!("list request failed: {e}");
                self.end = Some(ListEnd::RequestFailed);
                return;
            }
        };
        if !response.is_success() {
            log::error!("list request failed: HTTP {}", response.status);
            self.end = Some(ListEnd::RequestFailed);
            return;
        }

        let items: Vec<WireItem> = match serde_json::from_slice(&response.body) {
            Ok(items) => items,
            Err(e) => {
                log::error!("{}: malformed list page: {e}", self.label());
                self.end = Some(ListEnd::MalformedBody);
                return;
            }
        };
        if items.is_empty() {
            log::info!("{}: no more items, pagination complete", self.label());
            self.end = Some(ListEnd::Exhausted);
            return;
        }

        self.current_page = self.next_page;
        let count = items.len();
        self.buffer.extend(items.into_iter().map(|item| ListedDocument {
            uri: item.akn_uri,
            change: ChangeStatus::from_wire(&item.status),
        }));

        if count < limit {
            log::info!("{}: last page reached ({count} items)", self.label());
            self.end = Some(ListEnd::ShortPage);
        } else {
            self.next_page += 1;
        }
    }
}

impl<T: Transport> Iterator for DocumentLister<'_, T> {
    type Item = ListedDocument;

    fn next(&mut self) -> Option<ListedDocument> {
        loop {
            if let Some(item) = self.buffer.pop_front() {
                return Some(item);
            }
            if self.end.is_some() {
                return None;
            }
            self.fetch_page();
        }
    }
}
